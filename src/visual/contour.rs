//! Contour level generation and marching-squares segment extraction
//!
//! Feeds the filled-contour rasterizer: levels split the value span into
//! bands, and marching squares traces the iso-lines drawn on top of them.
//! Cells touching a NaN corner are skipped, leaving masked regions unlined.

/// A contour line segment between two grid-space points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment(pub (f32, f32), pub (f32, f32));

/// Evenly spaced interior levels splitting `lo..hi` into `bands` bands.
///
/// Returns `bands - 1` levels; degenerate or empty spans yield none.
pub fn contour_levels(lo: f32, hi: f32, bands: usize) -> Vec<f32> {
    if !(hi > lo) || bands < 2 {
        return vec![];
    }
    let span = hi - lo;
    (1..bands)
        .map(|i| lo + span * i as f32 / bands as f32)
        .collect()
}

/// Marching squares over a row-major grid, extracting segments of one level.
///
/// Coordinates are grid-space: x in `0..width-1`, y in `0..height-1`, with
/// fractional positions from linear interpolation along cell edges.
pub fn march_squares(data: &[f32], width: usize, height: usize, level: f32) -> Vec<Segment> {
    if width < 2 || height < 2 || data.len() != width * height {
        return vec![];
    }

    let mut segments = Vec::new();

    for y in 0..(height - 1) {
        for x in 0..(width - 1) {
            let tl = data[y * width + x];
            let tr = data[y * width + x + 1];
            let bl = data[(y + 1) * width + x];
            let br = data[(y + 1) * width + x + 1];

            if tl.is_nan() || tr.is_nan() || bl.is_nan() || br.is_nan() {
                continue;
            }

            let mut case = 0_u8;
            if tl >= level {
                case |= 8;
            }
            if tr >= level {
                case |= 4;
            }
            if br >= level {
                case |= 2;
            }
            if bl >= level {
                case |= 1;
            }

            if case == 0 || case == 15 {
                continue;
            }

            let fx = x as f32;
            let fy = y as f32;

            // Interpolated crossing points on each cell edge
            let top = (fx + interp(tl, tr, level), fy);
            let bottom = (fx + interp(bl, br, level), fy + 1.0);
            let left = (fx, fy + interp(tl, bl, level));
            let right = (fx + 1.0, fy + interp(tr, br, level));

            match case {
                1 | 14 => segments.push(Segment(left, bottom)),
                2 | 13 => segments.push(Segment(bottom, right)),
                3 | 12 => segments.push(Segment(left, right)),
                4 | 11 => segments.push(Segment(top, right)),
                6 | 9 => segments.push(Segment(top, bottom)),
                7 | 8 => segments.push(Segment(left, top)),
                5 => {
                    // Saddle: disambiguate with the cell-center average
                    let center = (tl + tr + bl + br) / 4.0;
                    if center >= level {
                        segments.push(Segment(left, top));
                        segments.push(Segment(bottom, right));
                    } else {
                        segments.push(Segment(left, bottom));
                        segments.push(Segment(top, right));
                    }
                }
                10 => {
                    let center = (tl + tr + bl + br) / 4.0;
                    if center >= level {
                        segments.push(Segment(top, right));
                        segments.push(Segment(left, bottom));
                    } else {
                        segments.push(Segment(left, top));
                        segments.push(Segment(bottom, right));
                    }
                }
                _ => unreachable!("cases 0 and 15 are filtered above"),
            }
        }
    }

    segments
}

/// Fractional position of the level crossing between two corner values
fn interp(v0: f32, v1: f32, level: f32) -> f32 {
    let delta = v1 - v0;
    if delta.abs() < f32::EPSILON {
        0.5
    } else {
        ((level - v0) / delta).clamp(0.0, 1.0)
    }
}
