//! Colormaps, normalization and RGBA rasterization
//!
//! Turns a [`VisualObject`] into the flat RGBA buffer the display surface
//! consumes. Normalization decides how data values map to the colormap's
//! 0..1 span: per-frame (each frame stretches its own range) or fixed-range
//! (one span shared across a whole slider sequence, so colors stay
//! comparable while scrubbing).

use crate::errors::{GridViewsError, Result};
use crate::visual::contour::{contour_levels, march_squares};
use crate::visual::{FrameData, FrameSequence, VisualKind, VisualObject};
use ndarray::Array2;
use rayon::prelude::*;

/// Color value in RGBA format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn transparent() -> Self {
        Self { r: 0, g: 0, b: 0, a: 0 }
    }
}

/// Convert HSV to RGB
///
/// `h` in degrees (0-360), `s` and `v` in 0-1.
pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> (u8, u8, u8) {
    let h = h % 360.0;
    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;

    let (r, g, b) = if h < 60.0 {
        (c, x, 0.0)
    } else if h < 120.0 {
        (x, c, 0.0)
    } else if h < 180.0 {
        (0.0, c, x)
    } else if h < 240.0 {
        (0.0, x, c)
    } else if h < 300.0 {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };

    (
        ((r + m) * 255.0) as u8,
        ((g + m) * 255.0) as u8,
        ((b + m) * 255.0) as u8,
    )
}

/// Named colormaps, sampled by interpolating fixed stops
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Colormap {
    Viridis,
    Plasma,
    CoolWarm,
    Greys,
    /// Blue-to-red HSV sweep, the generic fallback
    Hsv,
}

impl Colormap {
    /// Parse a CLI-facing colormap name
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "viridis" => Ok(Self::Viridis),
            "plasma" => Ok(Self::Plasma),
            "coolwarm" => Ok(Self::CoolWarm),
            "greys" | "grays" => Ok(Self::Greys),
            "hsv" => Ok(Self::Hsv),
            other => Err(GridViewsError::Generic(format!(
                "Unknown colormap '{}' (expected viridis, plasma, coolwarm, greys or hsv)",
                other
            ))),
        }
    }

    const fn stops(self) -> &'static [(u8, u8, u8)] {
        match self {
            Self::Viridis => &[
                (68, 1, 84),
                (59, 82, 139),
                (33, 145, 140),
                (94, 201, 98),
                (253, 231, 37),
            ],
            Self::Plasma => &[
                (13, 8, 135),
                (126, 3, 168),
                (204, 71, 120),
                (248, 149, 64),
                (240, 249, 33),
            ],
            Self::CoolWarm => &[
                (59, 76, 192),
                (144, 178, 254),
                (221, 221, 221),
                (245, 156, 125),
                (180, 4, 38),
            ],
            Self::Greys => &[(255, 255, 255), (128, 128, 128), (0, 0, 0)],
            Self::Hsv => &[],
        }
    }

    /// Sample the map at `t` in 0..1
    pub fn sample(self, t: f32) -> Color {
        let t = t.clamp(0.0, 1.0);
        if self == Self::Hsv {
            let (r, g, b) = hsv_to_rgb((1.0 - t) * 240.0, 1.0, 1.0);
            return Color::new(r, g, b, 255);
        }

        let stops = self.stops();
        let span = (stops.len() - 1) as f32;
        let pos = t * span;
        let i = (pos.floor() as usize).min(stops.len() - 2);
        let frac = pos - i as f32;

        let (r0, g0, b0) = stops[i];
        let (r1, g1, b1) = stops[i + 1];
        Color::new(
            (f32::from(r0) + (f32::from(r1) - f32::from(r0)) * frac) as u8,
            (f32::from(g0) + (f32::from(g1) - f32::from(g0)) * frac) as u8,
            (f32::from(b0) + (f32::from(b1) - f32::from(b0)) * frac) as u8,
            255,
        )
    }
}

/// How data values normalize onto the colormap span
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Normalization {
    /// Each frame stretches its own finite range
    PerFrame,
    /// One explicit range shared by every frame
    FixedRange(f32, f32),
}

impl Normalization {
    /// A fixed range for a whole sequence: the dataset's rebound limits if
    /// declared, otherwise the sequence-wide finite range.
    pub fn fixed_for(sequence: &FrameSequence) -> Self {
        let (lo, hi) = sequence
            .declared_range()
            .or_else(|| sequence.sequence_range())
            .unwrap_or((0.0, 1.0));
        Self::FixedRange(lo, hi)
    }

    fn resolve(self, frame: &VisualObject) -> (f32, f32) {
        match self {
            Self::PerFrame => frame.value_range.unwrap_or((0.0, 1.0)),
            Self::FixedRange(lo, hi) => (lo, hi),
        }
    }
}

/// Declarative per-render options. Never persisted; passed at render time.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub colormap: Colormap,
    pub normalization: Normalization,
    /// Output width in pixels
    pub width: usize,
    /// Output height in pixels; overridden when `aspect` is set
    pub height: usize,
    /// Height becomes width / aspect when set
    pub aspect: Option<f32>,
    /// Draw a one-pixel frame around the plot area
    pub show_axes: bool,
    /// Band count for filled contours
    pub contour_bands: usize,
    /// Draw contour lines on top of the filled bands
    pub contour_lines: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            colormap: Colormap::Viridis,
            normalization: Normalization::PerFrame,
            width: 640,
            height: 480,
            aspect: None,
            show_axes: true,
            contour_bands: 10,
            contour_lines: true,
        }
    }
}

impl RenderOptions {
    fn output_size(&self) -> (usize, usize) {
        match self.aspect {
            Some(aspect) if aspect > 0.0 => {
                let height = ((self.width as f32) / aspect).round().max(1.0) as usize;
                (self.width, height)
            }
            _ => (self.width, self.height),
        }
    }
}

/// A flat RGBA pixel buffer
#[derive(Debug, Clone, PartialEq)]
pub struct RgbaBuffer {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<u8>,
}

impl RgbaBuffer {
    pub fn filled(width: usize, height: usize, color: Color) -> Self {
        let mut pixels = Vec::with_capacity(width * height * 4);
        for _ in 0..width * height {
            pixels.extend_from_slice(&[color.r, color.g, color.b, color.a]);
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn set(&mut self, x: usize, y: usize, color: Color) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = (y * self.width + x) * 4;
        self.pixels[idx] = color.r;
        self.pixels[idx + 1] = color.g;
        self.pixels[idx + 2] = color.b;
        self.pixels[idx + 3] = color.a;
    }

    /// Alpha-composite `src` over this buffer (source-over)
    pub fn blend_over(&mut self, src: &RgbaBuffer) -> Result<()> {
        if src.width != self.width || src.height != self.height {
            return Err(GridViewsError::Generic(format!(
                "Cannot composite {}x{} over {}x{}",
                src.width, src.height, self.width, self.height
            )));
        }
        for (dst_px, src_px) in self.pixels.chunks_mut(4).zip(src.pixels.chunks(4)) {
            let sa = f32::from(src_px[3]) / 255.0;
            if sa <= 0.0 {
                continue;
            }
            let da = f32::from(dst_px[3]) / 255.0;
            let out_a = sa + da * (1.0 - sa);
            if out_a <= 0.0 {
                continue;
            }
            for c in 0..3 {
                let sc = f32::from(src_px[c]);
                let dc = f32::from(dst_px[c]);
                dst_px[c] = ((sc * sa + dc * da * (1.0 - sa)) / out_a).round() as u8;
            }
            dst_px[3] = (out_a * 255.0).round() as u8;
        }
        Ok(())
    }

    fn draw_border(&mut self, color: Color) {
        if self.width == 0 || self.height == 0 {
            return;
        }
        for x in 0..self.width {
            self.set(x, 0, color);
            self.set(x, self.height - 1, color);
        }
        for y in 0..self.height {
            self.set(0, y, color);
            self.set(self.width - 1, y, color);
        }
    }
}

/// Resample a row-major grid to a different resolution with bilinear
/// interpolation; cells touching a NaN corner fall back to nearest neighbor.
pub fn resample_grid(
    data: &Array2<f32>,
    dst_width: usize,
    dst_height: usize,
) -> Vec<f32> {
    let (src_height, src_width) = data.dim();
    let mut output = vec![f32::NAN; dst_width * dst_height];
    if src_width == 0 || src_height == 0 {
        return output;
    }

    let x_ratio = if dst_width > 1 {
        (src_width - 1) as f32 / (dst_width - 1) as f32
    } else {
        0.0
    };
    let y_ratio = if dst_height > 1 {
        (src_height - 1) as f32 / (dst_height - 1) as f32
    } else {
        0.0
    };

    for y in 0..dst_height {
        for x in 0..dst_width {
            let src_x = x as f32 * x_ratio;
            let src_y = y as f32 * y_ratio;

            let x1 = src_x.floor() as usize;
            let y1 = src_y.floor() as usize;
            let x2 = (x1 + 1).min(src_width - 1);
            let y2 = (y1 + 1).min(src_height - 1);

            let dx = src_x - x1 as f32;
            let dy = src_y - y1 as f32;

            let v11 = data[[y1, x1]];
            let v21 = data[[y1, x2]];
            let v12 = data[[y2, x1]];
            let v22 = data[[y2, x2]];

            let value = if v11.is_finite() && v21.is_finite() && v12.is_finite() && v22.is_finite()
            {
                let v1 = v11 * (1.0 - dx) + v21 * dx;
                let v2 = v12 * (1.0 - dx) + v22 * dx;
                v1 * (1.0 - dy) + v2 * dy
            } else {
                // Nearest neighbor keeps masked regions crisp
                let nx = if dx < 0.5 { x1 } else { x2 };
                let ny = if dy < 0.5 { y1 } else { y2 };
                data[[ny, nx]]
            };

            output[y * dst_width + x] = value;
        }
    }

    output
}

/// Rasterize one visual object into an RGBA buffer.
///
/// NaN cells render transparent so masked regions stay see-through in
/// overlays.
pub fn rasterize(visual: &VisualObject, options: &RenderOptions) -> Result<RgbaBuffer> {
    let (width, height) = options.output_size();
    let (lo, hi) = options.normalization.resolve(visual);
    let span = if hi > lo { hi - lo } else { 1.0 };
    let normalize = |v: f32| ((v - lo) / span).clamp(0.0, 1.0);

    // Grid rows follow axis order; pixel rows run top-down. Flip when the
    // y axis ascends.
    let flip_y = visual.extent.y1 > visual.extent.y0;

    let mut buffer = match (&visual.data, visual.kind) {
        (FrameData::Grid(grid), VisualKind::Image) => {
            let samples = resample_grid(grid, width, height);
            let mut buffer = RgbaBuffer::filled(width, height, Color::transparent());
            for y in 0..height {
                let row = if flip_y { height - 1 - y } else { y };
                for x in 0..width {
                    let value = samples[row * width + x];
                    if value.is_finite() {
                        let t = normalize(value);
                        buffer.set(x, y, options.colormap.sample(t));
                    }
                }
            }
            buffer
        }
        (FrameData::Grid(grid), VisualKind::FilledContour) => {
            rasterize_filled_contour(grid, options, width, height, lo, hi, flip_y)
        }
        (FrameData::Scatter(points), VisualKind::Points) => {
            let mut buffer = RgbaBuffer::filled(width, height, Color::transparent());
            for point in points {
                let (px, py) = project(visual, point.x, point.y, width, height);
                let color = options.colormap.sample(normalize(point.value));
                // 3x3 marker
                for dy in -1i64..=1 {
                    for dx in -1i64..=1 {
                        let x = px as i64 + dx;
                        let y = py as i64 + dy;
                        if x >= 0 && y >= 0 {
                            buffer.set(x as usize, y as usize, color);
                        }
                    }
                }
            }
            buffer
        }
        (FrameData::Series(series), VisualKind::Curve) => {
            let mut buffer = RgbaBuffer::filled(width, height, Color::transparent());
            let color = Color::new(31, 119, 180, 255);
            for pair in series.windows(2) {
                let (x0, v0) = pair[0];
                let (x1, v1) = pair[1];
                if !v0.is_finite() || !v1.is_finite() {
                    continue;
                }
                let (px0, py0) = project(visual, x0, f64::from(v0), width, height);
                let (px1, py1) = project(visual, x1, f64::from(v1), width, height);
                draw_segment(&mut buffer, px0, py0, px1, py1, color);
            }
            buffer
        }
        (data, kind) => {
            return Err(GridViewsError::UnsupportedVisualKind {
                kind: kind.as_str().to_string(),
                message: format!(
                    "frame payload {:?} does not match the visual kind",
                    std::mem::discriminant(data)
                ),
            })
        }
    };

    if options.show_axes {
        buffer.draw_border(Color::new(60, 60, 60, 255));
    }
    Ok(buffer)
}

/// Rasterize every frame of a sequence, fanning out across the thread pool
pub fn rasterize_frames(
    sequence: &FrameSequence,
    options: &RenderOptions,
) -> Result<Vec<RgbaBuffer>> {
    sequence
        .iter()
        .collect::<Vec<_>>()
        .par_iter()
        .map(|frame| rasterize(frame, options))
        .collect()
}

#[allow(clippy::too_many_arguments)]
fn rasterize_filled_contour(
    grid: &Array2<f32>,
    options: &RenderOptions,
    width: usize,
    height: usize,
    lo: f32,
    hi: f32,
    flip_y: bool,
) -> RgbaBuffer {
    let bands = options.contour_bands.max(2);
    let span = if hi > lo { hi - lo } else { 1.0 };
    let samples = resample_grid(grid, width, height);

    let mut buffer = RgbaBuffer::filled(width, height, Color::transparent());
    for y in 0..height {
        let row = if flip_y { height - 1 - y } else { y };
        for x in 0..width {
            let value = samples[row * width + x];
            if value.is_finite() {
                let t = ((value - lo) / span).clamp(0.0, 1.0);
                // Quantize into bands, sampling each band at its center
                let band = ((t * bands as f32).floor() as usize).min(bands - 1);
                let t_band = (band as f32 + 0.5) / bands as f32;
                buffer.set(x, y, options.colormap.sample(t_band));
            }
        }
    }

    if options.contour_lines {
        let line_color = Color::new(40, 40, 40, 255);
        for level in contour_levels(lo, hi, bands) {
            for segment in march_squares(&samples, width, height, level) {
                let (x0, y0) = segment.0;
                let (x1, y1) = segment.1;
                let map_y = |py: f32| if flip_y { height as f32 - 1.0 - py } else { py };
                draw_segment(
                    &mut buffer,
                    x0.round() as usize,
                    map_y(y0).round().max(0.0) as usize,
                    x1.round() as usize,
                    map_y(y1).round().max(0.0) as usize,
                    line_color,
                );
            }
        }
    }

    buffer
}

/// Project a data-space coordinate into pixel space (row 0 at the top)
fn project(
    visual: &VisualObject,
    x: f64,
    y: f64,
    width: usize,
    height: usize,
) -> (usize, usize) {
    let ext = visual.extent;
    let x_span = if (ext.x1 - ext.x0).abs() > f64::EPSILON {
        ext.x1 - ext.x0
    } else {
        1.0
    };
    let (y_lo, y_hi) = if ext.y1 >= ext.y0 {
        (ext.y0, ext.y1)
    } else {
        (ext.y1, ext.y0)
    };
    let y_span = if (y_hi - y_lo).abs() > f64::EPSILON {
        y_hi - y_lo
    } else {
        1.0
    };

    let tx = ((x - ext.x0) / x_span).clamp(0.0, 1.0);
    let ty = ((y - y_lo) / y_span).clamp(0.0, 1.0);

    let px = (tx * (width.saturating_sub(1)) as f64).round() as usize;
    // Pixel rows grow downward
    let py = ((1.0 - ty) * (height.saturating_sub(1)) as f64).round() as usize;
    (px, py)
}

/// Draw a line segment with a simple DDA walk
fn draw_segment(
    buffer: &mut RgbaBuffer,
    x0: usize,
    y0: usize,
    x1: usize,
    y1: usize,
    color: Color,
) {
    let (x0, y0, x1, y1) = (x0 as f32, y0 as f32, x1 as f32, y1 as f32);
    let steps = (x1 - x0).abs().max((y1 - y0).abs()).ceil().max(1.0) as usize;
    for i in 0..=steps {
        let t = i as f32 / steps as f32;
        let x = x0 + (x1 - x0) * t;
        let y = y0 + (y1 - y0) * t;
        buffer.set(x.round() as usize, y.round() as usize, color);
    }
}
