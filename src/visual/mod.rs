//! Mapping bound datasets onto renderable visual objects
//!
//! The mapper takes a [`BoundDataset`], a [`VisualKind`] and the subset of
//! key dimensions to place on the visual axes, and produces one
//! [`VisualObject`] per combination of the remaining key-dimension values.
//! With one unmapped key dimension the result is the sliderable
//! [`FrameSequence`] an interactive display layer pages through.
//!
//! # Organization
//!
//! - [`raster`]: colormaps, normalization and RGBA rasterization
//! - [`contour`]: contour level generation and segment extraction

pub mod contour;
pub mod raster;

use crate::dataset::{BoundDataset, Crs};
use crate::errors::{GridViewsError, Result};
use ndarray::{Array2, Axis as NdAxis};

/// The renderable kinds a bound dataset can be projected into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisualKind {
    /// Color-mapped image over two key dimensions
    Image,
    /// Filled contour bands over two key dimensions
    FilledContour,
    /// Point markers at the grid's coordinate lattice
    Points,
    /// Line curve over a single key dimension
    Curve,
}

impl VisualKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::FilledContour => "filled_contour",
            Self::Points => "points",
            Self::Curve => "curve",
        }
    }

    /// Number of key dimensions this kind maps onto visual axes
    const fn mapped_arity(self) -> usize {
        match self {
            Self::Image | Self::FilledContour | Self::Points => 2,
            Self::Curve => 1,
        }
    }

    /// Parse a CLI-facing kind name
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "image" => Ok(Self::Image),
            "contour" | "filled_contour" => Ok(Self::FilledContour),
            "points" => Ok(Self::Points),
            "curve" => Ok(Self::Curve),
            other => Err(GridViewsError::UnsupportedVisualKind {
                kind: other.to_string(),
                message: "expected image, contour, points or curve".to_string(),
            }),
        }
    }
}

/// One point of a scatter frame: x, y, value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScatterPoint {
    pub x: f64,
    pub y: f64,
    pub value: f32,
}

/// Frame payload, shaped by the visual kind
#[derive(Debug, Clone)]
pub enum FrameData {
    /// Row-major [y, x] grid for images and filled contours
    Grid(Array2<f32>),
    /// Coordinate lattice with values for point markers
    Scatter(Vec<ScatterPoint>),
    /// (x, value) pairs for curves
    Series(Vec<(f64, f32)>),
}

/// Spatial extent of a frame: left, bottom, right, top
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

/// A single rendering of a bound dataset for one combination of unmapped
/// key-dimension values. Ephemeral: recomputed on demand, never persisted.
#[derive(Debug, Clone)]
pub struct VisualObject {
    pub kind: VisualKind,
    pub xdim: String,
    pub ydim: Option<String>,
    pub vdim: String,
    pub data: FrameData,
    pub extent: Extent,
    /// Finite min/max of this frame's own values
    pub value_range: Option<(f32, f32)>,
    pub crs: Option<Crs>,
    /// Formatted unmapped-key values, e.g. "time: 1990-01-16 12:00"
    pub key_label: String,
}

impl VisualObject {
    /// Finite min/max of the frame payload
    fn compute_value_range(data: &FrameData) -> Option<(f32, f32)> {
        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        let mut seen = false;
        let mut feed = |x: f32| {
            if x.is_finite() {
                min = min.min(x);
                max = max.max(x);
                seen = true;
            }
        };
        match data {
            FrameData::Grid(g) => g.iter().for_each(|&x| feed(x)),
            FrameData::Scatter(pts) => pts.iter().for_each(|p| feed(p.value)),
            FrameData::Series(pts) => pts.iter().for_each(|&(_, v)| feed(v)),
        }
        if seen {
            Some((min, max))
        } else {
            None
        }
    }
}

/// Options for the mapping stage
#[derive(Debug, Clone)]
pub struct MapOptions {
    /// chrono format string for time-typed key labels
    pub date_format: String,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            date_format: "%Y-%m-%d %H:%M".to_string(),
        }
    }
}

/// An ordered, finite, restartable sequence of frames keyed by the unmapped
/// key dimensions. With a single unmapped dimension this is exactly the
/// value set a slider widget walks.
#[derive(Debug, Clone)]
pub struct FrameSequence {
    slider_dims: Vec<String>,
    frames: Vec<VisualObject>,
    /// Color-scale limits rebound on the dataset, if any
    declared_range: Option<(f32, f32)>,
}

impl FrameSequence {
    /// The unmapped key dimensions, in binding order
    pub fn slider_dims(&self) -> &[String] {
        &self.slider_dims
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&VisualObject> {
        self.frames.get(index)
    }

    /// Restartable iteration over the frames in key order
    pub fn iter(&self) -> std::slice::Iter<'_, VisualObject> {
        self.frames.iter()
    }

    /// Formatted key label of every frame, in order
    pub fn frame_labels(&self) -> Vec<&str> {
        self.frames.iter().map(|f| f.key_label.as_str()).collect()
    }

    /// Finite min/max across every frame in the sequence
    pub fn sequence_range(&self) -> Option<(f32, f32)> {
        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        let mut seen = false;
        for frame in &self.frames {
            if let Some((lo, hi)) = frame.value_range {
                min = min.min(lo);
                max = max.max(hi);
                seen = true;
            }
        }
        if seen {
            Some((min, max))
        } else {
            None
        }
    }

    /// The range rebound on the source dataset via `set_value_range`, if any
    pub fn declared_range(&self) -> Option<(f32, f32)> {
        self.declared_range
    }
}

impl std::ops::Index<usize> for FrameSequence {
    type Output = VisualObject;

    fn index(&self, index: usize) -> &VisualObject {
        &self.frames[index]
    }
}

impl<'a> IntoIterator for &'a FrameSequence {
    type Item = &'a VisualObject;
    type IntoIter = std::slice::Iter<'a, VisualObject>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl BoundDataset {
    /// Project this dataset onto visual axes.
    ///
    /// `mapped_dims` are the key dimensions placed on the visual axes (x,
    /// then y); every other key dimension becomes a slider dimension and
    /// contributes one frame per coordinate value.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` if a mapped name is not a bound key
    /// dimension, and `UnsupportedVisualKind` if the kind cannot represent
    /// the requested mapping (wrong axis count, no value dimension, or
    /// duplicate axes).
    pub fn to_visual(
        &self,
        kind: VisualKind,
        mapped_dims: &[&str],
        options: &MapOptions,
    ) -> Result<FrameSequence> {
        for dim in mapped_dims {
            if !self.kdims().iter().any(|k| k == dim) {
                return Err(GridViewsError::DimensionMismatch {
                    name: (*dim).to_string(),
                    available: self.kdims().to_vec(),
                });
            }
        }

        if self.vdims().is_empty() {
            return Err(GridViewsError::UnsupportedVisualKind {
                kind: kind.as_str().to_string(),
                message: "no value dimension to visualize".to_string(),
            });
        }
        if mapped_dims.len() != kind.mapped_arity() {
            return Err(GridViewsError::UnsupportedVisualKind {
                kind: kind.as_str().to_string(),
                message: format!(
                    "expected {} mapped key dimension(s), got {}",
                    kind.mapped_arity(),
                    mapped_dims.len()
                ),
            });
        }
        if mapped_dims.len() == 2 && mapped_dims[0] == mapped_dims[1] {
            return Err(GridViewsError::UnsupportedVisualKind {
                kind: kind.as_str().to_string(),
                message: format!("axis '{}' mapped twice", mapped_dims[0]),
            });
        }

        let grid = self.grid();
        let vdim = self.vdims()[0].clone();

        // Every payload axis must be accounted for, either on a visual axis
        // or as a slider; an unbound axis cannot be projected away.
        for axis in &grid.axes {
            if !self.kdims().iter().any(|k| *k == axis.name) {
                return Err(GridViewsError::UnsupportedVisualKind {
                    kind: kind.as_str().to_string(),
                    message: format!("grid axis '{}' is not bound as a key dimension", axis.name),
                });
            }
        }

        // Slider dimensions: every grid axis that is a bound kdim but not
        // mapped onto a visual axis, in payload order.
        let slider_dims: Vec<String> = grid
            .axis_names()
            .into_iter()
            .filter(|name| {
                self.kdims().iter().any(|k| k == name)
                    && !mapped_dims.iter().any(|m| m == name)
            })
            .collect();

        let slider_lens: Vec<usize> = slider_dims
            .iter()
            .map(|name| grid.axis(name).map(|a| a.len()).unwrap_or(0))
            .collect();

        let combinations = cartesian_product(&slider_lens);
        let mut frames = Vec::with_capacity(combinations.len());

        for combo in &combinations {
            let frame = self.build_frame(kind, mapped_dims, &slider_dims, combo, &vdim, options)?;
            frames.push(frame);
        }

        Ok(FrameSequence {
            slider_dims,
            frames,
            declared_range: self.value_range(&vdim),
        })
    }

    /// Slice out one frame's payload and wrap it as a visual object
    fn build_frame(
        &self,
        kind: VisualKind,
        mapped_dims: &[&str],
        slider_dims: &[String],
        combo: &[usize],
        vdim: &str,
        options: &MapOptions,
    ) -> Result<VisualObject> {
        let grid = self.grid();

        // Fix the slider axes one by one, highest payload axis first so the
        // remaining indices stay valid as axes drop out.
        let mut fixed: Vec<(usize, usize)> = Vec::with_capacity(slider_dims.len());
        for (name, &idx) in slider_dims.iter().zip(combo.iter()) {
            fixed.push((grid.require_axis_index(name)?, idx));
        }
        fixed.sort_by(|a, b| b.0.cmp(&a.0));

        let mut view = grid.data.view();
        for &(axis_pos, idx) in &fixed {
            view = view.index_axis_move(NdAxis(axis_pos), idx);
        }

        // Remaining axes of the view, in original payload order
        let remaining: Vec<&str> = grid
            .axes
            .iter()
            .filter_map(|axis| {
                mapped_dims
                    .iter()
                    .find(|m| **m == axis.name.as_str())
                    .copied()
            })
            .collect();

        let mut key_parts = Vec::with_capacity(slider_dims.len());
        for (name, &idx) in slider_dims.iter().zip(combo.iter()) {
            let axis = grid.require_axis(name)?;
            key_parts.push(format!(
                "{}: {}",
                name,
                axis.values.label_at(idx, &options.date_format)
            ));
        }
        let key_label = key_parts.join(", ");

        let (data, extent, xdim, ydim) = match kind {
            VisualKind::Curve => {
                let xdim = mapped_dims[0];
                let series_view = view
                    .into_dimensionality::<ndarray::Ix1>()
                    .map_err(GridViewsError::ArrayError)?;
                let axis = grid.require_axis(xdim)?;
                let series: Vec<(f64, f32)> = series_view
                    .iter()
                    .enumerate()
                    .map(|(i, &v)| (axis.values.numeric_at(i).unwrap_or(i as f64), v))
                    .collect();
                let (x0, x1) = axis.values.bounds().unwrap_or((0.0, 0.0));
                let (lo, hi) = VisualObject::compute_value_range(&FrameData::Series(series.clone()))
                    .unwrap_or((0.0, 0.0));
                let extent = Extent {
                    x0,
                    y0: f64::from(lo),
                    x1,
                    y1: f64::from(hi),
                };
                (FrameData::Series(series), extent, xdim.to_string(), None)
            }
            VisualKind::Image | VisualKind::FilledContour | VisualKind::Points => {
                let xdim = mapped_dims[0];
                let ydim = mapped_dims[1];
                let plane = view
                    .into_dimensionality::<ndarray::Ix2>()
                    .map_err(GridViewsError::ArrayError)?;

                // The 2-D view keeps payload order; arrange rows as y, columns as x
                let plane: Array2<f32> = if remaining.first() == Some(&xdim) {
                    plane.t().to_owned()
                } else {
                    plane.to_owned()
                };

                let x_axis = grid.require_axis(xdim)?;
                let y_axis = grid.require_axis(ydim)?;
                let (x0, x1) = x_axis.values.bounds().unwrap_or((0.0, 0.0));
                let (y0, y1) = y_axis.values.bounds().unwrap_or((0.0, 0.0));
                let extent = Extent { x0, y0, x1, y1 };

                let data = if kind == VisualKind::Points {
                    let mut points = Vec::new();
                    for (yi, row) in plane.outer_iter().enumerate() {
                        for (xi, &value) in row.iter().enumerate() {
                            if value.is_finite() {
                                points.push(ScatterPoint {
                                    x: x_axis.values.numeric_at(xi).unwrap_or(xi as f64),
                                    y: y_axis.values.numeric_at(yi).unwrap_or(yi as f64),
                                    value,
                                });
                            }
                        }
                    }
                    FrameData::Scatter(points)
                } else {
                    FrameData::Grid(plane)
                };

                (data, extent, xdim.to_string(), Some(ydim.to_string()))
            }
        };

        let value_range = VisualObject::compute_value_range(&data);

        Ok(VisualObject {
            kind,
            xdim,
            ydim,
            vdim: vdim.to_string(),
            data,
            extent,
            value_range,
            crs: self.crs(),
            key_label,
        })
    }
}

/// Row-major cartesian product of index ranges; one empty combination when
/// no slider dimension remains (a single frame).
fn cartesian_product(lens: &[usize]) -> Vec<Vec<usize>> {
    let mut combos: Vec<Vec<usize>> = vec![Vec::new()];
    for &len in lens {
        let mut next = Vec::with_capacity(combos.len() * len.max(1));
        for combo in &combos {
            for i in 0..len {
                let mut c = combo.clone();
                c.push(i);
                next.push(c);
            }
        }
        combos = next;
    }
    combos
}
