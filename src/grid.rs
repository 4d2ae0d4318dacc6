//! In-memory data model for loaded grids
//!
//! A [`RawGrid`] is the product of the loading stage: the full numeric payload
//! of one variable plus its named coordinate axes and attributes. It is
//! immutable once materialized; every later stage (binding, mapping,
//! composition) only builds views and derived objects on top of it.

use crate::errors::{GridViewsError, Result};
use chrono::{DateTime, Utc};
use ndarray::ArrayD;
use serde_json::Value as JsonValue;
use std::collections::HashMap;

/// Coordinate values along one axis.
///
/// Time axes keep decoded UTC timestamps so tick labels can be formatted with
/// a date format string; everything else stays numeric.
#[derive(Debug, Clone, PartialEq)]
pub enum AxisValues {
    Numeric(Vec<f64>),
    Time(Vec<DateTime<Utc>>),
}

impl AxisValues {
    /// Number of distinct coordinate values along the axis
    pub fn len(&self) -> usize {
        match self {
            AxisValues::Numeric(v) => v.len(),
            AxisValues::Time(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Coordinate value at `idx` as a plain number.
    ///
    /// Time values map to Unix seconds so extents and curve abscissas stay
    /// monotone regardless of axis type.
    pub fn numeric_at(&self, idx: usize) -> Option<f64> {
        match self {
            AxisValues::Numeric(v) => v.get(idx).copied(),
            AxisValues::Time(v) => v.get(idx).map(|t| t.timestamp() as f64),
        }
    }

    /// Human-readable label for the coordinate value at `idx`.
    ///
    /// `date_format` is a chrono format string applied to time axes only;
    /// numeric values print whole when integral, otherwise with two decimals.
    pub fn label_at(&self, idx: usize, date_format: &str) -> String {
        match self {
            AxisValues::Numeric(v) => match v.get(idx) {
                Some(x) if x.fract().abs() < 1e-9 => format!("{:.0}", x),
                Some(x) => format!("{:.2}", x),
                None => String::from("?"),
            },
            AxisValues::Time(v) => match v.get(idx) {
                Some(t) => t.format(date_format).to_string(),
                None => String::from("?"),
            },
        }
    }

    /// First and last coordinate values as numbers, for extent computation
    pub fn bounds(&self) -> Option<(f64, f64)> {
        if self.is_empty() {
            return None;
        }
        Some((self.numeric_at(0)?, self.numeric_at(self.len() - 1)?))
    }
}

/// A named coordinate axis of a grid
#[derive(Debug, Clone)]
pub struct Axis {
    pub name: String,
    pub values: AxisValues,
    pub units: Option<String>,
    pub is_unlimited: bool,
}

impl Axis {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Quick statistics over the finite values of a grid
#[derive(Debug, Clone, Copy)]
pub struct GridSummary {
    pub min: f32,
    pub max: f32,
    pub mean: f32,
    pub std_dev: f32,
    pub valid: usize,
    pub total: usize,
}

/// A fully materialized n-dimensional grid: one variable's payload plus its
/// coordinate axes and attributes. Owned by the loading stage; never mutated.
#[derive(Debug, Clone)]
pub struct RawGrid {
    pub var_name: String,
    pub data: ArrayD<f32>,
    pub axes: Vec<Axis>,
    pub attributes: HashMap<String, JsonValue>,
    pub units: Option<String>,
}

impl RawGrid {
    /// Names of all coordinate axes, in payload order
    pub fn axis_names(&self) -> Vec<String> {
        self.axes.iter().map(|a| a.name.clone()).collect()
    }

    /// Look up an axis by name
    pub fn axis(&self, name: &str) -> Option<&Axis> {
        self.axes.iter().find(|a| a.name == name)
    }

    /// Position of a named axis within the payload shape
    pub fn axis_index(&self, name: &str) -> Option<usize> {
        self.axes.iter().position(|a| a.name == name)
    }

    /// Payload shape, in axis order
    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    /// Resolve an axis name or fail with the binder's error kind
    pub(crate) fn require_axis_index(&self, name: &str) -> Result<usize> {
        self.axis_index(name)
            .ok_or_else(|| GridViewsError::DimensionMismatch {
                name: name.to_string(),
                available: self.axis_names(),
            })
    }

    /// Resolve an axis by name or fail with the binder's error kind
    pub(crate) fn require_axis(&self, name: &str) -> Result<&Axis> {
        self.axis(name)
            .ok_or_else(|| GridViewsError::DimensionMismatch {
                name: name.to_string(),
                available: self.axis_names(),
            })
    }

    /// Minimum and maximum over finite values, if any exist
    pub fn value_range(&self) -> Option<(f32, f32)> {
        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        let mut seen = false;
        for &x in self.data.iter() {
            if x.is_finite() {
                min = min.min(x);
                max = max.max(x);
                seen = true;
            }
        }
        if seen {
            Some((min, max))
        } else {
            None
        }
    }

    /// Computes quick statistics (min/mean/max/std) over the finite values
    pub fn summary(&self) -> Result<GridSummary> {
        let total = self.data.len();
        let valid: Vec<f64> = self
            .data
            .iter()
            .filter(|x| x.is_finite())
            .map(|&x| f64::from(x))
            .collect();

        if valid.is_empty() {
            return Err(GridViewsError::ReductionError(format!(
                "Variable '{}' contains no finite values",
                self.var_name
            )));
        }

        let min = valid.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = valid.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let mean = valid.iter().sum::<f64>() / valid.len() as f64;
        let std_dev =
            (valid.iter().map(|&x| (x - mean).powi(2)).sum::<f64>() / valid.len() as f64).sqrt();

        #[allow(clippy::cast_possible_truncation)]
        let summary = GridSummary {
            min: min as f32,
            max: max as f32,
            mean: mean as f32,
            std_dev: std_dev as f32,
            valid: valid.len(),
            total,
        };
        Ok(summary)
    }

    /// Verify the payload shape matches the axis lengths
    pub(crate) fn check_consistent(&self) -> Result<()> {
        let axis_shape: Vec<usize> = self.axes.iter().map(Axis::len).collect();
        if axis_shape != self.shape() {
            return Err(GridViewsError::Generic(format!(
                "Axis lengths {:?} do not match payload shape {:?} for '{}'",
                axis_shape,
                self.shape(),
                self.var_name
            )));
        }
        Ok(())
    }
}
