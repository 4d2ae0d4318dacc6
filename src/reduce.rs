//! Collapsing a grid over one named axis
//!
//! The cube-style workflow often reduces a key dimension away before mapping
//! (a time mean, an ensemble maximum) and then binds the surviving axes.
//! Reductions skip NaN and infinite cells; a cell with no valid input at all
//! becomes NaN.

use crate::errors::{GridViewsError, Result};
use crate::grid::RawGrid;
use ndarray::{ArrayD, Axis as NdAxis};

/// Supported reduction operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatOperation {
    /// Arithmetic mean
    Mean,
    /// Sum of values
    Sum,
    /// Minimum value
    Min,
    /// Maximum value
    Max,
}

impl StatOperation {
    /// Get the string representation of the operation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mean => "mean",
            Self::Sum => "sum",
            Self::Min => "minimum",
            Self::Max => "maximum",
        }
    }

    /// Parse a CLI-facing operation name
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "mean" => Ok(Self::Mean),
            "sum" => Ok(Self::Sum),
            "min" => Ok(Self::Min),
            "max" => Ok(Self::Max),
            other => Err(GridViewsError::ReductionError(format!(
                "Unknown reduction operation '{}' (expected mean, sum, min or max)",
                other
            ))),
        }
    }
}

/// Collapse one named axis of a grid, keeping the remaining axes in order.
///
/// The result is a new grid named `<var>_<op>_over_<dim>`; attributes and
/// units carry over from the input.
///
/// # Errors
///
/// Returns `DimensionMismatch` if the axis is not present in the grid.
pub fn collapse_dimension(grid: &RawGrid, dim_name: &str, op: StatOperation) -> Result<RawGrid> {
    let axis_index = grid.require_axis_index(dim_name)?;
    let data = reduce_along_axis(&grid.data, axis_index, op)?;

    let axes = grid
        .axes
        .iter()
        .enumerate()
        .filter_map(|(i, axis)| if i == axis_index { None } else { Some(axis.clone()) })
        .collect();

    let collapsed = RawGrid {
        var_name: format!("{}_{}_over_{}", grid.var_name, op.as_str(), dim_name),
        data,
        axes,
        attributes: grid.attributes.clone(),
        units: grid.units.clone(),
    };
    collapsed.check_consistent()?;
    Ok(collapsed)
}

/// NaN-skipping reduction along one axis of the payload
fn reduce_along_axis(data: &ArrayD<f32>, axis: usize, op: StatOperation) -> Result<ArrayD<f32>> {
    if axis >= data.ndim() {
        return Err(GridViewsError::ReductionError(format!(
            "Axis {} is out of bounds for array with {} dimensions",
            axis,
            data.ndim()
        )));
    }
    if data.shape()[axis] == 0 {
        return Err(GridViewsError::ReductionError(format!(
            "Cannot reduce over empty axis {}",
            axis
        )));
    }

    let nd_axis = NdAxis(axis);
    let result = match op {
        StatOperation::Sum => data
            .fold_axis(nd_axis, 0.0_f32, |&acc, &x| if x.is_finite() { acc + x } else { acc })
            .into_dyn(),
        StatOperation::Min => {
            let folded = data.fold_axis(nd_axis, f32::INFINITY, |&acc, &x| {
                if x.is_finite() {
                    acc.min(x)
                } else {
                    acc
                }
            });
            // INFINITY survives only where no valid value was seen
            folded
                .mapv(|x| if x == f32::INFINITY { f32::NAN } else { x })
                .into_dyn()
        }
        StatOperation::Max => {
            let folded = data.fold_axis(nd_axis, f32::NEG_INFINITY, |&acc, &x| {
                if x.is_finite() {
                    acc.max(x)
                } else {
                    acc
                }
            });
            folded
                .mapv(|x| if x == f32::NEG_INFINITY { f32::NAN } else { x })
                .into_dyn()
        }
        StatOperation::Mean => {
            // Accumulate in f64 to avoid precision loss over long axes
            let sums = data.fold_axis(nd_axis, 0.0_f64, |&acc, &x| {
                if x.is_finite() {
                    acc + f64::from(x)
                } else {
                    acc
                }
            });
            let counts = data.fold_axis(nd_axis, 0_u32, |&acc, &x| {
                if x.is_finite() {
                    acc + 1
                } else {
                    acc
                }
            });
            let sums = sums.into_dyn();
            let counts = counts.into_dyn();
            #[allow(clippy::cast_possible_truncation)]
            let means = ndarray::Zip::from(&sums)
                .and(&counts)
                .map_collect(|&sum, &count| {
                    if count > 0 {
                        (sum / f64::from(count)) as f32
                    } else {
                        f32::NAN
                    }
                });
            means
        }
    };

    Ok(result)
}
