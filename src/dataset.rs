//! Binding a raw grid's axes into key and value dimensions
//!
//! A [`BoundDataset`] is a thin view over a [`RawGrid`] that declares which
//! axes index the data (key dimensions) and which quantity gets visualized
//! (value dimensions), with an optional coordinate-reference tag and group
//! label. Construction is pure: it validates names against the grid and
//! nothing else. The one permitted mutation afterwards is rebinding a value
//! dimension's color-scale range.

use crate::errors::{GridViewsError, Result};
use crate::grid::RawGrid;
use crate::reduce::{collapse_dimension, StatOperation};
use std::collections::HashMap;

/// Coordinate-reference-system tag for spatial axes.
///
/// Purely metadata: no reprojection happens in this crate. The tag travels
/// with every visual so the display layer (and overlay composition) can tell
/// mismatched coordinate systems apart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Crs {
    /// Equirectangular longitude/latitude
    PlateCarree,
    /// Web-map Mercator
    Mercator,
    /// Orthographic view centered on a longitude/latitude
    Orthographic { lon0: f64, lat0: f64 },
}

impl Crs {
    /// Stable name used for display and mismatch reporting
    pub fn name(&self) -> String {
        match self {
            Crs::PlateCarree => "PlateCarree".to_string(),
            Crs::Mercator => "Mercator".to_string(),
            Crs::Orthographic { lon0, lat0 } => {
                format!("Orthographic({:.1}, {:.1})", lon0, lat0)
            }
        }
    }

    /// Parse a CLI-facing CRS name
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "platecarree" | "plate_carree" => Ok(Crs::PlateCarree),
            "mercator" => Ok(Crs::Mercator),
            "orthographic" => Ok(Crs::Orthographic { lon0: 0.0, lat0: 0.0 }),
            other => Err(GridViewsError::Generic(format!(
                "Unknown coordinate reference system '{}' (expected platecarree, mercator or orthographic)",
                other
            ))),
        }
    }
}

/// A raw grid with its axes classified into key and value dimensions
#[derive(Debug, Clone)]
pub struct BoundDataset {
    grid: RawGrid,
    kdims: Vec<String>,
    vdims: Vec<String>,
    crs: Option<Crs>,
    group: Option<String>,
    value_ranges: HashMap<String, (f32, f32)>,
}

impl BoundDataset {
    /// Bind a grid with explicit key and value dimension lists.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` if a key dimension does not name an axis
    /// of the grid, or a value dimension does not name the grid's variable.
    pub fn new(
        grid: RawGrid,
        kdims: Vec<String>,
        vdims: Vec<String>,
        crs: Option<Crs>,
    ) -> Result<Self> {
        for kdim in &kdims {
            grid.require_axis_index(kdim)?;
        }
        for vdim in &vdims {
            if *vdim != grid.var_name {
                return Err(GridViewsError::DimensionMismatch {
                    name: vdim.clone(),
                    available: vec![grid.var_name.clone()],
                });
            }
        }

        Ok(Self {
            grid,
            kdims,
            vdims,
            crs,
            group: None,
            value_ranges: HashMap::new(),
        })
    }

    /// Bind a grid using all of its own axes as key dimensions and its
    /// variable as the single value dimension.
    pub fn from_grid(grid: RawGrid, crs: Option<Crs>) -> Self {
        let kdims = grid.axis_names();
        let vdims = vec![grid.var_name.clone()];
        Self {
            grid,
            kdims,
            vdims,
            crs,
            group: None,
            value_ranges: HashMap::new(),
        }
    }

    /// Attach a human-readable group label
    pub fn with_group<S: Into<String>>(mut self, group: S) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Rebind the color-scale limits used when rendering `vdim`.
    ///
    /// This is the only mutation a bound dataset permits; the underlying
    /// grid payload is never touched.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` for an unknown value dimension.
    pub fn set_value_range(&mut self, vdim: &str, lo: f32, hi: f32) -> Result<()> {
        if !self.vdims.iter().any(|v| v == vdim) {
            return Err(GridViewsError::DimensionMismatch {
                name: vdim.to_string(),
                available: self.vdims.clone(),
            });
        }
        self.value_ranges.insert(vdim.to_string(), (lo, hi));
        Ok(())
    }

    /// The declared color-scale range for `vdim`, if one was rebound
    pub fn value_range(&self, vdim: &str) -> Option<(f32, f32)> {
        self.value_ranges.get(vdim).copied()
    }

    /// Collapse one key dimension with a reduction, rebinding the survivors
    pub fn collapse(&self, dim: &str, op: StatOperation) -> Result<BoundDataset> {
        let collapsed = collapse_dimension(&self.grid, dim, op)?;
        let kdims: Vec<String> = self
            .kdims
            .iter()
            .filter(|k| k.as_str() != dim)
            .cloned()
            .collect();
        let vdims = vec![collapsed.var_name.clone()];
        let mut bound = BoundDataset::new(collapsed, kdims, vdims, self.crs)?;
        bound.group = self.group.clone();
        Ok(bound)
    }

    pub fn grid(&self) -> &RawGrid {
        &self.grid
    }

    pub fn kdims(&self) -> &[String] {
        &self.kdims
    }

    pub fn vdims(&self) -> &[String] {
        &self.vdims
    }

    pub fn crs(&self) -> Option<Crs> {
        self.crs
    }

    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }
}
