//! Dataset loading from NetCDF files
//!
//! Two alternative backends open the same file through one [`GridSource`]
//! trait:
//!
//! - [`NetcdfSource`] presents the labeled-array view: dimensions become axes
//!   verbatim, coordinate variables supply axis values, attributes pass
//!   through untouched.
//! - [`CfCubeSource`] presents the physical-science cube view: CF time units
//!   are decoded into UTC timestamps, `_FillValue` cells are masked to NaN,
//!   and `scale_factor`/`add_offset` packing is applied.
//!
//! Loading is a one-shot operation: the file handle is released as soon as
//! the [`RawGrid`] is materialized in memory.

use crate::errors::{GridViewsError, Result};
use crate::grid::{Axis, AxisValues, RawGrid};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use ndarray::ArrayD;
use netcdf::{AttributeValue, File};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// A backend that can enumerate and load gridded variables from a file
pub trait GridSource {
    /// Names of the data variables available for loading.
    ///
    /// Coordinate variables (1-D variables named after their own dimension)
    /// are not data variables and are excluded.
    fn list_variables(&self) -> Vec<String>;

    /// Materialize one variable and its coordinate axes as a [`RawGrid`]
    fn load(&self, var_name: &str) -> Result<RawGrid>;

    /// The underlying open file, for structure inspection
    fn file(&self) -> &File;
}

/// Open a NetCDF file, distinguishing a missing path from an unreadable file
fn open_file(path: &Path) -> Result<File> {
    if !path.exists() {
        return Err(GridViewsError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    netcdf::open(path).map_err(|e| GridViewsError::FormatError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Labeled-array backend: loads variables exactly as stored
pub struct NetcdfSource {
    path: PathBuf,
    file: File,
}

impl NetcdfSource {
    /// Open a file for loading.
    ///
    /// # Errors
    ///
    /// Returns `FileNotFound` if the path does not exist and `FormatError`
    /// if it is not a readable NetCDF file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = open_file(&path)?;
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl GridSource for NetcdfSource {
    fn list_variables(&self) -> Vec<String> {
        list_data_variables(&self.file)
    }

    fn load(&self, var_name: &str) -> Result<RawGrid> {
        load_grid(&self.file, var_name, false)
    }

    fn file(&self) -> &File {
        &self.file
    }
}

/// Cube backend: loads variables with CF metadata conventions applied
pub struct CfCubeSource {
    path: PathBuf,
    file: File,
}

impl CfCubeSource {
    /// Open a file for CF-aware loading.
    ///
    /// # Errors
    ///
    /// Returns `FileNotFound` if the path does not exist and `FormatError`
    /// if it is not a readable NetCDF file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = open_file(&path)?;
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl GridSource for CfCubeSource {
    fn list_variables(&self) -> Vec<String> {
        list_data_variables(&self.file)
    }

    fn load(&self, var_name: &str) -> Result<RawGrid> {
        load_grid(&self.file, var_name, true)
    }

    fn file(&self) -> &File {
        &self.file
    }
}

/// Convenience: open `path` with the labeled-array backend and load one variable
pub fn open_grid<P: AsRef<Path>>(path: P, var_name: &str) -> Result<RawGrid> {
    NetcdfSource::open(path)?.load(var_name)
}

fn list_data_variables(file: &File) -> Vec<String> {
    let mut names: Vec<String> = file
        .variables()
        .filter(|var| {
            let dims = var.dimensions();
            // A 1-D variable named after its dimension is a coordinate, not data
            !(dims.len() == 1 && dims[0].name() == var.name())
        })
        .map(|var| var.name().to_string())
        .collect();
    names.sort();
    names
}

/// Core load path shared by both backends
fn load_grid(file: &File, var_name: &str, cf_decode: bool) -> Result<RawGrid> {
    let var = file
        .variable(var_name)
        .ok_or_else(|| GridViewsError::VariableNotFound {
            var: var_name.to_string(),
        })?;

    let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
    let data_vec = var.get_values::<f32, _>(..)?;
    let mut data = ArrayD::from_shape_vec(shape, data_vec)?;

    if cf_decode {
        apply_cf_packing(&var, &mut data)?;
    }

    let mut axes = Vec::with_capacity(var.dimensions().len());
    for dim in var.dimensions().iter() {
        axes.push(load_axis(file, dim, cf_decode)?);
    }

    let mut attributes = HashMap::new();
    for attr in var.attributes() {
        if let Ok(value) = attr.value() {
            attributes.insert(attr.name().to_string(), attr_to_json(&value));
        }
    }

    let units = string_attribute(&var, "units");

    let grid = RawGrid {
        var_name: var_name.to_string(),
        data,
        axes,
        attributes,
        units,
    };
    grid.check_consistent()?;
    Ok(grid)
}

/// Build one axis from a dimension, pulling values from the coordinate
/// variable of the same name when present, otherwise synthesizing indices.
fn load_axis(file: &File, dim: &netcdf::Dimension, cf_decode: bool) -> Result<Axis> {
    let name = dim.name().to_string();
    let len = dim.len();

    let coord_var = file
        .variable(&name)
        .filter(|v| v.dimensions().len() == 1 && v.dimensions()[0].name() == name);

    let (values, units) = match coord_var {
        Some(cv) => {
            let raw: Vec<f64> = cv.get_values::<f64, _>(..)?;
            let units = string_attribute(&cv, "units");
            let values = if cf_decode {
                match units.as_deref().and_then(parse_cf_epoch) {
                    Some((seconds_per_unit, epoch)) => decode_time_axis(&raw, seconds_per_unit, epoch),
                    None => AxisValues::Numeric(raw),
                }
            } else {
                AxisValues::Numeric(raw)
            };
            (values, units)
        }
        None => {
            let indices: Vec<f64> = (0..len).map(|i| i as f64).collect();
            (AxisValues::Numeric(indices), None)
        }
    };

    Ok(Axis {
        name,
        values,
        units,
        is_unlimited: dim.is_unlimited(),
    })
}

/// Mask `_FillValue` cells to NaN and unpack `scale_factor`/`add_offset`
fn apply_cf_packing(var: &netcdf::Variable, data: &mut ArrayD<f32>) -> Result<()> {
    let fill_value = numeric_attribute(var, "_FillValue");
    let scale = numeric_attribute(var, "scale_factor");
    let offset = numeric_attribute(var, "add_offset");

    if fill_value.is_none() && scale.is_none() && offset.is_none() {
        return Ok(());
    }

    let scale = scale.unwrap_or(1.0);
    let offset = offset.unwrap_or(0.0);
    data.mapv_inplace(|x| {
        if let Some(fv) = fill_value {
            if x == fv {
                return f32::NAN;
            }
        }
        x * scale + offset
    });
    Ok(())
}

/// Parse a CF time-units string like "hours since 1990-01-01 00:00:00".
///
/// Returns seconds-per-unit and the epoch, or None if the string does not
/// follow the convention (callers then keep the axis numeric).
fn parse_cf_epoch(units: &str) -> Option<(f64, DateTime<Utc>)> {
    let mut parts = units.splitn(3, ' ');
    let unit = parts.next()?;
    if parts.next()? != "since" {
        return None;
    }
    let epoch_str = parts.next()?.trim();

    let seconds_per_unit = match unit {
        "seconds" | "second" => 1.0,
        "minutes" | "minute" => 60.0,
        "hours" | "hour" => 3600.0,
        "days" | "day" => 86400.0,
        _ => return None,
    };

    let naive = NaiveDateTime::parse_from_str(epoch_str, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(epoch_str, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(epoch_str, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })?;

    Some((seconds_per_unit, naive.and_utc()))
}

fn decode_time_axis(raw: &[f64], seconds_per_unit: f64, epoch: DateTime<Utc>) -> AxisValues {
    let mut times = Vec::with_capacity(raw.len());
    for &offset in raw {
        let seconds = offset * seconds_per_unit;
        match Duration::try_seconds(seconds.round() as i64) {
            Some(delta) => times.push(epoch + delta),
            // Offset overflows the representable range; keep the axis numeric
            None => return AxisValues::Numeric(raw.to_vec()),
        }
    }
    AxisValues::Time(times)
}

fn string_attribute(var: &netcdf::Variable, name: &str) -> Option<String> {
    let attr = var.attribute(name)?;
    match attr.value().ok()? {
        AttributeValue::Str(s) => Some(s),
        _ => None,
    }
}

fn numeric_attribute(var: &netcdf::Variable, name: &str) -> Option<f32> {
    let attr = var.attribute(name)?;
    match attr.value().ok()? {
        AttributeValue::Float(v) => Some(v),
        AttributeValue::Double(v) => Some(v as f32),
        AttributeValue::Int(v) => Some(v as f32),
        AttributeValue::Short(v) => Some(f32::from(v)),
        _ => None,
    }
}

/// Flatten a NetCDF attribute value into JSON for the grid's attribute map
fn attr_to_json(value: &AttributeValue) -> JsonValue {
    match value {
        AttributeValue::Str(s) => JsonValue::from(s.clone()),
        AttributeValue::Strs(ss) => JsonValue::from(ss.clone()),
        AttributeValue::Float(v) => JsonValue::from(*v),
        AttributeValue::Floats(vs) => JsonValue::from(vs.clone()),
        AttributeValue::Double(v) => JsonValue::from(*v),
        AttributeValue::Doubles(vs) => JsonValue::from(vs.clone()),
        AttributeValue::Int(v) => JsonValue::from(*v),
        AttributeValue::Ints(vs) => JsonValue::from(vs.clone()),
        AttributeValue::Short(v) => JsonValue::from(*v),
        AttributeValue::Shorts(vs) => JsonValue::from(vs.clone()),
        AttributeValue::Uchar(v) => JsonValue::from(*v),
        AttributeValue::Uchars(vs) => JsonValue::from(vs.clone()),
        AttributeValue::Ushort(v) => JsonValue::from(*v),
        AttributeValue::Ushorts(vs) => JsonValue::from(vs.clone()),
        AttributeValue::Uint(v) => JsonValue::from(*v),
        AttributeValue::Uints(vs) => JsonValue::from(vs.clone()),
        other => JsonValue::from(format!("{:?}", other)),
    }
}
