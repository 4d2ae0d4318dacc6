//! Centralized error handling for GridViews
//!
//! This module provides structured error types covering the whole pipeline:
//! loading a grid, binding its dimensions, mapping to visuals and composing
//! the results.

use std::fmt;
use std::path::PathBuf;

/// Main error type for GridViews operations
#[derive(Debug)]
pub enum GridViewsError {
    /// Input file does not exist on disk
    FileNotFound { path: PathBuf },

    /// File exists but is not a recognized gridded format
    FormatError { path: PathBuf, message: String },

    /// NetCDF file operation errors
    NetCDFError(netcdf::Error),

    /// A declared key or value dimension is absent from the grid's axes
    DimensionMismatch { name: String, available: Vec<String> },

    /// The chosen visual kind cannot represent the requested axis mapping
    UnsupportedVisualKind { kind: String, message: String },

    /// Overlaid visuals carry differing coordinate reference systems
    MismatchedAxes { left: String, right: String },

    /// Variable not found in the file
    VariableNotFound { var: String },

    /// Reduction or summary computation errors
    ReductionError(String),

    /// I/O operation errors
    IoError(std::io::Error),

    /// Array shape or dimension error
    ArrayError(ndarray::ShapeError),

    /// Thread pool configuration error
    ThreadPoolError(String),

    /// Generic error
    Generic(String),
}

impl fmt::Display for GridViewsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridViewsError::FileNotFound { path } => {
                write!(f, "File not found: {}", path.display())
            }
            GridViewsError::FormatError { path, message } => {
                write!(
                    f,
                    "Not a recognized gridded format: {} ({})",
                    path.display(),
                    message
                )
            }
            GridViewsError::NetCDFError(e) => write!(f, "NetCDF error: {}", e),
            GridViewsError::DimensionMismatch { name, available } => {
                write!(
                    f,
                    "Dimension '{}' not present in grid axes [{}]",
                    name,
                    available.join(", ")
                )
            }
            GridViewsError::UnsupportedVisualKind { kind, message } => {
                write!(
                    f,
                    "Visual kind '{}' cannot represent this mapping: {}",
                    kind, message
                )
            }
            GridViewsError::MismatchedAxes { left, right } => {
                write!(
                    f,
                    "Overlaid visuals use differing coordinate systems: '{}' vs '{}'",
                    left, right
                )
            }
            GridViewsError::VariableNotFound { var } => {
                write!(f, "Variable '{}' not found in file", var)
            }
            GridViewsError::ReductionError(msg) => write!(f, "Reduction error: {}", msg),
            GridViewsError::IoError(e) => write!(f, "I/O error: {}", e),
            GridViewsError::ArrayError(e) => write!(f, "Array error: {}", e),
            GridViewsError::ThreadPoolError(msg) => write!(f, "Thread pool error: {}", msg),
            GridViewsError::Generic(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for GridViewsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GridViewsError::NetCDFError(e) => Some(e),
            GridViewsError::IoError(e) => Some(e),
            GridViewsError::ArrayError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<netcdf::Error> for GridViewsError {
    fn from(error: netcdf::Error) -> Self {
        GridViewsError::NetCDFError(error)
    }
}

impl From<std::io::Error> for GridViewsError {
    fn from(error: std::io::Error) -> Self {
        GridViewsError::IoError(error)
    }
}

impl From<ndarray::ShapeError> for GridViewsError {
    fn from(error: ndarray::ShapeError) -> Self {
        GridViewsError::ArrayError(error)
    }
}

impl From<String> for GridViewsError {
    fn from(error: String) -> Self {
        GridViewsError::Generic(error)
    }
}

impl From<&str> for GridViewsError {
    fn from(error: &str) -> Self {
        GridViewsError::Generic(error.to_string())
    }
}

/// Result type alias for GridViews operations
pub type Result<T> = std::result::Result<T, GridViewsError>;
