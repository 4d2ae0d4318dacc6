//! GridViews: slider-driven visualization of gridded NetCDF datasets
//!
//! A Rust library for the load → bind → map → compose workflow over
//! multidimensional gridded data. GridViews opens a NetCDF file, classifies
//! its axes into key dimensions (coordinates to index by) and value
//! dimensions (quantities to visualize), projects the data onto one or two
//! visual axes, and hands every remaining key-dimension value to the display
//! layer as an ordered frame sequence, the thing a slider widget pages
//! through.
//!
//! ## Key Features
//!
//! - **Two loading backends**: a verbatim labeled-array view and a CF-aware
//!   cube view (decoded time axes, masked fill values) behind one trait
//! - **Pure binding**: key/value dimension classification with an optional
//!   coordinate-reference tag, validated against the file's own axes
//! - **Visual mapping**: images, filled contours, point markers and curves,
//!   one frame per unmapped key-dimension value
//! - **Composition**: overlays (`a * b`) and grid layouts (`a + b`)
//! - **Parallel Rasterization**: frame fan-out across the Rayon thread pool
//!
//! ## Module Organization
//!
//! - [`loader`]: file opening and the two grid-loading backends
//! - [`grid`]: the in-memory grid data model
//! - [`metadata`]: file structure inspection
//! - [`dataset`]: key/value dimension binding
//! - [`reduce`]: collapsing a grid over one axis
//! - [`visual`]: mapping onto visual objects, rasterization, contours
//! - [`compose`]: overlay and layout composition
//! - [`parallel`]: thread pool configuration
//! - [`errors`]: centralized error handling
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use gridviews::prelude::*;
//!
//! // Load a variable with its coordinate axes
//! let grid = NetcdfSource::open("tas_ensemble.nc")
//!     .and_then(|src| src.load("surface_temperature"))
//!     .unwrap();
//!
//! // Declare what indexes and what gets drawn
//! let dataset = BoundDataset::from_grid(grid, Some(Crs::PlateCarree));
//!
//! // Project onto longitude/latitude; every other key dimension
//! // (time, ensemble member, ...) becomes a slider
//! let frames = dataset
//!     .to_visual(VisualKind::Image, &["longitude", "latitude"], &MapOptions::default())
//!     .unwrap();
//!
//! // Rasterize the first frame for the display surface
//! let buffer = rasterize(&frames[0], &RenderOptions::default()).unwrap();
//! assert_eq!(buffer.pixels.len(), buffer.width * buffer.height * 4);
//! ```
//!
//! The library is designed around small, independently addressable stages:
//! an error in one leaves everything already computed untouched.

// Core modules
pub mod compose;
pub mod dataset;
pub mod errors;
pub mod grid;
pub mod loader;
pub mod metadata;
pub mod parallel;
pub mod reduce;
pub mod visual;

// CLI surface, used by the binary
pub mod cli;

// Direct re-exports for the public API
pub use compose::*;
pub use dataset::*;
pub use errors::*;
pub use grid::*;
pub use loader::*;
pub use metadata::*;
pub use parallel::*;
pub use reduce::*;
pub use visual::*;

// High-level convenience API
pub mod prelude {
    //! Commonly used imports for convenience
    pub use crate::compose::{Layout, Overlay};
    pub use crate::dataset::{BoundDataset, Crs};
    pub use crate::errors::{GridViewsError, Result};
    pub use crate::grid::{Axis, AxisValues, RawGrid};
    pub use crate::loader::{open_grid, CfCubeSource, GridSource, NetcdfSource};
    pub use crate::parallel::ParallelConfig;
    pub use crate::reduce::StatOperation;
    pub use crate::visual::raster::{
        rasterize, rasterize_frames, Colormap, Normalization, RenderOptions, RgbaBuffer,
    };
    pub use crate::visual::{FrameSequence, MapOptions, VisualKind, VisualObject};
}
