//! Defines command-line interface options using `clap` for the GridViews application.

use clap::Parser;
use std::path::PathBuf;

/// A CLI tool for inspecting and rendering gridded NetCDF files
#[derive(Parser, Debug)]
#[command(
    version = "0.3.0",
    name = "GridViews",
    about = "App for rendering gridded NetCDF datasets as slider-driven map frames"
)]
pub struct Args {
    /// Path to the NetCDF file
    #[arg(short, long)]
    pub file: PathBuf,

    /// Render a variable to PNG frames, one per slider value
    #[arg(long)]
    pub render: Option<String>,

    /// Visual kind: image, contour, points or curve
    #[arg(long, default_value = "image")]
    pub kind: String,

    /// Key dimension mapped to the x axis (defaults to the last grid axis)
    #[arg(short = 'x', long)]
    pub x_dim: Option<String>,

    /// Key dimension mapped to the y axis (defaults to the second-to-last grid axis)
    #[arg(short = 'y', long)]
    pub y_dim: Option<String>,

    /// Collapse a dimension before rendering, formatted as <dim>:<op>
    #[arg(long, value_parser = parse_collapse_arg)]
    pub collapse: Option<(String, String)>,

    /// Colormap: viridis, plasma, coolwarm, greys or hsv
    #[arg(long, default_value = "viridis")]
    pub cmap: String,

    /// Fix the color-scale limits across all frames, formatted as <lo>:<hi>
    #[arg(long, value_parser = parse_clim_arg)]
    pub clim: Option<(f32, f32)>,

    /// Output frame size, formatted as <width>x<height>
    #[arg(long, value_parser = parse_size_arg, default_value = "640x480")]
    pub size: (usize, usize),

    /// Number of bands for filled contours
    #[arg(long, default_value_t = 10)]
    pub levels: usize,

    /// Normalize each frame to its own value range instead of the range
    /// shared across the whole sequence
    #[arg(long, default_value_t = false)]
    pub per_frame: bool,

    /// Coordinate reference tag: platecarree, mercator or orthographic
    #[arg(long)]
    pub crs: Option<String>,

    /// Load through the CF cube backend (decodes time axes and fill values)
    #[arg(long, default_value_t = false)]
    pub cube: bool,

    /// chrono format string for time-typed axis labels
    #[arg(long, default_value = "%Y-%m-%d %H:%M")]
    pub date_format: String,

    /// Directory to write rendered frames into. If not set, frames are
    /// counted but not written.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Tile all frames into one layout sheet with this many columns
    /// instead of writing individual frame files
    #[arg(long)]
    pub cols: Option<usize>,

    /// List coordinate axes and data variables in the file
    #[arg(long)]
    pub list_vars: bool,

    /// Describe a specific variable (data type, shape, and attributes)
    #[arg(long)]
    pub describe: Option<String>,

    /// Compute quick statistics (min/mean/max/std) for a variable
    #[arg(long)]
    pub summary: Option<String>,

    /// Number of threads to use for parallel frame rendering. Defaults to
    /// the number of CPU cores.
    #[arg(short = 't', long)]
    pub threads: Option<usize>,

    /// Enable verbose output.
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

fn parse_collapse_arg(s: &str) -> Result<(String, String), String> {
    let parts: Vec<&str> = s.split(':').collect();
    match parts.as_slice() {
        [dim, op] => Ok((dim.to_string(), op.to_string())),
        _ => Err("Invalid format: Expected '<dimension>:<operation>'.".to_string()),
    }
}

fn parse_clim_arg(s: &str) -> Result<(f32, f32), String> {
    let parts: Vec<&str> = s.split(':').collect();
    match parts.as_slice() {
        [lo, hi] => {
            let lo = lo
                .parse::<f32>()
                .map_err(|_| "Invalid lower color limit".to_string())?;
            let hi = hi
                .parse::<f32>()
                .map_err(|_| "Invalid upper color limit".to_string())?;
            if hi <= lo {
                return Err("Upper color limit must exceed the lower".to_string());
            }
            Ok((lo, hi))
        }
        _ => Err("Invalid format: Expected '<lo>:<hi>'.".to_string()),
    }
}

fn parse_size_arg(s: &str) -> Result<(usize, usize), String> {
    let parts: Vec<&str> = s.split('x').collect();
    match parts.as_slice() {
        [w, h] => {
            let w = w
                .parse::<usize>()
                .map_err(|_| "Invalid width".to_string())?;
            let h = h
                .parse::<usize>()
                .map_err(|_| "Invalid height".to_string())?;
            if w == 0 || h == 0 {
                return Err("Size must be positive".to_string());
            }
            Ok((w, h))
        }
        _ => Err("Invalid format: Expected '<width>x<height>'.".to_string()),
    }
}
