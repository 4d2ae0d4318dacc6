//! Entry point for the GridViews application.
//! Handles CLI parsing, file loading, and dispatches operations like
//! inspecting file structure or rendering a variable to PNG frames.

use clap::Parser;
use std::fs;
use std::path::Path;

use gridviews::cli::Args;
use gridviews::compose::Layout;
use gridviews::dataset::{BoundDataset, Crs};
use gridviews::errors::{GridViewsError, Result};
use gridviews::loader::{CfCubeSource, GridSource, NetcdfSource};
use gridviews::metadata::{describe_variable, print_structure};
use gridviews::parallel::{get_parallel_info, ParallelConfig};
use gridviews::reduce::StatOperation;
use gridviews::visual::raster::{
    rasterize_frames, Colormap, Normalization, RenderOptions, RgbaBuffer,
};
use gridviews::visual::{FrameSequence, MapOptions, VisualKind};

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    println!(
        r#"
------------------------------------------------------------------
         _____      _     ___      ___
        / ____|    (_)   | | \    / (_)
       | |  __ _ __ _  __| |\ \  / / _  _____      _____
       | | |_ | '__| |/ _` | \ \/ / | |/ _ \ \ /\ / / __|
       | |__| | |  | | (_| |  \  /  | |  __/\ V  V /\__ \
        \_____|_|  |_|\__,_|   \/   |_|\___| \_/\_/ |___/
               Rust-based gridded data viewer
------------------------------------------------------------------
                        "#
    );

    ParallelConfig::new(args.threads).setup_global_pool()?;
    if args.verbose {
        get_parallel_info().print_info();
    }

    let source: Box<dyn GridSource> = if args.cube {
        Box::new(CfCubeSource::open(&args.file)?)
    } else {
        Box::new(NetcdfSource::open(&args.file)?)
    };
    println!("Successfully opened file: {}", args.file.display());

    if args.list_vars {
        print_structure(source.file())?;
        return Ok(());
    }

    if let Some(var) = &args.describe {
        describe_variable(source.file(), var)?;
        return Ok(());
    }

    if let Some(var) = &args.summary {
        let grid = source.load(var)?;
        let summary = grid.summary()?;
        println!("\n Summary for variable: {}", var);
        println!("================================");
        println!("   Min: {}", summary.min);
        println!("   Max: {}", summary.max);
        println!("   Mean: {:.2}", summary.mean);
        println!("   Std Dev: {:.2}", summary.std_dev);
        println!("   Valid: {} / {}", summary.valid, summary.total);
        return Ok(());
    }

    if let Some(var) = &args.render {
        render_variable(&args, source.as_ref(), var)?;
        return Ok(());
    }

    // No operation requested; show what the file contains
    print_structure(source.file())?;
    Ok(())
}

/// Bind, map and rasterize one variable, writing PNG frames if requested
fn render_variable(args: &Args, source: &dyn GridSource, var_name: &str) -> Result<()> {
    let grid = source.load(var_name)?;
    let crs = match &args.crs {
        Some(name) => Some(Crs::parse(name)?),
        None => None,
    };

    let mut dataset = BoundDataset::from_grid(grid, crs);

    if let Some((dim, op)) = &args.collapse {
        let op = StatOperation::parse(op)?;
        println!("Collapsing dimension '{}' with {}", dim, op.as_str());
        dataset = dataset.collapse(dim, op)?;
    }

    if let Some((lo, hi)) = args.clim {
        let vdim = dataset.vdims()[0].clone();
        dataset.set_value_range(&vdim, lo, hi)?;
    }

    let kind = VisualKind::parse(&args.kind)?;
    let mapped = mapped_dims(args, &dataset, kind)?;
    let mapped_refs: Vec<&str> = mapped.iter().map(String::as_str).collect();

    let map_options = MapOptions {
        date_format: args.date_format.clone(),
    };
    let sequence = dataset.to_visual(kind, &mapped_refs, &map_options)?;

    println!(
        "Mapped '{}' as {} over [{}]: {} frame(s)",
        var_name,
        kind.as_str(),
        mapped.join(", "),
        sequence.len()
    );
    if !sequence.slider_dims().is_empty() {
        println!(
            "Slider dimension(s): [{}]",
            sequence.slider_dims().join(", ")
        );
    }

    let normalization = if args.per_frame {
        Normalization::PerFrame
    } else {
        match args.clim {
            Some((lo, hi)) => Normalization::FixedRange(lo, hi),
            None => Normalization::fixed_for(&sequence),
        }
    };

    let options = RenderOptions {
        colormap: Colormap::parse(&args.cmap)?,
        normalization,
        width: args.size.0,
        height: args.size.1,
        contour_bands: args.levels,
        ..Default::default()
    };

    match (&args.output, args.cols) {
        (Some(dir), Some(cols)) => {
            let sheet = layout_sheet(&sequence, cols, &options)?;
            fs::create_dir_all(dir)?;
            let path = dir.join("sheet.png");
            write_png(&sheet, &path)?;
            println!("Saved layout sheet to {}", path.display());
        }
        (Some(dir), None) => {
            let buffers = rasterize_frames(&sequence, &options)?;
            fs::create_dir_all(dir)?;
            for (i, buffer) in buffers.iter().enumerate() {
                let path = dir.join(format!("frame_{:04}.png", i));
                write_png(buffer, &path)?;
                if args.verbose {
                    println!(
                        "  frame {:>4}  {}  -> {}",
                        i,
                        sequence[i].key_label,
                        path.display()
                    );
                }
            }
            println!("Saved {} frame(s) to {}", buffers.len(), dir.display());
        }
        (None, _) => {
            for (i, frame) in sequence.iter().enumerate() {
                let range = frame
                    .value_range
                    .map(|(lo, hi)| format!("{:.2}..{:.2}", lo, hi))
                    .unwrap_or_else(|| "no finite values".to_string());
                println!("  frame {:>4}  [{}]  values {}", i, frame.key_label, range);
            }
            println!("No --output directory given; nothing written.");
        }
    }

    Ok(())
}

/// Pick the mapped key dimensions: explicit flags first, otherwise the
/// trailing grid axes (the usual lat/lon pair of a climate file).
fn mapped_dims(args: &Args, dataset: &BoundDataset, kind: VisualKind) -> Result<Vec<String>> {
    let axis_names = dataset.grid().axis_names();

    match kind {
        VisualKind::Curve => {
            let x = args
                .x_dim
                .clone()
                .or_else(|| axis_names.last().cloned())
                .ok_or_else(|| {
                    GridViewsError::Generic("Grid has no axes to map a curve over".into())
                })?;
            Ok(vec![x])
        }
        _ => {
            let x = args
                .x_dim
                .clone()
                .or_else(|| axis_names.last().cloned())
                .ok_or_else(|| {
                    GridViewsError::Generic("Grid has no axes to map onto x".into())
                })?;
            let y = args
                .y_dim
                .clone()
                .or_else(|| {
                    axis_names
                        .iter()
                        .rev()
                        .find(|name| **name != x)
                        .cloned()
                })
                .ok_or_else(|| {
                    GridViewsError::Generic("Grid has no second axis to map onto y".into())
                })?;
            Ok(vec![x, y])
        }
    }
}

/// Tile every frame of the sequence into one layout sheet
fn layout_sheet(
    sequence: &FrameSequence,
    cols: usize,
    options: &RenderOptions,
) -> Result<RgbaBuffer> {
    let mut layout = Layout::new().with_cols(cols);
    for frame in sequence {
        layout.push(frame.clone());
    }
    layout.rasterize(options)
}

fn write_png(buffer: &RgbaBuffer, path: &Path) -> Result<()> {
    let img = image::RgbaImage::from_raw(
        buffer.width as u32,
        buffer.height as u32,
        buffer.pixels.clone(),
    )
    .ok_or_else(|| GridViewsError::Generic("Pixel buffer does not match its size".into()))?;
    img.save(path)
        .map_err(|e| GridViewsError::Generic(format!("Failed to write {}: {}", path.display(), e)))
}
