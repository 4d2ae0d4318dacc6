//! Comprehensive unit tests for GridViews modules
//!
//! These tests exercise the pipeline stage by stage: loading, binding,
//! mapping, rasterization and composition, each against small hand-written
//! NetCDF fixtures.

use gridviews::{
    compose::{Layout, Overlay},
    dataset::{BoundDataset, Crs},
    errors::{GridViewsError, Result},
    grid::AxisValues,
    loader::{open_grid, CfCubeSource, GridSource, NetcdfSource},
    parallel::{get_parallel_info, ParallelConfig},
    reduce::StatOperation,
    visual::raster::{rasterize, Normalization, RenderOptions},
    visual::{FrameData, MapOptions, VisualKind},
};
use ndarray::Array3;
use netcdf::create;
use std::io::Write;
use std::path::Path;
use tempfile::tempdir;

/// Create a small climate fixture: time=3, latitude=5, longitude=10, one
/// data variable `surface_temperature` with CF time units.
fn create_reference_file(path: &Path) {
    let mut file = create(path).expect("Failed to create NetCDF file");

    file.add_dimension("time", 3).unwrap();
    file.add_dimension("latitude", 5).unwrap();
    file.add_dimension("longitude", 10).unwrap();

    let mut time_var = file.add_variable::<f64>("time", &["time"]).unwrap();
    time_var
        .put_attribute("units", "hours since 1990-01-01 00:00:00")
        .unwrap();
    let times = ndarray::arr1(&[0.0_f64, 24.0, 48.0]);
    time_var.put(times.view(), ..).unwrap();

    let mut lat_var = file.add_variable::<f64>("latitude", &["latitude"]).unwrap();
    lat_var.put_attribute("units", "degrees_north").unwrap();
    let lats = ndarray::arr1(&[-60.0_f64, -30.0, 0.0, 30.0, 60.0]);
    lat_var.put(lats.view(), ..).unwrap();

    let mut lon_var = file
        .add_variable::<f64>("longitude", &["longitude"])
        .unwrap();
    lon_var.put_attribute("units", "degrees_east").unwrap();
    let lons: Vec<f64> = (0..10).map(|i| f64::from(i) * 36.0).collect();
    lon_var
        .put(ndarray::arr1(&lons).view(), ..)
        .unwrap();

    // value = 100*t + 10*lat_idx + lon_idx, unique per cell
    let values: Vec<f32> = (0..3)
        .flat_map(|t| {
            (0..5).flat_map(move |la| (0..10).map(move |lo| (100 * t + 10 * la + lo) as f32))
        })
        .collect();
    let mut var = file
        .add_variable::<f32>("surface_temperature", &["time", "latitude", "longitude"])
        .unwrap();
    var.put_attribute("units", "K").unwrap();
    var.put_attribute("long_name", "Surface Temperature").unwrap();
    let data = Array3::from_shape_vec((3, 5, 10), values).unwrap();
    var.put(data.view(), ..).unwrap();
}

#[test]
fn test_error_types() {
    let not_found = GridViewsError::FileNotFound {
        path: "missing.nc".into(),
    };
    assert!(format!("{}", not_found).contains("File not found"));

    let mismatch = GridViewsError::DimensionMismatch {
        name: "altitude".to_string(),
        available: vec!["time".to_string(), "latitude".to_string()],
    };
    let rendered = format!("{}", mismatch);
    assert!(rendered.contains("'altitude'"));
    assert!(rendered.contains("latitude"));

    let unsupported = GridViewsError::UnsupportedVisualKind {
        kind: "curve".to_string(),
        message: "two mapped axes".to_string(),
    };
    assert!(format!("{}", unsupported).contains("'curve'"));

    let axes = GridViewsError::MismatchedAxes {
        left: "PlateCarree".to_string(),
        right: "Mercator".to_string(),
    };
    assert!(format!("{}", axes).contains("differing coordinate systems"));
}

#[test]
fn test_parallel_config() {
    let default_config = ParallelConfig::default();
    assert!(default_config.num_threads.is_none());

    let config_4 = ParallelConfig::with_threads(4);
    assert_eq!(config_4.num_threads, Some(4));

    let all_cores = ParallelConfig::all_cores();
    assert!(all_cores.num_threads.unwrap() > 0);

    let info = get_parallel_info();
    assert!(info.current_threads > 0);
    assert!(info.available_cores > 0);
}

#[test]
fn test_stat_operation_parsing() {
    assert_eq!(StatOperation::parse("mean").unwrap(), StatOperation::Mean);
    assert_eq!(StatOperation::parse("max").unwrap(), StatOperation::Max);
    assert_eq!(StatOperation::Mean.as_str(), "mean");
    assert!(StatOperation::parse("median").is_err());
}

#[test]
fn test_axis_label_formatting() {
    let numeric = AxisValues::Numeric(vec![0.0, 36.0, 72.5]);
    assert_eq!(numeric.label_at(0, "%Y"), "0");
    assert_eq!(numeric.label_at(2, "%Y"), "72.50");
    assert_eq!(numeric.bounds(), Some((0.0, 72.5)));

    let times = AxisValues::Time(vec![
        chrono::DateTime::from_timestamp(0, 0).unwrap(),
        chrono::DateTime::from_timestamp(86_400, 0).unwrap(),
    ]);
    assert_eq!(times.label_at(0, "%Y-%m-%d"), "1970-01-01");
    assert_eq!(times.label_at(1, "%Y-%m-%d"), "1970-01-02");
}

#[test]
fn test_loader_missing_file_and_bad_format() {
    let temp_dir = tempdir().expect("Failed to create temp dir");

    let missing = temp_dir.path().join("missing.nc");
    match NetcdfSource::open(&missing) {
        Err(GridViewsError::FileNotFound { path }) => assert_eq!(path, missing),
        other => panic!("Expected FileNotFound, got {:?}", other.map(|_| ())),
    }

    let garbage = temp_dir.path().join("garbage.nc");
    {
        let mut f = std::fs::File::create(&garbage).unwrap();
        f.write_all(b"this is not a netcdf file").unwrap();
    }
    match NetcdfSource::open(&garbage) {
        Err(GridViewsError::FormatError { path, .. }) => assert_eq!(path, garbage),
        other => panic!("Expected FormatError, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_loader_axes_and_variable_listing() -> Result<()> {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let file_path = temp_dir.path().join("reference.nc");
    create_reference_file(&file_path);

    let source = NetcdfSource::open(&file_path)?;

    // Coordinate variables are not data variables
    assert_eq!(source.list_variables(), vec!["surface_temperature"]);

    let grid = source.load("surface_temperature")?;
    assert_eq!(grid.shape(), &[3, 5, 10]);
    assert_eq!(grid.axis_names(), vec!["time", "latitude", "longitude"]);
    assert_eq!(grid.units.as_deref(), Some("K"));

    // The raw backend keeps the time axis numeric
    let time_axis = grid.axis("time").unwrap();
    assert_eq!(time_axis.values, AxisValues::Numeric(vec![0.0, 24.0, 48.0]));

    // Coordinate values come from the coordinate variables
    let lat_axis = grid.axis("latitude").unwrap();
    assert_eq!(lat_axis.values.numeric_at(0), Some(-60.0));
    assert_eq!(lat_axis.units.as_deref(), Some("degrees_north"));

    // Attributes survive as JSON
    assert_eq!(
        grid.attributes.get("long_name").and_then(|v| v.as_str()),
        Some("Surface Temperature")
    );

    let result = source.load("sea_level_pressure");
    assert!(matches!(
        result,
        Err(GridViewsError::VariableNotFound { .. })
    ));

    Ok(())
}

#[test]
fn test_cf_backend_decodes_time_and_fill_values() -> Result<()> {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let file_path = temp_dir.path().join("cf.nc");

    {
        let mut file = create(&file_path)?;
        file.add_dimension("time", 2)?;
        file.add_dimension("x", 3)?;

        let mut time_var = file.add_variable::<f64>("time", &["time"])?;
        time_var.put_attribute("units", "days since 2000-01-01")?;
        time_var.put(ndarray::arr1(&[0.0_f64, 31.0]).view(), ..)?;

        let mut var = file.add_variable::<f32>("pressure", &["time", "x"])?;
        var.put_attribute("_FillValue", -999.0_f32)?;
        let data = ndarray::arr2(&[[1000.0_f32, -999.0, 1010.0], [990.0, 995.0, -999.0]]);
        var.put(data.view(), ..)?;
    }

    let source = CfCubeSource::open(&file_path)?;
    let grid = source.load("pressure")?;

    // "days since" becomes UTC timestamps
    match &grid.axis("time").unwrap().values {
        AxisValues::Time(times) => {
            assert_eq!(times[0].format("%Y-%m-%d").to_string(), "2000-01-01");
            assert_eq!(times[1].format("%Y-%m-%d").to_string(), "2000-02-01");
        }
        other => panic!("Expected decoded time axis, got {:?}", other),
    }

    // Fill values are masked to NaN
    assert!(grid.data[[0, 1]].is_nan());
    assert!(grid.data[[1, 2]].is_nan());
    assert_eq!(grid.data[[0, 0]], 1000.0);

    // The x axis has no coordinate variable; indices are synthesized
    assert_eq!(
        grid.axis("x").unwrap().values,
        AxisValues::Numeric(vec![0.0, 1.0, 2.0])
    );

    Ok(())
}

#[test]
fn test_cf_backend_keeps_undecodable_units_numeric() -> Result<()> {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let file_path = temp_dir.path().join("odd_units.nc");

    {
        let mut file = create(&file_path)?;
        file.add_dimension("level", 2)?;
        let mut level_var = file.add_variable::<f64>("level", &["level"])?;
        level_var.put_attribute("units", "model_levels since forever")?;
        level_var.put(ndarray::arr1(&[1.0_f64, 2.0]).view(), ..)?;

        let mut var = file.add_variable::<f32>("rho", &["level"])?;
        var.put(ndarray::arr1(&[1.2_f32, 0.8]).view(), ..)?;
    }

    let grid = CfCubeSource::open(&file_path)?.load("rho")?;
    assert_eq!(
        grid.axis("level").unwrap().values,
        AxisValues::Numeric(vec![1.0, 2.0])
    );
    Ok(())
}

#[test]
fn test_binding_with_own_axis_names_never_mismatches() -> Result<()> {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let file_path = temp_dir.path().join("reference.nc");
    create_reference_file(&file_path);

    let grid = open_grid(&file_path, "surface_temperature")?;
    let kdims = grid.axis_names();
    let vdims = vec![grid.var_name.clone()];

    // Binding with the file's own axis names must always succeed
    let dataset = BoundDataset::new(grid, kdims, vdims, Some(Crs::PlateCarree))?;
    assert_eq!(dataset.kdims(), ["time", "latitude", "longitude"]);
    assert_eq!(dataset.vdims(), ["surface_temperature"]);
    assert_eq!(dataset.crs(), Some(Crs::PlateCarree));

    Ok(())
}

#[test]
fn test_binding_absent_dimension_fails() -> Result<()> {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let file_path = temp_dir.path().join("reference.nc");
    create_reference_file(&file_path);

    let grid = open_grid(&file_path, "surface_temperature")?;

    let result = BoundDataset::new(
        grid.clone(),
        vec!["time".to_string(), "altitude".to_string()],
        vec!["surface_temperature".to_string()],
        None,
    );
    match result {
        Err(GridViewsError::DimensionMismatch { name, .. }) => assert_eq!(name, "altitude"),
        other => panic!("Expected DimensionMismatch, got {:?}", other.map(|_| ())),
    }

    // An unknown value dimension is a mismatch too
    let result = BoundDataset::new(
        grid,
        vec!["time".to_string()],
        vec!["sea_surface_height".to_string()],
        None,
    );
    assert!(matches!(
        result,
        Err(GridViewsError::DimensionMismatch { .. })
    ));

    Ok(())
}

#[test]
fn test_value_range_rebinding() -> Result<()> {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let file_path = temp_dir.path().join("reference.nc");
    create_reference_file(&file_path);

    let grid = open_grid(&file_path, "surface_temperature")?;
    let mut dataset = BoundDataset::from_grid(grid, None);

    assert!(dataset.value_range("surface_temperature").is_none());
    dataset.set_value_range("surface_temperature", 0.0, 300.0)?;
    assert_eq!(
        dataset.value_range("surface_temperature"),
        Some((0.0, 300.0))
    );

    // The rebound range travels into mapped sequences
    let frames = dataset.to_visual(
        VisualKind::Image,
        &["longitude", "latitude"],
        &MapOptions::default(),
    )?;
    assert_eq!(frames.declared_range(), Some((0.0, 300.0)));

    assert!(matches!(
        dataset.set_value_range("humidity", 0.0, 1.0),
        Err(GridViewsError::DimensionMismatch { .. })
    ));

    Ok(())
}

#[test]
fn test_mapping_produces_one_frame_per_slider_value() -> Result<()> {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let file_path = temp_dir.path().join("reference.nc");
    create_reference_file(&file_path);

    let grid = open_grid(&file_path, "surface_temperature")?;
    let dataset = BoundDataset::from_grid(grid, None);

    let frames = dataset.to_visual(
        VisualKind::Image,
        &["longitude", "latitude"],
        &MapOptions::default(),
    )?;

    // One frame per time value
    assert_eq!(frames.len(), 3);
    assert_eq!(frames.slider_dims(), ["time"]);
    assert_eq!(
        frames.slider_dims().len(),
        1,
        "single unmapped dimension drives the slider"
    );

    // Sequence length equals the distinct-value count of the slider axis
    assert_eq!(
        frames.len(),
        dataset.grid().axis("time").unwrap().len()
    );

    // Frames arrive in key order with [y, x] payloads
    for (t, frame) in frames.iter().enumerate() {
        assert_eq!(frame.xdim, "longitude");
        assert_eq!(frame.ydim.as_deref(), Some("latitude"));
        match &frame.data {
            FrameData::Grid(plane) => {
                assert_eq!(plane.dim(), (5, 10));
                assert_eq!(plane[[0, 0]], (100 * t) as f32);
                assert_eq!(plane[[4, 9]], (100 * t + 49) as f32);
            }
            other => panic!("Expected grid payload, got {:?}", other),
        }
        assert_eq!(frame.value_range, Some(((100 * t) as f32, (100 * t + 49) as f32)));
    }

    // Restartable: a second pass sees the same frames
    assert_eq!(frames.iter().count(), 3);
    assert_eq!(frames.iter().count(), 3);

    Ok(())
}

#[test]
fn test_mapping_all_dimensions_yields_single_frame() -> Result<()> {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let file_path = temp_dir.path().join("single.nc");

    {
        let mut file = create(&file_path)?;
        file.add_dimension("y", 4)?;
        file.add_dimension("x", 6)?;
        let mut var = file.add_variable::<f32>("elevation", &["y", "x"])?;
        let values: Vec<f32> = (0..24).map(|i| i as f32).collect();
        var.put(
            ndarray::Array2::from_shape_vec((4, 6), values)?.view(),
            ..,
        )?;
    }

    let grid = open_grid(&file_path, "elevation")?;
    let dataset = BoundDataset::from_grid(grid, None);
    let frames = dataset.to_visual(VisualKind::Image, &["x", "y"], &MapOptions::default())?;

    assert_eq!(frames.len(), 1);
    assert!(frames.slider_dims().is_empty());
    assert_eq!(frames[0].key_label, "");

    Ok(())
}

#[test]
fn test_curve_with_two_spatial_axes_is_unsupported() -> Result<()> {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let file_path = temp_dir.path().join("reference.nc");
    create_reference_file(&file_path);

    let grid = open_grid(&file_path, "surface_temperature")?;
    let dataset = BoundDataset::from_grid(grid, None);

    let result = dataset.to_visual(
        VisualKind::Curve,
        &["longitude", "latitude"],
        &MapOptions::default(),
    );
    match result {
        Err(GridViewsError::UnsupportedVisualKind { kind, .. }) => assert_eq!(kind, "curve"),
        other => panic!("Expected UnsupportedVisualKind, got {:?}", other.map(|_| ())),
    }

    // An image over a single axis is equally unrepresentable
    let result = dataset.to_visual(VisualKind::Image, &["longitude"], &MapOptions::default());
    assert!(matches!(
        result,
        Err(GridViewsError::UnsupportedVisualKind { .. })
    ));

    // Mapping a dimension that was never bound is a mismatch
    let result = dataset.to_visual(
        VisualKind::Image,
        &["longitude", "depth"],
        &MapOptions::default(),
    );
    assert!(matches!(
        result,
        Err(GridViewsError::DimensionMismatch { .. })
    ));

    Ok(())
}

#[test]
fn test_curve_series_follows_axis_coordinates() -> Result<()> {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let file_path = temp_dir.path().join("reference.nc");
    create_reference_file(&file_path);

    let grid = open_grid(&file_path, "surface_temperature")?;
    let dataset = BoundDataset::from_grid(grid, None);

    // Curve over time: latitude and longitude become sliders
    let frames = dataset.to_visual(VisualKind::Curve, &["time"], &MapOptions::default())?;
    assert_eq!(frames.len(), 50);
    assert_eq!(frames.slider_dims(), ["latitude", "longitude"]);

    match &frames[0].data {
        FrameData::Series(series) => {
            assert_eq!(series.len(), 3);
            // x follows the time coordinate values, y the payload
            assert_eq!(series[0], (0.0, 0.0));
            assert_eq!(series[1], (24.0, 100.0));
            assert_eq!(series[2], (48.0, 200.0));
        }
        other => panic!("Expected series payload, got {:?}", other),
    }

    Ok(())
}

#[test]
fn test_points_skip_masked_cells() -> Result<()> {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let file_path = temp_dir.path().join("masked.nc");

    {
        let mut file = create(&file_path)?;
        file.add_dimension("y", 2)?;
        file.add_dimension("x", 2)?;
        let mut var = file.add_variable::<f32>("obs", &["y", "x"])?;
        var.put_attribute("_FillValue", -1.0_f32)?;
        var.put(
            ndarray::arr2(&[[1.0_f32, -1.0], [3.0, 4.0]]).view(),
            ..,
        )?;
    }

    let grid = CfCubeSource::open(&file_path)?.load("obs")?;
    let dataset = BoundDataset::from_grid(grid, None);
    let frames = dataset.to_visual(VisualKind::Points, &["x", "y"], &MapOptions::default())?;

    match &frames[0].data {
        FrameData::Scatter(points) => {
            assert_eq!(points.len(), 3, "masked cell contributes no marker");
            assert!(points.iter().all(|p| p.value.is_finite()));
        }
        other => panic!("Expected scatter payload, got {:?}", other),
    }

    Ok(())
}

#[test]
fn test_time_keys_format_with_date_format() -> Result<()> {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let file_path = temp_dir.path().join("reference.nc");
    create_reference_file(&file_path);

    let grid = CfCubeSource::open(&file_path)?.load("surface_temperature")?;
    let dataset = BoundDataset::from_grid(grid, None);

    let options = MapOptions {
        date_format: "%Y-%m-%d".to_string(),
    };
    let frames = dataset.to_visual(VisualKind::Image, &["longitude", "latitude"], &options)?;

    assert_eq!(
        frames.frame_labels(),
        vec!["time: 1990-01-01", "time: 1990-01-02", "time: 1990-01-03"]
    );

    Ok(())
}

#[test]
fn test_collapse_drops_axis_and_averages() -> Result<()> {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let file_path = temp_dir.path().join("reference.nc");
    create_reference_file(&file_path);

    let grid = open_grid(&file_path, "surface_temperature")?;
    let dataset = BoundDataset::from_grid(grid, None);

    let collapsed = dataset.collapse("time", StatOperation::Mean)?;
    assert_eq!(collapsed.kdims(), ["latitude", "longitude"]);
    assert_eq!(collapsed.grid().shape(), &[5, 10]);
    assert_eq!(
        collapsed.vdims(),
        ["surface_temperature_mean_over_time"]
    );

    // Mean of {v, v+100, v+200} is v+100
    assert_eq!(collapsed.grid().data[[0, 0]], 100.0);
    assert_eq!(collapsed.grid().data[[4, 9]], 149.0);

    // The collapsed dataset maps to a single frame
    let frames = collapsed.to_visual(
        VisualKind::Image,
        &["longitude", "latitude"],
        &MapOptions::default(),
    )?;
    assert_eq!(frames.len(), 1);

    assert!(matches!(
        dataset.collapse("altitude", StatOperation::Mean),
        Err(GridViewsError::DimensionMismatch { .. })
    ));

    Ok(())
}

#[test]
fn test_fixed_range_normalization_is_comparable_across_frames() -> Result<()> {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let file_path = temp_dir.path().join("reference.nc");
    create_reference_file(&file_path);

    let grid = open_grid(&file_path, "surface_temperature")?;
    let dataset = BoundDataset::from_grid(grid, None);
    let frames = dataset.to_visual(
        VisualKind::Image,
        &["longitude", "latitude"],
        &MapOptions::default(),
    )?;

    let base = RenderOptions {
        width: 10,
        height: 5,
        show_axes: false,
        ..Default::default()
    };

    // Per-frame: each frame stretches its own range, so the cells holding
    // each frame's minimum get the same (lowest) color.
    let per_frame = RenderOptions {
        normalization: Normalization::PerFrame,
        ..base.clone()
    };
    let f0 = rasterize(&frames[0], &per_frame)?;
    let f2 = rasterize(&frames[2], &per_frame)?;
    assert_eq!(&f0.pixels[0..4], &f2.pixels[0..4]);

    // Fixed range: the same data value maps to the same color everywhere,
    // so frame 2's different values produce different colors.
    let fixed = RenderOptions {
        normalization: Normalization::fixed_for(&frames),
        ..base
    };
    let f0 = rasterize(&frames[0], &fixed)?;
    let f2 = rasterize(&frames[2], &fixed)?;
    assert_ne!(&f0.pixels[0..4], &f2.pixels[0..4]);

    Ok(())
}

#[test]
fn test_nan_cells_rasterize_transparent() -> Result<()> {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let file_path = temp_dir.path().join("masked.nc");

    {
        let mut file = create(&file_path)?;
        file.add_dimension("y", 2)?;
        file.add_dimension("x", 2)?;
        let mut var = file.add_variable::<f32>("obs", &["y", "x"])?;
        var.put_attribute("_FillValue", -1.0_f32)?;
        var.put(
            ndarray::arr2(&[[-1.0_f32, -1.0], [-1.0, 4.0]]).view(),
            ..,
        )?;
    }

    let grid = CfCubeSource::open(&file_path)?.load("obs")?;
    let dataset = BoundDataset::from_grid(grid, None);
    let frames = dataset.to_visual(VisualKind::Image, &["x", "y"], &MapOptions::default())?;

    let options = RenderOptions {
        width: 2,
        height: 2,
        show_axes: false,
        ..Default::default()
    };
    let buffer = rasterize(&frames[0], &options)?;

    // y ascends, so payload row 1 ([NaN, 4.0]) lands on pixel row 0
    assert_eq!(buffer.pixels[3], 0, "masked cell stays transparent");
    assert_eq!(buffer.pixels[7], 255, "finite cell is opaque");

    Ok(())
}

#[test]
fn test_overlay_with_itself_is_idempotent() -> Result<()> {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let file_path = temp_dir.path().join("reference.nc");
    create_reference_file(&file_path);

    let grid = open_grid(&file_path, "surface_temperature")?;
    let dataset = BoundDataset::from_grid(grid, Some(Crs::PlateCarree));
    let frames = dataset.to_visual(
        VisualKind::Image,
        &["longitude", "latitude"],
        &MapOptions::default(),
    )?;

    let frame = frames[0].clone();
    let overlay = frame.clone() * frame.clone();

    assert_eq!(overlay.len(), 2);
    assert_eq!(overlay.extent(), Some(frame.extent));
    assert_eq!(overlay.value_range(), frame.value_range);
    overlay.check_axes()?;

    // Rasterizing opaque identical layers changes nothing either
    let options = RenderOptions {
        width: 10,
        height: 5,
        show_axes: false,
        ..Default::default()
    };
    let single = rasterize(&frame, &options)?;
    let stacked = overlay.rasterize(&options)?;
    assert_eq!(single.pixels, stacked.pixels);

    Ok(())
}

#[test]
fn test_overlay_detects_mismatched_axes() -> Result<()> {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let file_path = temp_dir.path().join("reference.nc");
    create_reference_file(&file_path);

    let grid = open_grid(&file_path, "surface_temperature")?;

    let carree = BoundDataset::from_grid(grid.clone(), Some(Crs::PlateCarree));
    let mercator = BoundDataset::from_grid(grid, Some(Crs::Mercator));

    let options = MapOptions::default();
    let a = carree
        .to_visual(VisualKind::Image, &["longitude", "latitude"], &options)?[0]
        .clone();
    let b = mercator
        .to_visual(VisualKind::Image, &["longitude", "latitude"], &options)?[0]
        .clone();

    // Composition proceeds with a warning; the strict check reports the kind
    let overlay = a * b;
    assert_eq!(overlay.len(), 2);
    match overlay.check_axes() {
        Err(GridViewsError::MismatchedAxes { left, right }) => {
            assert_eq!(left, "PlateCarree");
            assert_eq!(right, "Mercator");
        }
        other => panic!("Expected MismatchedAxes, got {:?}", other),
    }

    Ok(())
}

#[test]
fn test_layout_grid_arrangement() -> Result<()> {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let file_path = temp_dir.path().join("reference.nc");
    create_reference_file(&file_path);

    let grid = open_grid(&file_path, "surface_temperature")?;
    let dataset = BoundDataset::from_grid(grid, None);
    let frames = dataset.to_visual(
        VisualKind::Image,
        &["longitude", "latitude"],
        &MapOptions::default(),
    )?;

    let mut layout = Layout::new().with_cols(2);
    for frame in &frames {
        layout.push(frame.clone());
    }
    assert_eq!(layout.len(), 3);
    assert_eq!(layout.cols(), 2);
    assert_eq!(layout.rows(), 2);

    let options = RenderOptions {
        width: 8,
        height: 4,
        show_axes: false,
        ..Default::default()
    };
    let sheet = layout.rasterize(&options)?;
    assert_eq!(sheet.width, 16);
    assert_eq!(sheet.height, 8);

    // The fourth cell of the 2x2 grid is empty, hence transparent
    let idx = ((4 + 1) * 16 + 8) * 4;
    assert_eq!(sheet.pixels[idx + 3], 0);

    // `+` builds layouts like `*` builds overlays
    let layout = frames[0].clone() + frames[1].clone();
    assert_eq!(layout.len(), 2);

    let empty = Overlay::new();
    assert!(empty.rasterize(&options).is_err());

    Ok(())
}
