//! Integration tests: write grid files to the temp dir, build the model through
//! the public API and check its behaviour at, between and outside the bin centers.

use std::path::PathBuf;
use std::sync::Mutex;

use approx::assert_relative_eq;
use nalgebra::DMatrix;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use one_datum::data::{SynthConfig, generate_grid};
use one_datum::domain::{GridHeader, SampleCube};
use one_datum::io::fits::{HeaderKeys, grid_header_keys, write_grid, write_image_file};
use one_datum::math::gaussian_filter_2d;
use one_datum::model::{GRID_PATH_ENV, UncertaintyGrid, bundled_grid_path};
use one_datum::{InterpMethod, ModelError, UncertaintyConfig, get_uncertainty_model, load_uncertainty_model};

/// Serializes tests that touch the process environment.
static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Temp file removed on drop.
struct TempGrid(PathBuf);

impl TempGrid {
    fn new(name: &str) -> Self {
        Self(std::env::temp_dir().join(format!("one_datum_it_{}_{name}.fits", std::process::id())))
    }
}

impl Drop for TempGrid {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}

fn synth_file(name: &str) -> (TempGrid, GridHeader, SampleCube) {
    let file = TempGrid::new(name);
    let (header, cube) = generate_grid(&SynthConfig {
        samples_per_cell: 8,
        ..SynthConfig::default()
    })
    .unwrap();
    write_grid(&file.0, &header, &cube).unwrap();
    (file, header, cube)
}

fn variance(m: &DMatrix<f64>) -> f64 {
    let n = m.len() as f64;
    let mean = m.sum() / n;
    m.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n
}

#[test]
fn domain_matches_bin_centers() {
    let (file, header, _) = synth_file("domain");
    let model = load_uncertainty_model(&file.0, &UncertaintyConfig::default()).unwrap();

    let ((m0, m1), (c0, c1)) = model.domain();
    let mag_width = (header.max_mag - header.min_mag) / header.num_mag as f64;
    let col_width = (header.max_col - header.min_col) / header.num_col as f64;
    assert_relative_eq!(m0, header.min_mag + 0.5 * mag_width, epsilon = 1e-12);
    assert_relative_eq!(m1, header.max_mag - 0.5 * mag_width, epsilon = 1e-12);
    assert_relative_eq!(c0, header.min_col + 0.5 * col_width, epsilon = 1e-12);
    assert_relative_eq!(c1, header.max_col - 0.5 * col_width, epsilon = 1e-12);
    assert_eq!(model.mag_centers().len(), header.num_mag);
    assert_eq!(model.color_centers().len(), header.num_col);
}

#[test]
fn reproduces_smoothed_values_at_centers() {
    let (file, _, _) = synth_file("identity");
    let config = UncertaintyConfig::default();
    let grid = UncertaintyGrid::open(&file.0).unwrap();
    let smoothed = grid.smoothed(&config).unwrap();
    let model = grid.interpolator(&config).unwrap();

    for (i, &mag) in model.mag_centers().iter().enumerate() {
        for (j, &color) in model.color_centers().iter().enumerate() {
            let v = model.evaluate(mag, color).unwrap();
            assert_relative_eq!(v, smoothed[(i, j)], epsilon = 1e-12);
        }
    }
}

#[test]
fn zero_smoothing_reproduces_cell_means() {
    let (file, _, cube) = synth_file("unsmoothed");
    let config = UncertaintyConfig {
        color_smoothing_scale: 0.0,
        mag_smoothing_scale: 0.0,
        ..Default::default()
    };
    let model = load_uncertainty_model(&file.0, &config).unwrap();
    let mean = cube.mean_last_axis();
    let (mag, color) = (model.mag_centers()[3], model.color_centers()[5]);
    assert_relative_eq!(model.evaluate(mag, color).unwrap(), mean[(3, 5)], epsilon = 1e-12);
}

#[test]
fn smoothing_flattens_random_grids() {
    for seed in 0..5u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let raw = DMatrix::from_fn(12, 9, |_, _| rng.gen_range(-3.0_f64..3.0));
        let (raw_min, raw_max) = (raw.min(), raw.max());

        let mut previous = variance(&raw);
        for sigma in [0.5, 1.0, 2.0, 4.0] {
            let smoothed = gaussian_filter_2d(&raw, sigma, sigma);
            assert!(smoothed.max() <= raw_max + 1e-12);
            assert!(smoothed.min() >= raw_min - 1e-12);
            let var = variance(&smoothed);
            assert!(var < previous, "seed {seed}, sigma {sigma}: {var} >= {previous}");
            previous = var;
        }
    }
}

#[test]
fn larger_scales_flatten_the_model() {
    let (file, _, _) = synth_file("scales");
    let grid = UncertaintyGrid::open(&file.0).unwrap();
    let light = grid
        .smoothed(&UncertaintyConfig {
            mag_smoothing_scale: 0.1,
            color_smoothing_scale: 0.1,
            ..Default::default()
        })
        .unwrap();
    let heavy = grid
        .smoothed(&UncertaintyConfig {
            mag_smoothing_scale: 2.0,
            color_smoothing_scale: 1.0,
            ..Default::default()
        })
        .unwrap();
    assert!(variance(&heavy) < variance(&light));
    assert!(variance(&light) <= variance(grid.mean_grid()));
}

#[test]
fn bounds_error_rejects_out_of_range_queries() {
    let (file, _, _) = synth_file("bounds_error");
    let config = UncertaintyConfig {
        bounds_error: true,
        ..Default::default()
    };
    let model = load_uncertainty_model(&file.0, &config).unwrap();
    let ((m0, m1), (c0, c1)) = model.domain();
    let mid_mag = 0.5 * (m0 + m1);
    let mid_col = 0.5 * (c0 + c1);

    assert!(model.evaluate(mid_mag, mid_col).is_ok());
    assert!(model.evaluate(m0, c1).is_ok());
    for (mag, color) in [(m0 - 0.01, mid_col), (m1 + 0.01, mid_col), (mid_mag, c0 - 0.01), (mid_mag, c1 + 0.01)] {
        let err = model.evaluate(mag, color).unwrap_err();
        assert!(matches!(err, ModelError::OutOfBounds { .. }), "{err}");
    }
    assert!(model.evaluate_many(&[(mid_mag, mid_col), (m1 + 1.0, mid_col)]).is_err());
}

#[test]
fn fill_value_is_returned_exactly() {
    let (file, _, _) = synth_file("fill");
    let config = UncertaintyConfig {
        fill_value: Some(-7.25),
        ..Default::default()
    };
    let model = load_uncertainty_model(&file.0, &config).unwrap();
    let ((_, m1), (c0, _)) = model.domain();
    assert_eq!(model.evaluate(m1 + 0.5, 1.0).unwrap(), -7.25);
    assert_eq!(model.evaluate(8.0, c0 - 0.5).unwrap(), -7.25);
    assert_ne!(model.evaluate(8.0, 1.0).unwrap(), -7.25);
}

#[test]
fn default_policy_extrapolates() {
    let (file, _, _) = synth_file("extrapolate");
    let model = load_uncertainty_model(&file.0, &UncertaintyConfig::default()).unwrap();
    let ((_, m1), _) = model.domain();
    let color = model.color_centers()[4];
    let last = model.evaluate(m1, color).unwrap();
    let prev = model.evaluate(model.mag_centers()[model.mag_centers().len() - 2], color).unwrap();
    let step = m1 - model.mag_centers()[model.mag_centers().len() - 2];
    let beyond = model.evaluate(m1 + step, color).unwrap();
    assert_relative_eq!(beyond, last + (last - prev), epsilon = 1e-9);
}

#[test]
fn construction_is_deterministic() {
    let (file, _, _) = synth_file("deterministic");
    let config = UncertaintyConfig::default();
    let a = load_uncertainty_model(&file.0, &config).unwrap();
    let b = load_uncertainty_model(&file.0, &config).unwrap();
    for &(mag, color) in &[(5.1, 0.3), (9.99, 1.7), (12.6, 2.9), (14.0, -0.5)] {
        assert_eq!(
            a.evaluate(mag, color).unwrap().to_bits(),
            b.evaluate(mag, color).unwrap().to_bits()
        );
    }
}

#[test]
fn two_color_bin_scenario_drives_smoothing() {
    let file = TempGrid::new("scenario");
    let header = GridHeader {
        min_col: 0.0,
        max_col: 1.0,
        num_col: 2,
        min_mag: 10.0,
        max_mag: 14.0,
        num_mag: 4,
    };
    let data: Vec<f64> = (0..4 * 2 * 3).map(|i| (i as f64 * 0.37).sin()).collect();
    let cube = SampleCube::new([4, 2, 3], data).unwrap();
    write_grid(&file.0, &header, &cube).unwrap();

    let grid = UncertaintyGrid::open(&file.0).unwrap();
    assert_eq!(grid.color_axis().edges, vec![0.0, 0.5, 1.0]);
    assert_eq!(grid.color_axis().centers, vec![0.25, 0.75]);

    let config = UncertaintyConfig::default();
    let widths = grid.smoothing_widths(&config).unwrap();
    assert_relative_eq!(widths.color_cells, 0.2, epsilon = 1e-15);
    assert_relative_eq!(widths.mag_cells, 0.1, epsilon = 1e-15);

    let expected = gaussian_filter_2d(&cube.mean_last_axis(), 0.1, 0.2);
    assert_eq!(grid.smoothed(&config).unwrap(), expected);
}

#[test]
fn nearest_method_snaps_to_cells() {
    let (file, _, _) = synth_file("nearest");
    let config = UncertaintyConfig {
        method: InterpMethod::Nearest,
        ..Default::default()
    };
    let grid = UncertaintyGrid::open(&file.0).unwrap();
    let smoothed = grid.smoothed(&config).unwrap();
    let model = grid.interpolator(&config).unwrap();
    let (m, c) = (model.mag_centers()[2], model.color_centers()[7]);
    assert_eq!(model.evaluate(m + 0.1, c - 0.05).unwrap(), smoothed[(2, 7)]);
}

#[test]
fn missing_header_key_is_a_load_error() {
    let file = TempGrid::new("missing_key");
    let keys: HeaderKeys = grid_header_keys(&GridHeader {
        min_col: 0.0,
        max_col: 1.0,
        num_col: 2,
        min_mag: 0.0,
        max_mag: 1.0,
        num_mag: 2,
    })
    .into_iter()
    .filter(|(k, _)| k != "MAX_MAG")
    .collect();
    write_image_file(&file.0, &keys, &[2, 2, 1], &[0.0; 4]).unwrap();

    match load_uncertainty_model(&file.0, &UncertaintyConfig::default()) {
        Err(ModelError::MissingKey(key)) => assert_eq!(key, "MAX_MAG"),
        other => panic!("expected MissingKey, got {other:?}"),
    }
}

#[test]
fn cube_shape_must_match_header() {
    let file = TempGrid::new("shape");
    let header = GridHeader {
        min_col: 0.0,
        max_col: 1.0,
        num_col: 3,
        min_mag: 0.0,
        max_mag: 1.0,
        num_mag: 2,
    };
    // 2 x 2 x 1 cube while the header says 2 x 3.
    write_image_file(&file.0, &grid_header_keys(&header), &[2, 2, 1], &[0.0; 4]).unwrap();
    let err = load_uncertainty_model(&file.0, &UncertaintyConfig::default()).unwrap_err();
    assert!(matches!(err, ModelError::Format { .. }), "{err}");

    // A 2-D image is rejected too.
    write_image_file(&file.0, &grid_header_keys(&header), &[2, 3], &[0.0; 6]).unwrap();
    let err = load_uncertainty_model(&file.0, &UncertaintyConfig::default()).unwrap_err();
    assert!(err.to_string().contains("3-D"), "{err}");
}

#[test]
fn missing_file_is_a_resource_error() {
    let err = load_uncertainty_model(
        &PathBuf::from("/nonexistent/dir/rv_uncertainty_grid.fits"),
        &UncertaintyConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, ModelError::Io { .. }));
}

#[test]
fn interpolant_is_shareable_across_threads() {
    let (file, _, _) = synth_file("threads");
    let model = load_uncertainty_model(&file.0, &UncertaintyConfig::default()).unwrap();
    let expected = model.evaluate(9.3, 1.4).unwrap();

    std::thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| {
                assert_eq!(model.evaluate(9.3, 1.4).unwrap(), expected);
            });
        }
    });
}

#[test]
fn bundled_model_follows_the_environment_override() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let (file, _, _) = synth_file("bundled");
    let config = UncertaintyConfig::default();

    // SAFETY: every test that reads or writes the environment holds ENV_LOCK.
    unsafe { std::env::set_var(GRID_PATH_ENV, &file.0) };
    let bundled = get_uncertainty_model(&config);
    unsafe { std::env::remove_var(GRID_PATH_ENV) };

    let bundled = bundled.unwrap();
    let direct = load_uncertainty_model(&file.0, &config).unwrap();
    for &(mag, color) in &[(4.3, 0.1), (8.0, 1.0), (12.9, 2.95), (15.0, -1.0)] {
        assert_eq!(
            bundled.evaluate(mag, color).unwrap().to_bits(),
            direct.evaluate(mag, color).unwrap().to_bits()
        );
    }
}

#[test]
fn bundled_path_defaults_to_crate_data_dir() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let saved = std::env::var_os(GRID_PATH_ENV);

    // SAFETY: every test that reads or writes the environment holds ENV_LOCK.
    unsafe { std::env::remove_var(GRID_PATH_ENV) };
    let default = bundled_grid_path();
    unsafe { std::env::set_var(GRID_PATH_ENV, "") };
    let empty = bundled_grid_path();
    if let Some(value) = saved {
        unsafe { std::env::set_var(GRID_PATH_ENV, value) };
    } else {
        unsafe { std::env::remove_var(GRID_PATH_ENV) };
    }

    let expected = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data").join("rv_uncertainty_grid.fits");
    assert_eq!(default, expected);
    assert_eq!(empty, expected);
}

#[test]
fn nan_queries_respect_the_bounds_policy() {
    let (file, _, _) = synth_file("nan");
    let lenient = load_uncertainty_model(&file.0, &UncertaintyConfig::default()).unwrap();
    assert!(lenient.evaluate(f64::NAN, 1.0).unwrap().is_nan());

    let strict = load_uncertainty_model(
        &file.0,
        &UncertaintyConfig {
            bounds_error: true,
            ..Default::default()
        },
    )
    .unwrap();
    match strict.evaluate(8.0, f64::NAN) {
        Err(ModelError::OutOfBounds { axis, .. }) => assert_eq!(axis, "color"),
        other => panic!("expected OutOfBounds, got {other:?}"),
    }
}
