//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and installs logging
//! - parses CLI arguments
//! - builds the uncertainty model
//! - prints reports/plots
//! - writes optional exports

use std::fs::File;
use std::io::BufWriter;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Command, EvalArgs, GridArgs, InfoArgs, PlotArgs, SynthArgs};
use crate::data::{SynthConfig, generate_grid};
use crate::domain::GridHeader;
use crate::error::AppError;
use crate::io::{EvaluatedPoint, QueryPoint};

pub mod pipeline;

/// Entry point for the `one-datum` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = crate::cli::Cli::parse();
    match cli.command {
        Command::Info(args) => handle_info(args),
        Command::Eval(args) => handle_eval(args),
        Command::Grid(args) => handle_grid(args),
        Command::Plot(args) => handle_plot(args),
        Command::Synth(args) => handle_synth(args),
    }
}

/// Logs go to stderr so stdout stays usable for CSV output.
///
/// `RUST_LOG` controls the filter (default `warn`); `RUST_LOG_FORMAT=json`
/// switches to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let json = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let result = if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init()
    };
    if let Err(e) = result {
        eprintln!("logging disabled: {e}");
    }
}

fn handle_info(args: InfoArgs) -> Result<(), AppError> {
    let run = pipeline::load_model(&args.model)?;
    let widths = run.grid.smoothing_widths(&run.config)?;
    println!("Grid: {}", run.path.display());
    print!(
        "{}",
        crate::report::format_grid_summary(&run.grid, &run.config, &widths)
    );
    Ok(())
}

fn handle_eval(args: EvalArgs) -> Result<(), AppError> {
    let queries: Vec<QueryPoint> = match (&args.points, args.mag, args.color) {
        (Some(path), _, _) => crate::io::read_query_points(path)?,
        (None, Some(mag), Some(color)) => vec![QueryPoint { mag, color }],
        _ => {
            return Err(AppError::new(
                2,
                "Provide --mag and --color, or --points <CSV>.",
            ));
        }
    };

    let run = pipeline::load_model(&args.model)?;
    let interp = run.interpolator()?;

    let pairs: Vec<(f64, f64)> = queries.iter().map(|q| (q.mag, q.color)).collect();
    let values = interp.evaluate_many(&pairs)?;
    let rows: Vec<EvaluatedPoint> = queries
        .iter()
        .zip(values)
        .map(|(q, v)| EvaluatedPoint::new(*q, v))
        .collect();
    tracing::info!(points = rows.len(), "evaluated uncertainty model");

    if let Some(path) = &args.out {
        let file = File::create(path)
            .map_err(|e| AppError::new(2, format!("Failed to create results CSV '{}': {e}", path.display())))?;
        crate::io::write_evaluated(BufWriter::new(file), &rows)?;
    }

    if args.csv {
        crate::io::write_evaluated(std::io::stdout().lock(), &rows)?;
    } else if args.out.is_none() {
        print!("{}", crate::report::format_evaluations(&rows));
    }
    Ok(())
}

fn handle_grid(args: GridArgs) -> Result<(), AppError> {
    let run = pipeline::load_model(&args.model)?;
    let grid_file = crate::io::build_grid_file(&run.grid, &run.config)?;

    let widths = grid_file.widths;
    print!(
        "{}",
        crate::report::format_grid_summary(&run.grid, &run.config, &widths)
    );

    if args.plot {
        println!(
            "{}",
            crate::plot::render_grid_heatmap(&grid_file, args.width, args.height)
        );
    }

    // Optional exports.
    if let Some(path) = &args.export_json {
        crate::io::write_grid_json(path, &grid_file)?;
    }
    if let Some(path) = &args.export_csv {
        crate::io::write_grid_csv(path, &grid_file)?;
    }
    Ok(())
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let grid = crate::io::read_grid_json(&args.grid_json)?;
    println!(
        "{}",
        crate::plot::render_grid_heatmap(&grid, args.width, args.height)
    );
    Ok(())
}

pub fn synth_config_from_args(args: &SynthArgs) -> SynthConfig {
    SynthConfig {
        header: GridHeader {
            min_col: args.min_col,
            max_col: args.max_col,
            num_col: args.num_col,
            min_mag: args.min_mag,
            max_mag: args.max_mag,
            num_mag: args.num_mag,
        },
        samples_per_cell: args.samples,
        noise_sigma: args.noise,
        seed: args.seed,
    }
}

fn handle_synth(args: SynthArgs) -> Result<(), AppError> {
    let config = synth_config_from_args(&args);
    let (header, cube) = generate_grid(&config)?;
    crate::io::fits::write_grid(&args.out, &header, &cube)?;
    let [nm, nc, ns] = cube.shape();
    println!(
        "Wrote synthetic grid {} ({nm} mag x {nc} color bins, {ns} samples per cell)",
        args.out.display()
    );
    Ok(())
}
