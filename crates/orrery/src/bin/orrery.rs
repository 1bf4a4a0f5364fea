//! orrery CLI: headless replay of an AR solar-system session.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use orrery::core::{CameraError, CameraParameters, ImageSize};
use orrery::{run_replay, PlanetTable, SessionConfig, SessionError};

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Camera(#[from] CameraError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("window size must be non-zero (got {width}x{height})")]
    EmptyWindow { width: u32, height: u32 },
}

type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "orrery")]
#[command(about = "Draw planets orbiting a sun over ArUco markers (headless replay)")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay frames and recorded detections, write a JSON report.
    Run {
        /// Session config (JSON).
        #[arg(long)]
        config: PathBuf,

        /// Report path; overrides `output_path` from the config.
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Print the planet table as JSON.
    Planets {
        /// Take the table from this session config instead of the built-in one.
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Print the OpenGL projection matrix for a calibration and window size.
    Project {
        /// Camera calibration (JSON).
        #[arg(long)]
        camera: PathBuf,

        #[arg(long)]
        width: u32,

        #[arg(long)]
        height: u32,

        #[arg(long, default_value = "0.01")]
        near: f64,

        #[arg(long, default_value = "100.0")]
        far: f64,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    if let Err(err) = try_main(cli.command) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

#[cfg(feature = "tracing")]
fn init_logging(_verbosity: u8) {
    orrery::core::init_tracing(false);
}

#[cfg(not(feature = "tracing"))]
fn init_logging(verbosity: u8) {
    let level = orrery::core::level_from_verbosity(verbosity);
    if let Err(err) = orrery::core::init_with_level(level) {
        eprintln!("warning: logger not installed: {err}");
    }
}

fn try_main(command: Commands) -> CliResult<()> {
    match command {
        Commands::Run { config, output } => run(config, output),
        Commands::Planets { config } => planets(config),
        Commands::Project {
            camera,
            width,
            height,
            near,
            far,
        } => project(camera, width, height, near, far),
    }
}

fn run(config_path: PathBuf, output: Option<PathBuf>) -> CliResult<()> {
    let mut config = SessionConfig::load_json(&config_path)?;
    if let Some(output) = output {
        config.output_path = output;
    }

    let report = run_replay(&config)?;
    report.write_json(&config.output_path)?;
    println!(
        "{} frames, final angle {:.1}, report: {}",
        report.frames.len(),
        report.final_state.angle,
        config.output_path.display()
    );
    Ok(())
}

fn planets(config_path: Option<PathBuf>) -> CliResult<()> {
    let table = match config_path {
        Some(path) => SessionConfig::load_json(path)?.planet_table()?,
        None => PlanetTable::builtin(),
    };
    println!("{}", serde_json::to_string_pretty(&table.entries())?);
    Ok(())
}

fn project(camera_path: PathBuf, width: u32, height: u32, near: f64, far: f64) -> CliResult<()> {
    let window = ImageSize::new(width, height);
    if window.is_empty() {
        return Err(CliError::EmptyWindow { width, height });
    }
    let camera = CameraParameters::load_json(camera_path)?;
    let m = camera.gl_projection_matrix(camera.image_size, window, near, far);
    let rows: Vec<[f64; 4]> = (0..4)
        .map(|r| [m[(r, 0)], m[(r, 1)], m[(r, 2)], m[(r, 3)]])
        .collect();
    println!("{}", serde_json::to_string_pretty(&rows)?);
    Ok(())
}
