//! AMR map projector.
//!
//! Projects a RAMSES-style cell table onto 2D maps and writes them as JSON.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use projector::{run, LogFormat, ProjectionOptions, ProjectorConfig, RunArgs};

#[derive(Parser, Debug)]
#[command(name = "projector")]
#[command(about = "Project AMR cell data onto fixed-resolution maps")]
struct Args {
    /// Cell table (JSON)
    #[arg(short, long)]
    input: PathBuf,

    /// Variables to project, comma separated
    #[arg(long, value_delimiter = ',', required = true)]
    vars: Vec<String>,

    /// Output units, one per variable
    #[arg(long, value_delimiter = ',')]
    units: Vec<String>,

    /// Projection direction (x, y or z)
    #[arg(short, long, default_value = "z")]
    direction: String,

    /// Weighting (mass, volume or none)
    #[arg(short, long, default_value = "mass")]
    weighting: String,

    /// Accumulation mode (standard or sum)
    #[arg(long, default_value = "standard")]
    mode: String,

    /// Pixels across the full box
    #[arg(long)]
    res: Option<usize>,

    /// Pixel edge length in --range-unit, alternative to --res
    #[arg(long, conflicts_with = "res")]
    pixel_size: Option<f64>,

    /// Level cap for the default resolution
    #[arg(long)]
    lmax: Option<u32>,

    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    xrange: Option<Vec<f64>>,

    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    yrange: Option<Vec<f64>>,

    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    zrange: Option<Vec<f64>>,

    /// Reference centre; ranges become relative to it
    #[arg(long, value_delimiter = ',')]
    center: Option<Vec<f64>>,

    /// Unit of ranges, centre and pixel size
    #[arg(long, default_value = "standard")]
    range_unit: String,

    /// Output file (JSON); omitted prints a summary only
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Configuration file (YAML)
    #[arg(short, long, env = "PROJECTOR_CONFIG")]
    config: Option<PathBuf>,

    /// Worker threads, overrides the configuration
    #[arg(long, env = "PROJECTOR_THREADS")]
    threads: Option<usize>,

    /// Log a summary of every call
    #[arg(short, long)]
    verbose: bool,

    /// Log level, overrides the configuration
    #[arg(long, env = "LOG_LEVEL")]
    log_level: Option<String>,
}

fn init_tracing(level: &str, format: LogFormat) -> Result<()> {
    let level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true);

    match format {
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish())?,
        LogFormat::Pretty => tracing::subscriber::set_global_default(builder.finish())?,
    }
    Ok(())
}

fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ProjectorConfig::load(path)?,
        None => ProjectorConfig::from_env(),
    };
    if let Some(threads) = args.threads {
        config.projection.max_threads = threads;
    }
    if args.verbose {
        config.projection.verbose = true;
    }
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
    config.validate()?;

    init_tracing(&config.logging.level, config.logging.format)?;
    info!(
        max_threads = config.projection.max_threads,
        enhanced_coverage = config.projection.enhanced_coverage,
        "Starting projector"
    );

    let run_args = RunArgs {
        input: args.input,
        output: args.output,
        options: ProjectionOptions {
            variables: args.vars,
            units: args.units,
            direction: args.direction,
            weighting: args.weighting,
            mode: args.mode,
            resolution: args.res,
            pixel_size: args.pixel_size,
            lmax: args.lmax,
            xrange: args.xrange,
            yrange: args.yrange,
            zrange: args.zrange,
            center: args.center,
            range_unit: args.range_unit,
        },
    };

    let maps = run(&run_args, &config)?;
    for (name, map) in &maps.maps {
        let (min, max) = map.min_max().unwrap_or((0.0, 0.0));
        info!(
            variable = %name,
            unit = maps.unit(name).unwrap_or("standard"),
            min = min,
            max = max,
            "Map ready"
        );
    }

    Ok(())
}
