//! Neck tracker: replays recorded 68-point landmarks through the pose
//! pipeline and prints the shaped angles for each frame.

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use neck_tracker::{
    config::{Config, EXAMPLE_CONFIG},
    consumer::NeckJoint,
    landmarks::ReplaySource,
    pipeline::PosePipeline,
    pose_estimation::{PoseSolver, RansacPnpSolver},
    Error,
};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Recorded landmarks, one JSON object per line
    #[arg(short, long, required_unless_present = "print_config")]
    landmarks: Option<PathBuf>,

    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long)]
    config: Option<String>,

    /// Frame width in pixels
    #[arg(long)]
    width: Option<u32>,

    /// Frame height in pixels
    #[arg(long)]
    height: Option<u32>,

    /// Low-pass alpha in (0, 1]
    #[arg(short, long)]
    alpha: Option<f64>,

    /// Use the OpenCV pose solver
    #[cfg(feature = "opencv")]
    #[arg(long)]
    opencv: bool,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,

    /// Print an example configuration file and exit
    #[arg(long)]
    print_config: bool,
}

fn load_config(args: &Args) -> Config {
    let mut config = if let Some(config_path) = &args.config {
        info!("Loading configuration from: {}", config_path);
        match Config::from_file(config_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!("Failed to load config file: {}. Using defaults.", e);
                Config::default()
            }
        }
    } else {
        Config::default()
    };

    if let Some(width) = args.width {
        config.camera.frame_width = width;
    }
    if let Some(height) = args.height {
        config.camera.frame_height = height;
    }
    if let Some(alpha) = args.alpha {
        config.stabilizer.alpha = alpha;
    }
    config
}

fn run<S: PoseSolver>(mut source: ReplaySource, solver: S, config: &Config) -> Result<()> {
    let joint = NeckJoint::new(config.joint);
    let mut pipeline = PosePipeline::new(ReplaySource::default(), solver, joint, config)?;

    while let Some(frame) = source.next_frame() {
        match pipeline.process_frame(&frame) {
            Ok(report) => println!(
                "{} {:.3} {:.3} {:.3} {}",
                report.frame,
                report.angles.pitch,
                report.angles.yaw,
                report.angles.roll,
                report.outcome().as_str()
            ),
            Err(Error::DegenerateInput(reason)) => {
                warn!("Skipping frame {}: {}", pipeline.frame_count() - 1, reason);
            }
            Err(e) => return Err(e.into()),
        }
    }

    info!(
        "Processed {} frames, {} joint updates",
        pipeline.frame_count(),
        pipeline.consumer().updates()
    );
    Ok(())
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logger
    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    if args.print_config {
        print!("{EXAMPLE_CONFIG}");
        return Ok(());
    }

    info!("Neck Tracker {} ({})", env!("CARGO_PKG_VERSION"), env!("BUILD_TARGET"));

    let config = load_config(&args);
    let Some(path) = &args.landmarks else {
        anyhow::bail!("--landmarks is required");
    };
    let source = ReplaySource::from_file(path)
        .with_context(|| format!("Failed to load landmarks from {}", path.display()))?;

    #[cfg(feature = "opencv")]
    if args.opencv {
        let solver = neck_tracker::opencv_solver::OpenCvPnpSolver::new(config.solver.ransac_params());
        return run(source, solver, &config);
    }

    let solver = RansacPnpSolver::new(config.solver.ransac_params(), config.solver.seed);
    run(source, solver, &config)
}
