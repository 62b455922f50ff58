//! Gazekit CLI - offline driver for the calibration-and-mapping engine
//!
//! Commands:
//! - calibrate: build a calibration set from recorded frames
//! - estimate: map a stream of frames to screen coordinates
//! - validate: check recorded frames against the sample contract

use clap::{Parser, Subcommand};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use thiserror::Error;

use gazekit::{
    default_target_plan, CalibrationSet, CoordinateMapper, FrameFeatures, GazeError,
    GazeProcessor, Point, RecordOutcome, GAZEKIT_VERSION,
};

/// Gazekit - calibration-and-mapping engine for webcam gaze estimation
#[derive(Parser)]
#[command(name = "gazekit")]
#[command(version = GAZEKIT_VERSION)]
#[command(about = "Map gaze features to screen coordinates", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a calibration set from recorded frames (one frame per target,
    /// in presentation order)
    Calibrate {
        /// Frame NDJSON input path (use - for stdin)
        #[arg(short, long)]
        samples: PathBuf,

        /// Target plan JSON file (array of points); defaults to the built-in
        /// five-point plan
        #[arg(long)]
        targets: Option<PathBuf>,

        /// Calibration set output path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,
    },

    /// Estimate screen coordinates for a stream of frames
    Estimate {
        /// Calibration set JSON path
        #[arg(short, long)]
        calibration: PathBuf,

        /// Frame NDJSON input path (use - for stdin)
        #[arg(short, long, default_value = "-")]
        input: PathBuf,

        /// Estimate NDJSON output path (use - for stdout); each line is a
        /// point or null
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Number of nearest neighbors for the regression
        #[arg(long, default_value = "3")]
        neighbors: usize,

        /// Mirror pupil x-coordinates for a frame of this width (pixels)
        #[arg(long)]
        mirror_width: Option<f64>,
    },

    /// Check recorded frames against the all-or-nothing sample contract
    Validate {
        /// Frame NDJSON input path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,
    },
}

#[derive(Debug, Error)]
enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Gaze(#[from] GazeError),
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Calibrate {
            samples,
            targets,
            output,
        } => cmd_calibrate(&samples, targets.as_deref(), &output),

        Commands::Estimate {
            calibration,
            input,
            output,
            neighbors,
            mirror_width,
        } => cmd_estimate(&calibration, &input, &output, neighbors, mirror_width),

        Commands::Validate { input } => cmd_validate(&input),
    }
}

fn read_input(path: &Path) -> Result<String, CliError> {
    if path.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(path)?)
    }
}

fn write_output(path: &Path, data: &str) -> Result<(), CliError> {
    if path.to_string_lossy() == "-" {
        io::stdout().write_all(data.as_bytes())?;
        Ok(())
    } else {
        Ok(fs::write(path, data)?)
    }
}

/// Parse NDJSON frames, skipping blank lines
fn parse_frames(data: &str) -> Result<Vec<FrameFeatures>, CliError> {
    data.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| Ok(FrameFeatures::from_json(line)?))
        .collect()
}

fn cmd_calibrate(
    samples: &Path,
    targets: Option<&Path>,
    output: &Path,
) -> Result<(), CliError> {
    let plan = match targets {
        Some(path) => serde_json::from_str::<Vec<Point>>(&read_input(path)?)?,
        None => default_target_plan(),
    };
    let plan_len = plan.len();
    let frames = parse_frames(&read_input(samples)?)?;

    let mut processor = GazeProcessor::with_config(plan, gazekit::DEFAULT_NEIGHBORS)?;
    processor.start_calibration();

    let mut published: Option<CalibrationSet> = None;
    for frame in &frames {
        if published.is_some() {
            log::warn!("ignoring extra frames past the {}-target plan", plan_len);
            break;
        }
        let sample = frame.into_sample()?;
        if let RecordOutcome::Completed(set) = processor.record(sample)? {
            published = Some(set);
        }
    }

    let set = match published {
        Some(set) => set,
        None => {
            // Fewer frames than targets: publish what was collected.
            log::warn!(
                "only {}/{} targets recorded, publishing a partial set",
                processor.session().collected().len(),
                plan_len
            );
            processor.finish_calibration()?
        }
    };

    write_output(output, &serde_json::to_string_pretty(&set)?)?;
    Ok(())
}

fn cmd_estimate(
    calibration: &Path,
    input: &Path,
    output: &Path,
    neighbors: usize,
    mirror_width: Option<f64>,
) -> Result<(), CliError> {
    let set: CalibrationSet = serde_json::from_str(&read_input(calibration)?)?;
    let mapper = CoordinateMapper::new(neighbors)?;
    let frames = parse_frames(&read_input(input)?)?;

    let mut lines = Vec::with_capacity(frames.len());
    for frame in frames {
        let frame = match mirror_width {
            Some(width) => frame.mirrored(width),
            None => frame,
        };
        // An incomplete frame delivers nothing, which means no estimate for
        // that line.
        let estimate = match frame.into_sample() {
            Ok(sample) => mapper.estimate(&sample, &set.pairs),
            Err(e) => {
                log::warn!("discarding frame: {}", e);
                None
            }
        };
        match estimate {
            Some(point) => lines.push(serde_json::to_string(&point)?),
            None => lines.push("null".to_string()),
        }
    }

    let mut out = lines.join("\n");
    out.push('\n');
    write_output(output, &out)?;
    Ok(())
}

fn cmd_validate(input: &Path) -> Result<(), CliError> {
    let data = read_input(input)?;
    let mut total = 0usize;
    let mut complete = 0usize;

    for (lineno, line) in data.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        total += 1;
        match FrameFeatures::from_json(line) {
            Ok(frame) => match frame.into_sample() {
                Ok(_) => complete += 1,
                Err(e) => println!("line {}: {}", lineno + 1, e),
            },
            Err(e) => println!("line {}: {}", lineno + 1, e),
        }
    }

    println!("{}/{} frames satisfy the sample contract", complete, total);
    Ok(())
}
