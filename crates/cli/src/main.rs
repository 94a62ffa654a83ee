use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use dwelltrack_core::annotation::infrastructure::trajectory_annotator::TrajectoryAnnotator;
use dwelltrack_core::detection::infrastructure::jsonl_detection_provider::JsonlDetectionProvider;
use dwelltrack_core::pipeline::infrastructure::threaded_pipeline_executor::ThreadedPipelineExecutor;
use dwelltrack_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use dwelltrack_core::pipeline::track_objects_use_case::TrackObjectsUseCase;
use dwelltrack_core::reporting::domain::report_writer::ReportWriter;
use dwelltrack_core::reporting::infrastructure::json_report_writer::JsonReportWriter;
use dwelltrack_core::reporting::infrastructure::text_report_writer::TextReportWriter;
use dwelltrack_core::shared::constants::DEFAULT_REPORT_FILENAME;
use dwelltrack_core::tracking::domain::track_ledger::{DwellPolicy, LedgerOptions};
use dwelltrack_core::video::domain::video_reader::VideoReader;
use dwelltrack_core::video::domain::video_writer::VideoWriter;
use dwelltrack_core::video::infrastructure::ffmpeg_reader::FfmpegReader;
use dwelltrack_core::video::infrastructure::ffmpeg_writer::FfmpegWriter;
use dwelltrack_core::video::infrastructure::image_sequence_writer::ImageSequenceWriter;

/// Draw per-object trajectories on an annotated video and report how long
/// every object was on screen.
#[derive(Parser, Debug)]
#[command(name = "dwelltrack")]
struct Cli {
    /// Input video file.
    input: PathBuf,

    /// JSON-lines file with per-frame object identities and positions.
    annotations: PathBuf,

    /// Annotated output video (required unless --frames-dir is used).
    output: Option<PathBuf>,

    /// Write annotated frames as PNGs into this directory instead of a video.
    #[arg(long, conflicts_with = "output")]
    frames_dir: Option<PathBuf>,

    /// Where to write the end-of-stream report.
    #[arg(long, default_value = DEFAULT_REPORT_FILENAME)]
    report: PathBuf,

    /// Report format: text or json.
    #[arg(long, default_value = "text")]
    report_format: String,

    /// Dwell credit after an object's last sighting: through-end or last-seen.
    #[arg(long, default_value = "through-end")]
    dwell_policy: String,

    /// Override the frame rate reported by the container.
    #[arg(long)]
    fps: Option<f64>,

    /// Stop after this many frames; the report covers only those.
    #[arg(long)]
    max_frames: Option<usize>,

    /// ffmpeg encoder name for the output video (default: mpeg4).
    #[arg(long)]
    codec: Option<String>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let dwell_policy: DwellPolicy = cli.dwell_policy.parse()?;
    let ledger_options = LedgerOptions {
        dwell_policy,
        ..LedgerOptions::default()
    };

    let mut reader: Box<dyn VideoReader> = Box::new(FfmpegReader::new());
    let mut metadata = reader.open(&cli.input)?;
    if let Some(fps) = cli.fps {
        log::info!("Overriding container frame rate {:.2} with {fps}", metadata.fps);
        metadata = metadata.with_fps(fps);
    }

    let (writer, destination) = build_writer(&cli)?;
    let detector = JsonlDetectionProvider::open(&cli.annotations)?;

    let total = match cli.max_frames {
        Some(limit) if metadata.total_frames > 0 => metadata.total_frames.min(limit),
        Some(limit) => limit,
        None => metadata.total_frames,
    };
    let progress: Box<dyn Fn(usize, usize) -> bool + Send> = Box::new(move |current, _| {
        if total > 0 {
            eprint!("\rProcessing frame {current}/{total}");
        } else {
            eprint!("\rProcessing frame {current}");
        }
        true
    });

    let mut use_case = TrackObjectsUseCase::new(
        reader,
        writer,
        Box::new(detector),
        Box::new(TrajectoryAnnotator::default()),
        Box::new(ThreadedPipelineExecutor::new()),
        ledger_options,
        cli.max_frames,
        Some(Box::new(StdoutPipelineLogger::default())),
        Some(progress),
        None,
    );
    let report = use_case.execute(&metadata, &destination)?;
    eprintln!();
    log::info!("Output written to {}", destination.display());

    report_writer(&cli.report_format)?.write(&cli.report, &report)?;
    log::info!("Report written to {}", cli.report.display());
    print!("{report}");
    Ok(())
}

/// Picks the output sink and the path it writes to.
fn build_writer(
    cli: &Cli,
) -> Result<(Box<dyn VideoWriter>, PathBuf), Box<dyn std::error::Error>> {
    if let Some(dir) = &cli.frames_dir {
        return Ok((Box::new(ImageSequenceWriter::new()), dir.clone()));
    }
    let output = cli
        .output
        .clone()
        .ok_or("Output file is required unless --frames-dir is used")?;
    let writer = match &cli.codec {
        Some(name) => FfmpegWriter::new().with_codec(name.as_str()),
        None => FfmpegWriter::new(),
    };
    Ok((Box::new(writer), output))
}

fn report_writer(format: &str) -> Result<Box<dyn ReportWriter>, Box<dyn std::error::Error>> {
    match format {
        "text" => Ok(Box::new(TextReportWriter::new())),
        "json" => Ok(Box::new(JsonReportWriter::new())),
        other => Err(format!("Report format must be 'text' or 'json', got '{other}'").into()),
    }
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.input.exists() {
        return Err(format!("Input file not found: {}", cli.input.display()).into());
    }
    if !cli.annotations.exists() {
        return Err(format!("Annotation file not found: {}", cli.annotations.display()).into());
    }
    match (&cli.output, &cli.frames_dir) {
        (None, None) => return Err("Output file is required unless --frames-dir is used".into()),
        (Some(_), Some(_)) => return Err("OUTPUT and --frames-dir are mutually exclusive".into()),
        _ => {}
    }
    if let Some(output) = &cli.output {
        if same_file(output, &cli.input) {
            return Err("Output must not overwrite the input video".into());
        }
    }
    if let Some(fps) = cli.fps {
        if !(fps.is_finite() && fps > 0.0) {
            return Err(format!("Frame rate must be positive, got {fps}").into());
        }
    }
    if cli.max_frames == Some(0) {
        return Err("--max-frames must be at least 1".into());
    }
    report_writer(&cli.report_format)?;
    cli.dwell_policy.parse::<DwellPolicy>()?;
    Ok(())
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
