use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use motion_boxes::capture::{FrameSource, VideoFileSource};
use motion_boxes::output::{Headless, HighGuiWindow, Preview, VideoFileSink};
use motion_boxes::{run_pipeline, DetectorConfig, MotionDetector, OutputConfig};
use std::path::PathBuf;
use std::process::ExitCode;

/// Exit status for usage and open errors (-1 as an unsigned byte)
const FAILURE_EXIT: u8 = 255;

#[derive(Parser, Debug)]
#[command(author, version, about = "Draw boxes around moving objects in a video", long_about = None)]
struct Args {
    /// Input video file
    path_to_video: PathBuf,

    /// Reserved; echoed at start-up and otherwise unused
    base_memory_address: String,

    /// Output video file (MJPG)
    output_video_path: PathBuf,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// Run without the preview window
    #[arg(long)]
    no_display: bool,
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => e.exit(),
            _ => {
                let _ = e.print();
                return ExitCode::from(FAILURE_EXIT);
            }
        },
    };

    // Initialize logging
    let log_level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    println!("Base Memory Address: {}", args.base_memory_address);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::from(FAILURE_EXIT)
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let mut source = VideoFileSource::open(&args.path_to_video)?;
    let properties = source.properties();

    let config = DetectorConfig::default();
    let output_config = OutputConfig::default();

    let mut detector = MotionDetector::with_default_model(config, properties.width, properties.height);
    let (width, height) = detector.output_size();

    let mut output = VideoFileSink::create(
        &args.output_video_path,
        output_config.fourcc,
        properties.fps,
        width,
        height,
    )
    .context("Failed to initialize output video")?;

    let mut preview: Box<dyn Preview> = if args.no_display {
        tracing::info!("Running without preview window");
        Box::new(Headless)
    } else {
        Box::new(
            HighGuiWindow::new(&output_config.window_name, output_config.key_poll_ms)
                .context("Failed to initialize preview window")?,
        )
    };

    let summary = run_pipeline(&mut source, &mut detector, &mut output, preview.as_mut())?;
    tracing::info!(
        "Done: {} frames written to {}",
        summary.frames,
        args.output_video_path.display()
    );

    Ok(())
}
