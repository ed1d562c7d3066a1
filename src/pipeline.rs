use crate::capture::FrameSource;
use crate::detection::MotionDetector;
use crate::output::{OutputSink, Preview};
use anyhow::{Context, Result};
use std::time::{Duration, Instant};

/// Frames between two timing reports
const STATS_INTERVAL: u64 = 30;

/// Why the frame loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The source ran out of frames
    EndOfStream,
    /// The source failed to deliver a frame; handled like end of stream
    ReadFailure,
    /// A key was pressed in the preview
    KeyPress,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub frames: u64,
    pub boxes: u64,
    pub stop_reason: StopReason,
}

#[derive(Default)]
struct FrameStats {
    frames: u64,
    read: Duration,
    detect: Duration,
    output: Duration,
}

impl FrameStats {
    fn log(&self) {
        let per_frame = |total: Duration| total.as_secs_f64() * 1000.0 / self.frames as f64;
        let read_ms = per_frame(self.read);
        let detect_ms = per_frame(self.detect);
        let output_ms = per_frame(self.output);
        let total_ms = read_ms + detect_ms + output_ms;

        tracing::info!(
            "Frame {}: read={:.1}ms, detect={:.1}ms, output={:.1}ms, total={:.1}ms, fps={:.1}",
            self.frames,
            read_ms,
            detect_ms,
            output_ms,
            total_ms,
            1000.0 / total_ms
        );
    }
}

/// Read, detect, display and write frames until the source ends or a key is pressed
///
/// The output is finished before returning, whatever ended the loop. Errors
/// from detection, display or writing abort the run.
pub fn run_pipeline<S, O, P>(
    source: &mut S,
    detector: &mut MotionDetector,
    output: &mut O,
    preview: &mut P,
) -> Result<RunSummary>
where
    S: FrameSource + ?Sized,
    O: OutputSink + ?Sized,
    P: Preview + ?Sized,
{
    let mut stats = FrameStats::default();
    let mut boxes = 0u64;

    tracing::info!("Starting main pipeline loop");
    tracing::info!("Press any key in the preview window to stop");

    let stop_reason = loop {
        let read_start = Instant::now();
        let frame = match source.read_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                tracing::info!("End of video stream");
                break StopReason::EndOfStream;
            }
            Err(e) => {
                tracing::warn!("Failed to read frame from video source: {:#}", e);
                break StopReason::ReadFailure;
            }
        };
        stats.read += read_start.elapsed();

        let detect_start = Instant::now();
        let detection = detector
            .process(frame)
            .context("Failed to process frame")?;
        stats.detect += detect_start.elapsed();

        if !detection.boxes.is_empty() {
            tracing::debug!(
                "Frame {}: {} moving regions {:?}",
                stats.frames,
                detection.boxes.len(),
                detection.boxes
            );
        }

        let output_start = Instant::now();
        preview.show(&detection.frame)?;
        output
            .write_frame(&detection.frame)
            .context("Failed to write frame")?;
        stats.output += output_start.elapsed();

        stats.frames += 1;
        boxes += detection.boxes.len() as u64;

        if stats.frames % STATS_INTERVAL == 0 {
            stats.log();
        }

        if preview.key_pressed()? {
            tracing::info!("Key pressed, stopping");
            break StopReason::KeyPress;
        }
    };

    output.finish().context("Failed to close output")?;

    tracing::info!(
        "Processed {} frames, {} boxes drawn ({:?})",
        stats.frames,
        boxes,
        stop_reason
    );

    Ok(RunSummary {
        frames: stats.frames,
        boxes,
        stop_reason,
    })
}
