use super::OutputSink;
use crate::error::MotionError;
use anyhow::{bail, Context, Result};
use image::RgbImage;
use opencv::core::{self, Mat, Size};
use opencv::imgproc;
use opencv::prelude::*;
use opencv::videoio::VideoWriter;
use std::path::Path;

/// Video file written by OpenCV
///
/// Frames are encoded with the given codec at a fixed rate and size. If the
/// writer cannot be opened the sink still accepts frames and drops them,
/// which is how the backend itself behaves.
pub struct VideoFileSink {
    writer: VideoWriter,
    width: u32,
    height: u32,
    opened: bool,
    finished: bool,
}

impl VideoFileSink {
    pub fn create<P: AsRef<Path>>(
        path: P,
        fourcc: [char; 4],
        fps: f64,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        let path = path.as_ref();
        let codec: String = fourcc.iter().collect();
        tracing::info!(
            "Writing {} video to {} ({}x{} at {:.2} fps)",
            codec,
            path.display(),
            width,
            height,
            fps
        );

        let name = path
            .to_str()
            .with_context(|| format!("Output path {} is not valid UTF-8", path.display()))?;
        let code = VideoWriter::fourcc(fourcc[0], fourcc[1], fourcc[2], fourcc[3])
            .map_err(MotionError::from)?;
        let size = Size::new(width as i32, height as i32);

        let writer = VideoWriter::new(name, code, fps, size, true).map_err(MotionError::from)?;
        let opened = writer.is_opened().unwrap_or(false);
        if !opened {
            tracing::warn!(
                "Could not open {} for writing, frames will be dropped",
                path.display()
            );
        }

        Ok(Self {
            writer,
            width,
            height,
            opened,
            finished: false,
        })
    }

    fn release(&mut self) -> Result<()> {
        if !self.finished {
            self.finished = true;
            self.writer.release().map_err(MotionError::from)?;
            tracing::debug!("Output video released");
        }
        Ok(())
    }
}

/// Convert an RGB image to an 8-bit BGR matrix
pub(crate) fn rgb_to_bgr_mat(frame: &RgbImage) -> Result<Mat> {
    let (width, height) = frame.dimensions();
    let mut rgb = Mat::new_rows_cols_with_default(
        height as i32,
        width as i32,
        core::CV_8UC3,
        core::Scalar::all(0.0),
    )
    .map_err(MotionError::from)?;

    rgb.data_bytes_mut()
        .map_err(MotionError::from)?
        .copy_from_slice(frame.as_raw());

    let mut bgr = Mat::default();
    imgproc::cvt_color(&rgb, &mut bgr, imgproc::COLOR_RGB2BGR, 0)
        .context("Failed to convert frame to BGR")?;

    Ok(bgr)
}

impl OutputSink for VideoFileSink {
    fn write_frame(&mut self, frame: &RgbImage) -> Result<()> {
        if self.finished {
            bail!("Output video is already closed");
        }
        if !self.opened {
            return Ok(());
        }

        let mat = rgb_to_bgr_mat(frame)?;
        self.writer
            .write(&mat)
            .context("Failed to write frame to output video")?;

        Ok(())
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn finish(&mut self) -> Result<()> {
        self.release()
    }
}

impl Drop for VideoFileSink {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            tracing::warn!("Failed to release output video: {}", e);
        }
    }
}
