use super::{FrameSource, SourceProperties};
use crate::error::MotionError;
use anyhow::{Context, Result};
use image::RgbImage;
use opencv::core::Mat;
use opencv::imgproc;
use opencv::prelude::*;
use opencv::videoio::{self, VideoCapture};
use std::path::Path;

/// Frames decoded from a video file by OpenCV
pub struct VideoFileSource {
    capture: VideoCapture,
    properties: SourceProperties,
}

impl VideoFileSource {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        tracing::info!("Opening video file {}", path.display());

        let open_error = || MotionError::SourceOpen {
            path: path.to_path_buf(),
        };

        let name = path.to_str().ok_or_else(open_error)?;
        let capture = match VideoCapture::from_file(name, videoio::CAP_ANY) {
            Ok(capture) => capture,
            Err(e) => {
                tracing::debug!("VideoCapture failed: {}", e);
                return Err(open_error().into());
            }
        };

        if !capture.is_opened().unwrap_or(false) {
            return Err(open_error().into());
        }

        let width = capture.get(videoio::CAP_PROP_FRAME_WIDTH)?;
        let height = capture.get(videoio::CAP_PROP_FRAME_HEIGHT)?;
        let fps = capture.get(videoio::CAP_PROP_FPS)?;

        let properties = SourceProperties {
            width: width as u32,
            height: height as u32,
            fps,
        };

        tracing::info!(
            "Video opened: {}x{} at {:.2} fps",
            properties.width,
            properties.height,
            properties.fps
        );

        Ok(Self {
            capture,
            properties,
        })
    }
}

/// Convert an 8-bit BGR matrix to an RGB image
fn bgr_mat_to_rgb(frame: &Mat) -> Result<RgbImage> {
    let mut rgb = Mat::default();
    imgproc::cvt_color(frame, &mut rgb, imgproc::COLOR_BGR2RGB, 0)
        .context("Failed to convert frame to RGB")?;

    let (width, height) = (rgb.cols() as u32, rgb.rows() as u32);
    let data = rgb.data_bytes().map_err(MotionError::from)?.to_vec();

    RgbImage::from_raw(width, height, data)
        .with_context(|| format!("Frame buffer does not match {}x{}", width, height))
}

impl FrameSource for VideoFileSource {
    fn read_frame(&mut self) -> Result<Option<RgbImage>> {
        let mut frame = Mat::default();

        let ok = self
            .capture
            .read(&mut frame)
            .map_err(MotionError::from)?;

        if !ok || frame.empty() {
            return Ok(None);
        }

        bgr_mat_to_rgb(&frame).map(Some)
    }

    fn properties(&self) -> SourceProperties {
        self.properties
    }
}

impl Drop for VideoFileSource {
    fn drop(&mut self) {
        if let Err(e) = self.capture.release() {
            tracing::warn!("Failed to release video source: {}", e);
        }
    }
}
