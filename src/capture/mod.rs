#[cfg(feature = "opencv")]
mod video_file;

#[cfg(feature = "opencv")]
pub use video_file::VideoFileSource;

use anyhow::Result;
use image::RgbImage;

/// Native properties of a frame source
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceProperties {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
}

/// Trait for video frame sources
pub trait FrameSource {
    /// Read the next frame
    ///
    /// Returns `Ok(None)` at end of stream and `Err` when the read fails.
    fn read_frame(&mut self) -> Result<Option<RgbImage>>;

    /// Native frame size and rate
    fn properties(&self) -> SourceProperties;
}
