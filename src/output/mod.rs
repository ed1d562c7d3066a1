pub mod overlay;
#[cfg(feature = "opencv")]
mod video_writer;
#[cfg(feature = "opencv")]
mod window;

#[cfg(feature = "opencv")]
pub use video_writer::VideoFileSink;
#[cfg(feature = "opencv")]
pub use window::HighGuiWindow;

use anyhow::Result;
use image::RgbImage;

/// Trait for output destinations
pub trait OutputSink {
    /// Append a frame to the output
    fn write_frame(&mut self, frame: &RgbImage) -> Result<()>;

    /// Get the expected output resolution
    fn resolution(&self) -> (u32, u32);

    /// Flush and close the output; writing afterwards is an error
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Trait for live display of processed frames
pub trait Preview {
    /// Show a frame
    fn show(&mut self, frame: &RgbImage) -> Result<()>;

    /// Poll for a key press; also paces the display
    fn key_pressed(&mut self) -> Result<bool>;
}

/// Preview that displays nothing and never sees a key press
#[derive(Debug, Default)]
pub struct Headless;

impl Preview for Headless {
    fn show(&mut self, _frame: &RgbImage) -> Result<()> {
        Ok(())
    }

    fn key_pressed(&mut self) -> Result<bool> {
        Ok(false)
    }
}
