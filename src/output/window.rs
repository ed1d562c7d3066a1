use super::video_writer::rgb_to_bgr_mat;
use super::Preview;
use crate::error::MotionError;
use anyhow::{Context, Result};
use image::RgbImage;
use opencv::highgui;

/// Live preview in an OpenCV HighGUI window
pub struct HighGuiWindow {
    name: String,
    key_poll_ms: i32,
}

impl HighGuiWindow {
    pub fn new(name: &str, key_poll_ms: i32) -> Result<Self> {
        highgui::named_window(name, highgui::WINDOW_AUTOSIZE)
            .with_context(|| format!("Failed to create window '{}'", name))?;

        Ok(Self {
            name: name.to_string(),
            key_poll_ms,
        })
    }
}

impl Preview for HighGuiWindow {
    fn show(&mut self, frame: &RgbImage) -> Result<()> {
        let mat = rgb_to_bgr_mat(frame)?;
        highgui::imshow(&self.name, &mat).context("Failed to display frame")?;
        Ok(())
    }

    fn key_pressed(&mut self) -> Result<bool> {
        let key = highgui::wait_key(self.key_poll_ms).map_err(MotionError::from)?;
        Ok(key >= 0)
    }
}

impl Drop for HighGuiWindow {
    fn drop(&mut self) {
        if let Err(e) = highgui::destroy_all_windows() {
            tracing::warn!("Failed to close preview window: {}", e);
        }
    }
}
