use crate::error::MotionError;
use anyhow::Result;
use image::{imageops, RgbImage};

/// Compute `(floor(width * factor), floor(height * factor))`
pub fn scaled_dimensions(width: u32, height: u32, factor: f64) -> (u32, u32) {
    (
        (width as f64 * factor).floor() as u32,
        (height as f64 * factor).floor() as u32,
    )
}

/// Resizes incoming frames to the detection resolution
pub struct Preprocessor {
    target_width: u32,
    target_height: u32,
}

impl Preprocessor {
    pub fn new(target_width: u32, target_height: u32) -> Self {
        Self {
            target_width,
            target_height,
        }
    }

    /// Resize a frame to the target dimensions (bilinear)
    ///
    /// Frames that already have the target size are passed through untouched.
    pub fn resize(&self, frame: RgbImage) -> Result<RgbImage> {
        let _span = tracing::debug_span!("resize").entered();

        if self.target_width == 0 || self.target_height == 0 {
            return Err(MotionError::EmptyFrame {
                width: self.target_width,
                height: self.target_height,
            }
            .into());
        }

        if frame.dimensions() == (self.target_width, self.target_height) {
            return Ok(frame);
        }

        Ok(imageops::resize(
            &frame,
            self.target_width,
            self.target_height,
            imageops::FilterType::Triangle,
        ))
    }

    pub fn target_size(&self) -> (u32, u32) {
        (self.target_width, self.target_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn scaled_dimensions_round_down() {
        assert_eq!(scaled_dimensions(640, 480, 0.75), (480, 360));
        assert_eq!(scaled_dimensions(101, 99, 0.75), (75, 74));
        assert_eq!(scaled_dimensions(1, 1, 0.75), (0, 0));
    }

    #[test]
    fn resize_produces_target_dimensions() {
        let pre = Preprocessor::new(48, 36);
        let frame = RgbImage::from_pixel(64, 48, Rgb([10, 20, 30]));
        let resized = pre.resize(frame).unwrap();
        assert_eq!(resized.dimensions(), (48, 36));
        assert_eq!(*resized.get_pixel(20, 20), Rgb([10, 20, 30]));
    }

    #[test]
    fn matching_frame_is_untouched() {
        let pre = Preprocessor::new(8, 8);
        let mut frame = RgbImage::new(8, 8);
        frame.put_pixel(3, 4, Rgb([255, 0, 0]));
        let out = pre.resize(frame.clone()).unwrap();
        assert_eq!(out, frame);
    }

    #[test]
    fn zero_target_is_rejected() {
        let pre = Preprocessor::new(0, 0);
        let frame = RgbImage::new(1, 1);
        assert!(pre.resize(frame).is_err());
    }
}
