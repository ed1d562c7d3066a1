mod contours;
mod mog2;
mod morphology;
mod preprocess;

pub use contours::{accepted_boxes, approximate_simple, bounding_rect, contour_area, external_contours};
pub use mog2::{Mog2, BACKGROUND_VALUE, FOREGROUND_VALUE, SHADOW_VALUE};
pub use morphology::open_mask;
pub use preprocess::{scaled_dimensions, Preprocessor};

use crate::config::DetectorConfig;
use crate::error::MotionError;
use crate::output::overlay;
use anyhow::Result;
use image::{GrayImage, RgbImage};

/// Foreground mask: 0 = background, 127 = shadow, 255 = foreground
/// Dimensions match the frame it was computed from
pub type Mask = GrayImage;

/// Axis-aligned rectangle in scaled-frame pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn right(&self) -> i32 {
        self.x + self.width as i32 - 1
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height as i32 - 1
    }

    /// Whether `other` lies entirely inside this box
    pub fn contains(&self, other: &BoundingBox) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }
}

/// Trait for background models
pub trait BackgroundSubtractor {
    /// Update the model with `frame` and return its foreground mask
    ///
    /// # Arguments
    /// * `frame` - Input RGB frame
    /// * `learning_rate` - Model adaptation rate in [0, 1]; negative picks one automatically
    fn apply(&mut self, frame: &RgbImage, learning_rate: f64) -> Result<Mask>;

    /// Forget everything learned so far
    fn reset_state(&mut self) {}
}

/// Create the default background model (MOG2) for `config`
pub fn create_default_subtractor(config: &DetectorConfig) -> Box<dyn BackgroundSubtractor> {
    Box::new(Mog2::new(
        config.history,
        config.var_threshold,
        config.detect_shadows,
    ))
}

/// Result of running one frame through the detector
pub struct Detection {
    /// Resized frame with the boxes drawn on it
    pub frame: RgbImage,
    pub boxes: Vec<BoundingBox>,
}

/// The per-frame detection chain: resize, subtract, open, contours, filter, draw
pub struct MotionDetector {
    config: DetectorConfig,
    preprocessor: Preprocessor,
    subtractor: Box<dyn BackgroundSubtractor>,
}

impl MotionDetector {
    /// Build a detector for a source of `source_width` x `source_height`
    pub fn new(
        config: DetectorConfig,
        subtractor: Box<dyn BackgroundSubtractor>,
        source_width: u32,
        source_height: u32,
    ) -> Self {
        let (width, height) = config.scaled_dimensions(source_width, source_height);
        tracing::info!(
            "Detector: {}x{} -> {}x{}",
            source_width,
            source_height,
            width,
            height
        );

        Self {
            config,
            preprocessor: Preprocessor::new(width, height),
            subtractor,
        }
    }

    /// Detector with the default MOG2 model
    pub fn with_default_model(config: DetectorConfig, source_width: u32, source_height: u32) -> Self {
        let subtractor = create_default_subtractor(&config);
        Self::new(config, subtractor, source_width, source_height)
    }

    /// Dimensions of the frames this detector produces
    pub fn output_size(&self) -> (u32, u32) {
        self.preprocessor.target_size()
    }

    /// Resize `frame`, detect moving regions and draw their boxes onto it
    pub fn process(&mut self, frame: RgbImage) -> Result<Detection> {
        let mut frame = self.preprocessor.resize(frame)?;
        let boxes = self.detect(&frame)?;

        overlay::draw_boxes(
            &mut frame,
            &boxes,
            self.config.box_color,
            self.config.box_thickness,
        );

        Ok(Detection { frame, boxes })
    }

    /// Bounding boxes of the moving regions in an already resized frame
    pub fn detect(&mut self, frame: &RgbImage) -> Result<Vec<BoundingBox>> {
        let _span = tracing::debug_span!("detect").entered();

        let mask = self.subtractor.apply(frame, self.config.learning_rate)?;
        if mask.dimensions() != frame.dimensions() {
            return Err(MotionError::DimensionMismatch {
                frame: frame.dimensions(),
                mask: mask.dimensions(),
            }
            .into());
        }

        let mask = open_mask(&mask);
        Ok(accepted_boxes(&mask, self.config.min_contour_area))
    }
}
