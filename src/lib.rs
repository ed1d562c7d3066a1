//! Motion detection on video files: background subtraction, mask cleanup,
//! contour filtering and bounding-box rendering.

pub mod capture;
pub mod config;
pub mod detection;
pub mod error;
pub mod output;
pub mod pipeline;

pub use config::{DetectorConfig, OutputConfig};
pub use detection::{BackgroundSubtractor, BoundingBox, Mask, MotionDetector};
pub use error::MotionError;
pub use pipeline::{run_pipeline, RunSummary, StopReason};
