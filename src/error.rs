use std::path::PathBuf;
use thiserror::Error;

/// Errors the detection pipeline distinguishes
#[derive(Debug, Error)]
pub enum MotionError {
    #[error("Failed to open video file {}", .path.display())]
    SourceOpen { path: PathBuf },

    #[error("mask is {}x{} but frame is {}x{}", .mask.0, .mask.1, .frame.0, .frame.1)]
    DimensionMismatch { frame: (u32, u32), mask: (u32, u32) },

    #[error("cannot process an empty {width}x{height} frame")]
    EmptyFrame { width: u32, height: u32 },

    #[error("background model storage is not contiguous")]
    ModelLayout,

    #[cfg(feature = "opencv")]
    #[error(transparent)]
    OpenCv(#[from] opencv::Error),
}
