use image::Rgb;

/// Downsampling applied to both frame dimensions before detection
pub const SCALING_FACTOR: f64 = 0.75;

/// Learning rate passed to the background model on every frame
pub const LEARNING_RATE: f64 = 0.01;

/// Number of frames the background model remembers
pub const HISTORY: u32 = 500;

/// Squared Mahalanobis distance above which a pixel is foreground
pub const VAR_THRESHOLD: f32 = 16.0;

pub const DETECT_SHADOWS: bool = true;

/// Contours enclosing less than this area (scaled pixels) are noise
pub const MIN_CONTOUR_AREA: f64 = 100.0;

pub const BOX_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
pub const BOX_THICKNESS: u32 = 2;

/// Output codec (Motion JPEG)
pub const FOURCC: [char; 4] = ['M', 'J', 'P', 'G'];

pub const WINDOW_NAME: &str = "Video feed";

/// Delay used when polling the preview window for a key press
pub const KEY_POLL_MS: i32 = 1;

/// Parameters of the per-frame detection chain
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    pub scaling_factor: f64,
    pub learning_rate: f64,
    pub history: u32,
    pub var_threshold: f32,
    pub detect_shadows: bool,
    pub min_contour_area: f64,
    pub box_color: Rgb<u8>,
    pub box_thickness: u32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            scaling_factor: SCALING_FACTOR,
            learning_rate: LEARNING_RATE,
            history: HISTORY,
            var_threshold: VAR_THRESHOLD,
            detect_shadows: DETECT_SHADOWS,
            min_contour_area: MIN_CONTOUR_AREA,
            box_color: BOX_COLOR,
            box_thickness: BOX_THICKNESS,
        }
    }
}

impl DetectorConfig {
    /// Dimensions frames are resized to before detection
    pub fn scaled_dimensions(&self, width: u32, height: u32) -> (u32, u32) {
        crate::detection::scaled_dimensions(width, height, self.scaling_factor)
    }
}

/// Parameters of the output video and preview window
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub fourcc: [char; 4],
    pub window_name: String,
    pub key_poll_ms: i32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            fourcc: FOURCC,
            window_name: WINDOW_NAME.to_string(),
            key_poll_ms: KEY_POLL_MS,
        }
    }
}
