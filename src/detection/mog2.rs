use super::{BackgroundSubtractor, Mask};
use crate::error::MotionError;
use anyhow::Result;
use image::{GrayImage, RgbImage};
use ndarray::{Array2, Array3};

/// Maximum number of Gaussian modes kept per pixel
const MAX_MODES: usize = 5;
/// Fraction of the total weight that is considered background
const BACKGROUND_RATIO: f32 = 0.9;
/// Squared distance under which a sample updates an existing mode
const VAR_THRESHOLD_GEN: f32 = 9.0;
const VAR_INIT: f32 = 15.0;
const VAR_MIN: f32 = 4.0;
const VAR_MAX: f32 = 5.0 * VAR_INIT;
/// Prior driving unused modes towards zero weight
const COMPLEXITY_REDUCTION: f32 = 0.05;
/// Darkest brightness ratio still classified as shadow
const SHADOW_TAU: f32 = 0.5;

pub const BACKGROUND_VALUE: u8 = 0;
pub const SHADOW_VALUE: u8 = 127;
pub const FOREGROUND_VALUE: u8 = 255;

#[derive(Debug, Clone, Copy, Default)]
struct Gaussian {
    weight: f32,
    variance: f32,
    mean: [f32; 3],
}

#[derive(Debug, Clone, Copy)]
struct Thresholds {
    var_threshold: f32,
    detect_shadows: bool,
}

/// Adaptive Gaussian mixture background model (Zivkovic's MOG2)
///
/// Every pixel is described by up to five Gaussians over its RGB value. Modes
/// are kept sorted by weight; the heaviest ones that together account for
/// 90% of the weight form the background. A sample close enough to one of
/// those is background, a sample that looks like a darker copy of the
/// background is a shadow, anything else is foreground.
///
/// The model is created lazily from the first frame and rebuilt whenever the
/// frame size changes.
pub struct Mog2 {
    history: u32,
    var_threshold: f32,
    detect_shadows: bool,

    // (height, width, MAX_MODES), sorted by descending weight per pixel
    modes: Array3<Gaussian>,
    // (height, width)
    modes_used: Array2<u8>,
    frames_seen: u64,
}

impl Mog2 {
    /// Create an empty model
    ///
    /// # Arguments
    /// * `history` - Frames remembered when the learning rate is automatic
    /// * `var_threshold` - Squared Mahalanobis distance separating background from foreground
    /// * `detect_shadows` - Mark shadows with [`SHADOW_VALUE`] instead of foreground
    pub fn new(history: u32, var_threshold: f32, detect_shadows: bool) -> Self {
        Self {
            history,
            var_threshold,
            detect_shadows,
            modes: Array3::from_elem((0, 0, MAX_MODES), Gaussian::default()),
            modes_used: Array2::zeros((0, 0)),
            frames_seen: 0,
        }
    }

    fn init_model(&mut self, width: u32, height: u32) {
        tracing::debug!("Initializing background model for {}x{}", width, height);

        let (h, w) = (height as usize, width as usize);
        self.modes = Array3::from_elem((h, w, MAX_MODES), Gaussian::default());
        self.modes_used = Array2::zeros((h, w));
        self.frames_seen = 0;
    }

    /// Negative rates select `1 / min(2 * frames, history)`; the first frame
    /// after (re)initialisation always uses the automatic rate.
    fn effective_learning_rate(&self, learning_rate: f64) -> f32 {
        if learning_rate >= 0.0 && self.frames_seen > 1 {
            learning_rate as f32
        } else {
            let frames = (2 * self.frames_seen).min(self.history.max(1) as u64).max(1);
            1.0 / frames as f32
        }
    }
}

impl BackgroundSubtractor for Mog2 {
    fn apply(&mut self, frame: &RgbImage, learning_rate: f64) -> Result<Mask> {
        let _span = tracing::debug_span!("mog2_apply").entered();

        let (width, height) = frame.dimensions();
        if width == 0 || height == 0 {
            return Err(MotionError::EmptyFrame { width, height }.into());
        }

        if self.modes_used.dim() != (height as usize, width as usize) {
            self.init_model(width, height);
        }

        self.frames_seen += 1;
        let alpha = self.effective_learning_rate(learning_rate);
        let thresholds = Thresholds {
            var_threshold: self.var_threshold,
            detect_shadows: self.detect_shadows,
        };

        let mut mask = GrayImage::new(width, height);
        let modes = self
            .modes
            .as_slice_mut()
            .ok_or(MotionError::ModelLayout)?;

        for (((pixel, gaussians), used), out) in frame
            .pixels()
            .zip(modes.chunks_exact_mut(MAX_MODES))
            .zip(self.modes_used.iter_mut())
            .zip(mask.iter_mut())
        {
            let sample = [pixel[0] as f32, pixel[1] as f32, pixel[2] as f32];
            *out = update_pixel(thresholds, sample, gaussians, used, alpha);
        }

        Ok(mask)
    }

    fn reset_state(&mut self) {
        tracing::info!("Resetting background model");
        self.modes = Array3::from_elem((0, 0, MAX_MODES), Gaussian::default());
        self.modes_used = Array2::zeros((0, 0));
        self.frames_seen = 0;
    }
}

/// Update one pixel's mixture with `sample` and classify it
fn update_pixel(
    thresholds: Thresholds,
    sample: [f32; 3],
    modes: &mut [Gaussian],
    used: &mut u8,
    alpha: f32,
) -> u8 {
    let alpha1 = 1.0 - alpha;
    let prune = -alpha * COMPLEXITY_REDUCTION;

    let mut background = false;
    let mut fits = false;
    let mut total_weight = 0.0f32;
    let mut n = *used as usize;

    let mut mode = 0;
    while mode < n {
        let mut weight = alpha1 * modes[mode].weight + prune;
        let mut swaps = 0;

        if !fits {
            let variance = modes[mode].variance;
            let mean = modes[mode].mean;
            let diff = [
                mean[0] - sample[0],
                mean[1] - sample[1],
                mean[2] - sample[2],
            ];
            let dist2: f32 = diff.iter().map(|d| d * d).sum();

            if total_weight < BACKGROUND_RATIO && dist2 < thresholds.var_threshold * variance {
                background = true;
            }

            if dist2 < VAR_THRESHOLD_GEN * variance {
                fits = true;

                weight += alpha;
                let k = alpha / weight;
                for (m, d) in modes[mode].mean.iter_mut().zip(diff) {
                    *m -= k * d;
                }
                modes[mode].variance = (variance + k * (dist2 - variance)).clamp(VAR_MIN, VAR_MAX);

                // keep the heavier modes first
                let mut i = mode;
                while i > 0 && weight >= modes[i - 1].weight {
                    modes.swap(i, i - 1);
                    swaps += 1;
                    i -= 1;
                }
            }
        }

        if weight < -prune {
            weight = 0.0;
            n -= 1;
        }

        modes[mode - swaps].weight = weight;
        total_weight += weight;
        mode += 1;
    }

    if total_weight > 0.0 {
        let norm = 1.0 / total_weight;
        for g in &mut modes[..n] {
            g.weight *= norm;
        }
    }

    if !fits {
        let slot = if n == MAX_MODES {
            MAX_MODES - 1
        } else {
            n += 1;
            n - 1
        };

        if n == 1 {
            modes[slot].weight = 1.0;
        } else {
            modes[slot].weight = alpha;
            for g in &mut modes[..n - 1] {
                g.weight *= alpha1;
            }
        }
        modes[slot].mean = sample;
        modes[slot].variance = VAR_INIT;

        let mut i = n - 1;
        while i > 0 && alpha >= modes[i - 1].weight {
            modes.swap(i, i - 1);
            i -= 1;
        }
    }

    *used = n as u8;

    if background {
        BACKGROUND_VALUE
    } else if thresholds.detect_shadows && is_shadow(thresholds, sample, &modes[..n]) {
        SHADOW_VALUE
    } else {
        FOREGROUND_VALUE
    }
}

/// A sample is a shadow when it is a uniformly darkened copy of one of the
/// background modes.
fn is_shadow(thresholds: Thresholds, sample: [f32; 3], modes: &[Gaussian]) -> bool {
    let mut total_weight = 0.0f32;

    for g in modes {
        let numerator: f32 = sample.iter().zip(g.mean).map(|(s, m)| s * m).sum();
        let denominator: f32 = g.mean.iter().map(|m| m * m).sum();

        if denominator == 0.0 {
            return false;
        }

        if numerator <= denominator && numerator >= SHADOW_TAU * denominator {
            let a = numerator / denominator;
            let dist2a: f32 = sample
                .iter()
                .zip(g.mean)
                .map(|(s, m)| {
                    let d = a * m - s;
                    d * d
                })
                .sum();

            if dist2a < thresholds.var_threshold * g.variance * a * a {
                return true;
            }
        }

        total_weight += g.weight;
        if total_weight > BACKGROUND_RATIO {
            return false;
        }
    }

    false
}
