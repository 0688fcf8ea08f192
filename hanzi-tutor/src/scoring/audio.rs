//! Pronunciation scoring from signal features
//!
//! A heuristic stand-in for speech recognition: loudness, clip length,
//! pauses and a clear articulation peak earn up to three stars. The target
//! character is accepted for future use but does not affect the rating.

use tracing::debug;

/// Capture sample rate (mono, 16-bit)
pub const SAMPLE_RATE: u32 = 16_000;

/// Normalized amplitude below which a sample counts as silence
const SILENCE_THRESHOLD: f32 = 0.02;

const MAX_STARS: i64 = 3;

/// Features extracted from one clip
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioFeatures {
    /// Clip length in seconds
    pub duration: f32,
    /// Mean absolute amplitude (0.0-1.0)
    pub avg_energy: f32,
    /// Peak absolute amplitude (0.0-1.0)
    pub peak_energy: f32,
    /// Share of samples below the silence threshold
    pub silence_ratio: f32,
}

impl AudioFeatures {
    /// Extract features; None for an empty clip
    pub fn from_samples(samples: &[i16]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        let mut total = 0.0f64;
        let mut peak = 0.0f32;
        let mut silent = 0usize;

        for &sample in samples {
            let level = (f32::from(sample) / 32768.0).abs();
            total += f64::from(level);
            peak = peak.max(level);
            if level < SILENCE_THRESHOLD {
                silent += 1;
            }
        }

        let count = samples.len();
        Some(Self {
            duration: count as f32 / SAMPLE_RATE as f32,
            avg_energy: (total / count as f64) as f32,
            peak_energy: peak,
            silence_ratio: silent as f32 / count as f32,
        })
    }

    /// Star rating for these features
    pub fn stars(&self) -> i64 {
        if self.avg_energy < 0.01 {
            return 0;
        }

        let mut score = 0;

        if self.avg_energy >= 0.05 {
            score += 2;
        } else if self.avg_energy >= 0.03 {
            score += 1;
        }

        if self.duration < 0.3 || self.duration > 4.0 {
            score -= 1;
        } else if (0.5..=2.0).contains(&self.duration) {
            score += 1;
        }

        if self.silence_ratio > 0.7 {
            score -= 1;
        }

        if self.peak_energy > 0.3 {
            score += 1;
        }

        score.clamp(0, MAX_STARS)
    }
}

/// Rate a 16 kHz mono clip, 0 to 3 stars
pub fn assess(samples: &[i16], target: &str) -> i64 {
    let Some(features) = AudioFeatures::from_samples(samples) else {
        debug!("Empty clip for '{}'", target);
        return 0;
    };

    let stars = features.stars();
    debug!(
        "Clip for '{}': {:.2}s avg {:.3} peak {:.3} silence {:.2} -> {} stars",
        target,
        features.duration,
        features.avg_energy,
        features.peak_energy,
        features.silence_ratio,
        stars
    );
    stars
}
