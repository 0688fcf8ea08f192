//! Input level window for the recording waveform
//!
//! Keeps the most recent levels in a fixed ring; new levels overwrite the
//! oldest once full.

use ringbuf::{traits::*, HeapRb};

/// Number of levels shown by the waveform
pub const AMPLITUDE_WINDOW: usize = 30;

/// Rolling window of input levels
pub struct AmplitudeMeter {
    levels: HeapRb<f32>,
}

impl AmplitudeMeter {
    pub fn new(capacity: usize) -> Self {
        Self {
            levels: HeapRb::new(capacity.max(1)),
        }
    }

    /// Add a level (clamped to 0.0-1.0), dropping the oldest when full
    pub fn push(&mut self, level: f32) {
        self.levels.push_overwrite(level.clamp(0.0, 1.0));
    }

    /// Current window, oldest first
    pub fn levels(&self) -> Vec<f32> {
        self.levels.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.levels.occupied_len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

impl Default for AmplitudeMeter {
    fn default() -> Self {
        Self::new(AMPLITUDE_WINDOW)
    }
}

/// Normalized RMS of one capture buffer
pub fn rms_level(buffer: &[i16]) -> f32 {
    if buffer.is_empty() {
        return 0.0;
    }
    let sum: f64 = buffer.iter().map(|&s| f64::from(s) * f64::from(s)).sum();
    let rms = (sum / buffer.len() as f64).sqrt();
    ((rms / 32768.0) as f32).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_drops_oldest() {
        let mut meter = AmplitudeMeter::new(3);
        for level in [0.1, 0.2, 0.3, 0.4, 0.5] {
            meter.push(level);
        }
        assert_eq!(meter.len(), 3);
        assert_eq!(meter.levels(), vec![0.3, 0.4, 0.5]);
    }

    #[test]
    fn test_default_window_is_thirty() {
        let mut meter = AmplitudeMeter::default();
        for i in 0..45 {
            meter.push(i as f32 / 100.0);
        }
        let levels = meter.levels();
        assert_eq!(levels.len(), AMPLITUDE_WINDOW);
        assert_eq!(levels[0], 0.15);
        assert!(!meter.is_empty());
    }

    #[test]
    fn test_levels_clamped() {
        let mut meter = AmplitudeMeter::new(2);
        meter.push(-1.0);
        meter.push(7.0);
        assert_eq!(meter.levels(), vec![0.0, 1.0]);
    }

    #[test]
    fn test_rms_level() {
        assert_eq!(rms_level(&[]), 0.0);
        assert_eq!(rms_level(&[0, 0, 0]), 0.0);

        let level = rms_level(&[16384, -16384, 16384, -16384]);
        assert!((level - 0.5).abs() < 1e-6);
    }
}
