//! Scoring engines
//!
//! - `stroke`: handwriting quality (0-10) against reference medians
//! - `audio`: pronunciation heuristic (0-3 stars) from raw PCM features

pub mod audio;
pub mod stroke;

pub use audio::{assess, AudioFeatures, SAMPLE_RATE};
pub use stroke::{is_pass, StrokeParams, StrokeScore, StrokeScorer};
