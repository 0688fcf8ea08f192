//! Stroke scoring engine
//!
//! Scores user ink against the recognizer's candidate list and the reference
//! medians of the expected character. Checks run from cheapest to most
//! nuanced:
//!
//! 1. recognition (empty list, expected glyph missing)
//! 2. stroke count gate (off by two or more)
//! 3. sampled geometry (start/mid/end of every stroke)
//! 4. completeness clamp and stroke order penalty
//!
//! Reference medians use a y-up coordinate space; user ink is y-down. The
//! transform constants are empirical and kept configurable.

use crate::ink::{Ink, Stroke};
use crate::reference::Median;
use hanzi_common::db::PASS_SCORE;
use rand::Rng;
use tracing::debug;

/// Score at which the random partial credit for an unrecognized glyph tops out
const UNRECOGNIZED_MAX_SCORE: i64 = 3;

/// Score for a stroke count that is off by two or more
const STROKE_COUNT_MISMATCH_SCORE: i64 = 4;

/// Score for a recognized glyph before geometry bonuses
const BASE_SCORE: i64 = 6;

/// Highest score while strokes are still missing
const INCOMPLETE_MAX_SCORE: i64 = 5;

const MAX_SCORE: i64 = 10;

/// Geometry constants and quality thresholds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeParams {
    /// Size of the reference coordinate space
    pub coordinate_space: f64,
    /// Vertical compensation applied after flipping the reference y axis
    pub vertical_offset: f64,
    /// First-point deviation above which a stroke counts as out of order
    pub order_threshold: f64,
    /// Mean deviation below which the bonus is +3
    pub quality_excellent: f64,
    /// Mean deviation below which the bonus is +2
    pub quality_good: f64,
    /// Mean deviation below which the bonus is +1
    pub quality_fair: f64,
}

impl Default for StrokeParams {
    fn default() -> Self {
        Self {
            coordinate_space: 1024.0,
            vertical_offset: 120.0,
            order_threshold: 300.0,
            quality_excellent: 80.0,
            quality_good: 150.0,
            quality_fair: 250.0,
        }
    }
}

/// Handwriting score with stroke order verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrokeScore {
    /// 0 through 10
    pub score: i64,
    pub wrong_order: bool,
}

impl StrokeScore {
    fn new(score: i64, wrong_order: bool) -> Self {
        Self { score, wrong_order }
    }

    pub fn is_pass(&self) -> bool {
        is_pass(self.score)
    }
}

/// Pass threshold shared with mastery
pub fn is_pass(score: i64) -> bool {
    score >= PASS_SCORE
}

/// Sum of sampled deviations for one comparison
#[derive(Debug, Default)]
struct Deviation {
    total: f64,
    samples: usize,
    wrong_order: bool,
}

impl Deviation {
    fn mean(&self) -> Option<f64> {
        (self.samples > 0).then(|| self.total / self.samples as f64)
    }
}

/// Stroke scoring engine
#[derive(Debug, Clone, Default)]
pub struct StrokeScorer {
    params: StrokeParams,
}

impl StrokeScorer {
    pub fn new(params: StrokeParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &StrokeParams {
        &self.params
    }

    /// Score a submission
    ///
    /// `candidates` is the recognizer's ranked output, best first. `medians`
    /// is None when the character has no reference geometry; scoring then
    /// skips the count gate and geometry stages.
    pub fn score(
        &self,
        expected: &str,
        candidates: &[String],
        ink: &Ink,
        medians: Option<&[Median]>,
    ) -> StrokeScore {
        self.score_with_rng(expected, candidates, ink, medians, &mut rand::thread_rng())
    }

    /// Score with a caller-supplied random source (partial credit)
    pub fn score_with_rng<R: Rng + ?Sized>(
        &self,
        expected: &str,
        candidates: &[String],
        ink: &Ink,
        medians: Option<&[Median]>,
        rng: &mut R,
    ) -> StrokeScore {
        if candidates.is_empty() {
            return StrokeScore::new(0, false);
        }

        if !candidates.iter().any(|c| c == expected) {
            let score = rng.gen_range(0..=UNRECOGNIZED_MAX_SCORE);
            debug!("'{}' not among {:?}, partial credit {}", expected, candidates, score);
            return StrokeScore::new(score, false);
        }

        let user_count = ink.stroke_count();
        let reference_count = medians.map_or(0, |m| m.len());

        if reference_count > 0 && user_count.abs_diff(reference_count) >= 2 {
            debug!(
                "Stroke count mismatch for '{}': wrote {}, expected {}",
                expected, user_count, reference_count
            );
            return StrokeScore::new(STROKE_COUNT_MISMATCH_SCORE, false);
        }

        let deviation = match medians {
            Some(medians) if user_count == medians.len() => self.measure(&ink.strokes, medians),
            _ => Deviation::default(),
        };

        let mut score = BASE_SCORE;

        if let Some(mean) = deviation.mean() {
            let bonus = self.quality_bonus(mean);
            debug!("Mean deviation {:.1} over {} samples, bonus {}", mean, deviation.samples, bonus);
            score += bonus;
        }

        if candidates[0] == expected && score < MAX_SCORE {
            score += 1;
        }

        if reference_count > 0 && user_count < reference_count {
            score = score.min(INCOMPLETE_MAX_SCORE);
        }

        if deviation.wrong_order {
            score = (score - 1).max(0);
        }

        StrokeScore::new(score.clamp(0, MAX_SCORE), deviation.wrong_order)
    }

    fn quality_bonus(&self, mean: f64) -> i64 {
        if mean < self.params.quality_excellent {
            3
        } else if mean < self.params.quality_good {
            2
        } else if mean < self.params.quality_fair {
            1
        } else {
            0
        }
    }

    /// Compare sampled points of each stroke pair
    fn measure(&self, strokes: &[Stroke], medians: &[Median]) -> Deviation {
        let mut deviation = Deviation::default();

        for (stroke, median) in strokes.iter().zip(medians) {
            let user_points: Vec<(f64, f64)> = sample(&stroke.points)
                .into_iter()
                .map(|p| (f64::from(p.x), f64::from(p.y)))
                .collect();
            let reference_points: Vec<(f64, f64)> = sample(median)
                .into_iter()
                .map(|p| self.to_ink_space(*p))
                .collect();

            for (idx, (user, reference)) in user_points.iter().zip(&reference_points).enumerate() {
                let dist = ((user.0 - reference.0).powi(2) + (user.1 - reference.1).powi(2)).sqrt();
                deviation.total += dist;
                deviation.samples += 1;

                if idx == 0 && dist > self.params.order_threshold {
                    deviation.wrong_order = true;
                }
            }
        }

        deviation
    }

    /// Map a reference point (y up) into ink space (y down)
    fn to_ink_space(&self, point: [f64; 2]) -> (f64, f64) {
        let x = point[0];
        let y = (self.params.coordinate_space - point[1]) - self.params.vertical_offset;
        (x, y)
    }
}

/// Start, middle and end of a sequence (start and end below three items)
fn sample<T>(points: &[T]) -> Vec<&T> {
    match points.len() {
        0 => Vec::new(),
        n if n >= 3 => vec![&points[0], &points[n / 2], &points[n - 1]],
        n => vec![&points[0], &points[n - 1]],
    }
}
