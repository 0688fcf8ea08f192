//! Learning sessions
//!
//! One [`LearningSession`] per active user drives the progression state
//! machine: it presents characters, evaluates submitted ink, applies rewards
//! and keeps session statistics. All mutation of a user's progress goes
//! through the session that owns the user.

pub mod controller;
pub mod phase;
pub mod rewards;
pub mod selection;
pub mod stats;

pub use controller::{LearningSession, SessionSnapshot};
pub use phase::SessionPhase;
pub use selection::{ProgressViews, Selection};
pub use stats::SessionStats;

use crate::audio::AudioDevice;
use crate::recognition::HandwritingRecognizer;
use crate::reference::ReferenceData;
use crate::speech::SpeechOutput;
use std::sync::Arc;
use std::time::Duration;

/// Evaluation pacing and statistics periods
///
/// Loaded from the settings table when a session starts.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionTimings {
    /// Upper bound on waiting for the recognizer
    pub recognizer_timeout: Duration,
    /// Quiet period after a submission before evaluating it
    pub evaluation_settle: Duration,
    /// Lowest score that triggers the fireworks signal
    pub fireworks_min_score: i64,
    /// Pause after the stroke order hint
    pub wrong_order_pause: Duration,
    /// Pause after speaking the pronunciation prompt
    pub pronunciation_pause: Duration,
    /// Pause after the reward phrase
    pub reward_pause: Duration,
    /// Pause before moving on to the next character
    pub advance_pause: Duration,
    /// Session clock refresh period
    pub stats_tick_interval: Duration,
    /// Learning time persistence period
    pub learning_time_flush: Duration,
}

impl Default for SessionTimings {
    fn default() -> Self {
        Self {
            recognizer_timeout: Duration::from_millis(5000),
            evaluation_settle: Duration::from_millis(1500),
            fireworks_min_score: 8,
            wrong_order_pause: Duration::from_millis(1500),
            pronunciation_pause: Duration::from_millis(4500),
            reward_pause: Duration::from_millis(1500),
            advance_pause: Duration::from_millis(1000),
            stats_tick_interval: Duration::from_secs(10),
            learning_time_flush: Duration::from_secs(60),
        }
    }
}

/// External collaborators a session talks to
#[derive(Clone)]
pub struct Collaborators {
    pub recognizer: Arc<dyn HandwritingRecognizer>,
    pub reference: Arc<dyn ReferenceData>,
    pub speech: Arc<dyn SpeechOutput>,
    pub audio: Arc<dyn AudioDevice>,
}
