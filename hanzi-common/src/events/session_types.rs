//! Session-related type definitions
//!
//! Supporting types for learning session state and reward accounting.

use serde::{Deserialize, Serialize};

/// Learning session phase
///
/// A session moves `Idle → AwaitingCharacterSelection → Presenting →
/// Evaluating → (Passed | Failed) → Presenting`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub enum SessionPhaseKind {
    /// Session not started
    Idle,
    /// Waiting for a character to be chosen
    AwaitingCharacterSelection,
    /// A character is on screen and accepting ink
    Presenting,
    /// Ink submitted, recognition and scoring in flight
    Evaluating,
    /// Evaluation passed, rewards being applied
    Passed,
    /// Evaluation failed, feedback shown
    Failed,
}

impl std::fmt::Display for SessionPhaseKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionPhaseKind::Idle => write!(f, "Idle"),
            SessionPhaseKind::AwaitingCharacterSelection => write!(f, "AwaitingCharacterSelection"),
            SessionPhaseKind::Presenting => write!(f, "Presenting"),
            SessionPhaseKind::Evaluating => write!(f, "Evaluating"),
            SessionPhaseKind::Passed => write!(f, "Passed"),
            SessionPhaseKind::Failed => write!(f, "Failed"),
        }
    }
}

/// Source of awarded points
///
/// Each pool has its own baseline: handwriting against the high score,
/// pronunciation against the best star rating.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PointPool {
    Writing,
    Pronunciation,
}

impl std::fmt::Display for PointPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PointPool::Writing => write!(f, "writing"),
            PointPool::Pronunciation => write!(f, "pronunciation"),
        }
    }
}

/// Microphone/speaker state of a session
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RecordingState {
    Idle,
    Recording,
    Playing,
}

impl std::fmt::Display for RecordingState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordingState::Idle => write!(f, "idle"),
            RecordingState::Recording => write!(f, "recording"),
            RecordingState::Playing => write!(f, "playing"),
        }
    }
}
