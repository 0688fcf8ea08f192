//! Event types for the tutor event system
//!
//! Provides shared event definitions and the EventBus used to notify the UI
//! collaborator. The core never pushes rendering decisions; it publishes what
//! changed and the subscriber decides whether to re-render.

mod session_types;

pub use session_types::{PointPool, RecordingState, SessionPhaseKind};

use crate::db::User;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Tutor event types
///
/// Events are broadcast via EventBus and can be serialized for SSE transmission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TutorEvent {
    /// Session phase changed
    ///
    /// Triggers:
    /// - UI: enable/disable the writing pad, show spinners
    SessionPhaseChanged {
        user_id: i64,
        phase: SessionPhaseKind,
        timestamp: DateTime<Utc>,
    },

    /// A character is now on screen
    ///
    /// Triggers:
    /// - UI: draw practice grid, restore history ink
    CharacterPresented {
        user_id: i64,
        character_id: String,
        /// Re-practising an already mastered character
        review: bool,
        /// Last persisted ink for this character (serialized), if any
        history_ink: Option<String>,
        timestamp: DateTime<Utc>,
    },

    /// Every character of the grade has been exhausted
    AllCharactersComplete {
        user_id: i64,
        grade: i64,
        timestamp: DateTime<Utc>,
    },

    /// Handwriting evaluation finished for the current submission
    EvaluationCompleted {
        user_id: i64,
        character_id: String,
        score: i64,
        wrong_order: bool,
        passed: bool,
        timestamp: DateTime<Utc>,
    },

    /// Pronunciation clip rated
    PronunciationAssessed {
        user_id: i64,
        character_id: String,
        stars: i64,
        timestamp: DateTime<Utc>,
    },

    /// Points were added to the user's total
    PointsAwarded {
        user_id: i64,
        pool: PointPool,
        delta: i64,
        total_points: i64,
        timestamp: DateTime<Utc>,
    },

    /// User-facing feedback text
    Feedback {
        user_id: i64,
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// Celebration overlay toggle
    Fireworks {
        user_id: i64,
        visible: bool,
        timestamp: DateTime<Utc>,
    },

    /// Observed user row changed
    UserChanged {
        user: User,
        timestamp: DateTime<Utc>,
    },

    /// Observed progress list changed (derived views recomputed)
    ProgressChanged {
        user_id: i64,
        /// Mastered characters, most recently modified first
        learned: Vec<String>,
        /// Not yet mastered characters, ordered by id
        pending: Vec<String>,
        daily_char_count: i64,
        timestamp: DateTime<Utc>,
    },

    /// Periodic session statistics
    ///
    /// NOTE: emitted every tick; learning time is persisted less often.
    StatsUpdated {
        user_id: i64,
        session_seconds: i64,
        total_learning_seconds: i64,
        timestamp: DateTime<Utc>,
    },

    /// Recording/playback state changed
    RecordingStateChanged {
        user_id: i64,
        state: RecordingState,
        timestamp: DateTime<Utc>,
    },

    /// Recent input levels while recording (0.0-1.0, oldest first)
    ///
    /// Lossy: receivers that lag simply miss windows.
    AmplitudeLevels {
        user_id: i64,
        levels: Vec<f32>,
    },
}

impl TutorEvent {
    /// Event type string for SSE `event:` field
    pub fn event_type(&self) -> &'static str {
        match self {
            TutorEvent::SessionPhaseChanged { .. } => "SessionPhaseChanged",
            TutorEvent::CharacterPresented { .. } => "CharacterPresented",
            TutorEvent::AllCharactersComplete { .. } => "AllCharactersComplete",
            TutorEvent::EvaluationCompleted { .. } => "EvaluationCompleted",
            TutorEvent::PronunciationAssessed { .. } => "PronunciationAssessed",
            TutorEvent::PointsAwarded { .. } => "PointsAwarded",
            TutorEvent::Feedback { .. } => "Feedback",
            TutorEvent::Fireworks { .. } => "Fireworks",
            TutorEvent::UserChanged { .. } => "UserChanged",
            TutorEvent::ProgressChanged { .. } => "ProgressChanged",
            TutorEvent::StatsUpdated { .. } => "StatsUpdated",
            TutorEvent::RecordingStateChanged { .. } => "RecordingStateChanged",
            TutorEvent::AmplitudeLevels { .. } => "AmplitudeLevels",
        }
    }

    /// User the event belongs to
    pub fn user_id(&self) -> i64 {
        match self {
            TutorEvent::SessionPhaseChanged { user_id, .. }
            | TutorEvent::CharacterPresented { user_id, .. }
            | TutorEvent::AllCharactersComplete { user_id, .. }
            | TutorEvent::EvaluationCompleted { user_id, .. }
            | TutorEvent::PronunciationAssessed { user_id, .. }
            | TutorEvent::PointsAwarded { user_id, .. }
            | TutorEvent::Feedback { user_id, .. }
            | TutorEvent::Fireworks { user_id, .. }
            | TutorEvent::ProgressChanged { user_id, .. }
            | TutorEvent::StatsUpdated { user_id, .. }
            | TutorEvent::RecordingStateChanged { user_id, .. }
            | TutorEvent::AmplitudeLevels { user_id, .. } => *user_id,
            TutorEvent::UserChanged { user, .. } => user.id,
        }
    }
}

/// Central event bus
///
/// Thin wrapper over a tokio broadcast channel. Slow subscribers lose the
/// oldest events rather than blocking publishers.
pub struct EventBus {
    tx: broadcast::Sender<TutorEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Arguments
    ///
    /// * `capacity` - Number of events to buffer before dropping old events
    ///
    /// # Examples
    ///
    /// ```
    /// use hanzi_common::events::EventBus;
    ///
    /// let event_bus = EventBus::new(256);
    /// assert_eq!(event_bus.capacity(), 256);
    /// ```
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<TutorEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: TutorEvent,
    ) -> Result<usize, broadcast::error::SendError<TutorEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    ///
    /// # Examples
    ///
    /// ```
    /// use hanzi_common::events::{EventBus, TutorEvent};
    ///
    /// let event_bus = EventBus::new(16);
    ///
    /// // Amplitude windows - OK if no one is listening
    /// event_bus.emit_lossy(TutorEvent::AmplitudeLevels {
    ///     user_id: 1,
    ///     levels: vec![0.1, 0.2],
    /// });
    /// ```
    pub fn emit_lossy(&self, event: TutorEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
