//! Session phase state machine
//!
//! ```text
//! Idle -> AwaitingCharacterSelection -> Presenting -> Evaluating -> Passed | Failed
//!                 ^                          ^            |  ^          |       |
//!                 +-------- (next) ----------+------------+  +-- ink ---+-------+
//! ```
//!
//! `Passed` doubles as the success latch: once an evaluation reaches it, no
//! further ink is accepted until the session moves on, so a success can be
//! handled only once.

use crate::error::{Error, Result};
use hanzi_common::events::SessionPhaseKind;

/// Current phase of a learning session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionPhase {
    kind: SessionPhaseKind,
}

impl SessionPhase {
    pub fn new() -> Self {
        Self {
            kind: SessionPhaseKind::Idle,
        }
    }

    pub fn kind(&self) -> SessionPhaseKind {
        self.kind
    }

    /// Ink submissions are accepted in this phase
    pub fn accepts_ink(&self) -> bool {
        matches!(
            self.kind,
            SessionPhaseKind::Presenting | SessionPhaseKind::Evaluating | SessionPhaseKind::Failed
        )
    }

    /// The learner may pick or skip characters in this phase
    pub fn accepts_selection(&self) -> bool {
        !matches!(self.kind, SessionPhaseKind::Idle | SessionPhaseKind::Passed)
    }

    /// Move to `to`, rejecting transitions the machine does not allow
    pub fn transition(&mut self, to: SessionPhaseKind) -> Result<()> {
        if !can_transition(self.kind, to) {
            return Err(Error::InvalidState(format!(
                "cannot move from {} to {}",
                self.kind, to
            )));
        }
        self.kind = to;
        Ok(())
    }
}

impl Default for SessionPhase {
    fn default() -> Self {
        Self::new()
    }
}

/// Allowed phase transitions
pub fn can_transition(from: SessionPhaseKind, to: SessionPhaseKind) -> bool {
    use SessionPhaseKind::*;

    match (from, to) {
        // Stopping is always allowed
        (_, Idle) => true,
        (Idle, AwaitingCharacterSelection) => true,
        (AwaitingCharacterSelection | Presenting | Failed | Passed, AwaitingCharacterSelection) => true,
        (AwaitingCharacterSelection | Presenting | Failed | Passed, Presenting) => true,
        // Empty resubmission cancels back to ready
        (Evaluating, Presenting) => true,
        (Presenting | Evaluating | Failed, Evaluating) => true,
        (Evaluating, Passed | Failed) => true,
        _ => false,
    }
}
