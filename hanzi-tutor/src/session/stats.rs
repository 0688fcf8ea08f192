//! Session statistics
//!
//! Pure bookkeeping over `Instant`s; the session's background task supplies
//! the clock. Learning time is flushed in whole seconds and the remainder
//! carries over to the next flush.

use hanzi_common::events::PointPool;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct SessionStats {
    started: Instant,
    last_flush: Instant,
    session_seconds: i64,
    writing_points: i64,
    pronunciation_points: i64,
}

impl SessionStats {
    pub fn new(now: Instant) -> Self {
        Self {
            started: now,
            last_flush: now,
            session_seconds: 0,
            writing_points: 0,
            pronunciation_points: 0,
        }
    }

    /// Refresh the elapsed session time, returning it in seconds
    pub fn tick(&mut self, now: Instant) -> i64 {
        self.session_seconds = now.saturating_duration_since(self.started).as_secs() as i64;
        self.session_seconds
    }

    pub fn session_seconds(&self) -> i64 {
        self.session_seconds
    }

    /// More than `period` has passed since the last flush
    pub fn flush_due(&self, now: Instant, period: Duration) -> bool {
        now.saturating_duration_since(self.last_flush) > period
    }

    /// Whole seconds accumulated since the last flush; marks them flushed
    pub fn take_unflushed(&mut self, now: Instant) -> i64 {
        let seconds = now.saturating_duration_since(self.last_flush).as_secs();
        self.last_flush += Duration::from_secs(seconds);
        seconds as i64
    }

    /// Count points awarded during this session
    pub fn record_points(&mut self, pool: PointPool, delta: i64) {
        match pool {
            PointPool::Writing => self.writing_points += delta,
            PointPool::Pronunciation => self.pronunciation_points += delta,
        }
    }

    pub fn points(&self, pool: PointPool) -> i64 {
        match pool {
            PointPool::Writing => self.writing_points,
            PointPool::Pronunciation => self.pronunciation_points,
        }
    }
}
