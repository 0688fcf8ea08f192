//! Learning session controller
//!
//! Owns one user's session: presents characters, runs debounced evaluations,
//! applies rewards, drives the recording workflow and keeps statistics.
//!
//! **Concurrency:**
//! - State lives behind one `tokio::sync::Mutex`; it is never held across a
//!   collaborator call (recognizer, audio device) or a pause.
//! - Each ink submission bumps `generation` and aborts the previous
//!   evaluation task. A finished evaluation is only applied when its
//!   generation is still current and the phase is still `Evaluating`.
//! - Scored attempts and their points are committed in one store
//!   transaction, so concurrent ratings cannot award an improvement twice.
//! - The statistics task holds a `Weak` reference and ends with the session.

use super::phase::SessionPhase;
use super::rewards::{self, presentation_feedback};
use super::selection::{select_next, ProgressViews, Selection};
use super::stats::SessionStats;
use super::{Collaborators, SessionTimings};
use crate::audio::{AmplitudeMeter, AMPLITUDE_WINDOW};
use crate::db::{characters, progress, settings, users};
use crate::error::{Error, Result};
use crate::ink::Ink;
use crate::recognition::Arbiter;
use crate::scoring::{self, StrokeScorer};
use crate::speech::{pronunciation_text, reward_phrase};
use hanzi_common::db::{Character, User};
use hanzi_common::events::{EventBus, PointPool, RecordingState, SessionPhaseKind, TutorEvent};
use hanzi_common::time;
use serde::Serialize;
use sqlx::{Pool, Sqlite};
use std::collections::HashSet;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Point-in-time view of a session for the UI collaborator
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub user: User,
    pub phase: SessionPhaseKind,
    pub character: Option<Character>,
    pub review: bool,
    /// Last persisted ink for the current character (serialized)
    pub history_ink: Option<String>,
    pub feedback: String,
    pub fireworks: bool,
    pub learned: Vec<String>,
    pub pending: Vec<String>,
    pub daily_char_count: i64,
    pub session_seconds: i64,
    /// Points earned during this session, per pool
    pub writing_points: i64,
    pub pronunciation_points: i64,
    pub recording: RecordingState,
    pub has_recording: bool,
    /// Score of the most recent applied evaluation
    pub last_score: Option<i64>,
    pub generation: u64,
}

struct SessionState {
    phase: SessionPhase,
    user: User,
    timings: SessionTimings,
    arbiter: Option<Arc<Arbiter>>,
    current: Option<Character>,
    review: bool,
    history_ink: Option<String>,
    /// Characters presented during this session
    visited: HashSet<String>,
    views: ProgressViews,
    feedback: String,
    fireworks: bool,
    last_score: Option<i64>,
    generation: u64,
    evaluation: Option<JoinHandle<()>>,
    /// Newest generation whose evaluation finished or was cancelled
    settled: watch::Sender<u64>,
    stats: SessionStats,
    stats_task: Option<JoinHandle<()>>,
    recording: RecordingState,
    level_task: Option<JoinHandle<()>>,
    last_clip: Option<Vec<i16>>,
}

impl SessionState {
    fn new(user: User) -> Self {
        Self {
            phase: SessionPhase::new(),
            user,
            timings: SessionTimings::default(),
            arbiter: None,
            current: None,
            review: false,
            history_ink: None,
            visited: HashSet::new(),
            views: ProgressViews::default(),
            feedback: String::new(),
            fireworks: false,
            last_score: None,
            generation: 0,
            evaluation: None,
            settled: watch::channel(0).0,
            stats: SessionStats::new(Instant::now()),
            stats_task: None,
            recording: RecordingState::Idle,
            level_task: None,
            last_clip: None,
        }
    }

    /// Invalidate any in-flight evaluation
    fn cancel_evaluation(&mut self) -> u64 {
        if let Some(handle) = self.evaluation.take() {
            handle.abort();
            self.settle(self.generation);
        }
        self.generation += 1;
        self.generation
    }

    fn settle(&self, generation: u64) {
        self.settled.send_if_modified(|settled| {
            if generation > *settled {
                *settled = generation;
                true
            } else {
                false
            }
        });
    }
}

struct Inner {
    user_id: i64,
    db: Pool<Sqlite>,
    events: Arc<EventBus>,
    collaborators: Collaborators,
    state: Mutex<SessionState>,
}

/// One user's learning session
///
/// Cheap to clone; clones share the same session.
#[derive(Clone)]
pub struct LearningSession {
    inner: Arc<Inner>,
}

impl LearningSession {
    pub fn new(db: Pool<Sqlite>, events: Arc<EventBus>, collaborators: Collaborators, user: User) -> Self {
        Self {
            inner: Arc::new(Inner {
                user_id: user.id,
                db,
                events,
                collaborators,
                state: Mutex::new(SessionState::new(user)),
            }),
        }
    }

    pub fn user_id(&self) -> i64 {
        self.inner.user_id
    }

    /// Start the session and present the first character
    ///
    /// Resumes the user's last character when it belongs to their grade.
    pub async fn start(&self) -> Result<()> {
        let inner = &self.inner;
        if inner.state.lock().await.phase.kind() != SessionPhaseKind::Idle {
            return Err(Error::InvalidState("session already started".to_string()));
        }

        let user = users::require_user(&inner.db, inner.user_id).await?;
        let timings = settings::load_session_timings(&inner.db).await?;
        let params = settings::load_stroke_params(&inner.db).await?;
        let arbiter = Arbiter::new(
            Arc::clone(&inner.collaborators.recognizer),
            Arc::clone(&inner.collaborators.reference),
            StrokeScorer::new(params),
            timings.recognizer_timeout,
        );
        let tick = timings.stats_tick_interval;

        {
            let mut state = inner.state.lock().await;
            state.phase.transition(SessionPhaseKind::AwaitingCharacterSelection)?;
            state.user = user.clone();
            state.timings = timings;
            state.arbiter = Some(Arc::new(arbiter));
            state.stats = SessionStats::new(Instant::now());
            state.visited.clear();
            state.stats_task = Some(spawn_stats_task(Arc::downgrade(inner), tick));
        }
        inner.emit_phase(SessionPhaseKind::AwaitingCharacterSelection);
        info!("Session started for user {} ({}), grade {}", user.id, user.name, user.current_grade);

        inner.refresh_progress().await;

        if !user.last_character_id.is_empty() {
            match characters::get_character(&inner.db, &user.last_character_id).await {
                Ok(Some(character)) if character.grade == user.current_grade => {
                    return inner.present(character, false).await;
                }
                Ok(_) => debug!("Last character '{}' not in grade {}, selecting", user.last_character_id, user.current_grade),
                Err(e) => warn!("Failed to load last character '{}': {}", user.last_character_id, e),
            }
        }

        inner.advance().await
    }

    /// Stop background work, flush learning time and return to idle
    pub async fn stop(&self) {
        let inner = &self.inner;
        let (unflushed, recording) = {
            let mut state = inner.state.lock().await;
            state.cancel_evaluation();
            for handle in [state.stats_task.take(), state.level_task.take()].into_iter().flatten() {
                handle.abort();
            }
            let now = Instant::now();
            state.stats.tick(now);
            let unflushed = state.stats.take_unflushed(now);
            let recording = state.recording;
            state.recording = RecordingState::Idle;
            if let Err(e) = state.phase.transition(SessionPhaseKind::Idle) {
                warn!("Stopping session: {}", e);
            }
            state.current = None;
            (unflushed, recording)
        };

        if recording == RecordingState::Recording {
            if let Err(e) = inner.collaborators.audio.stop_recording().await {
                warn!("Failed to stop recording on shutdown: {}", e);
            }
        }

        if unflushed > 0 {
            if let Err(e) = users::add_learning_time(&inner.db, inner.user_id, unflushed).await {
                error!("Failed to flush learning time for user {}: {}", inner.user_id, e);
            }
        }

        inner.emit_phase(SessionPhaseKind::Idle);
        info!("Session stopped for user {}", inner.user_id);
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let state = self.inner.state.lock().await;
        SessionSnapshot {
            user: state.user.clone(),
            phase: state.phase.kind(),
            character: state.current.clone(),
            review: state.review,
            history_ink: state.history_ink.clone(),
            feedback: state.feedback.clone(),
            fireworks: state.fireworks,
            learned: state.views.learned.clone(),
            pending: state.views.pending.clone(),
            daily_char_count: state.views.daily_char_count,
            session_seconds: state.stats.session_seconds(),
            writing_points: state.stats.points(PointPool::Writing),
            pronunciation_points: state.stats.points(PointPool::Pronunciation),
            recording: state.recording,
            has_recording: state.last_clip.is_some(),
            last_score: state.last_score,
            generation: state.generation,
        }
    }

    /// Submit the learner's ink for the current character
    ///
    /// Replaces any pending evaluation. Empty ink cancels it and returns to
    /// `Presenting`. Returns the submission's generation.
    pub async fn submit_ink(&self, ink: Ink) -> Result<u64> {
        let inner = &self.inner;
        let mut state = inner.state.lock().await;
        if !state.phase.accepts_ink() {
            return Err(Error::InvalidState(format!("ink not accepted while {}", state.phase.kind())));
        }

        let generation = state.cancel_evaluation();

        if ink.is_empty() {
            if state.phase.kind() != SessionPhaseKind::Presenting {
                state.phase.transition(SessionPhaseKind::Presenting)?;
                inner.emit_phase(SessionPhaseKind::Presenting);
            }
            debug!("Empty ink from user {}, evaluation cancelled", inner.user_id);
            return Ok(generation);
        }

        let character = state
            .current
            .clone()
            .ok_or_else(|| Error::InvalidState("no character presented".to_string()))?;
        let arbiter = state
            .arbiter
            .clone()
            .ok_or_else(|| Error::InvalidState("session not started".to_string()))?;

        if state.phase.kind() != SessionPhaseKind::Evaluating {
            state.phase.transition(SessionPhaseKind::Evaluating)?;
            inner.emit_phase(SessionPhaseKind::Evaluating);
        }

        let settle = state.timings.evaluation_settle;
        let task_inner = Arc::clone(inner);
        state.evaluation = Some(tokio::spawn(async move {
            tokio::time::sleep(settle).await;
            task_inner.evaluate(generation, character, ink, arbiter).await;
            task_inner.state.lock().await.settle(generation);
        }));

        debug!("Queued evaluation {} for user {}", generation, inner.user_id);
        Ok(generation)
    }

    /// Wait until the latest submitted evaluation (and its reward flow) ends
    ///
    /// Also returns when that evaluation is cancelled, which stays possible
    /// while someone waits.
    pub async fn wait_for_evaluation(&self) {
        let (target, mut settled) = {
            let state = self.inner.state.lock().await;
            if state.evaluation.is_none() {
                return;
            }
            (state.generation, state.settled.subscribe())
        };
        // Sender is owned by the session `self` keeps alive
        let _ = settled.wait_for(|done| *done >= target).await;
    }

    /// Skip to the next character
    pub async fn load_next(&self) -> Result<()> {
        self.inner.prepare_selection().await?;
        self.inner.advance().await
    }

    /// Present a specific character; `review` re-practises a mastered one
    pub async fn select_character(&self, character_id: &str, review: bool) -> Result<()> {
        let character = characters::get_character(&self.inner.db, character_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("character '{}'", character_id)))?;
        self.inner.prepare_selection().await?;
        self.inner.present(character, review).await
    }

    /// Forget the last attempt of the current character
    ///
    /// Returns false when the character had no progress row.
    pub async fn clear_history_ink(&self) -> Result<bool> {
        let inner = &self.inner;
        let character = inner.current_character().await?;

        let cleared = progress::clear_history_ink(&inner.db, inner.user_id, &character.id, time::now_millis()).await?;
        if cleared {
            let review = {
                let mut state = inner.state.lock().await;
                state.history_ink = None;
                state.review
            };
            inner.emit(TutorEvent::CharacterPresented {
                user_id: inner.user_id,
                character_id: character.id.clone(),
                review,
                history_ink: None,
                timestamp: time::now(),
            });
            inner.refresh_progress().await;
        }
        Ok(cleared)
    }

    /// Speak the pronunciation prompt for the current character
    pub async fn pronounce_current(&self) -> Result<String> {
        let character = self.inner.current_character().await?;
        let text = pronunciation_text(&character);
        self.inner.collaborators.speech.speak(&text);
        Ok(text)
    }

    /// Start capturing a pronunciation clip
    pub async fn start_recording(&self) -> Result<()> {
        let inner = &self.inner;
        {
            let state = inner.state.lock().await;
            if state.recording != RecordingState::Idle {
                return Err(Error::InvalidState(format!("audio busy: {}", state.recording)));
            }
        }

        let (tx, mut rx) = mpsc::channel::<f32>(64);
        if let Err(e) = inner.collaborators.audio.start_recording(tx).await {
            warn!("Failed to start recording for user {}: {}", inner.user_id, e);
            inner.state.lock().await.last_clip = None;
            inner.set_feedback(rewards::RECORDING_FAILED_FEEDBACK).await;
            return Err(e);
        }

        let events = Arc::clone(&inner.events);
        let user_id = inner.user_id;
        let level_task = tokio::spawn(async move {
            let mut meter = AmplitudeMeter::new(AMPLITUDE_WINDOW);
            while let Some(level) = rx.recv().await {
                meter.push(level);
                events.emit_lossy(TutorEvent::AmplitudeLevels {
                    user_id,
                    levels: meter.levels(),
                });
            }
        });

        {
            let mut state = inner.state.lock().await;
            state.recording = RecordingState::Recording;
            state.level_task = Some(level_task);
        }
        inner.emit_recording(RecordingState::Recording);
        inner.set_feedback(rewards::RECORDING_FEEDBACK).await;
        Ok(())
    }

    /// Stop capturing and rate the clip; returns the star rating
    pub async fn stop_recording(&self) -> Result<i64> {
        let inner = &self.inner;
        if inner.state.lock().await.recording != RecordingState::Recording {
            return Err(Error::InvalidState("not recording".to_string()));
        }

        let captured = inner.collaborators.audio.stop_recording().await;

        {
            let mut state = inner.state.lock().await;
            if let Some(handle) = state.level_task.take() {
                handle.abort();
            }
            state.recording = RecordingState::Idle;
            if captured.is_err() {
                state.last_clip = None;
            }
        }
        inner.emit_recording(RecordingState::Idle);

        match captured {
            Ok(pcm) => self.assess_recording(pcm).await,
            Err(e) => {
                warn!("Recording failed for user {}: {}", inner.user_id, e);
                inner.set_feedback(rewards::RECORDING_FAILED_FEEDBACK).await;
                Err(e)
            }
        }
    }

    /// Rate a 16 kHz mono clip for the current character
    ///
    /// The clip becomes the one replayed by [`play_recording`](Self::play_recording).
    pub async fn assess_recording(&self, pcm: Vec<i16>) -> Result<i64> {
        let inner = &self.inner;
        let character = inner.current_character().await?;
        inner.set_feedback(rewards::ANALYZING_FEEDBACK).await;

        let stars = scoring::assess(&pcm, &character.id);
        inner.state.lock().await.last_clip = Some(pcm);
        inner.emit(TutorEvent::PronunciationAssessed {
            user_id: inner.user_id,
            character_id: character.id.clone(),
            stars,
            timestamp: time::now(),
        });
        info!("Pronunciation of '{}' by user {}: {} stars", character.id, inner.user_id, stars);

        if stars == 0 {
            inner.set_feedback(rewards::TOO_QUIET_FEEDBACK).await;
            return Ok(stars);
        }

        let recorded = progress::record_pronunciation(
            &inner.db,
            inner.user_id,
            &character.id,
            stars,
            time::now_millis(),
            |before| rewards::pronunciation_points(stars, before.pronunciation_score),
        )
        .await;
        let points = match recorded {
            Ok(Some(scored)) => {
                inner.announce_points(PointPool::Pronunciation, scored.points, scored.total_points).await;
                scored.points
            }
            Ok(None) => 0,
            Err(e) => {
                error!("Failed to record pronunciation for '{}': {}", character.id, e);
                0
            }
        };

        inner.set_feedback(rewards::pronunciation_feedback(stars, points)).await;
        if points == 0 {
            let phrase = reward_phrase(&mut rand::thread_rng());
            inner.collaborators.speech.speak(phrase);
        }

        inner.refresh_progress().await;
        Ok(stars)
    }

    /// Play back the last clip
    pub async fn play_recording(&self) -> Result<()> {
        let inner = &self.inner;
        let clip = {
            let mut state = inner.state.lock().await;
            if state.recording != RecordingState::Idle {
                return Err(Error::InvalidState(format!("audio busy: {}", state.recording)));
            }
            let clip = state
                .last_clip
                .clone()
                .ok_or_else(|| Error::InvalidState("nothing recorded".to_string()))?;
            state.recording = RecordingState::Playing;
            clip
        };
        inner.emit_recording(RecordingState::Playing);

        let result = inner.collaborators.audio.play(&clip).await;

        inner.state.lock().await.recording = RecordingState::Idle;
        inner.emit_recording(RecordingState::Idle);

        if let Err(e) = &result {
            warn!("Playback failed for user {}: {}", inner.user_id, e);
            inner.set_feedback(rewards::PLAYBACK_FAILED_FEEDBACK).await;
        }
        result
    }

    /// Reload the user row and publish it
    pub async fn refresh_user(&self) -> Result<User> {
        self.inner.refresh_user().await
    }
}

impl Inner {
    fn emit(&self, event: TutorEvent) {
        self.events.emit_lossy(event);
    }

    fn emit_phase(&self, phase: SessionPhaseKind) {
        self.emit(TutorEvent::SessionPhaseChanged {
            user_id: self.user_id,
            phase,
            timestamp: time::now(),
        });
    }

    fn emit_recording(&self, state: RecordingState) {
        self.emit(TutorEvent::RecordingStateChanged {
            user_id: self.user_id,
            state,
            timestamp: time::now(),
        });
    }

    async fn set_feedback(&self, message: impl Into<String>) {
        let message = message.into();
        self.state.lock().await.feedback = message.clone();
        self.emit(TutorEvent::Feedback {
            user_id: self.user_id,
            message,
            timestamp: time::now(),
        });
    }

    async fn set_fireworks(&self, visible: bool) {
        self.state.lock().await.fireworks = visible;
        self.emit(TutorEvent::Fireworks {
            user_id: self.user_id,
            visible,
            timestamp: time::now(),
        });
    }

    async fn current_character(&self) -> Result<Character> {
        self.state
            .lock()
            .await
            .current
            .clone()
            .ok_or_else(|| Error::InvalidState("no character presented".to_string()))
    }

    /// Guard for learner-initiated character changes
    async fn prepare_selection(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        if !state.phase.accepts_selection() {
            return Err(Error::InvalidState(format!("cannot change character while {}", state.phase.kind())));
        }
        state.cancel_evaluation();
        Ok(())
    }

    /// Present whatever `select_next` picks
    async fn advance(&self) -> Result<()> {
        let (grade, current, pending, visited) = {
            let state = self.state.lock().await;
            (
                state.user.current_grade,
                state.current.clone(),
                state.views.pending.clone(),
                state.visited.clone(),
            )
        };

        match select_next(&self.db, grade, current.as_ref(), &pending, &visited).await? {
            Selection::Next(character) => self.present(character, false).await,
            Selection::AllComplete => {
                {
                    let mut state = self.state.lock().await;
                    state.phase.transition(SessionPhaseKind::AwaitingCharacterSelection)?;
                    state.current = None;
                    state.review = false;
                    state.history_ink = None;
                }
                self.emit_phase(SessionPhaseKind::AwaitingCharacterSelection);
                self.emit(TutorEvent::AllCharactersComplete {
                    user_id: self.user_id,
                    grade,
                    timestamp: time::now(),
                });
                self.set_feedback(rewards::ALL_COMPLETE_FEEDBACK).await;
                info!("User {} has no characters left in grade {}", self.user_id, grade);
                Ok(())
            }
        }
    }

    async fn present(&self, character: Character, review: bool) -> Result<()> {
        let history = match progress::get_progress(&self.db, self.user_id, &character.id).await {
            Ok(row) => row,
            Err(e) => {
                warn!("Failed to load history for '{}': {}", character.id, e);
                None
            }
        };
        let last_score = history.as_ref().map_or(0, |p| p.last_score);
        let history_ink = history.and_then(|p| p.last_writing_ink);

        if let Err(e) = users::set_last_character(&self.db, self.user_id, &character.id).await {
            warn!("Failed to remember last character for user {}: {}", self.user_id, e);
        }

        {
            let mut state = self.state.lock().await;
            state.phase.transition(SessionPhaseKind::Presenting)?;
            state.visited.insert(character.id.clone());
            state.user.last_character_id = character.id.clone();
            state.current = Some(character.clone());
            state.review = review;
            state.history_ink = history_ink.clone();
            state.last_score = None;
        }

        self.emit_phase(SessionPhaseKind::Presenting);
        self.emit(TutorEvent::CharacterPresented {
            user_id: self.user_id,
            character_id: character.id.clone(),
            review,
            history_ink,
            timestamp: time::now(),
        });

        let first_word = character.example_words.first().map(String::as_str);
        self.set_feedback(presentation_feedback(&character.id, first_word, review, last_score))
            .await;
        debug!("Presented '{}' to user {} (review: {})", character.id, self.user_id, review);
        Ok(())
    }

    /// Body of one evaluation task
    async fn evaluate(&self, generation: u64, character: Character, ink: Ink, arbiter: Arc<Arbiter>) {
        let verdict = arbiter.evaluate(&character.id, &ink).await;

        let review = {
            let mut state = self.state.lock().await;
            if state.generation != generation || state.phase.kind() != SessionPhaseKind::Evaluating {
                debug!("Discarding stale evaluation {} (current {})", generation, state.generation);
                return;
            }

            let next = if verdict.is_pass() {
                SessionPhaseKind::Passed
            } else {
                SessionPhaseKind::Failed
            };
            if let Err(e) = state.phase.transition(next) {
                warn!("Evaluation {} not applied: {}", generation, e);
                return;
            }
            state.last_score = Some(verdict.score.score);
            state.review
        };

        self.emit_phase(if verdict.is_pass() {
            SessionPhaseKind::Passed
        } else {
            SessionPhaseKind::Failed
        });
        self.emit(TutorEvent::EvaluationCompleted {
            user_id: self.user_id,
            character_id: character.id.clone(),
            score: verdict.score.score,
            wrong_order: verdict.score.wrong_order,
            passed: verdict.is_pass(),
            timestamp: time::now(),
        });
        info!(
            "User {} wrote '{}': score {}, wrong order {}",
            self.user_id, character.id, verdict.score.score, verdict.score.wrong_order
        );

        if verdict.is_pass() {
            self.celebrate(&character, &ink, verdict.score.score, verdict.score.wrong_order, review)
                .await;
        } else {
            self.set_feedback(rewards::FAIL_FEEDBACK).await;
            self.collaborators.speech.speak(rewards::FAIL_SPEECH);
        }
    }

    /// Success flow: persist and award, celebrate, then move on
    ///
    /// The attempt and its points are committed together; an abort after
    /// that point only loses the announcements.
    async fn celebrate(&self, character: &Character, ink: &Ink, score: i64, wrong_order: bool, review: bool) {
        let timings = self.state.lock().await.timings.clone();

        let mut points = 0;
        match ink.to_json() {
            Ok(ink_json) => {
                let recorded = progress::record_writing_pass(
                    &self.db,
                    self.user_id,
                    &character.id,
                    score,
                    &ink_json,
                    time::now_millis(),
                    |before| if review { 0 } else { rewards::writing_points(score, before.high_score) },
                )
                .await;
                match recorded {
                    Ok(scored) => {
                        self.state.lock().await.history_ink = scored.progress.last_writing_ink;
                        points = scored.points;
                        self.announce_points(PointPool::Writing, points, scored.total_points).await;
                    }
                    Err(e) => error!("Failed to record pass of '{}' for user {}: {}", character.id, self.user_id, e),
                }
            }
            Err(e) => error!("Failed to serialize ink for '{}': {}", character.id, e),
        }

        let feedback = if review {
            rewards::REVIEW_PASS_FEEDBACK.to_string()
        } else {
            rewards::pass_feedback(score, points)
        };
        self.set_feedback(feedback).await;

        if !review && score >= timings.fireworks_min_score {
            self.set_fireworks(true).await;
        }

        let speech = &self.collaborators.speech;
        if wrong_order {
            speech.speak(rewards::WRONG_ORDER_HINT);
            tokio::time::sleep(timings.wrong_order_pause).await;
        }

        let prompt = pronunciation_text(character);
        self.set_feedback(prompt.clone()).await;
        speech.speak(&prompt);
        tokio::time::sleep(timings.pronunciation_pause).await;

        if !review {
            let phrase = reward_phrase(&mut rand::thread_rng());
            self.set_feedback(phrase).await;
            speech.speak(phrase);
            tokio::time::sleep(timings.reward_pause).await;
        }

        self.refresh_progress().await;

        if review {
            tokio::time::sleep(timings.reward_pause).await;
            self.set_fireworks(false).await;
            self.set_feedback(rewards::REVIEW_DONE_FEEDBACK).await;

            let moved = self.state.lock().await.phase.transition(SessionPhaseKind::Presenting);
            match moved {
                Ok(()) => self.emit_phase(SessionPhaseKind::Presenting),
                Err(e) => warn!("Review of '{}' not reopened: {}", character.id, e),
            }
        } else {
            tokio::time::sleep(timings.advance_pause).await;
            self.set_fireworks(false).await;
            if let Err(e) = self.advance().await {
                error!("Failed to advance after '{}': {}", character.id, e);
            }
        }
    }

    /// Publish points already committed to the store
    async fn announce_points(&self, pool: PointPool, delta: i64, total_points: i64) {
        if delta <= 0 {
            return;
        }
        self.state.lock().await.stats.record_points(pool, delta);
        self.emit(TutorEvent::PointsAwarded {
            user_id: self.user_id,
            pool,
            delta,
            total_points,
            timestamp: time::now(),
        });
        info!("User {} earned {} {} points (total {})", self.user_id, delta, pool, total_points);
        if let Err(e) = self.refresh_user().await {
            warn!("Failed to reload user {}: {}", self.user_id, e);
        }
    }

    async fn refresh_user(&self) -> Result<User> {
        let user = users::require_user(&self.db, self.user_id).await?;
        self.state.lock().await.user = user.clone();
        self.emit(TutorEvent::UserChanged {
            user: user.clone(),
            timestamp: time::now(),
        });
        Ok(user)
    }

    /// Recompute learned/pending views from the store
    async fn refresh_progress(&self) {
        if let Err(e) = self.try_refresh_progress().await {
            warn!("Failed to refresh progress for user {}: {}", self.user_id, e);
        }
    }

    async fn try_refresh_progress(&self) -> Result<()> {
        let user = self.refresh_user().await?;
        let grade_characters = characters::characters_by_grade(&self.db, user.current_grade).await?;
        let rows = progress::user_progress(&self.db, self.user_id).await?;
        let views = ProgressViews::compute(&grade_characters, &rows, time::today_start_millis());

        self.emit(TutorEvent::ProgressChanged {
            user_id: self.user_id,
            learned: views.learned.clone(),
            pending: views.pending.clone(),
            daily_char_count: views.daily_char_count,
            timestamp: time::now(),
        });
        self.state.lock().await.views = views;
        Ok(())
    }

    /// One statistics tick: refresh the clock, flush learning time when due
    async fn stats_tick(&self, now: Instant) {
        let (session_seconds, unflushed, mut total) = {
            let mut state = self.state.lock().await;
            let session_seconds = state.stats.tick(now);
            let period = state.timings.learning_time_flush;
            let unflushed = if state.stats.flush_due(now, period) {
                state.stats.take_unflushed(now)
            } else {
                0
            };
            (session_seconds, unflushed, state.user.total_learning_time)
        };

        if unflushed > 0 {
            match users::add_learning_time(&self.db, self.user_id, unflushed).await {
                Ok(new_total) => {
                    total = new_total;
                    self.state.lock().await.user.total_learning_time = new_total;
                    debug!("Flushed {}s of learning time for user {}", unflushed, self.user_id);
                }
                Err(e) => warn!("Failed to flush learning time for user {}: {}", self.user_id, e),
            }
        }

        self.emit(TutorEvent::StatsUpdated {
            user_id: self.user_id,
            session_seconds,
            total_learning_seconds: total,
            timestamp: time::now(),
        });
    }
}

fn spawn_stats_task(inner: Weak<Inner>, tick: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(tick.max(Duration::from_millis(10)));
        // First tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let Some(inner) = inner.upgrade() else {
                break;
            };
            inner.stats_tick(Instant::now()).await;
        }
    })
}
