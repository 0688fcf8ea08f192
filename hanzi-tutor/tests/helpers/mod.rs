//! Test helpers for hanzi-tutor integration tests
//!
//! Provides fake collaborators and a ready-made environment:
//! - ScriptedRecognizer: returns whatever candidates the test sets
//! - MemoryReference: reference geometry held in memory
//! - RecordingSpeech: remembers everything spoken
//! - FakeAudio: canned capture, records played clips
//! - TestEnv: temp database, catalog, user and (unstarted) session

#![allow(dead_code)]

use async_trait::async_trait;
use hanzi_common::db::{Character, User};
use hanzi_common::events::{EventBus, TutorEvent};
use hanzi_tutor::audio::{rms_level, AudioDevice, LevelSender};
use hanzi_tutor::db::{characters, settings, users};
use hanzi_tutor::ink::{Ink, Stroke};
use hanzi_tutor::recognition::HandwritingRecognizer;
use hanzi_tutor::reference::{Median, ReferenceData, StrokeReference};
use hanzi_tutor::session::{Collaborators, LearningSession};
use hanzi_tutor::speech::SpeechOutput;
use hanzi_tutor::{Error, Result};
use sqlx::{Pool, Sqlite};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::broadcast;

/// Recognizer answering with scripted candidates
#[derive(Default)]
pub struct ScriptedRecognizer {
    candidates: Mutex<Vec<String>>,
    delay: Mutex<Duration>,
    calls: Mutex<usize>,
}

impl ScriptedRecognizer {
    pub fn set(&self, candidates: &[&str]) {
        *self.candidates.lock().unwrap() = candidates.iter().map(|s| s.to_string()).collect();
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl HandwritingRecognizer for ScriptedRecognizer {
    async fn recognize(&self, _ink: &Ink) -> Result<Vec<String>> {
        *self.calls.lock().unwrap() += 1;
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        Ok(self.candidates.lock().unwrap().clone())
    }
}

/// Reference geometry held in memory
#[derive(Default)]
pub struct MemoryReference {
    data: HashMap<String, StrokeReference>,
}

impl MemoryReference {
    pub fn with(mut self, glyph: &str, medians: Vec<Median>) -> Self {
        self.data.insert(
            glyph.to_string(),
            StrokeReference {
                strokes: Vec::new(),
                medians,
            },
        );
        self
    }
}

#[async_trait]
impl ReferenceData for MemoryReference {
    async fn lookup(&self, character: &str) -> Option<StrokeReference> {
        self.data.get(character).cloned()
    }
}

/// Speech sink remembering what was said
#[derive(Default)]
pub struct RecordingSpeech {
    spoken: Mutex<Vec<String>>,
}

impl RecordingSpeech {
    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }
}

impl SpeechOutput for RecordingSpeech {
    fn speak(&self, text: &str) {
        self.spoken.lock().unwrap().push(text.to_string());
    }
}

/// Audio device with a canned clip
#[derive(Default)]
pub struct FakeAudio {
    clip: Mutex<Vec<i16>>,
    fail_capture: Mutex<bool>,
    levels: Mutex<Vec<f32>>,
    played: Mutex<Vec<Vec<i16>>>,
}

impl FakeAudio {
    pub fn set_clip(&self, clip: Vec<i16>) {
        *self.clip.lock().unwrap() = clip;
    }

    pub fn set_levels(&self, levels: Vec<f32>) {
        *self.levels.lock().unwrap() = levels;
    }

    pub fn fail_capture(&self, fail: bool) {
        *self.fail_capture.lock().unwrap() = fail;
    }

    pub fn played(&self) -> Vec<Vec<i16>> {
        self.played.lock().unwrap().clone()
    }
}

#[async_trait]
impl AudioDevice for FakeAudio {
    async fn start_recording(&self, levels: LevelSender) -> Result<()> {
        if *self.fail_capture.lock().unwrap() {
            return Err(Error::AudioDevice("microphone unplugged".to_string()));
        }
        // Explicit levels, else one per 100 ms buffer of the clip
        let mut scripted = self.levels.lock().unwrap().clone();
        if scripted.is_empty() {
            scripted = self.clip.lock().unwrap().chunks(1_600).map(rms_level).collect();
        }
        for level in scripted {
            let _ = levels.try_send(level);
        }
        Ok(())
    }

    async fn stop_recording(&self) -> Result<Vec<i16>> {
        if *self.fail_capture.lock().unwrap() {
            return Err(Error::AudioDevice("microphone unplugged".to_string()));
        }
        Ok(self.clip.lock().unwrap().clone())
    }

    async fn play(&self, pcm: &[i16]) -> Result<()> {
        self.played.lock().unwrap().push(pcm.to_vec());
        Ok(())
    }
}

/// Two reference strokes used for 木 throughout the tests
pub fn wood_medians() -> Vec<Median> {
    vec![
        vec![[100.0, 700.0], [500.0, 700.0], [900.0, 700.0]],
        vec![[500.0, 900.0], [500.0, 500.0], [500.0, 100.0]],
    ]
}

/// Ink tracing `medians` in ink space, each sampled point shifted right
pub fn ink_with_offsets(medians: &[Median], offsets: &[[f32; 3]]) -> Ink {
    let strokes = medians
        .iter()
        .zip(offsets)
        .map(|(median, dx)| {
            let coords: Vec<(f32, f32)> = median
                .iter()
                .zip(dx)
                .map(|(p, d)| (p[0] as f32 + d, (1024.0 - p[1] as f32) - 120.0))
                .collect();
            Stroke::from_coords(&coords)
        })
        .collect();
    Ink::new(strokes)
}

/// Near-perfect 木 (mean deviation well under 80)
pub fn good_wood() -> Ink {
    ink_with_offsets(&wood_medians(), &[[10.0, 5.0, 12.0], [3.0, 8.0, 0.0]])
}

/// 木 with mean deviation 200 and the first stroke started 320 away
pub fn sloppy_wood() -> Ink {
    ink_with_offsets(&wood_medians(), &[[320.0, 140.0, 140.0], [200.0, 200.0, 200.0]])
}

/// Everything a session test needs
pub struct TestEnv {
    pub dir: TempDir,
    pub db: Pool<Sqlite>,
    pub events: Arc<EventBus>,
    pub recognizer: Arc<ScriptedRecognizer>,
    pub speech: Arc<RecordingSpeech>,
    pub audio: Arc<FakeAudio>,
    pub collaborators: Collaborators,
    pub user: User,
}

impl TestEnv {
    /// Database with `catalog` (glyph, grade) imported and user "Mei" in grade 1
    ///
    /// Pauses are zeroed and the settle delay shortened so evaluations
    /// finish quickly.
    pub async fn new(catalog: &[(&str, i64)]) -> Self {
        let dir = TempDir::new().unwrap();
        let db = hanzi_common::db::init_database(&dir.path().join("test.db"))
            .await
            .unwrap();

        for (key, value) in [
            ("evaluation_settle_ms", 20),
            ("recognizer_timeout_ms", 500),
            ("wrong_order_pause_ms", 0),
            ("pronunciation_pause_ms", 0),
            ("reward_pause_ms", 0),
            ("advance_pause_ms", 0),
            ("stats_tick_interval_ms", 3_600_000),
            ("learning_time_flush_ms", 3_600_000),
        ] {
            settings::set_setting(&db, key, value).await.unwrap();
        }

        let rows: Vec<Character> = catalog
            .iter()
            .map(|(glyph, grade)| {
                let mut character = Character::new(*glyph, *grade);
                character.example_words = vec![format!("{}头", glyph)];
                character
            })
            .collect();
        characters::replace_all(&db, &rows).await.unwrap();

        let user = users::insert_user(&db, "Mei", "avatar_twilight", 1, 0).await.unwrap();

        let recognizer = Arc::new(ScriptedRecognizer::default());
        let speech = Arc::new(RecordingSpeech::default());
        let audio = Arc::new(FakeAudio::default());
        let collaborators = Collaborators {
            recognizer: recognizer.clone(),
            reference: Arc::new(MemoryReference::default().with("木", wood_medians())),
            speech: speech.clone(),
            audio: audio.clone(),
        };

        Self {
            dir,
            db,
            events: Arc::new(EventBus::new(1024)),
            recognizer,
            speech,
            audio,
            collaborators,
            user,
        }
    }

    pub fn session(&self) -> LearningSession {
        LearningSession::new(
            self.db.clone(),
            Arc::clone(&self.events),
            self.collaborators.clone(),
            self.user.clone(),
        )
    }

    pub async fn reload_user(&self) -> User {
        users::require_user(&self.db, self.user.id).await.unwrap()
    }
}

/// Drain every event currently buffered
pub fn drain(rx: &mut broadcast::Receiver<TutorEvent>) -> Vec<TutorEvent> {
    let mut events = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(event) => events.push(event),
            Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
            Err(_) => break,
        }
    }
    events
}

/// Deltas of all PointsAwarded events
pub fn awarded(events: &[TutorEvent]) -> Vec<i64> {
    events
        .iter()
        .filter_map(|e| match e {
            TutorEvent::PointsAwarded { delta, .. } => Some(*delta),
            _ => None,
        })
        .collect()
}

/// Constant-magnitude 16 kHz clip with alternating sign
pub fn tone(seconds: f32, level: f32) -> Vec<i16> {
    let count = (seconds * 16_000.0) as usize;
    let magnitude = (level * 32768.0).round() as i16;
    (0..count)
        .map(|i| if i % 2 == 0 { magnitude } else { -magnitude })
        .collect()
}

/// Poll the session until it reaches `phase`, panicking after two seconds
pub async fn wait_for_phase(session: &LearningSession, phase: hanzi_common::events::SessionPhaseKind) {
    for _ in 0..200 {
        if session.snapshot().await.phase == phase {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("session never reached {}", phase);
}
