//! Audio device seam

use crate::error::{Error, Result};
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Channel on which a recording device reports input levels (0.0-1.0)
///
/// Devices should use `try_send`: a full channel drops the level.
pub type LevelSender = mpsc::Sender<f32>;

/// Microphone and speaker
#[async_trait]
pub trait AudioDevice: Send + Sync {
    /// Start capturing 16 kHz mono PCM, reporting one level per buffer
    async fn start_recording(&self, levels: LevelSender) -> Result<()>;

    /// Stop capturing and hand over everything recorded since start
    async fn stop_recording(&self) -> Result<Vec<i16>>;

    /// Play a clip; resolves once playback has finished
    async fn play(&self, pcm: &[i16]) -> Result<()>;
}

/// Device used when the host has no audio attached
///
/// Every operation fails, which the session turns into a user message.
/// Clips can still be assessed by uploading PCM directly.
#[derive(Debug, Default)]
pub struct UnavailableDevice;

#[async_trait]
impl AudioDevice for UnavailableDevice {
    async fn start_recording(&self, _levels: LevelSender) -> Result<()> {
        Err(Error::AudioDevice("no capture device attached".to_string()))
    }

    async fn stop_recording(&self) -> Result<Vec<i16>> {
        Err(Error::AudioDevice("no capture device attached".to_string()))
    }

    async fn play(&self, _pcm: &[i16]) -> Result<()> {
        Err(Error::AudioDevice("no playback device attached".to_string()))
    }
}
