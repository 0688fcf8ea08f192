//! Audio capture/playback collaborator
//!
//! The device itself is behind [`AudioDevice`]; this module supplies the
//! amplitude window fed to the UI while recording and PCM helpers for
//! uploaded or file-based clips.

pub mod device;
pub mod meter;
pub mod pcm;

pub use device::{AudioDevice, LevelSender, UnavailableDevice};
pub use meter::{rms_level, AmplitudeMeter, AMPLITUDE_WINDOW};
pub use pcm::{pcm_from_le_bytes, read_wav};
