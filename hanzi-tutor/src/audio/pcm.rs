//! PCM helpers
//!
//! Clips arrive either as raw little-endian 16-bit bytes (uploads) or as WAV
//! files (command line).

use crate::error::{Error, Result};
use crate::scoring::audio::SAMPLE_RATE;
use std::path::Path;
use tracing::warn;

/// Decode little-endian 16-bit PCM; a trailing odd byte is ignored
pub fn pcm_from_le_bytes(bytes: &[u8]) -> Vec<i16> {
    bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}

/// Read a 16-bit integer WAV file as mono samples
///
/// Multi-channel files keep the first channel. Clips at other rates are
/// accepted with a warning; durations are then off by the rate ratio.
pub fn read_wav(path: &Path) -> Result<Vec<i16>> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();

    if spec.sample_format != hound::SampleFormat::Int || spec.bits_per_sample != 16 {
        return Err(Error::Decode(format!(
            "{}: expected 16-bit integer PCM, found {} bit {:?}",
            path.display(),
            spec.bits_per_sample,
            spec.sample_format
        )));
    }

    if spec.sample_rate != SAMPLE_RATE {
        warn!(
            "{} is {} Hz, assessing as {} Hz",
            path.display(),
            spec.sample_rate,
            SAMPLE_RATE
        );
    }

    let channels = usize::from(spec.channels.max(1));
    let samples = reader
        .samples::<i16>()
        .step_by(channels)
        .collect::<std::result::Result<Vec<i16>, _>>()?;

    Ok(samples)
}
