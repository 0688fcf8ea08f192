//! Handwriting recognition
//!
//! The recognizer itself is an external collaborator: it turns ink into a
//! ranked list of candidate glyphs. `arbitration` bounds the call and merges
//! its answer with geometric scoring.

pub mod arbitration;

pub use arbitration::{Arbiter, Verdict};

use crate::error::{Error, Result};
use crate::ink::Ink;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Ranked glyph recognition
#[async_trait]
pub trait HandwritingRecognizer: Send + Sync {
    /// Candidates for the ink, best first; empty when nothing matched
    async fn recognize(&self, ink: &Ink) -> Result<Vec<String>>;
}

/// Recognizer used when none is configured: nothing is ever recognized
#[derive(Debug, Default)]
pub struct NullRecognizer;

#[async_trait]
impl HandwritingRecognizer for NullRecognizer {
    async fn recognize(&self, _ink: &Ink) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}

/// Request body sent to a remote recognizer
#[derive(Debug, Serialize)]
struct RecognizeRequest<'a> {
    ink: &'a Ink,
}

/// Response body from a remote recognizer
#[derive(Debug, Deserialize)]
struct RecognizeResponse {
    #[serde(default)]
    candidates: Vec<String>,
}

/// HTTP recognizer client
///
/// POSTs `{"ink": [[{"x":..,"y":..}]]}` to `<base_url>/recognize` and expects
/// `{"candidates": ["木", ...]}` back.
pub struct RemoteRecognizer {
    http_client: reqwest::Client,
    endpoint: String,
}

impl RemoteRecognizer {
    pub fn new(base_url: &str) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("hanzi-tutor/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http_client,
            endpoint: format!("{}/recognize", base_url.trim_end_matches('/')),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl HandwritingRecognizer for RemoteRecognizer {
    async fn recognize(&self, ink: &Ink) -> Result<Vec<String>> {
        debug!(endpoint = %self.endpoint, strokes = ink.stroke_count(), "Querying recognizer");

        let response = self
            .http_client
            .post(&self.endpoint)
            .json(&RecognizeRequest { ink })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(Error::Recognizer(format!("HTTP {}: {}", status.as_u16(), error_text)));
        }

        let body: RecognizeResponse = response.json().await?;
        Ok(body.candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_null_recognizer_recognizes_nothing() {
        let candidates = NullRecognizer.recognize(&Ink::default()).await.unwrap();
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_remote_endpoint_normalized() {
        let recognizer = RemoteRecognizer::new("http://127.0.0.1:9000/").unwrap();
        assert_eq!(recognizer.endpoint(), "http://127.0.0.1:9000/recognize");
    }

    #[test]
    fn test_request_body_shape() {
        let ink = Ink::new(vec![crate::ink::Stroke::from_coords(&[(1.0, 2.0)])]);
        let body = serde_json::to_value(RecognizeRequest { ink: &ink }).unwrap();
        assert_eq!(body["ink"][0][0]["x"], 1.0);
    }
}
