//! Recognition arbitration
//!
//! Waits (bounded) for the recognizer, loads reference geometry and runs the
//! stroke scorer. Recognizer errors and timeouts are folded into "not
//! recognized" so the low-score path handles them like any miss.

use super::HandwritingRecognizer;
use crate::ink::Ink;
use crate::reference::ReferenceData;
use crate::scoring::stroke::{StrokeScore, StrokeScorer};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Outcome of one arbitrated evaluation
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub expected: String,
    /// Recognizer output (empty on miss, error or timeout)
    pub candidates: Vec<String>,
    pub score: StrokeScore,
}

impl Verdict {
    pub fn is_pass(&self) -> bool {
        self.score.is_pass()
    }
}

/// Call the recognizer, giving up after `timeout`
pub async fn recognize_bounded(
    recognizer: &dyn HandwritingRecognizer,
    ink: &Ink,
    timeout: Duration,
) -> Vec<String> {
    match tokio::time::timeout(timeout, recognizer.recognize(ink)).await {
        Ok(Ok(candidates)) => candidates,
        Ok(Err(e)) => {
            warn!("Recognizer failed, treating as not recognized: {}", e);
            Vec::new()
        }
        Err(_) => {
            warn!("Recognizer did not answer within {:?}, treating as not recognized", timeout);
            Vec::new()
        }
    }
}

/// Combines recognizer output with geometric scoring
pub struct Arbiter {
    recognizer: Arc<dyn HandwritingRecognizer>,
    reference: Arc<dyn ReferenceData>,
    scorer: StrokeScorer,
    timeout: Duration,
}

impl Arbiter {
    pub fn new(
        recognizer: Arc<dyn HandwritingRecognizer>,
        reference: Arc<dyn ReferenceData>,
        scorer: StrokeScorer,
        timeout: Duration,
    ) -> Self {
        Self {
            recognizer,
            reference,
            scorer,
            timeout,
        }
    }

    /// Evaluate one submission for `expected`
    pub async fn evaluate(&self, expected: &str, ink: &Ink) -> Verdict {
        let candidates = recognize_bounded(self.recognizer.as_ref(), ink, self.timeout).await;
        let reference = self.reference.lookup(expected).await;
        let medians = reference.as_ref().map(|r| r.medians.as_slice());

        let score = self.scorer.score(expected, &candidates, ink, medians);
        debug!(
            "Evaluated '{}': candidates {:?}, score {}, wrong order {}",
            expected, candidates, score.score, score.wrong_order
        );

        Verdict {
            expected: expected.to_string(),
            candidates,
            score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use crate::reference::StrokeReference;
    use async_trait::async_trait;

    struct Fixed(Vec<String>);

    #[async_trait]
    impl HandwritingRecognizer for Fixed {
        async fn recognize(&self, _ink: &Ink) -> Result<Vec<String>> {
            Ok(self.0.clone())
        }
    }

    struct Failing;

    #[async_trait]
    impl HandwritingRecognizer for Failing {
        async fn recognize(&self, _ink: &Ink) -> Result<Vec<String>> {
            Err(Error::Recognizer("offline".to_string()))
        }
    }

    struct Silent;

    #[async_trait]
    impl HandwritingRecognizer for Silent {
        async fn recognize(&self, _ink: &Ink) -> Result<Vec<String>> {
            std::future::pending().await
        }
    }

    struct NoReference;

    #[async_trait]
    impl ReferenceData for NoReference {
        async fn lookup(&self, _character: &str) -> Option<StrokeReference> {
            None
        }
    }

    fn arbiter(recognizer: Arc<dyn HandwritingRecognizer>) -> Arbiter {
        Arbiter::new(
            recognizer,
            Arc::new(NoReference),
            StrokeScorer::default(),
            Duration::from_millis(50),
        )
    }

    fn ink() -> Ink {
        Ink::new(vec![crate::ink::Stroke::from_coords(&[(0.0, 0.0), (10.0, 0.0)])])
    }

    #[tokio::test]
    async fn test_never_answering_recognizer_times_out() {
        let verdict = arbiter(Arc::new(Silent)).evaluate("一", &ink()).await;
        assert!(verdict.candidates.is_empty());
        assert_eq!(verdict.score.score, 0);
        assert!(!verdict.is_pass());
    }

    #[tokio::test]
    async fn test_recognizer_error_is_not_recognized() {
        let verdict = arbiter(Arc::new(Failing)).evaluate("一", &ink()).await;
        assert_eq!(verdict.score.score, 0);
        assert!(verdict.candidates.is_empty());
    }

    #[tokio::test]
    async fn test_missing_reference_still_scores() {
        let verdict = arbiter(Arc::new(Fixed(vec!["一".to_string()])))
            .evaluate("一", &ink())
            .await;
        assert_eq!(verdict.candidates, vec!["一".to_string()]);
        assert_eq!(verdict.score.score, 7);
        assert!(verdict.is_pass());
    }
}
