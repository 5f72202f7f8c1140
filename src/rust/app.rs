//! One submission = one pass through classify → transform.

use std::sync::Arc;

use crate::analysis::{transform, Analysis};
use crate::classifier::{classify, ClassifierError, EmotionScorer, LabelMap};

/// Text the input starts out with.
pub const DEFAULT_INPUT: &str = "今日はカレーライスだ！うれしい！";

#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    /// Nothing to analyze; the classifier was not called.
    EmptyInput,
    Analyzed(Analysis),
}

/// Request handler over a shared, already-loaded scorer.
pub struct App<S: EmotionScorer + ?Sized> {
    scorer: Arc<S>,
}

impl<S: EmotionScorer + ?Sized> Clone for App<S> {
    fn clone(&self) -> Self {
        Self {
            scorer: Arc::clone(&self.scorer),
        }
    }
}

impl<S: EmotionScorer + ?Sized> App<S> {
    pub fn new(scorer: Arc<S>) -> Self {
        Self { scorer }
    }

    pub fn labels(&self) -> &LabelMap {
        self.scorer.labels()
    }

    /// Only the empty string is skipped; whitespace is classified like any other text.
    pub fn submit(&self, text: &str) -> Result<Submission, ClassifierError> {
        if text.is_empty() {
            log::warn!("Empty input submitted, skipping classification");
            return Ok(Submission::EmptyInput);
        }

        let raw = classify(self.scorer.as_ref(), text)?;
        log::debug!("Classifier returned {} scores", raw.len());
        let analysis = transform(&raw, self.scorer.labels()).ok_or_else(|| {
            ClassifierError::PredictionError("Classifier returned no scores".into())
        })?;
        log::info!(
            "Primary emotion '{}' ({})",
            analysis.top1.name(),
            analysis.top1.score
        );
        Ok(Submission::Analyzed(analysis))
    }
}
