use std::sync::Arc;
use ort::session::Session;
use super::error::ClassifierError;
use super::inference::{RawScore, SequenceClassification};
use super::labels::LabelMap;
use super::tokenizer::TextTokenizer;
use super::EmotionScorer;
use crate::ModelCharacteristics;

/// The loaded, ready-to-use tokenizer + ONNX session + label table.
///
/// All shared state sits behind `Arc`, so the handle is `Send + Sync` and can be
/// handed to any number of readers once built.
///
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use emotion_radar::{EmotionClassifier, BuiltinModel};
///
/// let classifier = EmotionClassifier::builder()
///     .with_model(BuiltinModel::YtLiveJaBertEmotion)?
///     .build()?;
///
/// let scores = classifier.classify("今日はカレーライスだ！うれしい！")?;
/// assert_eq!(scores.len(), classifier.labels().len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct EmotionClassifier {
    pub model_path: String,
    pub tokenizer_path: String,
    pub config_path: String,
    pub tokenizer: Arc<TextTokenizer>,
    pub session: Arc<Session>,
    pub labels: Arc<LabelMap>,
    pub model_characteristics: ModelCharacteristics,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<EmotionClassifier>();
    }
};

impl SequenceClassification for EmotionClassifier {
    fn tokenizer(&self) -> Option<&TextTokenizer> {
        Some(&self.tokenizer)
    }

    fn session(&self) -> Option<&Session> {
        Some(&self.session)
    }
}

impl EmotionClassifier {
    /// Creates a new EmotionClassifierBuilder for fluent construction
    pub fn builder() -> super::builder::EmotionClassifierBuilder {
        super::builder::EmotionClassifierBuilder::new()
    }

    /// Returns information about the loaded model
    pub fn info(&self) -> super::ClassifierInfo {
        super::ClassifierInfo {
            model_path: self.model_path.clone(),
            tokenizer_path: self.tokenizer_path.clone(),
            config_path: self.config_path.clone(),
            num_labels: self.labels.len(),
            label_names: self.labels.names().map(str::to_string).collect(),
            max_sequence_length: self.model_characteristics.max_sequence_length,
        }
    }

    /// The model's index → category table.
    pub fn labels(&self) -> &LabelMap {
        &self.labels
    }

    /// Scores every category for `text`; one entry per label, in model output order.
    pub fn classify(&self, text: &str) -> Result<Vec<RawScore>, ClassifierError> {
        if text.is_empty() {
            return Err(ClassifierError::ValidationError("Input text cannot be empty".into()));
        }

        let scores = self.score_all(text)?;
        if scores.len() != self.labels.len() {
            return Err(ClassifierError::PredictionError(format!(
                "Model returned {} scores for {} labels",
                scores.len(),
                self.labels.len()
            )));
        }
        Ok(scores)
    }
}

impl EmotionScorer for EmotionClassifier {
    fn labels(&self) -> &LabelMap {
        EmotionClassifier::labels(self)
    }

    fn classify(&self, text: &str) -> Result<Vec<RawScore>, ClassifierError> {
        EmotionClassifier::classify(self, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BuiltinModel, ModelManager};

    async fn setup_test_classifier() -> Result<EmotionClassifier, Box<dyn std::error::Error>> {
        let manager = ModelManager::new_default()?;
        let model = BuiltinModel::YtLiveJaBertEmotion;
        manager.ensure_model_downloaded(&model.get_model_info()).await?;
        Ok(EmotionClassifier::builder().with_model(model)?.build()?)
    }

    #[tokio::test]
    #[ignore = "downloads the pretrained model"]
    async fn test_classify_all_categories() -> Result<(), Box<dyn std::error::Error>> {
        let classifier = setup_test_classifier().await?;
        let scores = classifier.classify("今日はカレーライスだ！うれしい！")?;
        assert_eq!(scores.len(), 9);
        assert!(scores.iter().all(|s| (0.0..=1.0).contains(&s.score)));
        let total: f32 = scores.iter().map(|s| s.score).sum();
        assert!((total - 1.0).abs() < 1e-3);
        Ok(())
    }

    #[tokio::test]
    #[ignore = "downloads the pretrained model"]
    async fn test_empty_text_rejected() -> Result<(), Box<dyn std::error::Error>> {
        let classifier = setup_test_classifier().await?;
        assert!(matches!(
            classifier.classify(""),
            Err(ClassifierError::ValidationError(_))
        ));
        assert_eq!(classifier.info().num_labels, 9);
        Ok(())
    }

    #[tokio::test]
    #[ignore = "downloads the pretrained model"]
    async fn test_whitespace_text_classified() -> Result<(), Box<dyn std::error::Error>> {
        let classifier = setup_test_classifier().await?;
        let scores = classifier.classify("   ")?;
        assert_eq!(scores.len(), 9);
        Ok(())
    }
}
