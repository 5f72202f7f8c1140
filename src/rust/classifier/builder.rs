use std::path::Path;
use std::sync::Arc;
use ort::session::Session;
use log::{info, error};

use super::error::ClassifierError;
use super::inference::SequenceClassification;
use super::labels::{LabelMap, ModelConfig};
use super::model::EmotionClassifier;
use super::tokenizer::{TextTokenizer, VOCAB_FILE};
use crate::{BuiltinModel, ModelCharacteristics, ModelInfo, ModelManager, runtime::{RuntimeConfig, create_session_builder}};

const DEFAULT_MAX_SEQUENCE_LENGTH: usize = 512;
const WARMUP_TEXT: &str = "テスト";
const TOKENIZER_JSON: &str = "tokenizer.json";

/// A builder for constructing an EmotionClassifier with a fluent interface.
#[derive(Default, Debug)]
pub struct EmotionClassifierBuilder {
    model_path: Option<String>,
    tokenizer_path: Option<String>,
    config_path: Option<String>,
    tokenizer: Option<TextTokenizer>,
    session: Option<Session>,
    labels: Option<LabelMap>,
    model_characteristics: Option<ModelCharacteristics>,
    runtime_config: RuntimeConfig,
}

impl SequenceClassification for EmotionClassifierBuilder {
    fn tokenizer(&self) -> Option<&TextTokenizer> {
        self.tokenizer.as_ref()
    }

    fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }
}

impl EmotionClassifierBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the runtime configuration for ONNX model execution
    ///
    /// # Example
    /// ```
    /// use emotion_radar::{EmotionClassifierBuilder, RuntimeConfig};
    ///
    /// let builder = EmotionClassifierBuilder::new()
    ///     .with_runtime_config(RuntimeConfig::default());
    /// ```
    pub fn with_runtime_config(mut self, config: RuntimeConfig) -> Self {
        self.runtime_config = config;
        self
    }

    /// Loads a built-in model from the default cache directory.
    ///
    /// The model must already be downloaded (see [`ModelManager::download_model`]).
    pub fn with_model(self, model: BuiltinModel) -> Result<Self, ClassifierError> {
        let manager = ModelManager::new_default()
            .map_err(|e| ClassifierError::BuildError(format!("Failed to create model manager: {}", e)))?;
        self.with_cached_model(&manager, &model.get_model_info(), Some(model.characteristics()))
    }

    /// Loads the files of `info` from `manager`'s cache directory.
    pub fn with_cached_model(
        self,
        manager: &ModelManager,
        info: &ModelInfo,
        characteristics: Option<ModelCharacteristics>,
    ) -> Result<Self, ClassifierError> {
        manager.require_downloaded(info).map_err(|e| {
            ClassifierError::BuildError(format!(
                "{}. Please download it first using ModelManager::download_model()",
                e
            ))
        })?;

        self.load_files(
            &manager.get_model_path(&info.name),
            &manager.get_tokenizer_path(info),
            &manager.get_config_path(&info.name),
            characteristics.map(|c| c.max_sequence_length),
        )
    }

    /// Loads a model from a directory holding `model.onnx`, `config.json` and a tokenizer:
    /// `tokenizer.json` when present, otherwise a BERT `vocab.txt`.
    pub fn with_model_dir<P: AsRef<Path>>(
        self,
        dir: P,
        max_sequence_length: Option<usize>,
    ) -> Result<Self, ClassifierError> {
        let dir = dir.as_ref();
        let tokenizer_path = match dir.join(TOKENIZER_JSON) {
            path if path.exists() => path,
            _ => dir.join(VOCAB_FILE),
        };
        self.with_custom_model(
            &dir.join("model.onnx"),
            &tokenizer_path,
            &dir.join("config.json"),
            max_sequence_length,
        )
    }

    /// Sets explicit model, tokenizer and config paths.
    ///
    /// `max_sequence_length` defaults to the config's `max_position_embeddings`, or 512.
    pub fn with_custom_model(
        self,
        model_path: &Path,
        tokenizer_path: &Path,
        config_path: &Path,
        max_sequence_length: Option<usize>,
    ) -> Result<Self, ClassifierError> {
        for (kind, path) in [("Model", model_path), ("Tokenizer", tokenizer_path), ("Config", config_path)] {
            if path.as_os_str().is_empty() {
                return Err(ClassifierError::BuildError(format!("{} path cannot be empty", kind)));
            }
            if !path.exists() {
                return Err(ClassifierError::BuildError(format!("{} file not found: {}", kind, path.display())));
            }
        }
        self.load_files(model_path, tokenizer_path, config_path, max_sequence_length)
    }

    fn load_files(
        mut self,
        model_path: &Path,
        tokenizer_path: &Path,
        config_path: &Path,
        max_sequence_length: Option<usize>,
    ) -> Result<Self, ClassifierError> {
        if self.model_path.is_some() {
            return Err(ClassifierError::BuildError("Model already set".to_string()));
        }

        let config = ModelConfig::from_file(config_path)?;
        let labels = LabelMap::from_config(&config)?;
        info!("Loaded {} labels from {:?}", labels.len(), config_path);

        let max_sequence_length = max_sequence_length
            .or(config.max_position_embeddings)
            .unwrap_or(DEFAULT_MAX_SEQUENCE_LENGTH);

        let mut tokenizer = TextTokenizer::from_file(tokenizer_path)
            .map_err(|e| {
                error!("Failed to load tokenizer: {}", e);
                e
            })?;
        tokenizer.with_truncation(max_sequence_length)?;
        info!("Tokenizer loaded from {:?}", tokenizer_path);

        let session = create_session_builder(&self.runtime_config)?
            .commit_from_file(model_path)?;
        Self::validate_model(&session)?;
        info!("Model structure validated successfully");

        self.model_characteristics = Some(ModelCharacteristics {
            max_sequence_length,
            num_labels: labels.len(),
            model_size_mb: file_size_mb(model_path),
        });
        self.model_path = Some(model_path.to_string_lossy().to_string());
        self.tokenizer_path = Some(tokenizer_path.to_string_lossy().to_string());
        self.config_path = Some(config_path.to_string_lossy().to_string());
        self.tokenizer = Some(tokenizer);
        self.session = Some(session);
        self.labels = Some(labels);
        Ok(self)
    }

    /// Builds the classifier after checking that the graph emits one logit per label.
    pub fn build(mut self) -> Result<EmotionClassifier, ClassifierError> {
        let labels = self.labels.take()
            .ok_or_else(|| ClassifierError::BuildError("Model must be set before building".to_string()))?;

        let width = self.logits(WARMUP_TEXT)?.len();
        if width != labels.len() {
            return Err(ClassifierError::ModelError(format!(
                "Model emits {} logits but config.json names {} labels",
                width,
                labels.len()
            )));
        }
        info!("Model emits {} logits per input", width);

        let tokenizer = Arc::new(self.tokenizer.take()
            .ok_or_else(|| ClassifierError::BuildError("No tokenizer loaded".into()))?);
        let session = Arc::new(self.session.take()
            .ok_or_else(|| ClassifierError::BuildError("No ONNX model loaded".into()))?);
        let model_characteristics = self.model_characteristics
            .ok_or_else(|| ClassifierError::BuildError("Model characteristics not set".to_string()))?;

        Ok(EmotionClassifier {
            model_path: self.model_path.take().unwrap_or_default(),
            tokenizer_path: self.tokenizer_path.take().unwrap_or_default(),
            config_path: self.config_path.take().unwrap_or_default(),
            tokenizer,
            session,
            labels: Arc::new(labels),
            model_characteristics,
        })
    }

    /// Validates that the model has the expected input/output structure
    fn validate_model(session: &Session) -> Result<(), ClassifierError> {
        let names: Vec<&str> = session.inputs.iter().map(|i| i.name.as_str()).collect();
        for required in ["input_ids", "attention_mask"] {
            if !names.contains(&required) {
                return Err(ClassifierError::ModelError(
                    format!("Model is missing the '{}' input (found {:?})", required, names)
                ));
            }
        }

        if session.outputs.is_empty() {
            return Err(ClassifierError::ModelError(
                "Model must have at least 1 output for logits".to_string()
            ));
        }

        Ok(())
    }
}

fn file_size_mb(path: &Path) -> usize {
    std::fs::metadata(path)
        .map(|m| (m.len() / (1024 * 1024)) as usize)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn scratch_dir(tag: &str) -> PathBuf {
        std::env::temp_dir()
            .join("emotion_radar-builder-test")
            .join(format!("{}-{}", tag, std::process::id()))
    }

    #[test]
    fn test_build_without_model() {
        let result = EmotionClassifierBuilder::new().build();
        assert!(matches!(result, Err(ClassifierError::BuildError(_))));
    }

    #[test]
    fn test_missing_files() {
        let dir = scratch_dir("missing");
        fs::create_dir_all(&dir).unwrap();
        let result = EmotionClassifierBuilder::new().with_model_dir(&dir, None);
        match result {
            Err(ClassifierError::BuildError(msg)) => assert!(msg.contains("Model file not found")),
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_bad_config_is_reported_before_loading() {
        let dir = scratch_dir("config");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("model.onnx"), b"not a graph").unwrap();
        fs::write(dir.join("tokenizer.json"), b"{}").unwrap();
        fs::write(dir.join("config.json"), br#"{"hidden_size": 768}"#).unwrap();

        let result = EmotionClassifierBuilder::new().with_model_dir(&dir, None);
        assert!(matches!(result, Err(ClassifierError::ConfigError(_))));
    }

    #[test]
    fn test_model_dir_falls_back_to_vocab() {
        let dir = scratch_dir("vocab");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("model.onnx"), b"not a graph").unwrap();
        fs::write(dir.join("config.json"), br#"{"hidden_size": 768}"#).unwrap();

        match EmotionClassifierBuilder::new().with_model_dir(&dir, None) {
            Err(ClassifierError::BuildError(msg)) => {
                assert!(msg.contains("Tokenizer file not found"));
                assert!(msg.contains("vocab.txt"));
            }
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }

        fs::write(dir.join("vocab.txt"), "[PAD]\n[UNK]\n[CLS]\n[SEP]").unwrap();
        let result = EmotionClassifierBuilder::new().with_model_dir(&dir, None);
        assert!(matches!(result, Err(ClassifierError::ConfigError(_))));
    }

    #[test]
    fn test_builtin_model_not_downloaded() {
        let manager = ModelManager::new(scratch_dir("cache")).unwrap();
        let info = BuiltinModel::YtLiveJaBertEmotion.get_model_info();
        let result = EmotionClassifierBuilder::new().with_cached_model(&manager, &info, None);
        match result {
            Err(ClassifierError::BuildError(msg)) => assert!(msg.contains("not downloaded")),
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }
}
