//! Process-wide classifier handle, built once and shared read-only afterwards.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::OnceCell;

use crate::classifier::{ClassifierError, EmotionClassifier};
use crate::model_manager::{ModelError, ModelManager};
use crate::models::{BuiltinModel, ModelCharacteristics, ModelInfo};
use crate::runtime::RuntimeConfig;

/// Environment variable the binary reads the local model directory from.
pub const MODEL_DIR_ENV: &str = "EMOTION_RADAR_MODEL_DIR";

#[derive(Debug, thiserror::Error)]
pub enum ModelLoadError {
    #[error("failed to fetch model files: {0}")]
    Download(ModelError),
    #[error(
        "{url} is not published. Export the classifier to ONNX once, e.g. \
         `optimum-cli export onnx --model <hub repo> --task text-classification <dir>`, \
         then pass that directory with --model-dir or {}", MODEL_DIR_ENV
    )]
    NotPublished { url: String },
    #[error("failed to initialize classifier: {0}")]
    Classifier(#[from] ClassifierError),
    #[error("failed to open model cache: {0}")]
    Cache(#[from] io::Error),
}

impl From<ModelError> for ModelLoadError {
    fn from(e: ModelError) -> Self {
        match e {
            ModelError::HttpStatus { url, status } if status == reqwest::StatusCode::NOT_FOUND => {
                ModelLoadError::NotPublished { url }
            }
            other => ModelLoadError::Download(other),
        }
    }
}

/// Where the loader gets its three model files from.
#[derive(Debug, Clone)]
pub enum ModelSource {
    /// Fetched into (or found in) a model cache directory.
    Cached {
        manager: ModelManager,
        info: ModelInfo,
        characteristics: Option<ModelCharacteristics>,
    },
    /// A local directory with `model.onnx`, `config.json` and `tokenizer.json` or
    /// `vocab.txt`; never downloads.
    Directory(PathBuf),
}

impl ModelSource {
    pub fn builtin(model: BuiltinModel) -> Result<Self, ModelLoadError> {
        Ok(Self::builtin_in(ModelManager::new_default()?, model))
    }

    pub fn builtin_in(manager: ModelManager, model: BuiltinModel) -> Self {
        ModelSource::Cached {
            manager,
            info: model.get_model_info(),
            characteristics: Some(model.characteristics()),
        }
    }

    fn describe(&self) -> String {
        match self {
            ModelSource::Cached { info, .. } => info.name.clone(),
            ModelSource::Directory(dir) => dir.display().to_string(),
        }
    }
}

/// Builds the [`EmotionClassifier`] on first use and hands out the same `Arc` afterwards.
///
/// Construct one at startup and pass it by reference to whatever serves requests.
/// Concurrent callers of [`ModelLoader::load`] share a single initialization; a failed
/// initialization caches nothing.
#[derive(Debug)]
pub struct ModelLoader {
    source: ModelSource,
    runtime_config: RuntimeConfig,
    fresh: bool,
    handle: OnceCell<Arc<EmotionClassifier>>,
}

impl ModelLoader {
    pub fn new(source: ModelSource) -> Self {
        Self {
            source,
            runtime_config: RuntimeConfig::default(),
            fresh: false,
            handle: OnceCell::new(),
        }
    }

    pub fn with_runtime_config(mut self, config: RuntimeConfig) -> Self {
        self.runtime_config = config;
        self
    }

    /// Discard cached files and download them again on first load.
    pub fn with_fresh_download(mut self, fresh: bool) -> Self {
        self.fresh = fresh;
        self
    }

    pub fn source(&self) -> &ModelSource {
        &self.source
    }

    /// The handle, if a previous [`ModelLoader::load`] succeeded.
    pub fn cached(&self) -> Option<Arc<EmotionClassifier>> {
        self.handle.get().cloned()
    }

    pub async fn load(&self) -> Result<Arc<EmotionClassifier>, ModelLoadError> {
        let handle = self
            .handle
            .get_or_try_init(|| async { self.initialize().await.map(Arc::new) })
            .await?;
        Ok(Arc::clone(handle))
    }

    async fn initialize(&self) -> Result<EmotionClassifier, ModelLoadError> {
        let start = Instant::now();
        log::info!("Loading model '{}'...", self.source.describe());

        let builder = EmotionClassifier::builder().with_runtime_config(self.runtime_config.clone());
        let builder = match &self.source {
            ModelSource::Cached { manager, info, characteristics } => {
                if self.fresh {
                    log::info!("Fresh download requested - removing any existing model files...");
                    manager.remove_download(info)?;
                }
                manager.ensure_model_downloaded(info).await?;
                builder.with_cached_model(manager, info, *characteristics)?
            }
            ModelSource::Directory(dir) => builder.with_model_dir(dir, None)?,
        };
        let classifier = builder.build()?;

        log::info!("Model loaded in {:.2?}", start.elapsed());
        Ok(classifier)
    }
}
