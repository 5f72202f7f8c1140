use std::path::{Path, PathBuf};
use std::fs;
use std::io;
use std::sync::Arc;
use std::env;
use tokio::sync::Mutex;
use sha2::{Sha256, Digest};

use crate::models::ModelInfo;

pub const CACHE_ENV_VAR: &str = "EMOTION_RADAR_CACHE";

const MODEL_FILE: &str = "model.onnx";
const CONFIG_FILE: &str = "config.json";
/// Suffix of a file still being downloaded; renamed into place once complete.
const PARTIAL_SUFFIX: &str = ".part";

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Model not downloaded: {0}")]
    NotDownloaded(String),
    #[error("Download error: {0}")]
    DownloadError(#[from] reqwest::Error),
    #[error("Download of {url} failed with HTTP status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Model verification failed")]
    VerificationFailed,
    #[error("Hash mismatch: expected {expected}, got {actual} for {file_type} file")]
    HashMismatch {
        file_type: String,
        expected: String,
        actual: String,
    },
}

/// One of the three files a model is made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Artifact {
    Model,
    Tokenizer,
    Config,
}

impl Artifact {
    const ALL: [Artifact; 3] = [Artifact::Model, Artifact::Tokenizer, Artifact::Config];

    fn file_type(&self) -> &'static str {
        match self {
            Artifact::Model => "model",
            Artifact::Tokenizer => "tokenizer",
            Artifact::Config => "config",
        }
    }

    fn file_name<'a>(&self, info: &'a ModelInfo) -> &'a str {
        match self {
            Artifact::Model => MODEL_FILE,
            Artifact::Tokenizer => info.tokenizer_file(),
            Artifact::Config => CONFIG_FILE,
        }
    }

    fn url<'a>(&self, info: &'a ModelInfo) -> &'a str {
        match self {
            Artifact::Model => &info.model_url,
            Artifact::Tokenizer => &info.tokenizer_url,
            Artifact::Config => &info.config_url,
        }
    }

    fn expected_hash<'a>(&self, info: &'a ModelInfo) -> Option<&'a str> {
        match self {
            Artifact::Model => info.model_hash.as_deref(),
            Artifact::Tokenizer => info.tokenizer_hash.as_deref(),
            Artifact::Config => info.config_hash.as_deref(),
        }
    }
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(PARTIAL_SUFFIX);
    path.with_file_name(name)
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Keeps the on-disk cache of pretrained models: one directory per model holding
/// `model.onnx`, the tokenizer file and `config.json`.
///
/// Files are downloaded to `<name>.part` and renamed when complete, so a file under
/// its final name is never a truncated download.
#[derive(Clone, Debug)]
pub struct ModelManager {
    models_dir: PathBuf,
    download_lock: Arc<Mutex<()>>,
}

impl ModelManager {
    /// Creates a new ModelManager with the default models directory
    pub fn new_default() -> io::Result<Self> {
        Self::new(Self::get_default_models_dir())
    }

    /// Returns the default models directory path
    pub fn get_default_models_dir() -> PathBuf {
        if let Ok(path) = env::var(CACHE_ENV_VAR) {
            return PathBuf::from(path).join("models");
        }

        if let Some(cache_dir) = dirs::cache_dir() {
            return cache_dir.join("emotion_radar").join("models");
        }

        if let Some(home_dir) = dirs::home_dir() {
            return home_dir.join(".cache").join("emotion_radar").join("models");
        }

        env::temp_dir().join("emotion_radar").join("models")
    }

    pub fn new<P: AsRef<Path>>(models_dir: P) -> io::Result<Self> {
        let models_dir = models_dir.as_ref().to_path_buf();
        fs::create_dir_all(&models_dir)?;
        Ok(Self {
            models_dir,
            download_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    pub fn get_model_dir(&self, name: &str) -> PathBuf {
        self.models_dir.join(name)
    }

    pub fn get_model_path(&self, name: &str) -> PathBuf {
        self.get_model_dir(name).join(MODEL_FILE)
    }

    pub fn get_tokenizer_path(&self, info: &ModelInfo) -> PathBuf {
        self.get_model_dir(&info.name).join(info.tokenizer_file())
    }

    pub fn get_config_path(&self, name: &str) -> PathBuf {
        self.get_model_dir(name).join(CONFIG_FILE)
    }

    fn artifact_path(&self, info: &ModelInfo, artifact: Artifact) -> PathBuf {
        self.get_model_dir(&info.name).join(artifact.file_name(info))
    }

    pub fn is_model_downloaded(&self, info: &ModelInfo) -> bool {
        let downloaded = Artifact::ALL.iter().all(|artifact| {
            let path = self.artifact_path(info, *artifact);
            log::debug!("  {} path: {:?} (exists: {})", artifact.file_type(), path, path.exists());
            path.exists()
        });
        log::info!("Model '{}' downloaded: {}", info.name, downloaded);
        downloaded
    }

    pub fn require_downloaded(&self, info: &ModelInfo) -> Result<(), ModelError> {
        if self.is_model_downloaded(info) {
            Ok(())
        } else {
            Err(ModelError::NotDownloaded(info.name.clone()))
        }
    }

    pub async fn download_model(&self, info: &ModelInfo) -> Result<(), ModelError> {
        let _lock = self.download_lock.lock().await;

        let model_dir = self.get_model_dir(&info.name);
        log::info!("Creating model directory at {:?}", model_dir);
        fs::create_dir_all(&model_dir)?;

        for artifact in Artifact::ALL {
            if let Err(e) = self.ensure_artifact(info, artifact).await {
                log::error!("Failed to set up {} file: {}", artifact.file_type(), e);
                let _ = self.remove_download(info);
                return Err(e);
            }
        }

        log::info!("Model '{}' ready to use", info.name);
        Ok(())
    }

    async fn ensure_artifact(&self, info: &ModelInfo, artifact: Artifact) -> Result<(), ModelError> {
        let path = self.artifact_path(info, artifact);
        let expected = artifact.expected_hash(info);

        if path.exists() {
            match expected {
                Some(hash) if !self.verify_file(&path, hash)? => {
                    log::warn!("{} file verification failed, redownloading", artifact.file_type());
                }
                _ => {
                    log::info!("Existing {} file at {:?} kept", artifact.file_type(), path);
                    return Ok(());
                }
            }
        }

        self.download_and_verify_file(artifact.url(info), &path, expected, artifact.file_type())
            .await
    }

    fn verify_file(&self, path: &Path, expected_hash: &str) -> Result<bool, ModelError> {
        let bytes = fs::read(path)?;
        let hash = sha256_hex(&bytes);
        log::debug!("Verifying {:?}: calculated {}, expected {}", path, hash, expected_hash);
        Ok(hash == expected_hash)
    }

    /// Checks that every artefact exists and, where a hash is pinned, matches it.
    pub fn verify_model(&self, info: &ModelInfo) -> Result<bool, ModelError> {
        for artifact in Artifact::ALL {
            let path = self.artifact_path(info, artifact);
            if !path.exists() {
                log::info!("{} file missing at {:?}", artifact.file_type(), path);
                return Ok(false);
            }
            if let Some(hash) = artifact.expected_hash(info) {
                if !self.verify_file(&path, hash)? {
                    log::info!("{} hash verification failed", artifact.file_type());
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }

    async fn download_and_verify_file(
        &self,
        url: &str,
        path: &Path,
        expected_hash: Option<&str>,
        file_type: &str,
    ) -> Result<(), ModelError> {
        log::info!("Downloading {} file from {} to {:?}", file_type, url, path);
        let response = reqwest::get(url).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ModelError::HttpStatus {
                url: url.to_string(),
                status,
            });
        }
        let bytes = response.bytes().await?;
        log::info!("Downloaded {} bytes", bytes.len());

        if let Some(expected) = expected_hash {
            let hash = sha256_hex(&bytes);
            if hash != expected {
                log::error!("{} hash mismatch: expected {}, got {}", file_type, expected, hash);
                return Err(ModelError::HashMismatch {
                    file_type: file_type.to_string(),
                    expected: expected.to_string(),
                    actual: hash,
                });
            }
        } else {
            log::warn!("No pinned hash for {} file, skipping verification", file_type);
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let partial = partial_path(path);
        fs::write(&partial, &bytes)?;

        if let Some(expected) = expected_hash {
            if !self.verify_file(&partial, expected)? {
                fs::remove_file(&partial)?;
                return Err(ModelError::VerificationFailed);
            }
        }
        fs::rename(&partial, path)?;

        log::info!("{} file downloaded successfully", file_type);
        Ok(())
    }

    /// Deletes the model's files, including any leftover partial downloads.
    pub fn remove_download(&self, info: &ModelInfo) -> Result<(), ModelError> {
        for artifact in Artifact::ALL {
            let path = self.artifact_path(info, artifact);
            for path in [partial_path(&path), path] {
                if path.exists() {
                    fs::remove_file(&path)?;
                }
            }
        }
        Ok(())
    }

    /// Ensures that a model is downloaded and verified.
    /// If the model doesn't exist, it will be downloaded.
    /// If verification fails, it will be re-downloaded.
    pub async fn ensure_model_downloaded(&self, info: &ModelInfo) -> Result<(), ModelError> {
        if !self.is_model_downloaded(info) {
            log::info!("Model '{}' not found, downloading...", info.name);
            self.download_model(info).await?;
        } else if !self.verify_model(info)? {
            log::info!("Model '{}' verification failed, re-downloading...", info.name);
            self.remove_download(info)?;
            self.download_model(info).await?;
        }
        Ok(())
    }
}
