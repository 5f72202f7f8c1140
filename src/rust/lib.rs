//! Nine-emotion analysis of free-form Japanese text using a pretrained BERT classifier
//! run through ONNX Runtime.
//!
//! The pipeline is: load the classifier once ([`ModelLoader`]), score a text against
//! every category ([`classify`]), then reshape the raw `LABEL_<n>` scores into a
//! headline, a top-three ranking and a radar series ([`transform`]).
//!
//! # Basic Usage
//!
//! ```no_run
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! use emotion_radar::{App, BuiltinModel, ModelLoader, ModelSource, Submission};
//!
//! let loader = ModelLoader::new(ModelSource::builtin(BuiltinModel::YtLiveJaBertEmotion)?);
//! let app = App::new(loader.load().await?);
//!
//! if let Submission::Analyzed(analysis) = app.submit("今日はカレーライスだ！うれしい！")? {
//!     println!("{} {}", analysis.top1.name(), analysis.top1.score);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! [`EmotionClassifier`] is `Send + Sync`; the loader hands out one `Arc` that any
//! number of request handlers may read concurrently.

pub mod analysis;
pub mod app;
pub mod classifier;
pub mod loader;
pub mod model_manager;
pub mod models;
pub mod presentation;
mod runtime;

pub use analysis::{rank, transform, Analysis, Confidence, RankedResult};
pub use app::{App, Submission, DEFAULT_INPUT};
pub use classifier::{
    classify, extract_labels, ClassifierError, ClassifierInfo, EmotionClassifier,
    EmotionClassifierBuilder, EmotionScorer, LabelMap, LabelResolution, RawScore, TextTokenizer,
};
pub use loader::{ModelLoadError, ModelLoader, ModelSource, MODEL_DIR_ENV};
pub use model_manager::{ModelError, ModelManager};
pub use models::{BuiltinModel, ModelCharacteristics, ModelInfo};
pub use runtime::{create_session_builder, RuntimeConfig};

pub fn init_logger() {
    env_logger::init();
}
