mod error;
mod inference;
mod labels;
mod model;
pub mod builder;
mod tokenizer;
mod utils;

pub use error::ClassifierError;
pub use inference::RawScore;
pub use labels::{label_identifier, parse_label_index, LabelMap, LabelResolution, LABEL_PREFIX};
pub use model::EmotionClassifier;
pub use tokenizer::{TextTokenizer, WordSegmenter, VOCAB_FILE};
pub use builder::EmotionClassifierBuilder;

/// Information about the loaded model
#[derive(Debug, Clone)]
pub struct ClassifierInfo {
    /// Path to the ONNX model file
    pub model_path: String,
    /// Path to the tokenizer file
    pub tokenizer_path: String,
    /// Path to the model configuration
    pub config_path: String,
    pub num_labels: usize,
    /// Category names in index order
    pub label_names: Vec<String>,
    pub max_sequence_length: usize,
}

/// Anything that can score a text against a fixed set of emotion categories.
///
/// [`EmotionClassifier`] is the production implementation; request handling only
/// depends on this trait.
pub trait EmotionScorer: Send + Sync {
    fn labels(&self) -> &LabelMap;

    /// One [`RawScore`] per category, in the scorer's natural category order.
    fn classify(&self, text: &str) -> Result<Vec<RawScore>, ClassifierError>;
}

/// The scorer's index → name table.
pub fn extract_labels<S: EmotionScorer + ?Sized>(handle: &S) -> &LabelMap {
    handle.labels()
}

/// Runs one inference requesting every category's score.
pub fn classify<S: EmotionScorer + ?Sized>(handle: &S, text: &str) -> Result<Vec<RawScore>, ClassifierError> {
    handle.classify(text)
}
