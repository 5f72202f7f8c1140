use serde::{Deserialize, Serialize};

const HF_BASE: &str = "https://huggingface.co";

/// Pretrained classifiers the crate knows how to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinModel {
    /// `iton/YTLive-JaBERT-Emotion-v1`, nine emotions tuned on live-chat comments,
    /// paired with the `tohoku-nlp/bert-base-japanese-v3` tokenizer.
    YtLiveJaBertEmotion,
}

/// Where the three artefacts of a model live and, optionally, what they must hash to.
///
/// The tokenizer is either a `tokenizer.json` or a BERT `vocab.txt`; its cached file
/// keeps the name the URL ends in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    pub model_url: String,
    pub tokenizer_url: String,
    pub config_url: String,
    /// Hub page credited in the footer.
    pub homepage: String,
    pub model_hash: Option<String>,
    pub tokenizer_hash: Option<String>,
    pub config_hash: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelCharacteristics {
    pub max_sequence_length: usize,
    pub num_labels: usize,
    pub model_size_mb: usize,
}

impl ModelInfo {
    /// File name the tokenizer is cached under, taken from the last segment of its URL.
    pub fn tokenizer_file(&self) -> &str {
        self.tokenizer_url
            .split(|c: char| c == '?' || c == '#')
            .next()
            .and_then(|url| url.rsplit('/').next())
            .filter(|name| !name.is_empty())
            .unwrap_or("tokenizer.json")
    }
}

impl BuiltinModel {
    pub fn repo(&self) -> &'static str {
        match self {
            BuiltinModel::YtLiveJaBertEmotion => "iton/YTLive-JaBERT-Emotion-v1",
        }
    }

    pub fn tokenizer_repo(&self) -> &'static str {
        match self {
            BuiltinModel::YtLiveJaBertEmotion => "tohoku-nlp/bert-base-japanese-v3",
        }
    }

    /// The built-in model follows the hub's `main` revision, so nothing is pinned.
    ///
    /// The tokenizer repo publishes no `tokenizer.json`, only the `vocab.txt` its
    /// UniDic + WordPiece tokenizer is built from. The classifier repo publishes no
    /// ONNX graph under `main` unless someone uploads an export.
    pub fn get_model_info(&self) -> ModelInfo {
        let repo = self.repo();
        ModelInfo {
            name: "ytlive-jabert-emotion-v1".to_string(),
            model_url: format!("{HF_BASE}/{repo}/resolve/main/onnx/model.onnx"),
            tokenizer_url: format!(
                "{HF_BASE}/{}/resolve/main/vocab.txt",
                self.tokenizer_repo()
            ),
            config_url: format!("{HF_BASE}/{repo}/resolve/main/config.json"),
            homepage: format!("{HF_BASE}/{repo}"),
            model_hash: None,
            tokenizer_hash: None,
            config_hash: None,
        }
    }

    pub fn characteristics(&self) -> ModelCharacteristics {
        match self {
            BuiltinModel::YtLiveJaBertEmotion => ModelCharacteristics {
                max_sequence_length: 512,
                num_labels: 9,
                model_size_mb: 445,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_model_urls() {
        let info = BuiltinModel::YtLiveJaBertEmotion.get_model_info();
        assert!(info.model_url.ends_with("iton/YTLive-JaBERT-Emotion-v1/resolve/main/onnx/model.onnx"));
        assert!(info.tokenizer_url.contains("tohoku-nlp/bert-base-japanese-v3"));
        assert_eq!(info.tokenizer_file(), "vocab.txt");
        assert!(info.config_url.ends_with("config.json"));
        assert_eq!(info.homepage, "https://huggingface.co/iton/YTLive-JaBERT-Emotion-v1");
        assert!(info.model_hash.is_none());
    }

    #[test]
    fn test_tokenizer_file_from_url() {
        let mut info = BuiltinModel::YtLiveJaBertEmotion.get_model_info();
        info.tokenizer_url = "https://example.com/repo/tokenizer.json?download=true".to_string();
        assert_eq!(info.tokenizer_file(), "tokenizer.json");

        info.tokenizer_url = "https://example.com/repo/".to_string();
        assert_eq!(info.tokenizer_file(), "tokenizer.json");
    }

    #[test]
    fn test_builtin_characteristics() {
        assert_eq!(BuiltinModel::YtLiveJaBertEmotion.characteristics().num_labels, 9);
    }
}
