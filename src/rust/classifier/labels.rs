use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::ClassifierError;

/// Prefix of the raw identifiers the classifier emits, e.g. `LABEL_3`.
pub const LABEL_PREFIX: &str = "LABEL_";

/// The fields of a HuggingFace `config.json` this crate cares about.
#[derive(Debug, Deserialize)]
pub(crate) struct ModelConfig {
    #[serde(default)]
    pub id2label: HashMap<String, String>,
    #[serde(default)]
    pub max_position_embeddings: Option<usize>,
}

impl ModelConfig {
    pub(crate) fn from_file(path: &Path) -> Result<Self, ClassifierError> {
        let raw = fs::read_to_string(path).map_err(|e| {
            ClassifierError::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Ok(serde_json::from_str(&raw)?)
    }
}

/// Index → category name table embedded in the model configuration.
///
/// Built once when the model is loaded and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LabelMap {
    labels: BTreeMap<usize, String>,
}

/// Outcome of mapping a raw classifier identifier to a category name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum LabelResolution {
    Resolved(String),
    /// The identifier did not follow `LABEL_<n>` or named an unknown index; shown verbatim.
    Unresolved(String),
}

impl LabelResolution {
    pub fn name(&self) -> &str {
        match self {
            LabelResolution::Resolved(name) | LabelResolution::Unresolved(name) => name,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, LabelResolution::Resolved(_))
    }
}

/// Extracts `n` from `LABEL_<n>`.
pub fn parse_label_index(identifier: &str) -> Option<usize> {
    identifier.strip_prefix(LABEL_PREFIX)?.parse().ok()
}

pub fn label_identifier(index: usize) -> String {
    format!("{}{}", LABEL_PREFIX, index)
}

impl LabelMap {
    pub fn new(labels: BTreeMap<usize, String>) -> Self {
        Self { labels }
    }

    pub(crate) fn from_config(config: &ModelConfig) -> Result<Self, ClassifierError> {
        if config.id2label.is_empty() {
            return Err(ClassifierError::ConfigError(
                "Model configuration has no id2label table".into(),
            ));
        }

        let mut labels = BTreeMap::new();
        for (key, name) in &config.id2label {
            let index = key.trim().parse::<usize>().map_err(|_| {
                ClassifierError::ConfigError(format!("id2label key '{}' is not an index", key))
            })?;
            labels.insert(index, name.clone());
        }

        // Scores come back positionally, so indices must cover 0..n without gaps.
        if let Some((pos, _)) = labels.keys().enumerate().find(|(pos, index)| pos != *index) {
            return Err(ClassifierError::ConfigError(format!(
                "id2label is missing index {}",
                pos
            )));
        }

        Ok(Self { labels })
    }

    /// Parses the `id2label` table out of a `config.json` document.
    pub fn from_config_json(json: &str) -> Result<Self, ClassifierError> {
        let config: ModelConfig = serde_json::from_str(json)?;
        Self::from_config(&config)
    }

    pub fn from_config_file<P: AsRef<Path>>(path: P) -> Result<Self, ClassifierError> {
        Self::from_config(&ModelConfig::from_file(path.as_ref())?)
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels.get(&index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// `(LABEL_<n>, name)` rows in index order, as shown in the dictionary panel.
    pub fn entries(&self) -> impl Iterator<Item = (String, &str)> + '_ {
        self.labels
            .iter()
            .map(|(index, name)| (label_identifier(*index), name.as_str()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.labels.values().map(String::as_str)
    }

    pub fn resolve(&self, identifier: &str) -> LabelResolution {
        match parse_label_index(identifier).and_then(|index| self.get(index)) {
            Some(name) => LabelResolution::Resolved(name.to_string()),
            None => LabelResolution::Unresolved(identifier.to_string()),
        }
    }
}

impl<S: Into<String>> FromIterator<(usize, S)> for LabelMap {
    fn from_iter<I: IntoIterator<Item = (usize, S)>>(iter: I) -> Self {
        Self {
            labels: iter.into_iter().map(|(i, name)| (i, name.into())).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"{
        "architectures": ["BertForSequenceClassification"],
        "id2label": {
            "0": "joy", "1": "sadness", "2": "anticipate", "3": "anger", "4": "fear",
            "5": "disgust", "6": "trust", "7": "surprise", "8": "neutral"
        },
        "max_position_embeddings": 512
    }"#;

    #[test]
    fn test_config_parsing() {
        let labels = LabelMap::from_config_json(CONFIG).unwrap();
        assert_eq!(labels.len(), 9);
        assert_eq!(labels.get(3), Some("anger"));
        assert_eq!(labels.get(9), None);

        let rows: Vec<_> = labels.entries().take(2).collect();
        assert_eq!(rows, vec![("LABEL_0".to_string(), "joy"), ("LABEL_1".to_string(), "sadness")]);
    }

    #[test]
    fn test_config_without_labels() {
        let err = LabelMap::from_config_json(r#"{"hidden_size": 768}"#).unwrap_err();
        assert!(matches!(err, ClassifierError::ConfigError(_)));
    }

    #[test]
    fn test_config_with_gap() {
        let err = LabelMap::from_config_json(r#"{"id2label": {"0": "joy", "2": "anger"}}"#)
            .unwrap_err();
        assert!(err.to_string().contains("missing index 1"));
    }

    #[test]
    fn test_resolve() {
        let labels: LabelMap = [(3, "anger")].into_iter().collect();
        assert_eq!(labels.resolve("LABEL_3"), LabelResolution::Resolved("anger".into()));
        assert_eq!(labels.resolve("LABEL_4"), LabelResolution::Unresolved("LABEL_4".into()));
        assert_eq!(labels.resolve("anger"), LabelResolution::Unresolved("anger".into()));
        assert_eq!(labels.resolve("LABEL_x"), LabelResolution::Unresolved("LABEL_x".into()));
    }

    #[test]
    fn test_parse_label_index() {
        assert_eq!(parse_label_index("LABEL_0"), Some(0));
        assert_eq!(parse_label_index("LABEL_12"), Some(12));
        assert_eq!(parse_label_index("label_1"), None);
        assert_eq!(parse_label_index("LABEL_"), None);
    }
}
