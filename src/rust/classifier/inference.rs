use ort::session::Session;
use ndarray::{Array1, Array2};
use ort::value::Tensor;
use serde::Serialize;
use std::collections::HashMap;

use super::error::ClassifierError;
use super::labels::label_identifier;
use super::tokenizer::TextTokenizer;
use super::utils::softmax;

/// One category's raw `(identifier, score)` output from a single inference call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawScore {
    pub label: String,
    pub score: f32,
}

impl RawScore {
    pub fn new(label: impl Into<String>, score: f32) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

/// Runs a sequence-classification ONNX graph (BERT style) over a single text.
///
/// The graph is expected to:
/// - accept `input_ids` and `attention_mask`, and `token_type_ids` when it declares one
///   (all shaped `[1, sequence_length]`, i64)
/// - return logits shaped `[1, num_labels]` as its first output
pub(crate) trait SequenceClassification {
    fn tokenizer(&self) -> Option<&TextTokenizer>;

    fn session(&self) -> Option<&Session>;

    /// Token ids with special tokens; the tokenizer itself caps them at the model's
    /// maximum sequence length.
    fn tokenize(&self, text: &str) -> Result<Vec<u32>, ClassifierError> {
        let tokenizer = self.tokenizer()
            .ok_or_else(|| ClassifierError::TokenizerError("Tokenizer not initialized".into()))?;

        let ids = tokenizer.encode(text)?;
        if ids.is_empty() {
            return Err(ClassifierError::ValidationError("Input produced no tokens".into()));
        }
        Ok(ids)
    }

    /// Raw logits for one text.
    fn logits(&self, text: &str) -> Result<Array1<f32>, ClassifierError> {
        let tokens = self.tokenize(text)?;
        let session = self.session()
            .ok_or_else(|| ClassifierError::ModelError("Session not initialized".into()))?;

        let seq_len = tokens.len();
        let input_array = Array2::from_shape_vec((1, seq_len),
            tokens.iter().map(|&x| x as i64).collect())
            .map_err(|e| ClassifierError::ModelError(format!("Failed to create input array: {}", e)))?;
        let input_dyn = input_array.into_dyn();
        let input_ids = input_dyn.as_standard_layout();

        let mask_dyn = Array2::<i64>::ones((1, seq_len)).into_dyn();
        let attention_mask = mask_dyn.as_standard_layout();

        let type_dyn = Array2::<i64>::zeros((1, seq_len)).into_dyn();
        let token_type_ids = type_dyn.as_standard_layout();

        let mut input_tensors = HashMap::new();
        input_tensors.insert("input_ids", Tensor::from_array(&input_ids)
            .map_err(|e| ClassifierError::ModelError(format!("Failed to create input tensor: {}", e)))?);
        input_tensors.insert("attention_mask", Tensor::from_array(&attention_mask)
            .map_err(|e| ClassifierError::ModelError(format!("Failed to create mask tensor: {}", e)))?);
        if session.inputs.iter().any(|input| input.name == "token_type_ids") {
            input_tensors.insert("token_type_ids", Tensor::from_array(&token_type_ids)
                .map_err(|e| ClassifierError::ModelError(format!("Failed to create token type tensor: {}", e)))?);
        }

        let outputs = session.run(input_tensors)
            .map_err(|e| ClassifierError::ModelError(format!("Failed to run model: {}", e)))?;
        let output_tensor = outputs[0].try_extract_tensor::<f32>()
            .map_err(|e| ClassifierError::ModelError(format!("Failed to extract output tensor: {}", e)))?;

        let logits = match output_tensor.ndim() {
            1 => Array1::from_iter(output_tensor.iter().cloned()),
            2 => Array1::from_iter(output_tensor.slice(ndarray::s![0, ..]).iter().cloned()),
            n => {
                return Err(ClassifierError::PredictionError(
                    format!("Expected logits of rank 1 or 2, got rank {}", n)
                ))
            }
        };
        Ok(logits)
    }

    /// Softmax scores for every category, one `LABEL_<i>` entry per logit in output order.
    fn score_all(&self, text: &str) -> Result<Vec<RawScore>, ClassifierError> {
        let probs = softmax(&self.logits(text)?);
        Ok(probs.iter()
            .enumerate()
            .map(|(i, &score)| RawScore::new(label_identifier(i), score))
            .collect())
    }
}
