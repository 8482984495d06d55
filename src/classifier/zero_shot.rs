use std::collections::HashMap;
use std::sync::Arc;

use ndarray::Array2;
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::Tokenizer;

use super::codec::TokenCodec;
use super::error::ClassifierError;
use crate::models::ModelCharacteristics;

/// Default hypothesis wrapped around each candidate category label.
pub const DEFAULT_HYPOTHESIS_TEMPLATE: &str = "This example is {}.";

/// Per-call result of the zero-shot primitive.
///
/// `labels` and `scores` are parallel, sorted descending by score, and
/// `labels` is a permutation of the categories passed to `classify`.
#[derive(Debug, Clone)]
pub struct LabelScores {
    pub labels: Vec<String>,
    pub scores: Vec<f32>,
}

impl LabelScores {
    /// The top-ranked label and its score.
    pub fn top(&self) -> Option<(&str, f32)> {
        self.labels
            .first()
            .map(|label| (label.as_str(), self.scores[0]))
    }
}

/// Zero-shot classification over a caller-supplied category list.
///
/// Implementations must be safe for concurrent invocation; the orchestrator
/// shares one backend across all chunks and documents.
pub trait ZeroShotBackend: Send + Sync {
    /// Scores `text` against every category, returning a probability-like
    /// distribution that sums to 1 across the categories.
    ///
    /// # Errors
    /// - `TokenizerError` if the premise/hypothesis pair cannot be encoded
    /// - `ModelError` if the model cannot be run or produces unusable output
    fn classify(&self, text: &str, categories: &[String]) -> Result<LabelScores, ClassifierError>;
}

/// NLI-based zero-shot classifier backed by an ONNX session.
///
/// Reproduces the single-label zero-shot formulation: each category becomes a
/// hypothesis, the model scores entailment of that hypothesis against the
/// text, and the entailment logits are softmaxed across categories.
pub struct NliModel {
    tokenizer: Arc<Tokenizer>,
    /// Separate handle with pair truncation enabled; truncation must never
    /// apply to whole-document token counting.
    pair_tokenizer: Arc<Tokenizer>,
    session: Arc<Session>,
    characteristics: ModelCharacteristics,
    hypothesis_template: String,
    wants_token_type_ids: bool,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<NliModel>();
    }
};

impl NliModel {
    pub(crate) fn new(
        tokenizer: Arc<Tokenizer>,
        pair_tokenizer: Arc<Tokenizer>,
        session: Arc<Session>,
        characteristics: ModelCharacteristics,
        hypothesis_template: String,
    ) -> Self {
        let wants_token_type_ids = session
            .inputs
            .iter()
            .any(|input| input.name == "token_type_ids");
        Self {
            tokenizer,
            pair_tokenizer,
            session,
            characteristics,
            hypothesis_template,
            wants_token_type_ids,
        }
    }

    pub fn characteristics(&self) -> &ModelCharacteristics {
        &self.characteristics
    }

    /// Entailment logit for one (premise, hypothesis) pair.
    fn entailment_logit(&self, premise: &str, hypothesis: &str) -> Result<f32, ClassifierError> {
        let encoding = self
            .pair_tokenizer
            .encode((premise, hypothesis), true)
            .map_err(|e| ClassifierError::TokenizerError(e.to_string()))?;

        let len = encoding.get_ids().len();
        let ids: Vec<i64> = encoding.get_ids().iter().map(|&id| id as i64).collect();
        let mask: Vec<i64> = encoding
            .get_attention_mask()
            .iter()
            .map(|&m| m as i64)
            .collect();

        let input_array = Array2::from_shape_vec((1, len), ids)
            .map_err(|e| ClassifierError::ModelError(format!("Failed to create input array: {}", e)))?;
        let input_dyn = input_array.into_dyn();
        let input_ids = input_dyn.as_standard_layout();

        let mask_array = Array2::from_shape_vec((1, len), mask)
            .map_err(|e| ClassifierError::ModelError(format!("Failed to create mask array: {}", e)))?;
        let mask_dyn = mask_array.into_dyn();
        let attention_mask = mask_dyn.as_standard_layout();

        let mut input_tensors = HashMap::new();
        input_tensors.insert(
            "input_ids",
            Tensor::from_array(&input_ids)
                .map_err(|e| ClassifierError::ModelError(format!("Failed to create input tensor: {}", e)))?,
        );
        input_tensors.insert(
            "attention_mask",
            Tensor::from_array(&attention_mask)
                .map_err(|e| ClassifierError::ModelError(format!("Failed to create mask tensor: {}", e)))?,
        );

        if self.wants_token_type_ids {
            let type_ids: Vec<i64> = encoding.get_type_ids().iter().map(|&t| t as i64).collect();
            let type_array = Array2::from_shape_vec((1, len), type_ids).map_err(|e| {
                ClassifierError::ModelError(format!("Failed to create type id array: {}", e))
            })?;
            let type_dyn = type_array.into_dyn();
            let token_type_ids = type_dyn.as_standard_layout();
            input_tensors.insert(
                "token_type_ids",
                Tensor::from_array(&token_type_ids).map_err(|e| {
                    ClassifierError::ModelError(format!("Failed to create type id tensor: {}", e))
                })?,
            );
            let outputs = self
                .session
                .run(input_tensors)
                .map_err(|e| ClassifierError::ModelError(format!("Failed to run model: {}", e)))?;
            let logits = outputs[0].try_extract_tensor::<f32>().map_err(|e| {
                ClassifierError::ModelError(format!("Failed to extract logits: {}", e))
            })?;
            return self.entailment_from_logits(logits);
        }

        let outputs = self
            .session
            .run(input_tensors)
            .map_err(|e| ClassifierError::ModelError(format!("Failed to run model: {}", e)))?;
        let logits = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| ClassifierError::ModelError(format!("Failed to extract logits: {}", e)))?;
        self.entailment_from_logits(logits)
    }

    fn entailment_from_logits(
        &self,
        logits: ndarray::ArrayViewD<'_, f32>,
    ) -> Result<f32, ClassifierError> {
        let shape = logits.shape();
        let index = self.characteristics.entailment_index;
        if shape.len() != 2 || shape[1] <= index {
            return Err(ClassifierError::ModelError(format!(
                "Unexpected logit shape {:?}, need [1, >{}]",
                shape, index
            )));
        }
        Ok(logits[[0, index]])
    }
}

impl TokenCodec for NliModel {
    fn encode(&self, text: &str) -> Result<Vec<u32>, ClassifierError> {
        self.tokenizer
            .encode(text, false)
            .map_err(|e| ClassifierError::TokenizerError(e.to_string()))
            .map(|encoding| encoding.get_ids().to_vec())
    }

    fn decode(&self, ids: &[u32]) -> Result<String, ClassifierError> {
        self.tokenizer
            .decode(ids, true)
            .map_err(|e| ClassifierError::TokenizerError(e.to_string()))
    }
}

impl ZeroShotBackend for NliModel {
    fn classify(&self, text: &str, categories: &[String]) -> Result<LabelScores, ClassifierError> {
        let mut logits = Vec::with_capacity(categories.len());
        for category in categories {
            let hypothesis = self.hypothesis_template.replace("{}", category);
            logits.push(self.entailment_logit(text, &hypothesis)?);
        }

        let scores = softmax(&logits);
        let order = rank_descending(&scores);

        Ok(LabelScores {
            labels: order.iter().map(|&i| categories[i].clone()).collect(),
            scores: order.iter().map(|&i| scores[i]).collect(),
        })
    }
}

/// Numerically stable softmax over raw logits.
pub(crate) fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f64> = logits.iter().map(|&l| f64::from(l - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.iter().map(|&e| (e / total) as f32).collect()
}

/// Indices sorted by score, highest first; equal scores keep input order.
pub(crate) fn rank_descending(scores: &[f32]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| {
        scores[b]
            .partial_cmp(&scores[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    order
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_softmax_sums_to_one() {
        let scores = softmax(&[1.0, 2.0, 3.0]);
        let total: f32 = scores.iter().sum();
        assert!((total - 1.0).abs() < 1e-6);
        assert!(scores[2] > scores[1] && scores[1] > scores[0]);
    }

    #[test]
    fn test_softmax_is_shift_invariant() {
        let a = softmax(&[1.0, 2.0]);
        let b = softmax(&[1001.0, 1002.0]);
        assert!((a[0] - b[0]).abs() < 1e-6);
        assert!((a[1] - b[1]).abs() < 1e-6);
    }

    #[test]
    fn test_rank_descending() {
        assert_eq!(rank_descending(&[0.1, 0.7, 0.2]), vec![1, 2, 0]);
        // stable for ties
        assert_eq!(rank_descending(&[0.5, 0.5, 0.1]), vec![0, 1, 2]);
    }
}
