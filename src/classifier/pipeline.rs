use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use log::{debug, info, warn};
use serde::Serialize;

use super::aggregate::{self, AggregationMethod, ChunkScores};
use super::chunker::{ChunkConfig, ChunkSplitter};
use super::codec::TokenCodec;
use super::error::ClassifierError;
use super::zero_shot::{LabelScores, ZeroShotBackend};

/// Category reported when classification could not run at all.
pub const FALLBACK_CATEGORY: &str = "Other";

/// Default category set, used when the caller does not supply one.
pub const DEFAULT_CATEGORIES: [&str; 5] = [
    "Technical Documentation",
    "Business Proposal",
    "Legal Document",
    "Academic Paper",
    "General Article",
];

pub fn default_categories() -> Vec<String> {
    DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect()
}

/// Unified result record for one classification call.
///
/// Every call produces one of these, including the error paths: empty input
/// and primitive failures before any chunk scored are reported through the
/// `error` field with `predicted_category = "Other"` and zero confidence,
/// never as a panic or an `Err` to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentClassification {
    pub predicted_category: String,
    pub confidence_score: f64,
    /// Per-category mean (or direct) scores, rounded to 4 decimals
    pub all_scores: HashMap<String, f64>,
    pub aggregation_method: AggregationMethod,
    pub chunks_used: usize,
    /// Strategy-B diagnostic; never overrides the selected category
    pub majority_vote: String,
    /// Strategy-C scores, rounded to 4 decimals
    pub weighted_scores: HashMap<String, f64>,
    /// Per-chunk top predictions, first 5 chunks only
    pub chunk_predictions: Vec<String>,
    pub text_length_tokens: usize,
    /// Always false: chunking never discards input
    pub was_truncated: bool,
    /// Total time spent in the classification primitive, in seconds
    pub inference_time: f64,
    pub model_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DocumentClassification {
    fn error_result(model_id: &str, message: String) -> Self {
        Self {
            predicted_category: FALLBACK_CATEGORY.to_string(),
            confidence_score: 0.0,
            all_scores: HashMap::new(),
            aggregation_method: AggregationMethod::Direct,
            chunks_used: 0,
            majority_vote: FALLBACK_CATEGORY.to_string(),
            weighted_scores: HashMap::new(),
            chunk_predictions: Vec::new(),
            text_length_tokens: 0,
            was_truncated: false,
            inference_time: 0.0,
            model_id: model_id.to_string(),
            error: Some(message),
        }
    }
}

/// Zero-shot document classifier with token-aware chunking.
///
/// Construct once via [`DocumentClassifier::builder`] (the handle owns the
/// tokenizer and model session, which are expensive to load), share across
/// threads with `Arc`, and drop to release the underlying resources. No
/// hidden global state survives the handle.
///
/// Classification is stateless per call: short texts go straight to the
/// zero-shot primitive, long texts are split into overlapping token chunks
/// that are classified in order and aggregated.
pub struct DocumentClassifier {
    codec: Arc<dyn TokenCodec>,
    backend: Arc<dyn ZeroShotBackend>,
    splitter: ChunkSplitter,
    categories: Vec<String>,
    model_id: String,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<DocumentClassifier>();
    }
};

pub(crate) fn validate_categories(categories: &[String]) -> Result<(), ClassifierError> {
    if categories.is_empty() {
        return Err(ClassifierError::ValidationError(
            "At least one category is required".into(),
        ));
    }
    for (i, category) in categories.iter().enumerate() {
        if category.trim().is_empty() {
            return Err(ClassifierError::ValidationError(format!(
                "Category {} is empty",
                i + 1
            )));
        }
        if categories[..i].contains(category) {
            return Err(ClassifierError::ValidationError(format!(
                "Duplicate category '{}'",
                category
            )));
        }
    }
    Ok(())
}

impl DocumentClassifier {
    /// Creates a new DocumentClassifierBuilder for fluent construction
    pub fn builder() -> super::builder::DocumentClassifierBuilder {
        super::builder::DocumentClassifierBuilder::new()
    }

    /// Assembles a classifier from explicit parts.
    ///
    /// The builder is the usual entry point; this constructor is the seam for
    /// custom backends and deterministic test doubles.
    pub fn new(
        codec: Arc<dyn TokenCodec>,
        backend: Arc<dyn ZeroShotBackend>,
        chunking: ChunkConfig,
        categories: Vec<String>,
        model_id: impl Into<String>,
    ) -> Result<Self, ClassifierError> {
        validate_categories(&categories)?;
        Ok(Self {
            codec,
            backend,
            splitter: ChunkSplitter::new(chunking)?,
            categories,
            model_id: model_id.into(),
        })
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn chunk_config(&self) -> &ChunkConfig {
        self.splitter.config()
    }

    /// Returns information about the classifier's current configuration
    pub fn info(&self) -> super::ClassifierInfo {
        super::ClassifierInfo {
            model_id: self.model_id.clone(),
            categories: self.categories.clone(),
            max_chunk_tokens: self.splitter.config().max_chunk_tokens,
            overlap_tokens: self.splitter.config().overlap_tokens(),
        }
    }

    /// Classifies a document against the classifier's category set.
    pub fn classify(&self, text: &str) -> DocumentClassification {
        self.run(text, &self.categories)
    }

    /// Classifies a document against a caller-supplied ordered category set.
    ///
    /// The list is used as given for this call only; it is never stored or
    /// mutated. Order matters: it decides argmax tie-breaking and the shared
    /// normalizer of the weighted-average strategy.
    pub fn classify_with_categories(
        &self,
        text: &str,
        categories: &[String],
    ) -> DocumentClassification {
        self.run(text, categories)
    }

    fn run(&self, text: &str, categories: &[String]) -> DocumentClassification {
        if text.trim().is_empty() {
            debug!("Rejecting empty input without invoking the model");
            return DocumentClassification::error_result(
                &self.model_id,
                "Empty text provided".into(),
            );
        }
        if let Err(e) = validate_categories(categories) {
            return DocumentClassification::error_result(&self.model_id, e.to_string());
        }
        match self.classify_inner(text, categories) {
            Ok(result) => result,
            Err(e) => {
                warn!("Classification failed before any chunk was scored: {}", e);
                DocumentClassification::error_result(&self.model_id, e.to_string())
            }
        }
    }

    fn classify_inner(
        &self,
        text: &str,
        categories: &[String],
    ) -> Result<DocumentClassification, ClassifierError> {
        let tokens = self.codec.encode(text)?;
        let total_tokens = tokens.len();

        if total_tokens <= self.splitter.config().max_chunk_tokens {
            debug!(
                "Text fits in one chunk ({} tokens), classifying directly",
                total_tokens
            );
            return self.classify_direct(text, categories, total_tokens);
        }

        info!(
            "Classifying {} tokens as {} token chunks with {} token overlap",
            total_tokens,
            self.splitter.config().max_chunk_tokens,
            self.splitter.config().overlap_tokens()
        );
        self.classify_chunked(&tokens, categories, total_tokens)
    }

    /// Terminal path for texts at or below the chunk budget.
    fn classify_direct(
        &self,
        text: &str,
        categories: &[String],
        total_tokens: usize,
    ) -> Result<DocumentClassification, ClassifierError> {
        let started = Instant::now();
        let result = self.backend.classify(text, categories)?;
        let inference_time = started.elapsed().as_secs_f64();

        let (label, score) = result.top().ok_or_else(|| {
            ClassifierError::ClassificationError("Backend returned no scores".into())
        })?;
        let predicted = label.to_string();
        let scores = rounded_map(&result);

        Ok(DocumentClassification {
            predicted_category: predicted.clone(),
            confidence_score: aggregate::round4(f64::from(score)),
            all_scores: scores.clone(),
            aggregation_method: AggregationMethod::Direct,
            chunks_used: 1,
            majority_vote: predicted.clone(),
            weighted_scores: scores,
            chunk_predictions: vec![predicted],
            text_length_tokens: total_tokens,
            was_truncated: false,
            inference_time: round3(inference_time),
            model_id: self.model_id.clone(),
            error: None,
        })
    }

    /// Terminal path for texts that need splitting. One failed chunk scores
    /// zero everywhere and processing continues; only a failure before the
    /// first chunk was attempted aborts the document.
    fn classify_chunked(
        &self,
        tokens: &[u32],
        categories: &[String],
        total_tokens: usize,
    ) -> Result<DocumentClassification, ClassifierError> {
        let chunks = self.splitter.split(tokens, self.codec.as_ref())?;
        let chunk_count = chunks.len();

        let mut per_chunk: Vec<ChunkScores> = Vec::with_capacity(chunk_count);
        let mut inference_time = 0.0;
        for (index, chunk) in chunks.iter().enumerate() {
            let started = Instant::now();
            match self.backend.classify(&chunk.text, categories) {
                Ok(result) => {
                    debug!(
                        "Chunk {}/{} [{}..{}) classified",
                        index + 1,
                        chunk_count,
                        chunk.span.start,
                        chunk.span.end
                    );
                    per_chunk.push(aggregate::scores_from_labels(&result));
                }
                Err(e) => {
                    warn!(
                        "Chunk {}/{} [{}..{}) failed, scoring zero for every category: {}",
                        index + 1,
                        chunk_count,
                        chunk.span.start,
                        chunk.span.end,
                        e
                    );
                    per_chunk.push(aggregate::zero_scores(categories));
                }
            }
            inference_time += started.elapsed().as_secs_f64();
        }

        let outcome = aggregate::aggregate(categories, &per_chunk);
        info!(
            "Aggregated {} chunks: {} ({:.4}, {})",
            chunk_count, outcome.predicted_category, outcome.confidence, outcome.method
        );

        Ok(DocumentClassification {
            predicted_category: outcome.predicted_category,
            confidence_score: aggregate::round4(outcome.confidence),
            all_scores: rounded_category_map(categories, &outcome.mean_scores),
            aggregation_method: outcome.method,
            chunks_used: chunk_count,
            majority_vote: outcome.majority_vote,
            weighted_scores: rounded_category_map(categories, &outcome.weighted_scores),
            chunk_predictions: outcome.chunk_predictions,
            text_length_tokens: total_tokens,
            was_truncated: false,
            inference_time: round3(inference_time),
            model_id: self.model_id.clone(),
            error: None,
        })
    }
}

fn rounded_map(result: &LabelScores) -> HashMap<String, f64> {
    result
        .labels
        .iter()
        .cloned()
        .zip(
            result
                .scores
                .iter()
                .map(|&s| aggregate::round4(f64::from(s))),
        )
        .collect()
}

fn rounded_category_map(categories: &[String], values: &[f64]) -> HashMap<String, f64> {
    categories
        .iter()
        .cloned()
        .zip(values.iter().map(|&v| aggregate::round4(v)))
        .collect()
}

fn round3(value: f64) -> f64 {
    (value * 1_000.0).round() / 1_000.0
}
