mod aggregate;
pub mod builder;
mod chunker;
mod codec;
mod error;
mod pipeline;
mod zero_shot;

pub use aggregate::AggregationMethod;
pub use builder::DocumentClassifierBuilder;
pub use chunker::{Chunk, ChunkConfig, ChunkSplitter, TokenSpan};
pub use codec::TokenCodec;
pub use error::ClassifierError;
pub use pipeline::{
    default_categories, DocumentClassification, DocumentClassifier, DEFAULT_CATEGORIES,
    FALLBACK_CATEGORY,
};
pub use zero_shot::{LabelScores, NliModel, ZeroShotBackend, DEFAULT_HYPOTHESIS_TEMPLATE};

/// Information about the current configuration of a classifier
#[derive(Debug, Clone)]
pub struct ClassifierInfo {
    /// Identifier of the underlying NLI model
    pub model_id: String,
    /// Ordered category set used when a call does not supply one
    pub categories: Vec<String>,
    /// Maximum number of tokens in a single chunk
    pub max_chunk_tokens: usize,
    /// Tokens shared between consecutive chunks
    pub overlap_tokens: usize,
}
