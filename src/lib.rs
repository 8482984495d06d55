//! Zero-shot document classification with token-aware chunking.
//!
//! Documents are scored against an arbitrary, caller-supplied category list
//! using an NLI model served through ONNX Runtime. Texts that exceed the
//! model's input budget are split into overlapping token chunks; each chunk
//! is classified on its own and the per-chunk distributions are combined by
//! three aggregation strategies (mean probability, majority vote,
//! confidence-weighted average) into one document-level decision. No part of
//! the input is ever truncated away.
//!
//! # Basic Usage
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use wernicke::{BuiltinModel, DocumentClassifier};
//!
//! let classifier = DocumentClassifier::builder()
//!     .with_model(BuiltinModel::BartLargeMnli)?
//!     .build()?;
//!
//! let result = classifier.classify("This license agreement governs the use of...");
//! println!("{} ({:.4})", result.predicted_category, result.confidence_score);
//! println!("method: {}, chunks: {}", result.aggregation_method, result.chunks_used);
//! # Ok(())
//! # }
//! ```
//!
//! # Long documents
//!
//! Chunking is transparent: the same call handles a ten-page contract, and
//! the result reports how it was combined.
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! # use wernicke::{BuiltinModel, DocumentClassifier};
//! # let classifier = DocumentClassifier::builder()
//! #     .with_model(BuiltinModel::BartLargeMnli)?
//! #     .build()?;
//! let long_text = std::fs::read_to_string("contract.txt")?;
//! let result = classifier.classify(&long_text);
//! assert!(!result.was_truncated);
//! println!(
//!     "{} over {} chunks, majority vote {}",
//!     result.predicted_category, result.chunks_used, result.majority_vote
//! );
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! The classifier owns its tokenizer and session behind `Arc` and classifies
//! through `&self`, so one handle can be shared across threads:
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use wernicke::{BuiltinModel, DocumentClassifier};
//! use std::sync::Arc;
//! use std::thread;
//!
//! let classifier = Arc::new(
//!     DocumentClassifier::builder()
//!         .with_model(BuiltinModel::BartLargeMnli)?
//!         .build()?,
//! );
//!
//! let mut handles = vec![];
//! for _ in 0..3 {
//!     let classifier = Arc::clone(&classifier);
//!     handles.push(thread::spawn(move || {
//!         classifier.classify("quarterly revenue projections");
//!     }));
//! }
//!
//! for handle in handles {
//!     handle.join().unwrap();
//! }
//! # Ok(())
//! # }
//! ```
//!
//! The handle is the only long-lived resource: build it once at startup,
//! reuse it for every document, and drop it on shutdown to release the model.

pub mod classifier;
pub mod model_manager;
pub mod models;
mod runtime;

pub use classifier::{
    default_categories, AggregationMethod, Chunk, ChunkConfig, ChunkSplitter, ClassifierError,
    ClassifierInfo, DocumentClassification, DocumentClassifier, DocumentClassifierBuilder,
    LabelScores, NliModel, TokenCodec, TokenSpan, ZeroShotBackend, DEFAULT_CATEGORIES,
    DEFAULT_HYPOTHESIS_TEMPLATE, FALLBACK_CATEGORY,
};
pub use model_manager::{ModelError, ModelManager};
pub use models::{BuiltinModel, ModelCharacteristics, ModelInfo};
pub use runtime::{create_session_builder, RuntimeConfig};

pub fn init_logger() {
    env_logger::init();
}
