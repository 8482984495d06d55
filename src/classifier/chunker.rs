use serde::Serialize;

use super::codec::TokenCodec;
use super::error::ClassifierError;

/// Default chunk budget in tokens. Conservative enough to leave room for the
/// hypothesis suffix appended by the NLI backend on 1024-token models.
pub const DEFAULT_MAX_CHUNK_TOKENS: usize = 900;

/// Default fraction of the chunk budget shared between consecutive chunks.
pub const DEFAULT_OVERLAP_FRACTION: f64 = 0.2;

/// Chunking parameters for splitting long documents.
#[derive(Debug, Clone, Copy)]
pub struct ChunkConfig {
    /// Maximum number of tokens in a single chunk
    pub max_chunk_tokens: usize,
    /// Fraction of `max_chunk_tokens` shared between consecutive chunks
    pub overlap_fraction: f64,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            max_chunk_tokens: DEFAULT_MAX_CHUNK_TOKENS,
            overlap_fraction: DEFAULT_OVERLAP_FRACTION,
        }
    }
}

impl ChunkConfig {
    pub fn new(max_chunk_tokens: usize, overlap_fraction: f64) -> Self {
        Self {
            max_chunk_tokens,
            overlap_fraction,
        }
    }

    /// Number of tokens shared between consecutive chunks.
    pub fn overlap_tokens(&self) -> usize {
        (self.max_chunk_tokens as f64 * self.overlap_fraction) as usize
    }

    /// Validates the configuration.
    ///
    /// An overlap at or above the chunk size would make the splitter's start
    /// offset stop advancing, so it is rejected here rather than at call time.
    ///
    /// # Errors
    /// - `ConfigError` if `max_chunk_tokens` is zero
    /// - `ConfigError` if `overlap_fraction` is negative or not finite
    /// - `ConfigError` if the resulting overlap is not smaller than the chunk size
    pub fn validate(&self) -> Result<(), ClassifierError> {
        if self.max_chunk_tokens == 0 {
            return Err(ClassifierError::ConfigError(
                "max_chunk_tokens must be greater than zero".into(),
            ));
        }
        if !self.overlap_fraction.is_finite() || self.overlap_fraction < 0.0 {
            return Err(ClassifierError::ConfigError(format!(
                "overlap_fraction must be a non-negative finite number, got {}",
                self.overlap_fraction
            )));
        }
        if self.overlap_tokens() >= self.max_chunk_tokens {
            return Err(ClassifierError::ConfigError(format!(
                "overlap of {} tokens must be smaller than the chunk size of {} tokens",
                self.overlap_tokens(),
                self.max_chunk_tokens
            )));
        }
        Ok(())
    }
}

/// Half-open token range `[start, end)` into a document's token sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TokenSpan {
    pub start: usize,
    pub end: usize,
}

impl TokenSpan {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// A contiguous token-bounded slice of a document, decoded back to text.
///
/// `text` is the tokenizer's decoding of the tokens in `span`, not a
/// character-offset substring: token and character boundaries need not align.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub span: TokenSpan,
    pub text: String,
}

/// Splits token sequences into overlapping, context-preserving chunks.
///
/// Spans for one document are monotonically increasing in `start`, overlap
/// the previous span by exactly `overlap_tokens` except possibly at the final
/// boundary, and collectively cover `[0, total_tokens)`. The last span always
/// ends at `total_tokens` and may be shorter than the chunk budget.
#[derive(Debug, Clone)]
pub struct ChunkSplitter {
    config: ChunkConfig,
}

impl ChunkSplitter {
    /// Creates a splitter, rejecting configurations that could not terminate.
    pub fn new(config: ChunkConfig) -> Result<Self, ClassifierError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ChunkConfig {
        &self.config
    }

    /// Computes the chunk boundaries for a document of `total_tokens` tokens.
    ///
    /// Deterministic: identical input and parameters always yield identical
    /// boundaries.
    pub fn spans(&self, total_tokens: usize) -> Vec<TokenSpan> {
        let mut spans = Vec::new();
        if total_tokens == 0 {
            return spans;
        }

        let max = self.config.max_chunk_tokens;
        let stride = max - self.config.overlap_tokens();

        let mut start = 0;
        loop {
            let end = usize::min(start + max, total_tokens);
            spans.push(TokenSpan { start, end });
            if end == total_tokens {
                break;
            }
            start += stride;
        }
        spans
    }

    /// Splits a token sequence into chunks, decoding each span back to text.
    ///
    /// # Errors
    /// - `TokenizerError` if a span cannot be decoded
    pub fn split(
        &self,
        tokens: &[u32],
        codec: &dyn TokenCodec,
    ) -> Result<Vec<Chunk>, ClassifierError> {
        self.spans(tokens.len())
            .into_iter()
            .map(|span| {
                let text = codec.decode(&tokens[span.start..span.end])?;
                Ok(Chunk { span, text })
            })
            .collect()
    }
}
