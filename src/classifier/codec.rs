use super::error::ClassifierError;

/// Token-level view of a document used by the chunking pipeline.
///
/// The pipeline only needs two things from a tokenizer: measuring a text in
/// tokens, and materializing a token range back into text so a chunk can be
/// classified on its own. Both directions treat the vocabulary as opaque.
///
/// `decode(encode(x))` may differ from `x` in whitespace normalization but
/// must not drop semantic content.
pub trait TokenCodec: Send + Sync {
    /// Converts text into token ids, without adding special tokens.
    ///
    /// # Errors
    /// - `TokenizerError` if the text cannot be encoded
    fn encode(&self, text: &str) -> Result<Vec<u32>, ClassifierError>;

    /// Converts token ids back into text, stripping special tokens.
    ///
    /// # Errors
    /// - `TokenizerError` if the ids cannot be decoded
    fn decode(&self, ids: &[u32]) -> Result<String, ClassifierError>;

    /// Counts the number of tokens in the text without materializing chunks.
    ///
    /// Used to decide whether a document needs chunking at all.
    fn count_tokens(&self, text: &str) -> Result<usize, ClassifierError> {
        self.encode(text).map(|ids| ids.len())
    }
}
