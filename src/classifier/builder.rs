use std::sync::Arc;

use log::{info, warn};
use ort::session::Session;
use tokenizers::{Tokenizer, TruncationParams, TruncationStrategy};

use super::chunker::ChunkConfig;
use super::error::ClassifierError;
use super::pipeline::{default_categories, validate_categories, DocumentClassifier};
use super::zero_shot::{NliModel, DEFAULT_HYPOTHESIS_TEMPLATE};
use crate::models::{BuiltinModel, ModelCharacteristics};
use crate::runtime::{create_session_builder, RuntimeConfig};
use crate::ModelManager;

/// A builder for constructing a DocumentClassifier with a fluent interface.
///
/// # Example
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use wernicke::{BuiltinModel, DocumentClassifier};
///
/// let classifier = DocumentClassifier::builder()
///     .with_model(BuiltinModel::BartLargeMnli)?
///     .with_categories(vec!["Contract", "Invoice", "Resume"])?
///     .build()?;
///
/// let result = classifier.classify("This agreement is entered into by and between...");
/// println!("{} ({:.4})", result.predicted_category, result.confidence_score);
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct DocumentClassifierBuilder {
    model_path: Option<String>,
    tokenizer_path: Option<String>,
    tokenizer: Option<Tokenizer>,
    session: Option<Session>,
    characteristics: Option<ModelCharacteristics>,
    model_id: Option<String>,
    categories: Option<Vec<String>>,
    chunking: ChunkConfig,
    hypothesis_template: Option<String>,
    runtime_config: RuntimeConfig,
}

impl DocumentClassifierBuilder {
    /// Creates a new empty builder with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the runtime configuration for ONNX model execution
    pub fn with_runtime_config(mut self, config: RuntimeConfig) -> Self {
        self.runtime_config = config;
        self
    }

    /// Sets the model to use for classification using a built-in model type
    ///
    /// # Errors
    /// Returns `BuildError` if:
    /// - The model paths are already set
    /// - The model is not downloaded
    /// - The model or tokenizer failed to load
    /// - The model structure is invalid
    pub fn with_model(mut self, model: BuiltinModel) -> Result<Self, ClassifierError> {
        if self.model_path.is_some() || self.tokenizer_path.is_some() {
            return Err(ClassifierError::BuildError(
                "Model and tokenizer paths already set".to_string(),
            ));
        }

        let manager = ModelManager::new_default().map_err(|e| {
            ClassifierError::BuildError(format!("Failed to create model manager: {}", e))
        })?;

        if !manager.is_model_downloaded(model) {
            return Err(ClassifierError::BuildError(format!(
                "Model '{:?}' is not downloaded. Please download it first using ModelManager::download_model()",
                model
            )));
        }

        let info = model.get_model_info();
        let model_path = manager.get_model_path(model);
        let tokenizer_path = manager.get_tokenizer_path(model);

        let tokenizer = Tokenizer::from_file(&tokenizer_path).map_err(|e| {
            ClassifierError::BuildError(format!("Failed to load tokenizer: {}", e))
        })?;
        info!("Tokenizer loaded successfully");

        let session = create_session_builder(&self.runtime_config)?
            .commit_from_file(&model_path)
            .map_err(|e| ClassifierError::BuildError(format!("Failed to load model: {}", e)))?;

        Self::validate_model(&session)?;
        info!("Model structure validated successfully");

        self.characteristics = Some(model.characteristics());
        self.model_id = Some(info.model_id.to_string());
        self.model_path = Some(model_path.to_string_lossy().to_string());
        self.tokenizer_path = Some(tokenizer_path.to_string_lossy().to_string());
        self.tokenizer = Some(tokenizer);
        self.session = Some(session);
        Ok(self)
    }

    /// Sets a custom NLI model and tokenizer for the classifier.
    ///
    /// `max_sequence_length` bounds one premise/hypothesis pair (defaults to
    /// 512 tokens). `entailment_index` is the position of the entailment
    /// logit in the model's three-way output head.
    ///
    /// # Errors
    /// Returns `BuildError` if the paths are empty, already set, missing on
    /// disk, or if the model or tokenizer fails to load or validate.
    pub fn with_custom_model(
        mut self,
        model_path: &str,
        tokenizer_path: &str,
        max_sequence_length: Option<usize>,
        entailment_index: usize,
    ) -> Result<Self, ClassifierError> {
        if model_path.is_empty() || tokenizer_path.is_empty() {
            return Err(ClassifierError::BuildError(
                "Model and tokenizer paths cannot be empty".to_string(),
            ));
        }
        if self.model_path.is_some() || self.tokenizer_path.is_some() {
            return Err(ClassifierError::BuildError(
                "Model and tokenizer paths already set".to_string(),
            ));
        }
        if !std::path::Path::new(model_path).exists() {
            return Err(ClassifierError::BuildError(format!(
                "Model file not found: {}",
                model_path
            )));
        }
        if !std::path::Path::new(tokenizer_path).exists() {
            return Err(ClassifierError::BuildError(format!(
                "Tokenizer file not found: {}",
                tokenizer_path
            )));
        }

        let tokenizer = Tokenizer::from_file(tokenizer_path).map_err(|e| {
            ClassifierError::BuildError(format!("Failed to load tokenizer: {}", e))
        })?;
        info!("Tokenizer loaded successfully");

        let session = create_session_builder(&self.runtime_config)?
            .commit_from_file(model_path)
            .map_err(|e| ClassifierError::BuildError(format!("Failed to load model: {}", e)))?;

        Self::validate_model(&session)?;
        info!("Model structure validated successfully");

        self.characteristics = Some(ModelCharacteristics {
            max_sequence_length: max_sequence_length.unwrap_or(512),
            entailment_index,
            model_size_mb: 0,
        });
        self.model_id = Some(model_path.to_string());
        self.model_path = Some(model_path.to_string());
        self.tokenizer_path = Some(tokenizer_path.to_string());
        self.tokenizer = Some(tokenizer);
        self.session = Some(session);
        Ok(self)
    }

    /// Sets the ordered category list used when a call does not supply one.
    ///
    /// # Errors
    /// Returns `ValidationError` if the list is empty or contains empty or
    /// duplicate labels.
    pub fn with_categories(
        mut self,
        categories: Vec<impl Into<String>>,
    ) -> Result<Self, ClassifierError> {
        let categories: Vec<String> = categories.into_iter().map(Into::into).collect();
        validate_categories(&categories)?;
        self.categories = Some(categories);
        Ok(self)
    }

    /// Overrides the default chunking parameters.
    ///
    /// # Errors
    /// Returns `ConfigError` if the overlap is not smaller than the chunk
    /// size (the splitter could not terminate otherwise).
    pub fn with_chunking(mut self, config: ChunkConfig) -> Result<Self, ClassifierError> {
        config.validate()?;
        self.chunking = config;
        Ok(self)
    }

    /// Overrides the hypothesis template wrapped around each category label.
    ///
    /// # Errors
    /// Returns `ValidationError` if the template has no `{}` placeholder.
    pub fn with_hypothesis_template(
        mut self,
        template: impl Into<String>,
    ) -> Result<Self, ClassifierError> {
        let template = template.into();
        if !template.contains("{}") {
            return Err(ClassifierError::ValidationError(
                "Hypothesis template must contain a {} placeholder".to_string(),
            ));
        }
        self.hypothesis_template = Some(template);
        Ok(self)
    }

    /// Builds and returns the final DocumentClassifier instance
    ///
    /// # Errors
    /// Returns `BuildError` if no model and tokenizer are set, or if the
    /// truncation setup for premise/hypothesis pairs fails.
    pub fn build(mut self) -> Result<DocumentClassifier, ClassifierError> {
        let tokenizer = self
            .tokenizer
            .take()
            .ok_or_else(|| ClassifierError::BuildError("No tokenizer loaded".into()))?;
        let session = self
            .session
            .take()
            .ok_or_else(|| ClassifierError::BuildError("No ONNX model loaded".into()))?;
        let characteristics = self
            .characteristics
            .take()
            .ok_or_else(|| ClassifierError::BuildError("Model characteristics not set".into()))?;
        let model_id = self.model_id.take().unwrap_or_else(|| "custom".to_string());

        if self.chunking.max_chunk_tokens > characteristics.max_sequence_length {
            warn!(
                "Chunk budget of {} tokens exceeds the model's {} token sequence limit; \
                 oversized chunks will be truncated at classification time",
                self.chunking.max_chunk_tokens, characteristics.max_sequence_length
            );
        }

        // Truncation is confined to the pair tokenizer: the document codec
        // must count every token or long texts would never be chunked.
        let mut pair_tokenizer = tokenizer.clone();
        if let Err(e) = pair_tokenizer.with_truncation(Some(TruncationParams {
            max_length: characteristics.max_sequence_length,
            strategy: TruncationStrategy::OnlyFirst,
            ..Default::default()
        })) {
            return Err(ClassifierError::BuildError(format!(
                "Failed to configure pair truncation: {}",
                e
            )));
        }

        let hypothesis_template = self
            .hypothesis_template
            .take()
            .unwrap_or_else(|| DEFAULT_HYPOTHESIS_TEMPLATE.to_string());

        let model = Arc::new(NliModel::new(
            Arc::new(tokenizer),
            Arc::new(pair_tokenizer),
            Arc::new(session),
            characteristics,
            hypothesis_template,
        ));

        DocumentClassifier::new(
            model.clone(),
            model,
            self.chunking,
            self.categories.take().unwrap_or_else(default_categories),
            model_id,
        )
    }

    /// Validates that the model has the expected input/output structure
    fn validate_model(session: &Session) -> Result<(), ClassifierError> {
        let inputs = &session.inputs;
        if inputs.len() < 2 {
            return Err(ClassifierError::ModelError(format!(
                "Model must have at least 2 inputs (input_ids and attention_mask), found {}",
                inputs.len()
            )));
        }

        let outputs = &session.outputs;
        if outputs.is_empty() {
            return Err(ClassifierError::ModelError(
                "Model must have at least 1 output for the NLI logits".to_string(),
            ));
        }

        Ok(())
    }
}
