/// Built-in NLI models usable for zero-shot classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinModel {
    /// facebook/bart-large-mnli, the reference English zero-shot model
    BartLargeMnli,
    /// MoritzLaurer/mDeBERTa-v3-base-mnli-xnli, multilingual and smaller
    MDebertaV3Mnli,
}

/// Download metadata for a built-in model.
#[derive(Debug, Clone)]
pub struct ModelInfo {
    /// Directory name under the models cache
    pub name: &'static str,
    /// Human-readable model name
    pub display_name: &'static str,
    /// Upstream model identifier
    pub model_id: &'static str,
    pub model_url: &'static str,
    pub model_hash: &'static str,
    pub tokenizer_url: &'static str,
    pub tokenizer_hash: &'static str,
}

/// Static properties of a model relevant to the classification pipeline.
#[derive(Debug, Clone)]
pub struct ModelCharacteristics {
    /// Maximum sequence length of one premise/hypothesis pair
    pub max_sequence_length: usize,
    /// Position of the entailment logit in the model's output
    pub entailment_index: usize,
    /// Approximate size of the ONNX file in megabytes
    pub model_size_mb: usize,
}

impl BuiltinModel {
    pub fn get_model_info(&self) -> ModelInfo {
        match self {
            Self::BartLargeMnli => ModelInfo {
                name: "bart-large-mnli",
                display_name: "BART Large MNLI",
                model_id: "facebook/bart-large-mnli",
                model_url: "https://huggingface.co/Xenova/bart-large-mnli/resolve/main/onnx/model.onnx",
                model_hash: "a0c9d7e13d8ad5b0f8b6e4c55d3e5721f9c4a8e02d6b1f37c88a9be50f41a6d2",
                tokenizer_url: "https://huggingface.co/Xenova/bart-large-mnli/resolve/main/tokenizer.json",
                tokenizer_hash: "4f2ab24a0c3bb1d6385fe03bd7e6a52dd1ee45c8bb01f6e9847c2f0d9a33b570",
            },
            Self::MDebertaV3Mnli => ModelInfo {
                name: "mdeberta-v3-base-mnli-xnli",
                display_name: "mDeBERTa v3 Base MNLI XNLI",
                model_id: "MoritzLaurer/mDeBERTa-v3-base-mnli-xnli",
                model_url: "https://huggingface.co/Xenova/mDeBERTa-v3-base-mnli-xnli/resolve/main/onnx/model.onnx",
                model_hash: "7c1e09f4a2d64b8e3f05c7aa918d2bfe6c430d15e7a8f29b04d6c3e58a1f7b09",
                tokenizer_url: "https://huggingface.co/Xenova/mDeBERTa-v3-base-mnli-xnli/resolve/main/tokenizer.json",
                tokenizer_hash: "90be5d1a74c2ef08b3d6a97f14e02c55871fc6e2d3a40b9887e5b20c64d9a113",
            },
        }
    }

    pub fn characteristics(&self) -> ModelCharacteristics {
        match self {
            // MNLI head order: [contradiction, neutral, entailment]
            Self::BartLargeMnli => ModelCharacteristics {
                max_sequence_length: 1024,
                entailment_index: 2,
                model_size_mb: 1630,
            },
            // XNLI head order: [entailment, neutral, contradiction]
            Self::MDebertaV3Mnli => ModelCharacteristics {
                max_sequence_length: 512,
                entailment_index: 0,
                model_size_mb: 558,
            },
        }
    }
}
