use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use log::info;

use wernicke::{
    BuiltinModel, ChunkConfig, DocumentClassification, DocumentClassifier, ModelManager,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModelArg {
    /// facebook/bart-large-mnli (English)
    Bart,
    /// MoritzLaurer/mDeBERTa-v3-base-mnli-xnli (multilingual)
    Mdeberta,
}

impl From<ModelArg> for BuiltinModel {
    fn from(arg: ModelArg) -> Self {
        match arg {
            ModelArg::Bart => BuiltinModel::BartLargeMnli,
            ModelArg::Mdeberta => BuiltinModel::MDebertaV3Mnli,
        }
    }
}

impl std::fmt::Display for ModelArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelArg::Bart => f.write_str("bart"),
            ModelArg::Mdeberta => f.write_str("mdeberta"),
        }
    }
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Plain-text file to classify; omit to run the built-in demo inputs
    file: Option<PathBuf>,

    /// Classify this text literal instead of reading a file
    #[arg(long, conflicts_with = "file")]
    text: Option<String>,

    /// Model to classify with
    #[arg(long, value_enum, default_value_t = ModelArg::Bart)]
    model: ModelArg,

    /// Comma-separated category list (defaults to the built-in set)
    #[arg(long, value_delimiter = ',')]
    categories: Vec<String>,

    /// Maximum tokens per chunk
    #[arg(long, default_value_t = 900)]
    max_chunk_tokens: usize,

    /// Fraction of each chunk shared with its neighbor
    #[arg(long, default_value_t = 0.2)]
    overlap: f64,

    /// Force a fresh download of the model files
    #[arg(short, long)]
    fresh: bool,

    /// Print the full result record as JSON
    #[arg(long)]
    json: bool,
}

async fn ensure_model_downloaded(model: BuiltinModel, fresh: bool) -> Result<()> {
    let manager = ModelManager::new_default()?;

    if fresh {
        info!("Fresh download requested - removing any existing model files...");
        manager.remove_download(model)?;
    }

    if !manager.is_model_downloaded(model) {
        info!("Downloading model...");
        manager.download_model(model).await?;
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    wernicke::init_logger();
    let args = Args::parse();
    let model: BuiltinModel = args.model.into();

    ensure_model_downloaded(model, args.fresh).await?;

    let start_time = Instant::now();
    info!("Building classifier...");

    let mut builder = DocumentClassifier::builder()
        .with_model(model)?
        .with_chunking(ChunkConfig::new(args.max_chunk_tokens, args.overlap))?;
    if !args.categories.is_empty() {
        builder = builder.with_categories(args.categories.clone())?;
    }
    let classifier = builder.build()?;

    let build_time = start_time.elapsed();
    info!("Classifier built in {:.2?}", build_time);

    let inputs: Vec<String> = if let Some(path) = &args.file {
        vec![std::fs::read_to_string(path)?]
    } else if let Some(text) = &args.text {
        vec![text.clone()]
    } else {
        demo_inputs()
    };

    let classify_start = Instant::now();
    for (i, text) in inputs.iter().enumerate() {
        info!(
            "Classifying input {}/{} (elapsed: {:.2?})",
            i + 1,
            inputs.len(),
            classify_start.elapsed()
        );
        let result = classifier.classify(text);
        if args.json {
            println!("{}", serde_json::to_string_pretty(&result)?);
        } else {
            print_result(&result);
        }
    }

    info!("Total time: {:.2?}", start_time.elapsed());
    Ok(())
}

fn print_result(result: &DocumentClassification) {
    println!("\nResults:");
    if let Some(error) = &result.error {
        println!("  Error: {}", error);
        return;
    }
    println!(
        "  Predicted category: {} ({:.4})",
        result.predicted_category, result.confidence_score
    );
    println!(
        "  Method: {} over {} chunk(s), {} tokens",
        result.aggregation_method, result.chunks_used, result.text_length_tokens
    );
    println!("  Majority vote: {}", result.majority_vote);

    let mut scores: Vec<_> = result.all_scores.iter().collect();
    scores.sort_by(|a, b| b.1.partial_cmp(a.1).unwrap_or(std::cmp::Ordering::Equal));
    println!("  Category scores (sorted):");
    for (label, score) in scores {
        println!("    {}: {:.1}%", label, score * 100.0);
    }
    println!("  Inference time: {:.3}s", result.inference_time);
}

fn demo_inputs() -> Vec<String> {
    [
        // Clear single-category cases
        "This API reference describes the authentication endpoints, request \
         schemas, and error codes for the v2 payments service.",
        "We propose a three-year partnership to expand distribution into the \
         EMEA market, with projected revenue growth of 40% by year two.",
        "This agreement is entered into by and between the Licensor and the \
         Licensee, who hereby agree to the terms and conditions set forth below.",
        // Mixed-category cases
        "Our study evaluates the economic impact of open-source licensing on \
         enterprise software procurement decisions.",
        // Edge case
        "Short note.",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
