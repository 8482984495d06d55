use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use wernicke::{
    AggregationMethod, ChunkConfig, ClassifierError, DocumentClassifier, LabelScores, TokenCodec,
    ZeroShotBackend, FALLBACK_CATEGORY,
};

/// One token per character; decode inverts encode exactly.
struct CharCodec;

impl TokenCodec for CharCodec {
    fn encode(&self, text: &str) -> Result<Vec<u32>, ClassifierError> {
        Ok(text.chars().map(|c| c as u32).collect())
    }

    fn decode(&self, ids: &[u32]) -> Result<String, ClassifierError> {
        ids.iter()
            .map(|&id| {
                char::from_u32(id).ok_or_else(|| {
                    ClassifierError::TokenizerError(format!("invalid token id {}", id))
                })
            })
            .collect()
    }
}

/// Replays scripted per-call score vectors (in category order) and records
/// the token length of every text it was asked to classify.
struct ScriptedBackend {
    responses: Mutex<VecDeque<Result<Vec<f32>, String>>>,
    seen_lengths: Mutex<Vec<usize>>,
}

impl ScriptedBackend {
    fn new(responses: Vec<Result<Vec<f32>, String>>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
            seen_lengths: Mutex::new(Vec::new()),
        }
    }

    fn seen_lengths(&self) -> Vec<usize> {
        self.seen_lengths.lock().unwrap().clone()
    }

    fn calls(&self) -> usize {
        self.seen_lengths.lock().unwrap().len()
    }
}

impl ZeroShotBackend for ScriptedBackend {
    fn classify(&self, text: &str, categories: &[String]) -> Result<LabelScores, ClassifierError> {
        self.seen_lengths.lock().unwrap().push(text.chars().count());
        let next = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("backend called more often than scripted");
        match next {
            Ok(scores) => {
                assert_eq!(scores.len(), categories.len());
                let mut pairs: Vec<(String, f32)> =
                    categories.iter().cloned().zip(scores).collect();
                pairs.sort_by(|a, b| {
                    b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal)
                });
                Ok(LabelScores {
                    labels: pairs.iter().map(|(l, _)| l.clone()).collect(),
                    scores: pairs.iter().map(|(_, s)| *s).collect(),
                })
            }
            Err(message) => Err(ClassifierError::ClassificationError(message)),
        }
    }
}

fn categories(labels: &[&str]) -> Vec<String> {
    labels.iter().map(|l| l.to_string()).collect()
}

fn classifier(
    backend: Arc<ScriptedBackend>,
    max_chunk_tokens: usize,
    labels: &[&str],
) -> DocumentClassifier {
    DocumentClassifier::new(
        Arc::new(CharCodec),
        backend,
        ChunkConfig::new(max_chunk_tokens, 0.2),
        categories(labels),
        "scripted-model",
    )
    .unwrap()
}

#[test]
fn test_short_text_is_classified_directly() {
    let backend = Arc::new(ScriptedBackend::new(vec![Ok(vec![0.7, 0.3])]));
    let classifier = classifier(backend.clone(), 900, &["alpha", "beta"]);

    let result = classifier.classify("a short note");
    assert!(result.error.is_none());
    assert_eq!(result.aggregation_method, AggregationMethod::Direct);
    assert_eq!(result.chunks_used, 1);
    assert_eq!(result.predicted_category, "alpha");
    assert_eq!(result.confidence_score, 0.7);
    assert_eq!(result.majority_vote, "alpha");
    assert_eq!(result.chunk_predictions, vec!["alpha"]);
    assert!(!result.was_truncated);
    assert_eq!(backend.calls(), 1);
}

#[test]
fn test_long_text_is_chunked_with_constant_overlap() {
    // 2,000 tokens, 900-token budget, 20% overlap: [0,900) [720,1620) [1440,2000)
    let backend = Arc::new(ScriptedBackend::new(vec![
        Ok(vec![0.6, 0.4]),
        Ok(vec![0.6, 0.4]),
        Ok(vec![0.6, 0.4]),
    ]));
    let classifier = classifier(backend.clone(), 900, &["alpha", "beta"]);

    let text = "x".repeat(2000);
    let result = classifier.classify(&text);

    assert!(result.error.is_none());
    assert_eq!(result.chunks_used, 3);
    assert_eq!(result.text_length_tokens, 2000);
    assert_eq!(backend.seen_lengths(), vec![900, 900, 560]);
    assert_eq!(result.predicted_category, "alpha");
    assert_eq!(result.aggregation_method, AggregationMethod::MeanProbabilities);
    assert!(!result.was_truncated);
}

#[test]
fn test_identical_input_yields_identical_result() {
    let script = || {
        Arc::new(ScriptedBackend::new(vec![
            Ok(vec![0.5, 0.3, 0.2]),
            Ok(vec![0.1, 0.6, 0.3]),
            Ok(vec![0.2, 0.2, 0.6]),
        ]))
    };
    let text = "y".repeat(2000);

    let first = classifier(script(), 900, &["a", "b", "c"]).classify(&text);
    let second = classifier(script(), 900, &["a", "b", "c"]).classify(&text);

    assert_eq!(first.predicted_category, second.predicted_category);
    assert_eq!(first.confidence_score, second.confidence_score);
    assert_eq!(first.all_scores, second.all_scores);
    assert_eq!(first.weighted_scores, second.weighted_scores);
    assert_eq!(first.majority_vote, second.majority_vote);
    assert_eq!(first.chunk_predictions, second.chunk_predictions);
}

#[test]
fn test_failed_chunk_scores_zero_and_processing_continues() {
    let backend = Arc::new(ScriptedBackend::new(vec![
        Ok(vec![0.8, 0.2]),
        Err("scripted failure".to_string()),
        Ok(vec![0.8, 0.2]),
    ]));
    let classifier = classifier(backend.clone(), 900, &["alpha", "beta"]);

    let result = classifier.classify(&"z".repeat(2000));

    // the failure is isolated: no error surfaces, all chunks counted
    assert!(result.error.is_none());
    assert_eq!(result.chunks_used, 3);
    assert_eq!(backend.calls(), 3);
    // alpha mean = (0.8 + 0.0 + 0.8) / 3
    assert_eq!(result.all_scores["alpha"], 0.5333);
    assert_eq!(result.all_scores["beta"], 0.1333);
    assert_eq!(result.predicted_category, "alpha");
}

#[test]
fn test_all_chunks_failing_still_produces_a_result() {
    let backend = Arc::new(ScriptedBackend::new(vec![
        Err("down".to_string()),
        Err("down".to_string()),
        Err("down".to_string()),
    ]));
    let classifier = classifier(backend, 900, &["alpha", "beta"]);

    let result = classifier.classify(&"z".repeat(2000));
    assert!(result.error.is_none());
    assert_eq!(result.predicted_category, "alpha");
    assert_eq!(result.confidence_score, 0.0);
}

#[test]
fn test_majority_vote_reported_alongside_selection() {
    // five chunks: 3 vote Legal Document, 2 vote Business Proposal
    let backend = Arc::new(ScriptedBackend::new(vec![
        Ok(vec![0.9, 0.1]),
        Ok(vec![0.2, 0.8]),
        Ok(vec![0.7, 0.3]),
        Ok(vec![0.4, 0.6]),
        Ok(vec![0.6, 0.4]),
    ]));
    // 2,100 tokens with a 500-token budget and 100-token overlap: 5 chunks
    let classifier = DocumentClassifier::new(
        Arc::new(CharCodec),
        backend,
        ChunkConfig::new(500, 0.2),
        categories(&["Legal Document", "Business Proposal"]),
        "scripted-model",
    )
    .unwrap();

    let result = classifier.classify(&"w".repeat(2100));
    assert_eq!(result.chunks_used, 5);
    assert_eq!(result.majority_vote, "Legal Document");
    assert_eq!(result.chunk_predictions.len(), 5);
}

#[test]
fn test_weighted_average_override() {
    let backend = Arc::new(ScriptedBackend::new(vec![
        Ok(vec![0.9, 0.1]),
        Ok(vec![0.1, 0.9]),
        Ok(vec![0.1, 0.9]),
    ]));
    let classifier = classifier(backend, 900, &["alpha", "beta"]);

    let result = classifier.classify(&"q".repeat(2000));
    // weighted beta = 1.63/1.1 ~ 1.4818 beats mean beta ~ 0.6333 by >10%
    assert_eq!(result.aggregation_method, AggregationMethod::WeightedAverage);
    assert_eq!(result.predicted_category, "beta");
    assert_eq!(result.confidence_score, 1.4818);
    assert_eq!(result.majority_vote, "beta");
}

#[test]
fn test_empty_and_whitespace_input_return_sentinel() {
    let backend = Arc::new(ScriptedBackend::new(vec![]));
    let classifier = classifier(backend.clone(), 900, &["alpha", "beta"]);

    for text in ["", "   \n\t"] {
        let result = classifier.classify(text);
        assert_eq!(result.predicted_category, FALLBACK_CATEGORY);
        assert_eq!(result.confidence_score, 0.0);
        assert!(result.error.is_some());
    }
    // the classification primitive was never invoked
    assert_eq!(backend.calls(), 0);
}

#[test]
fn test_per_call_categories_do_not_mutate_defaults() {
    let backend = Arc::new(ScriptedBackend::new(vec![
        Ok(vec![0.2, 0.8]),
        Ok(vec![0.7, 0.3]),
    ]));
    let classifier = classifier(backend, 900, &["alpha", "beta"]);

    let custom = categories(&["gamma", "delta"]);
    let result = classifier.classify_with_categories("first call", &custom);
    assert_eq!(result.predicted_category, "delta");

    let result = classifier.classify("second call");
    assert_eq!(result.predicted_category, "alpha");
    assert_eq!(classifier.categories(), &["alpha", "beta"]);
}

#[test]
fn test_classifier_is_shareable_across_threads() {
    let backend = Arc::new(ScriptedBackend::new(vec![
        Ok(vec![0.7, 0.3]),
        Ok(vec![0.7, 0.3]),
        Ok(vec![0.7, 0.3]),
    ]));
    let classifier = Arc::new(classifier(backend, 900, &["alpha", "beta"]));

    let mut handles = vec![];
    for _ in 0..3 {
        let classifier = Arc::clone(&classifier);
        handles.push(std::thread::spawn(move || {
            let result = classifier.classify("thread local text");
            assert!(result.error.is_none());
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }
}
