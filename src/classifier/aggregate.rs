use std::collections::HashMap;

use serde::Serialize;

use super::zero_shot::LabelScores;

/// How the final prediction was combined from per-chunk results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationMethod {
    /// Single classification of the full text, no aggregation
    Direct,
    /// Per-category mean across all attempted chunks
    MeanProbabilities,
    /// Self-weighted average, selected when it beats the mean by >10%
    WeightedAverage,
}

impl AggregationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::MeanProbabilities => "mean_probabilities",
            Self::WeightedAverage => "weighted_average",
        }
    }
}

impl std::fmt::Display for AggregationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relative margin by which the weighted average must beat the mean before it
/// overrides the mean-probability prediction.
const WEIGHTED_OVERRIDE_MARGIN: f64 = 1.1;

/// Number of leading per-chunk predictions reported for diagnostics.
const CHUNK_PREDICTION_PREVIEW: usize = 5;

/// Per-chunk category scores, in document chunk order.
///
/// A chunk that failed classification is recorded as all zeros rather than
/// omitted, so every category accumulates one value per *attempted* chunk.
pub(crate) type ChunkScores = HashMap<String, f64>;

pub(crate) fn zero_scores(categories: &[String]) -> ChunkScores {
    categories.iter().map(|c| (c.clone(), 0.0)).collect()
}

pub(crate) fn scores_from_labels(result: &LabelScores) -> ChunkScores {
    result
        .labels
        .iter()
        .cloned()
        .zip(result.scores.iter().map(|&s| f64::from(s)))
        .collect()
}

/// Rounds to 4 decimal digits for presentation. Selection never uses rounded
/// values.
pub(crate) fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Outcome of combining per-chunk scores, parallel to the category list.
#[derive(Debug, Clone)]
pub(crate) struct Aggregation {
    pub predicted_category: String,
    pub confidence: f64,
    pub method: AggregationMethod,
    pub mean_scores: Vec<f64>,
    pub weighted_scores: Vec<f64>,
    pub majority_vote: String,
    pub chunk_predictions: Vec<String>,
}

/// Index of the highest value, iterating in category order so that exact ties
/// resolve to the earliest category in the caller-supplied list.
fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > values[best] {
            best = i;
        }
    }
    best
}

/// Strategy A: per-category mean across all attempted chunks. Failed chunks
/// contribute zeros, penalizing categories that could not be evaluated
/// everywhere.
fn mean_scores(categories: &[String], chunks: &[ChunkScores]) -> Vec<f64> {
    categories
        .iter()
        .map(|category| {
            let sum: f64 = chunks
                .iter()
                .map(|scores| scores.get(category).copied().unwrap_or(0.0))
                .sum();
            sum / chunks.len() as f64
        })
        .collect()
}

/// Strategy C: each chunk's score weighted by itself, normalized by the total
/// weight accumulated from the first category's chunk scores.
///
/// The shared normalizer reproduces the reference behavior exactly; it is not
/// a per-category normalizer, so values can exceed 1 when the first category
/// scores low overall.
fn weighted_scores(categories: &[String], chunks: &[ChunkScores]) -> Vec<f64> {
    let total_weight: f64 = match categories.first() {
        Some(first) => chunks
            .iter()
            .map(|scores| scores.get(first).copied().unwrap_or(0.0))
            .sum(),
        None => 0.0,
    };

    categories
        .iter()
        .map(|category| {
            let weighted_sum: f64 = chunks
                .iter()
                .map(|scores| {
                    let s = scores.get(category).copied().unwrap_or(0.0);
                    s * s
                })
                .sum();
            if total_weight > 0.0 {
                weighted_sum / total_weight
            } else {
                0.0
            }
        })
        .collect()
}

/// Each chunk's vote: its single highest-scoring category.
fn chunk_votes(categories: &[String], chunks: &[ChunkScores]) -> Vec<String> {
    chunks
        .iter()
        .map(|scores| {
            let values: Vec<f64> = categories
                .iter()
                .map(|c| scores.get(c).copied().unwrap_or(0.0))
                .collect();
            categories[argmax(&values)].clone()
        })
        .collect()
}

/// Strategy B: the most frequently voted category. Ties are broken by the
/// first occurrence among the tied categories in chunk-sequence order.
fn majority_vote(votes: &[String]) -> Option<String> {
    // (category, vote count, index of its first vote)
    let mut tally: Vec<(String, usize, usize)> = Vec::new();
    for (index, vote) in votes.iter().enumerate() {
        if let Some(entry) = tally.iter_mut().find(|entry| entry.0 == *vote) {
            entry.1 += 1;
        } else {
            tally.push((vote.clone(), 1, index));
        }
    }
    tally
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then(b.2.cmp(&a.2)))
        .map(|entry| entry.0)
}

/// Combines per-chunk score sets into one document-level decision.
///
/// The mean-probability winner is the default; the confidence-weighted winner
/// overrides it only when its score beats the mean winner's by a relative
/// margin greater than 10%. The majority vote is always computed alongside
/// for diagnostics and never overrides the selection.
pub(crate) fn aggregate(categories: &[String], chunks: &[ChunkScores]) -> Aggregation {
    debug_assert!(!categories.is_empty());
    debug_assert!(!chunks.is_empty());

    let means = mean_scores(categories, chunks);
    let weighted = weighted_scores(categories, chunks);

    let mean_winner = argmax(&means);
    let weighted_winner = argmax(&weighted);

    let votes = chunk_votes(categories, chunks);
    let majority = majority_vote(&votes).unwrap_or_else(|| categories[0].clone());

    let (predicted, confidence, method) =
        if weighted[weighted_winner] > means[mean_winner] * WEIGHTED_OVERRIDE_MARGIN {
            (
                categories[weighted_winner].clone(),
                weighted[weighted_winner],
                AggregationMethod::WeightedAverage,
            )
        } else {
            (
                categories[mean_winner].clone(),
                means[mean_winner],
                AggregationMethod::MeanProbabilities,
            )
        };

    let mut chunk_predictions = votes;
    chunk_predictions.truncate(CHUNK_PREDICTION_PREVIEW);

    Aggregation {
        predicted_category: predicted,
        confidence,
        method,
        mean_scores: means,
        weighted_scores: weighted,
        majority_vote: majority,
        chunk_predictions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn categories(labels: &[&str]) -> Vec<String> {
        labels.iter().map(|l| l.to_string()).collect()
    }

    fn chunk(categories: &[String], scores: &[f64]) -> ChunkScores {
        categories
            .iter()
            .cloned()
            .zip(scores.iter().copied())
            .collect()
    }

    #[test]
    fn test_mean_strategy_wins_by_default() {
        let cats = categories(&["alpha", "beta"]);
        let chunks = vec![
            chunk(&cats, &[0.6, 0.4]),
            chunk(&cats, &[0.6, 0.4]),
        ];
        let result = aggregate(&cats, &chunks);
        assert_eq!(result.predicted_category, "alpha");
        assert_eq!(result.method, AggregationMethod::MeanProbabilities);
        assert!((result.confidence - 0.6).abs() < 1e-12);
        // weighted: 2 * 0.36 / 1.2 = 0.6, no 10% margin over the mean
        assert!((result.weighted_scores[0] - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_weighted_average_overrides_on_margin() {
        let cats = categories(&["alpha", "beta"]);
        let chunks = vec![
            chunk(&cats, &[0.9, 0.1]),
            chunk(&cats, &[0.1, 0.9]),
            chunk(&cats, &[0.1, 0.9]),
        ];
        let result = aggregate(&cats, &chunks);
        // mean beta = 1.9/3 ~ 0.6333; weighted beta = 1.63/1.1 ~ 1.4818
        assert_eq!(result.method, AggregationMethod::WeightedAverage);
        assert_eq!(result.predicted_category, "beta");
        assert!((result.confidence - 1.63 / 1.1).abs() < 1e-12);
    }

    #[test]
    fn test_weighted_normalizer_comes_from_first_category() {
        let cats = categories(&["alpha", "beta"]);
        let chunks = vec![
            chunk(&cats, &[0.2, 0.8]),
            chunk(&cats, &[0.4, 0.6]),
        ];
        let result = aggregate(&cats, &chunks);
        // normalizer is the alpha total (0.6) for every category
        assert!((result.weighted_scores[0] - (0.04 + 0.16) / 0.6).abs() < 1e-12);
        assert!((result.weighted_scores[1] - (0.64 + 0.36) / 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_failed_chunk_zeros_lower_the_mean() {
        let cats = categories(&["alpha", "beta"]);
        let chunks = vec![
            chunk(&cats, &[0.8, 0.2]),
            zero_scores(&cats),
        ];
        let result = aggregate(&cats, &chunks);
        assert!((result.mean_scores[0] - 0.4).abs() < 1e-12);
        assert!((result.mean_scores[1] - 0.1).abs() < 1e-12);
        assert_eq!(result.predicted_category, "alpha");
    }

    #[test]
    fn test_all_zero_scores_resolve_to_first_category() {
        let cats = categories(&["alpha", "beta", "gamma"]);
        let chunks = vec![zero_scores(&cats), zero_scores(&cats)];
        let result = aggregate(&cats, &chunks);
        assert_eq!(result.predicted_category, "alpha");
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.method, AggregationMethod::MeanProbabilities);
    }

    #[test]
    fn test_majority_vote_three_against_two() {
        let cats = categories(&["Legal Document", "Business Proposal"]);
        let chunks = vec![
            chunk(&cats, &[0.9, 0.1]),
            chunk(&cats, &[0.2, 0.8]),
            chunk(&cats, &[0.7, 0.3]),
            chunk(&cats, &[0.4, 0.6]),
            chunk(&cats, &[0.6, 0.4]),
        ];
        let result = aggregate(&cats, &chunks);
        assert_eq!(result.majority_vote, "Legal Document");
        assert_eq!(
            result.chunk_predictions,
            vec![
                "Legal Document",
                "Business Proposal",
                "Legal Document",
                "Business Proposal",
                "Legal Document",
            ]
        );
    }

    #[test]
    fn test_majority_tie_breaks_on_earliest_vote() {
        let cats = categories(&["alpha", "beta"]);
        let chunks = vec![
            chunk(&cats, &[0.2, 0.8]),
            chunk(&cats, &[0.8, 0.2]),
            chunk(&cats, &[0.3, 0.7]),
            chunk(&cats, &[0.7, 0.3]),
        ];
        let result = aggregate(&cats, &chunks);
        // two votes each; beta voted first (chunk 0)
        assert_eq!(result.majority_vote, "beta");
    }

    #[test]
    fn test_chunk_predictions_keep_first_five_only() {
        let cats = categories(&["alpha", "beta"]);
        let chunks: Vec<ChunkScores> = (0..7).map(|_| chunk(&cats, &[0.9, 0.1])).collect();
        let result = aggregate(&cats, &chunks);
        assert_eq!(result.chunk_predictions.len(), 5);
    }

    #[test]
    fn test_selection_uses_unrounded_values() {
        let cats = categories(&["alpha", "beta"]);
        // identical to 4 decimals, beta ahead in the 5th
        let chunks = vec![chunk(&cats, &[0.50000, 0.50004])];
        let result = aggregate(&cats, &chunks);
        assert_eq!(result.predicted_category, "beta");
        assert_eq!(round4(result.mean_scores[0]), round4(result.mean_scores[1]));
    }

    #[test]
    fn test_aggregation_is_deterministic() {
        let cats = categories(&["alpha", "beta", "gamma"]);
        let chunks = vec![
            chunk(&cats, &[0.5, 0.3, 0.2]),
            chunk(&cats, &[0.1, 0.6, 0.3]),
            chunk(&cats, &[0.2, 0.2, 0.6]),
        ];
        let first = aggregate(&cats, &chunks);
        let second = aggregate(&cats, &chunks);
        assert_eq!(first.predicted_category, second.predicted_category);
        assert_eq!(first.mean_scores, second.mean_scores);
        assert_eq!(first.weighted_scores, second.weighted_scores);
        assert_eq!(first.majority_vote, second.majority_vote);
    }

    #[test]
    fn test_round4() {
        assert_eq!(round4(0.123_449), 0.1234);
        assert_eq!(round4(0.123_46), 0.1235);
        assert_eq!(round4(1.0), 1.0);
    }
}
