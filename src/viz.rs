//! Chart-ready series for a rendering layer. Nothing here draws; every
//! chart is exported as plain labels/values data.

use serde::Serialize;

use crate::analysis::{CorpusAnalysis, SourceAnalysis};
use crate::nlp::preprocess::rank_by_count;
use crate::nlp::SentimentStats;

const TOP_ENTITIES: usize = 10;
const WORD_CLOUD_MAX_WORDS: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series<V> {
    pub labels: Vec<String>,
    pub values: Vec<V>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceComparison {
    pub sources: Vec<String>,
    pub article_counts: Vec<usize>,
    pub sentiment_scores: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WordWeight {
    pub word: String,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub sentiment: Series<usize>,
    pub entities: Series<usize>,
    pub sources: SourceComparison,
    pub word_cloud: Vec<WordWeight>,
}

impl ChartData {
    pub fn build(stats: &SentimentStats, analysis: &CorpusAnalysis, sources: &SourceAnalysis) -> Self {
        Self {
            sentiment: sentiment_series(stats),
            entities: entity_series(analysis),
            sources: source_comparison(sources),
            word_cloud: word_cloud(&analysis.processed_text),
        }
    }
}

fn sentiment_series(stats: &SentimentStats) -> Series<usize> {
    Series {
        labels: vec!["Positive".into(), "Negative".into(), "Neutral".into()],
        values: vec![stats.positive_count, stats.negative_count, stats.neutral_count],
    }
}

fn entity_series(analysis: &CorpusAnalysis) -> Series<usize> {
    let top = analysis.entity_frequencies.iter().take(TOP_ENTITIES);
    let (labels, values) = top.map(|(name, count)| (name.clone(), *count)).unzip();
    Series { labels, values }
}

fn source_comparison(sources: &SourceAnalysis) -> SourceComparison {
    SourceComparison {
        sources: sources.keys().map(String::from).collect(),
        article_counts: sources.iter().map(|(_, s)| s.article_count).collect(),
        sentiment_scores: sources.iter().map(|(_, s)| s.avg_sentiment.score).collect(),
    }
}

/// Word frequencies of the processed text, normalised so the most frequent
/// word weighs 1.0.
pub fn word_cloud(processed_text: &str) -> Vec<WordWeight> {
    let ranked = rank_by_count(processed_text.split_whitespace());
    let max = match ranked.first() {
        Some((_, count)) => *count as f64,
        None => return Vec::new(),
    };
    ranked
        .into_iter()
        .take(WORD_CLOUD_MAX_WORDS)
        .map(|(word, count)| WordWeight {
            word,
            weight: count as f64 / max,
        })
        .collect()
}
