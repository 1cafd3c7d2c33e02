//! Inference oracles: opaque text -> result models behind a fixed interface.
//!
//! Implementations are shared read-only across concurrent requests, so a
//! `classify` or `summarize` call must not race on internal state. It must
//! either be stateless or synchronise internally. Every call is bounded by
//! the timeout it is given; exceeding it is reported as
//! `OracleError::Timeout`, which callers treat like any other inference
//! failure.

pub mod ollama;

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::OracleError;
use crate::nlp::SentimentLabel;

pub use ollama::OllamaBackend;

/// Top label of a sentiment classifier with its confidence in [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub label: SentimentLabel,
    pub confidence: f64,
}

/// Decoding settings handed to a summarization oracle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub min_length: usize,
    pub max_length: usize,
    pub num_beams: u32,
    pub length_penalty: f32,
    pub early_stopping: bool,
    pub no_repeat_ngram_size: usize,
}

pub trait SentimentOracle: Send + Sync {
    fn name(&self) -> &str;

    fn classify(&self, text: &str, timeout: Duration) -> Result<Classification, OracleError>;
}

pub trait SummaryOracle: Send + Sync {
    fn name(&self) -> &str;

    fn summarize(
        &self,
        text: &str,
        params: &GenerationParams,
        timeout: Duration,
    ) -> Result<String, OracleError>;
}

/// Map a classifier label to the three-valued label set. Accepts the usual
/// spellings plus the `LABEL_0/1/2` ids of three-class checkpoints.
pub fn parse_label(raw: &str) -> Option<SentimentLabel> {
    let cleaned = raw
        .trim()
        .trim_matches(|c: char| !c.is_alphanumeric() && c != '_')
        .to_lowercase();
    match cleaned.as_str() {
        "positive" | "pos" | "label_2" => Some(SentimentLabel::Positive),
        "negative" | "neg" | "label_0" => Some(SentimentLabel::Negative),
        "neutral" | "neu" | "label_1" => Some(SentimentLabel::Neutral),
        _ => None,
    }
}

/// Parse a `<label> <confidence>` reply. The first recognised label and the
/// first number found are used.
pub fn parse_classification(reply: &str) -> Result<Classification, OracleError> {
    let mut label = None;
    let mut confidence = None;
    for token in reply.split(|c: char| c.is_whitespace() || c == ':' || c == ',') {
        if token.is_empty() {
            continue;
        }
        if label.is_none() {
            if let Some(l) = parse_label(token) {
                label = Some(l);
                continue;
            }
        }
        if confidence.is_none() {
            let numeric = token.trim_matches(|c: char| !c.is_ascii_digit() && c != '.');
            if let Ok(v) = numeric.parse::<f64>() {
                confidence = Some(v);
            }
        }
    }

    let label = label.ok_or_else(|| OracleError::Malformed(format!("no sentiment label in {reply:?}")))?;
    let confidence =
        confidence.ok_or_else(|| OracleError::Malformed(format!("no confidence in {reply:?}")))?;
    if !(0.0..=1.0).contains(&confidence) {
        return Err(OracleError::Malformed(format!("confidence {confidence} outside [0, 1]")));
    }
    Ok(Classification { label, confidence })
}

/// Drop words that would repeat an n-gram already present, then cut to at
/// most `max_words` words.
pub fn enforce_summary_bounds(summary: &str, no_repeat_ngram_size: usize, max_words: usize) -> String {
    let mut kept: Vec<&str> = Vec::new();
    let mut seen: Vec<Vec<String>> = Vec::new();
    let n = no_repeat_ngram_size;

    for word in summary.split_whitespace() {
        if kept.len() >= max_words {
            break;
        }
        if n > 0 && kept.len() + 1 >= n {
            let gram: Vec<String> = kept[kept.len() + 1 - n..]
                .iter()
                .chain(std::iter::once(&word))
                .map(|w| w.to_lowercase())
                .collect();
            if seen.contains(&gram) {
                continue;
            }
            seen.push(gram);
        }
        kept.push(word);
    }
    kept.join(" ")
}
