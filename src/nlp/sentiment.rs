// Sentiment scoring: primary classifier oracle with a lexicon-based fallback.
//
// The two methods report different things in `score`. A "transformer" score
// is the classifier's confidence in its label; a "textblob" score is the
// absolute lexical polarity. Both lie in [0, 1] but they are not comparable
// with each other.
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::Lazy;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::context::PipelineContext;
use crate::error::Outcome;
use crate::oracle::SentimentOracle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoringMethod {
    Transformer,
    Textblob,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentResult {
    pub label: SentimentLabel,
    pub score: f64,
    pub method: ScoringMethod,
}

impl SentimentResult {
    /// Label a lexical polarity. The neutral band is exclusive on both ends:
    /// a polarity of exactly `band` is still neutral.
    pub fn from_polarity(polarity: f64, band: f64) -> Self {
        let label = if polarity > band {
            SentimentLabel::Positive
        } else if polarity < -band {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        };
        Self {
            label,
            score: polarity.abs(),
            method: ScoringMethod::Textblob,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentStats {
    pub positive_count: usize,
    pub negative_count: usize,
    pub neutral_count: usize,
    pub total: usize,
}

// Polarity lexicon, values in [-1, 1]
static LEXICON: Lazy<HashMap<&'static str, f64>> = Lazy::new(|| {
    [
        ("good", 0.7), ("great", 0.8), ("excellent", 1.0), ("wonderful", 1.0),
        ("fantastic", 0.4), ("amazing", 0.6), ("awesome", 1.0), ("love", 0.5),
        ("happy", 0.8), ("joy", 0.8), ("pleased", 0.5), ("delighted", 0.7),
        ("satisfied", 0.5), ("perfect", 1.0), ("beautiful", 0.85), ("brilliant", 0.9),
        ("outstanding", 0.5), ("superb", 1.0), ("impressive", 1.0), ("remarkable", 0.75),
        ("best", 1.0), ("better", 0.5), ("positive", 0.23), ("success", 0.3),
        ("successful", 0.75), ("win", 0.8), ("wins", 0.8), ("winning", 0.5),
        ("triumph", 0.6), ("enjoy", 0.4), ("pleasant", 0.73), ("excited", 0.38),
        ("exciting", 0.3), ("strong", 0.43), ("stronger", 0.45), ("growth", 0.3),
        ("gain", 0.3), ("gains", 0.3), ("rise", 0.2), ("surge", 0.35), ("boost", 0.4),
        ("improve", 0.4), ("improved", 0.4), ("progress", 0.3), ("breakthrough", 0.5),
        ("record", 0.2), ("optimistic", 0.5), ("confident", 0.5), ("hope", 0.3),
        ("hopeful", 0.5), ("safe", 0.5), ("peace", 0.4), ("agreement", 0.3),
        ("support", 0.2), ("benefit", 0.4), ("recovery", 0.35), ("profit", 0.3),
        ("bad", -0.7), ("terrible", -1.0), ("awful", -1.0), ("horrible", -1.0),
        ("poor", -0.4), ("worst", -1.0), ("worse", -0.4), ("hate", -0.8),
        ("angry", -0.5), ("sad", -0.5), ("upset", -0.4), ("disappointed", -0.75),
        ("disappointing", -0.6), ("unhappy", -0.6), ("fail", -0.5), ("failure", -0.32),
        ("failed", -0.5), ("problem", -0.3), ("wrong", -0.5), ("error", -0.3),
        ("difficult", -0.5), ("struggle", -0.4), ("struggling", -0.4), ("broken", -0.4),
        ("painful", -0.7), ("damage", -0.4), ("damaged", -0.4), ("disaster", -0.8),
        ("negative", -0.3), ("loss", -0.4), ("losses", -0.4), ("lose", -0.4),
        ("lost", -0.3), ("defeat", -0.5), ("crisis", -0.5), ("war", -0.6),
        ("attack", -0.6), ("killed", -0.8), ("dead", -0.6), ("death", -0.6),
        ("violence", -0.7), ("fear", -0.5), ("fears", -0.5), ("threat", -0.5),
        ("collapse", -0.6), ("crash", -0.6), ("decline", -0.3), ("fall", -0.2),
        ("plunge", -0.5), ("weak", -0.4), ("weaker", -0.4), ("risk", -0.2),
        ("concern", -0.3), ("concerns", -0.3), ("scandal", -0.6), ("corruption", -0.7),
        ("frustrated", -0.6), ("frustrating", -0.6), ("dangerous", -0.6),
    ]
    .iter()
    .copied()
    .collect()
});

static INTENSIFIERS: Lazy<HashMap<&'static str, f64>> = Lazy::new(|| {
    [
        ("very", 1.3), ("extremely", 1.5), ("absolutely", 1.4), ("really", 1.2),
        ("incredibly", 1.5), ("highly", 1.3), ("totally", 1.3), ("deeply", 1.3),
        ("slightly", 0.6), ("somewhat", 0.7),
    ]
    .iter()
    .copied()
    .collect()
});

static NEGATIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    ["not", "no", "never", "nothing", "nobody", "nowhere", "neither", "nor", "none", "without"]
        .iter()
        .copied()
        .collect()
});

const NEGATION_FACTOR: f64 = -0.5;

fn is_negation(word: &str) -> bool {
    NEGATIONS.contains(word) || word.ends_with("n't")
}

/// Lexical polarity in [-1, 1]: the mean of the scored words after
/// intensifier and negation adjustments, 0 when nothing scores.
pub fn polarity(text: &str) -> f64 {
    let words: Vec<String> = text
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric() && c != '\'')
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();

    let mut scores: Vec<f64> = Vec::new();
    for (i, word) in words.iter().enumerate() {
        let Some(&base) = LEXICON.get(word.as_str()) else {
            continue;
        };
        let mut value = base;
        if i > 0 {
            if let Some(&factor) = INTENSIFIERS.get(words[i - 1].as_str()) {
                value = (value * factor).clamp(-1.0, 1.0);
            }
        }
        let negated = (i > 0 && is_negation(&words[i - 1])) || (i > 1 && is_negation(&words[i - 2]));
        if negated {
            value *= NEGATION_FACTOR;
        }
        scores.push(value);
    }

    if scores.is_empty() {
        return 0.0;
    }
    (scores.iter().sum::<f64>() / scores.len() as f64).clamp(-1.0, 1.0)
}

/// Lexicon-only scoring. Never fails.
pub fn score_fallback(text: &str, neutral_band: f64) -> SentimentResult {
    SentimentResult::from_polarity(polarity(text), neutral_band)
}

pub fn stats(results: &[SentimentResult]) -> SentimentStats {
    let mut stats = SentimentStats {
        total: results.len(),
        ..Default::default()
    };
    for result in results {
        match result.label {
            SentimentLabel::Positive => stats.positive_count += 1,
            SentimentLabel::Negative => stats.negative_count += 1,
            SentimentLabel::Neutral => stats.neutral_count += 1,
        }
    }
    stats
}

/// Sentiment component. If the classifier was not available when the
/// context was built, the scorer stays in fallback-only mode for its whole
/// lifetime.
#[derive(Clone)]
pub struct SentimentScorer {
    oracle: Option<Arc<dyn SentimentOracle>>,
    max_input_chars: usize,
    neutral_band: f64,
    timeout: Duration,
}

impl SentimentScorer {
    pub fn new(ctx: &PipelineContext) -> Self {
        let oracle = ctx.sentiment_oracle();
        if oracle.is_none() {
            warn!("sentiment classifier unavailable; using lexicon fallback only");
        }
        Self {
            oracle,
            max_input_chars: ctx.config().sentiment.max_input_chars,
            neutral_band: ctx.config().sentiment.neutral_band,
            timeout: ctx.config().oracle.timeout(),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.oracle.is_none()
    }

    /// Primary scoring with the fallback made explicit.
    pub fn score_primary_outcome(&self, text: &str) -> Outcome<SentimentResult> {
        let Some(oracle) = &self.oracle else {
            return Outcome::degraded(self.score_fallback(text), "classifier not loaded");
        };

        // Character truncation, as the classifier input limit is applied
        // before tokenization; this may cut a word.
        let truncated: String = text.chars().take(self.max_input_chars).collect();
        match oracle.classify(&truncated, self.timeout) {
            Ok(c) => {
                debug!(label = ?c.label, confidence = c.confidence, "classifier scored text");
                Outcome::Ok(SentimentResult {
                    label: c.label,
                    score: c.confidence,
                    method: ScoringMethod::Transformer,
                })
            }
            Err(e) => {
                warn!(error = %e, oracle = oracle.name(), "classifier failed; using lexicon fallback");
                Outcome::degraded(self.score_fallback(text), e)
            }
        }
    }

    pub fn score_primary(&self, text: &str) -> SentimentResult {
        self.score_primary_outcome(text)
            .unwrap_or_else(|_| self.score_fallback(text))
    }

    pub fn score_fallback(&self, text: &str) -> SentimentResult {
        score_fallback(text, self.neutral_band)
    }

    /// Element-wise primary scoring; output order matches input order.
    pub fn score_batch<S: AsRef<str> + Sync>(&self, texts: &[S]) -> Vec<SentimentResult> {
        texts.par_iter().map(|t| self.score_primary(t.as_ref())).collect()
    }

    pub fn stats(&self, results: &[SentimentResult]) -> SentimentStats {
        stats(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyze_sentiment_positive() {
        let result = score_fallback("This is a wonderful day! I'm feeling great and happy!", 0.1);
        assert_eq!(result.label, SentimentLabel::Positive);
        assert_eq!(result.method, ScoringMethod::Textblob);
    }

    #[test]
    fn test_analyze_sentiment_negative() {
        let result = score_fallback("This is terrible and awful. I hate it!", 0.1);
        assert_eq!(result.label, SentimentLabel::Negative);
        assert!(result.score > 0.1);
    }

    #[test]
    fn test_analyze_sentiment_neutral() {
        let result = score_fallback("The sky is blue. The grass is green.", 0.1);
        assert_eq!(result.label, SentimentLabel::Neutral);
        assert_eq!(result.score, 0.0);
    }

    #[test]
    fn test_negation_handling() {
        assert!(polarity("This is not good at all.") < 0.0);
        assert!(polarity("This isn't bad") > 0.0);
    }

    #[test]
    fn test_intensifier_scales_and_clamps() {
        let plain = polarity("good");
        let boosted = polarity("very good");
        assert!(boosted > plain);
        assert_eq!(polarity("extremely excellent"), 1.0);
    }

    #[test]
    fn test_polarity_is_mean_of_scored_words() {
        // good 0.7, bad -0.7
        assert!(polarity("good bad").abs() < 1e-9);
        assert!((polarity("good news about the weather") - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_label_boundaries() {
        let r = SentimentResult::from_polarity(0.1, 0.1);
        assert_eq!(r.label, SentimentLabel::Neutral);
        let r = SentimentResult::from_polarity(-0.1, 0.1);
        assert_eq!(r.label, SentimentLabel::Neutral);
        let r = SentimentResult::from_polarity(0.15, 0.1);
        assert_eq!(r.label, SentimentLabel::Positive);
        assert!((r.score - 0.15).abs() < 1e-12);
        let r = SentimentResult::from_polarity(-0.4, 0.1);
        assert_eq!(r.label, SentimentLabel::Negative);
        assert!((r.score - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_stats_sum_to_total() {
        let results: Vec<SentimentResult> = [0.5, -0.5, 0.0, 0.3, 0.05]
            .iter()
            .map(|&p| SentimentResult::from_polarity(p, 0.1))
            .collect();
        let s = stats(&results);
        assert_eq!(s.positive_count, 2);
        assert_eq!(s.negative_count, 1);
        assert_eq!(s.neutral_count, 2);
        assert_eq!(s.total, 5);
        assert_eq!(s.positive_count + s.negative_count + s.neutral_count, s.total);
        assert_eq!(stats(&[]), SentimentStats::default());
    }

    #[test]
    fn test_serialization_labels() {
        let r = SentimentResult::from_polarity(0.5, 0.1);
        let json = serde_json::to_string(&r).unwrap();
        assert_eq!(json, r#"{"label":"POSITIVE","score":0.5,"method":"textblob"}"#);
    }
}
