// Abstractive summarization through the summary oracle, with an extractive
// first-sentences fallback when the oracle is missing or fails.
use std::sync::Arc;
use std::time::Duration;

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::config::SummaryConfig;
use crate::context::PipelineContext;
use crate::error::Outcome;
use crate::oracle::{GenerationParams, SummaryOracle};

const FALLBACK_SENTENCES: usize = 3;

/// First three ". "-separated pieces, rejoined, plus a closing period.
/// A third piece that already ends in "." yields "..", as it always has.
pub fn extractive_summary(text: &str) -> String {
    let sentences: Vec<&str> = text.split(". ").take(FALLBACK_SENTENCES).collect();
    format!("{}.", sentences.join(". "))
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

#[derive(Clone)]
pub struct Summarizer {
    oracle: Option<Arc<dyn SummaryOracle>>,
    settings: SummaryConfig,
    timeout: Duration,
}

impl Summarizer {
    pub fn new(ctx: &PipelineContext) -> Self {
        let oracle = ctx.summary_oracle();
        if oracle.is_none() {
            warn!("summarization model unavailable; using extractive fallback only");
        }
        Self {
            oracle,
            settings: ctx.config().summary.clone(),
            timeout: ctx.config().oracle.timeout(),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.oracle.is_none()
    }

    fn params(&self, max_length: Option<usize>, min_length: Option<usize>) -> GenerationParams {
        let max_length = max_length.unwrap_or(self.settings.max_length);
        let min_length = min_length.unwrap_or(self.settings.min_length).min(max_length);
        GenerationParams {
            min_length,
            max_length,
            num_beams: self.settings.num_beams,
            length_penalty: self.settings.length_penalty,
            early_stopping: self.settings.early_stopping,
            no_repeat_ngram_size: self.settings.no_repeat_ngram_size,
        }
    }

    pub fn summarize_outcome(
        &self,
        text: &str,
        max_length: Option<usize>,
        min_length: Option<usize>,
    ) -> Outcome<String> {
        if word_count(text) < self.settings.passthrough_words {
            return Outcome::Ok(text.to_string());
        }
        let Some(oracle) = &self.oracle else {
            return Outcome::degraded(extractive_summary(text), "summarizer not loaded");
        };

        let params = self.params(max_length, min_length);
        match oracle.summarize(text, &params, self.timeout) {
            Ok(summary) => {
                debug!(words_in = word_count(text), words_out = word_count(&summary), "summarized text");
                Outcome::Ok(summary)
            }
            Err(e) => {
                warn!(error = %e, oracle = oracle.name(), "summarization failed; using extractive fallback");
                Outcome::degraded(extractive_summary(text), e)
            }
        }
    }

    /// Texts shorter than the passthrough threshold come back verbatim.
    pub fn summarize(&self, text: &str, max_length: Option<usize>, min_length: Option<usize>) -> String {
        self.summarize_outcome(text, max_length, min_length)
            .unwrap_or_else(|_| extractive_summary(text))
    }

    pub fn summarize_batch<S: AsRef<str> + Sync>(
        &self,
        texts: &[S],
        max_length: Option<usize>,
        min_length: Option<usize>,
    ) -> Vec<String> {
        texts
            .par_iter()
            .map(|t| self.summarize(t.as_ref(), max_length, min_length))
            .collect()
    }
}
