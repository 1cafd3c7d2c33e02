//! The two operations exposed to a request layer: analyze a collection of
//! articles, and summarize one text. No wire format is defined here; the
//! result types are plain serde records.

use std::panic::{catch_unwind, AssertUnwindSafe};

use rayon::prelude::*;
use serde::Serialize;
use tracing::{error, info};

use crate::analysis::{CorpusAnalysis, NewsAnalyzer, SourceAnalysis};
use crate::article::Article;
use crate::context::PipelineContext;
use crate::error::PipelineError;
use crate::nlp::{Preprocessor, SentimentResult, SentimentScorer, SentimentStats, Summarizer};
use crate::viz::ChartData;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArticleResult {
    pub title: String,
    pub url: String,
    pub source: String,
    pub summary: String,
    pub sentiment: SentimentResult,
    pub publish_date: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub articles: Vec<ArticleResult>,
    pub analysis: CorpusAnalysis,
    pub sentiment_stats: SentimentStats,
    pub source_analysis: SourceAnalysis,
    pub charts: ChartData,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryResponse {
    pub original_text: String,
    pub summary: String,
}

/// All components, built once from a context and reused across requests.
#[derive(Clone)]
pub struct Pipeline {
    summarizer: Summarizer,
    scorer: SentimentScorer,
    analyzer: NewsAnalyzer,
}

impl Pipeline {
    pub fn new(ctx: &PipelineContext) -> Self {
        let scorer = SentimentScorer::new(ctx);
        Self {
            summarizer: Summarizer::new(ctx),
            analyzer: NewsAnalyzer::with_components(ctx, Preprocessor::new(ctx), scorer.clone()),
            scorer,
        }
    }

    pub fn summarizer(&self) -> &Summarizer {
        &self.summarizer
    }

    pub fn scorer(&self) -> &SentimentScorer {
        &self.scorer
    }

    pub fn analyzer(&self) -> &NewsAnalyzer {
        &self.analyzer
    }

    /// Per-article results plus the corpus, sentiment and source aggregates.
    /// `Ok(None)` means there was nothing to analyze.
    pub fn analyze(&self, articles: &[Article]) -> Result<Option<AnalysisReport>, PipelineError> {
        self.analyze_with_progress(articles, || {})
    }

    /// Same as `analyze`, calling `on_article` once per finished article.
    pub fn analyze_with_progress<F>(
        &self,
        articles: &[Article],
        on_article: F,
    ) -> Result<Option<AnalysisReport>, PipelineError>
    where
        F: Fn() + Sync,
    {
        if articles.is_empty() {
            info!("no articles to analyze");
            return Ok(None);
        }

        let outcome = catch_unwind(AssertUnwindSafe(|| {
            let results: Vec<ArticleResult> = articles
                .par_iter()
                .map(|article| {
                    let result = self.process_article(article);
                    on_article();
                    result
                })
                .collect();

            let analysis = self.analyzer.analyze_corpus(articles);
            let sentiments: Vec<SentimentResult> = results.iter().map(|r| r.sentiment.clone()).collect();
            let sentiment_stats = self.scorer.stats(&sentiments);
            let source_analysis = self.analyzer.compare_sources(articles);
            let charts = ChartData::build(&sentiment_stats, &analysis, &source_analysis);

            AnalysisReport {
                articles: results,
                analysis,
                sentiment_stats,
                source_analysis,
                charts,
            }
        }));

        match outcome {
            Ok(report) => {
                info!(
                    articles = report.articles.len(),
                    sources = report.source_analysis.len(),
                    positive = report.sentiment_stats.positive_count,
                    negative = report.sentiment_stats.negative_count,
                    neutral = report.sentiment_stats.neutral_count,
                    "analysis complete"
                );
                Ok(Some(report))
            }
            Err(panic) => {
                let reason = panic_message(panic.as_ref());
                error!(reason = %reason, "analysis aborted");
                Err(PipelineError::Internal(reason))
            }
        }
    }

    fn process_article(&self, article: &Article) -> ArticleResult {
        ArticleResult {
            title: article.title.clone(),
            url: article.url.clone(),
            source: article.source.clone(),
            summary: self.summarizer.summarize(&article.text, None, None),
            sentiment: self.scorer.score_primary(&article.text),
            publish_date: article.publish_date.map(|d| d.to_rfc3339()),
            image: article.top_image.clone(),
        }
    }

    /// Summarize a single text with the default bounds. `None` for empty
    /// input.
    pub fn summarize_text(&self, text: &str) -> Option<SummaryResponse> {
        self.summarize_text_with(text, None, None)
    }

    pub fn summarize_text_with(
        &self,
        text: &str,
        max_length: Option<usize>,
        min_length: Option<usize>,
    ) -> Option<SummaryResponse> {
        if text.trim().is_empty() {
            return None;
        }
        Some(SummaryResponse {
            original_text: text.to_string(),
            summary: self.summarizer.summarize(text, max_length, min_length),
        })
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
