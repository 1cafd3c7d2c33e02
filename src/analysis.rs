//! Corpus-level aggregation: entities, key phrases, topics and the
//! per-source comparison.

use std::collections::HashMap;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use tracing::debug;

use crate::article::Article;
use crate::context::PipelineContext;
use crate::nlp::preprocess::rank_by_count;
use crate::nlp::{Entity, Preprocessor, SentimentResult, SentimentScorer};

pub const UNKNOWN_SOURCE: &str = "unknown";

/// Insertion-ordered string map; serializes as a JSON object in order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OrderedMap<V>(pub Vec<(String, V)>);

impl<V> OrderedMap<V> {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, V)> {
        self.0.iter()
    }
}

impl<V: Serialize> Serialize for OrderedMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CorpusAnalysis {
    pub processed_text: String,
    pub entities: Vec<Entity>,
    pub key_phrases: Vec<String>,
    pub entity_frequencies: OrderedMap<usize>,
    pub topics: OrderedMap<usize>,
    pub total_articles: usize,
    pub total_words: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceSummary {
    pub article_count: usize,
    pub avg_sentiment: SentimentResult,
    pub key_topics: Vec<String>,
}

pub type SourceAnalysis = OrderedMap<SourceSummary>;

#[derive(Clone)]
pub struct NewsAnalyzer {
    preprocessor: Preprocessor,
    scorer: SentimentScorer,
    key_phrase_count: usize,
    source_key_topics: usize,
    entity_top_n: usize,
}

impl NewsAnalyzer {
    pub fn new(ctx: &PipelineContext) -> Self {
        Self::with_components(ctx, Preprocessor::new(ctx), SentimentScorer::new(ctx))
    }

    pub fn with_components(ctx: &PipelineContext, preprocessor: Preprocessor, scorer: SentimentScorer) -> Self {
        let nlp = &ctx.config().nlp;
        Self {
            preprocessor,
            scorer,
            key_phrase_count: nlp.key_phrase_count,
            source_key_topics: nlp.source_key_topics,
            entity_top_n: nlp.entity_top_n,
        }
    }

    /// Aggregate analysis over the concatenated texts. An empty collection
    /// gives the default (empty) analysis.
    pub fn analyze_corpus(&self, articles: &[Article]) -> CorpusAnalysis {
        if articles.is_empty() {
            return CorpusAnalysis::default();
        }

        let all_text = articles
            .iter()
            .filter(|a| !a.text.is_empty())
            .map(|a| a.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        let processed_text = self.preprocessor.preprocess(&all_text);
        let entities = self.preprocessor.extract_entities(&all_text);
        let key_phrases = self.preprocessor.extract_key_phrases(&all_text, self.key_phrase_count);

        let mut entity_frequencies = rank_by_count(entities.iter().map(|e| e.text.as_str()));
        entity_frequencies.truncate(self.entity_top_n);

        let topics = topics_from_phrases(&key_phrases);

        debug!(
            articles = articles.len(),
            entities = entities.len(),
            key_phrases = key_phrases.len(),
            "corpus analyzed"
        );

        CorpusAnalysis {
            processed_text,
            entities,
            key_phrases,
            entity_frequencies: OrderedMap(entity_frequencies),
            topics: OrderedMap(topics),
            total_articles: articles.len(),
            total_words: all_text.split_whitespace().count(),
        }
    }

    /// Group by source in first-seen order. Each group is scored with the
    /// lexicon method rather than the classifier.
    pub fn compare_sources(&self, articles: &[Article]) -> SourceAnalysis {
        let mut groups: Vec<(String, Vec<&Article>)> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        for article in articles {
            let source = if article.source.is_empty() {
                UNKNOWN_SOURCE.to_string()
            } else {
                article.source.clone()
            };
            match index.get(&source) {
                Some(&i) => groups[i].1.push(article),
                None => {
                    index.insert(source.clone(), groups.len());
                    groups.push((source, vec![article]));
                }
            }
        }

        let summaries = groups
            .into_iter()
            .map(|(source, members)| {
                let source_text = members
                    .iter()
                    .map(|a| a.text.as_str())
                    .collect::<Vec<_>>()
                    .join(" ");
                let summary = SourceSummary {
                    article_count: members.len(),
                    avg_sentiment: self.scorer.score_fallback(&source_text),
                    key_topics: self
                        .preprocessor
                        .extract_key_phrases(&source_text, self.source_key_topics),
                };
                (source, summary)
            })
            .collect();
        OrderedMap(summaries)
    }
}

// Key phrases longer than three characters, ranked by how often each occurs
// in the list. The list has no duplicates, so every weight is 1 and the
// phrase order is kept.
fn topics_from_phrases(key_phrases: &[String]) -> Vec<(String, usize)> {
    rank_by_count(key_phrases.iter().filter(|p| p.chars().count() > 3))
}
