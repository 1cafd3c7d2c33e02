// Text cleaning, tokenization and key-phrase extraction.
use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

use super::lemma::lemmatize_token;
use super::ner::{Entity, EntityRecognizer};
use super::stopwords::is_stopword;
use crate::context::PipelineContext;

static URL_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"http\S+").unwrap());
static NON_ALPHA_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z\s]").unwrap());
static WHITESPACE_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Lowercase, strip URLs and everything outside `[a-z\s]`, collapse
/// whitespace. Accepts `None` as well as plain strings.
pub fn clean_text<'a>(text: impl Into<Option<&'a str>>) -> String {
    let text = match text.into() {
        Some(t) if !t.is_empty() => t,
        _ => return String::new(),
    };
    let lowered = text.to_lowercase();
    let no_urls = URL_PATTERN.replace_all(&lowered, "");
    let letters = NON_ALPHA_PATTERN.replace_all(&no_urls, "");
    WHITESPACE_PATTERN.replace_all(&letters, " ").trim().to_string()
}

/// Word tokenization on Unicode word boundaries. Punctuation marks come out
/// as tokens of their own; whitespace is dropped.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_word_bounds()
        .filter(|t| !t.chars().all(char::is_whitespace))
        .map(String::from)
        .collect()
}

pub fn remove_stopwords(tokens: Vec<String>) -> Vec<String> {
    tokens.into_iter().filter(|t| !is_stopword(t)).collect()
}

pub fn lemmatize(tokens: &[String]) -> Vec<String> {
    tokens.iter().map(|t| lemmatize_token(t)).collect()
}

/// clean -> tokenize -> remove stopwords -> lemmatize -> join.
pub fn preprocess(text: &str) -> String {
    let tokens = remove_stopwords(tokenize(&clean_text(text)));
    lemmatize(&tokens).join(" ")
}

/// Count occurrences and rank them by descending count. Ties keep the order
/// in which items were first seen.
pub fn rank_by_count<I, S>(items: I) -> Vec<(String, usize)>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut counts: Vec<(String, usize)> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    for item in items {
        let item = item.as_ref();
        match positions.get(item) {
            Some(&i) => counts[i].1 += 1,
            None => {
                positions.insert(item.to_string(), counts.len());
                counts.push((item.to_string(), 1));
            }
        }
    }
    // stable: equal counts stay in first-seen order
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

/// Most frequent non-stopword tokens of the cleaned text.
pub fn extract_key_phrases(text: &str, n: usize) -> Vec<String> {
    let tokens = remove_stopwords(tokenize(&clean_text(text)));
    rank_by_count(tokens)
        .into_iter()
        .take(n)
        .map(|(token, _)| token)
        .collect()
}

/// Text preprocessing component. Construction fails when the entity
/// recognizer could not be loaded; there is no degraded mode.
#[derive(Clone)]
pub struct Preprocessor {
    recognizer: Arc<EntityRecognizer>,
}

impl Preprocessor {
    pub fn new(ctx: &PipelineContext) -> Self {
        Self {
            recognizer: ctx.recognizer(),
        }
    }

    pub fn with_recognizer(recognizer: Arc<EntityRecognizer>) -> Self {
        Self { recognizer }
    }

    pub fn preprocess(&self, text: &str) -> String {
        preprocess(text)
    }

    /// Named entities of the raw (uncleaned) text, in order of appearance.
    pub fn extract_entities(&self, text: &str) -> Vec<Entity> {
        self.recognizer.recognize(text)
    }

    pub fn extract_key_phrases(&self, text: &str, n: usize) -> Vec<String> {
        extract_key_phrases(text, n)
    }
}
