// NLP module for newslens
pub mod lemma;
pub mod ner;
pub mod preprocess;
pub mod sentiment;
pub mod stopwords;
pub mod summarization;

pub use ner::{Entity, EntityLabel, EntityRecognizer};
pub use preprocess::Preprocessor;
pub use sentiment::{ScoringMethod, SentimentLabel, SentimentResult, SentimentScorer, SentimentStats};
pub use summarization::Summarizer;
