//! Error taxonomy for the analysis pipeline.
//!
//! `PipelineError` is what callers can see. `OracleError` only ever travels
//! between an oracle and the component that owns it, which converts it into a
//! fallback result.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// A model, lexicon or pattern set could not be loaded.
    #[error("resource unavailable: {resource}: {reason}")]
    ResourceUnavailable { resource: String, reason: String },

    /// A fetched record is missing required fields.
    #[error("invalid article: {reason}")]
    InvalidArticle { reason: String },

    #[error("internal error: {0}")]
    Internal(String),
}

impl PipelineError {
    pub fn resource(resource: impl Into<String>, reason: impl ToString) -> Self {
        Self::ResourceUnavailable {
            resource: resource.into(),
            reason: reason.to_string(),
        }
    }

    pub fn invalid_article(reason: impl Into<String>) -> Self {
        Self::InvalidArticle {
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum OracleError {
    #[error("oracle unavailable: {0}")]
    Unavailable(String),

    #[error("oracle timed out after {0:?}")]
    Timeout(Duration),

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("malformed oracle reply: {0}")]
    Malformed(String),
}

/// Result of a call that may fall back to a deterministic computation.
///
/// `Degraded` carries the fallback value together with the reason the primary
/// path was not used. `Failed` means no value exists at all. The scorer and
/// summarizer always have a fallback, so they never return it; it is there
/// for steps without one.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Ok(T),
    Degraded { value: T, reason: String },
    Failed(String),
}

impl<T> Outcome<T> {
    pub fn degraded(value: T, reason: impl ToString) -> Self {
        Self::Degraded {
            value,
            reason: reason.to_string(),
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }

    pub fn value(self) -> Option<T> {
        match self {
            Self::Ok(value) | Self::Degraded { value, .. } => Some(value),
            Self::Failed(_) => None,
        }
    }

    /// Collapse into a value, computing one if the outcome failed outright.
    pub fn unwrap_or_else(self, f: impl FnOnce(String) -> T) -> T {
        match self {
            Self::Ok(value) | Self::Degraded { value, .. } => value,
            Self::Failed(reason) => f(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_value() {
        assert_eq!(Outcome::Ok(3).value(), Some(3));
        assert_eq!(Outcome::degraded(4, "model missing").value(), Some(4));
        assert_eq!(Outcome::<i32>::Failed("boom".into()).value(), None);
    }

    #[test]
    fn test_outcome_unwrap_or_else() {
        let failed: Outcome<String> = Outcome::Failed("no model".into());
        assert_eq!(failed.unwrap_or_else(|r| format!("fallback: {r}")), "fallback: no model");
        assert!(Outcome::degraded(1, "x").is_degraded());
        assert!(!Outcome::Ok(1).is_degraded());
    }

    #[test]
    fn test_error_display() {
        let err = PipelineError::resource("ner-gazetteer", "file not found");
        assert_eq!(err.to_string(), "resource unavailable: ner-gazetteer: file not found");
        let err = OracleError::Timeout(Duration::from_secs(2));
        assert!(err.to_string().contains("2s"));
    }
}
