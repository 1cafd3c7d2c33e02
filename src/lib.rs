//! newslens: news article summarization, sentiment scoring and corpus
//! analysis.
//!
//! Library crate exposing all modules for use by integration tests and the
//! binary entry point.

pub mod analysis;
pub mod article;
pub mod config;
pub mod context;
pub mod error;
pub mod nlp;
pub mod oracle;
pub mod service;
pub mod viz;

pub use article::Article;
pub use config::AppConfig;
pub use context::PipelineContext;
pub use error::{OracleError, Outcome, PipelineError};
pub use service::Pipeline;
