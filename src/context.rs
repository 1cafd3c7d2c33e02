//! Process-wide model resources.
//!
//! A `PipelineContext` is built once at startup and passed by reference to
//! every component constructor. It is read-only afterwards and can be shared
//! across threads.

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::AppConfig;
use crate::error::PipelineError;
use crate::nlp::EntityRecognizer;
use crate::oracle::{OllamaBackend, SentimentOracle, SummaryOracle};

pub struct PipelineContext {
    config: AppConfig,
    recognizer: Arc<EntityRecognizer>,
    sentiment_oracle: Option<Arc<dyn SentimentOracle>>,
    summary_oracle: Option<Arc<dyn SummaryOracle>>,
}

impl PipelineContext {
    /// Load every resource named by the configuration.
    ///
    /// The entity recognizer is required: a failure to load it is returned
    /// as an error. The oracles are optional: a failed probe is logged and
    /// the owning component runs on its fallback.
    pub fn new(config: AppConfig) -> Result<Self, PipelineError> {
        let (sentiment, summary) = if config.oracle.enabled {
            let timeout = config.oracle.timeout();
            let sentiment = match OllamaBackend::probe(&config.models.ollama_bin, &config.models.sentiment_model, timeout) {
                Ok(backend) => Some(Arc::new(backend) as Arc<dyn SentimentOracle>),
                Err(e) => {
                    warn!(error = %e, model = %config.models.sentiment_model, "sentiment classifier failed to load");
                    None
                }
            };
            let summary = match OllamaBackend::probe(&config.models.ollama_bin, &config.models.summarization_model, timeout) {
                Ok(backend) => Some(Arc::new(backend) as Arc<dyn SummaryOracle>),
                Err(e) => {
                    warn!(error = %e, model = %config.models.summarization_model, "summarization model failed to load");
                    None
                }
            };
            (sentiment, summary)
        } else {
            info!("oracles disabled by configuration");
            (None, None)
        };
        Self::with_oracles(config, sentiment, summary)
    }

    /// Build a context around already-constructed oracles, for alternative
    /// inference runtimes and tests.
    pub fn with_oracles(
        config: AppConfig,
        sentiment_oracle: Option<Arc<dyn SentimentOracle>>,
        summary_oracle: Option<Arc<dyn SummaryOracle>>,
    ) -> Result<Self, PipelineError> {
        let recognizer = EntityRecognizer::new(config.nlp.gazetteer_path.as_deref())?;
        info!(
            classifier = sentiment_oracle.is_some(),
            summarizer = summary_oracle.is_some(),
            "pipeline context ready"
        );
        Ok(Self {
            config,
            recognizer: Arc::new(recognizer),
            sentiment_oracle,
            summary_oracle,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn recognizer(&self) -> Arc<EntityRecognizer> {
        Arc::clone(&self.recognizer)
    }

    pub fn sentiment_oracle(&self) -> Option<Arc<dyn SentimentOracle>> {
        self.sentiment_oracle.clone()
    }

    pub fn summary_oracle(&self) -> Option<Arc<dyn SummaryOracle>> {
        self.summary_oracle.clone()
    }
}
