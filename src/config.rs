//! Configuration loading from TOML.
//!
//! Every section carries serde defaults, so a partial file (or no file at
//! all) yields the stock settings of the summarization and sentiment models.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "newslens.toml";
pub const CONFIG_ENV: &str = "NEWSLENS_CONFIG";
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3.2";

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub models: ModelsConfig,
    pub oracle: OracleConfig,
    pub sentiment: SentimentConfig,
    pub summary: SummaryConfig,
    pub nlp: NlpConfig,
}

/// Model names as the local runtime lists them (`ollama list`). Any model
/// the runtime can serve works; the defaults are small general models.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ModelsConfig {
    pub sentiment_model: String,
    pub summarization_model: String,
    pub ollama_bin: String,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            sentiment_model: DEFAULT_OLLAMA_MODEL.to_string(),
            summarization_model: DEFAULT_OLLAMA_MODEL.to_string(),
            ollama_bin: "ollama".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OracleConfig {
    /// `false` runs both the classifier and the summarizer in fallback-only mode.
    pub enabled: bool,
    pub timeout_secs: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_secs: 30,
        }
    }
}

impl OracleConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SentimentConfig {
    /// Truncation applied before the primary classifier. Counted in
    /// characters, not model tokens, so it may cut a word in half.
    pub max_input_chars: usize,
    pub neutral_band: f64,
}

impl Default for SentimentConfig {
    fn default() -> Self {
        Self {
            max_input_chars: 512,
            neutral_band: 0.1,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SummaryConfig {
    pub max_length: usize,
    pub min_length: usize,
    pub num_beams: u32,
    pub length_penalty: f32,
    pub no_repeat_ngram_size: usize,
    pub early_stopping: bool,
    /// Texts with fewer words than this are returned verbatim.
    pub passthrough_words: usize,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            max_length: 150,
            min_length: 30,
            num_beams: 4,
            length_penalty: 2.0,
            no_repeat_ngram_size: 3,
            early_stopping: true,
            passthrough_words: 50,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct NlpConfig {
    /// Extra NER gazetteer, one `LABEL<TAB>surface` entry per line.
    pub gazetteer_path: Option<PathBuf>,
    pub key_phrase_count: usize,
    pub source_key_topics: usize,
    pub entity_top_n: usize,
}

impl Default for NlpConfig {
    fn default() -> Self {
        Self {
            gazetteer_path: None,
            key_phrase_count: 10,
            source_key_topics: 5,
            entity_top_n: 20,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Resolve the config source: explicit path, then `NEWSLENS_CONFIG`, then
    /// `newslens.toml` in the working directory. Only the implicit default file
    /// may be absent.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Self::load(Path::new(&path));
        }
        let default_path = Path::new(DEFAULT_CONFIG_FILE);
        if default_path.exists() {
            Self::load(default_path)
        } else {
            Ok(Self::default())
        }
    }
}
