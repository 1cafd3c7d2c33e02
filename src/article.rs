//! Article records and the fetcher boundary.
//!
//! Fetchers hand over loosely-typed JSON records. They are validated here,
//! once, into `Article`; the rest of the pipeline only sees typed records.

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::Url;
use walkdir::WalkDir;

use crate::error::PipelineError;

/// Record as produced by a fetcher. Every field may be missing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawArticle {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub publish_date: Option<String>,
    #[serde(default)]
    pub top_image: Option<String>,
    #[serde(default)]
    pub authors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub text: String,
    pub url: String,
    pub source: String,
    pub publish_date: Option<DateTime<Utc>>,
    pub top_image: Option<String>,
    pub authors: Vec<String>,
}

impl Article {
    /// Validate a raw record. `url` and `text` are required; the source is
    /// always the URL authority (`host[:port]`).
    pub fn from_raw(raw: RawArticle) -> Result<Self, PipelineError> {
        let url = raw
            .url
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| PipelineError::invalid_article("missing url"))?;
        let parsed = Url::parse(url.trim())
            .map_err(|e| PipelineError::invalid_article(format!("bad url {url:?}: {e}")))?;
        let text = raw
            .text
            .ok_or_else(|| PipelineError::invalid_article(format!("missing text for {url}")))?;

        let publish_date = raw.publish_date.as_deref().and_then(|d| {
            let parsed = parse_publish_date(d);
            if parsed.is_none() {
                warn!(url = %url, date = d, "unparseable publish date");
            }
            parsed
        });

        Ok(Self {
            title: raw.title.unwrap_or_default(),
            text,
            source: source_of(&parsed),
            url,
            publish_date,
            top_image: raw.top_image.filter(|s| !s.is_empty()),
            authors: raw.authors,
        })
    }
}

fn source_of(url: &Url) -> String {
    match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{host}:{port}"),
        (Some(host), None) => host.to_string(),
        _ => String::new(),
    }
}

/// RFC 3339 timestamp or a bare `YYYY-MM-DD` date (taken as midnight UTC).
pub fn parse_publish_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawBatch {
    Many(Vec<RawArticle>),
    One(RawArticle),
}

/// Load articles from a JSON file (an array of records or a single record)
/// or from every `*.json` file under a directory. Invalid records are
/// skipped; only unreadable or undecodable files are errors.
pub fn load_articles(path: &Path) -> Result<Vec<Article>> {
    let files: Vec<PathBuf> = if path.is_dir() {
        let mut files: Vec<PathBuf> = WalkDir::new(path)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("json"))
            .map(|e| e.path().to_path_buf())
            .collect();
        files.sort();
        files
    } else {
        vec![path.to_path_buf()]
    };

    let mut articles = Vec::new();
    for file in &files {
        let f = File::open(file).with_context(|| format!("Failed to open {}", file.display()))?;
        let batch: RawBatch = serde_json::from_reader(f)
            .with_context(|| format!("Failed to decode articles in {}", file.display()))?;
        let raws = match batch {
            RawBatch::Many(v) => v,
            RawBatch::One(a) => vec![a],
        };
        for raw in raws {
            match Article::from_raw(raw) {
                Ok(article) => articles.push(article),
                Err(e) => warn!(file = %file.display(), error = %e, "skipping article"),
            }
        }
        debug!(file = %file.display(), "article file loaded");
    }
    info!(files = files.len(), articles = articles.len(), "articles loaded");
    Ok(articles)
}
