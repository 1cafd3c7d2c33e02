//! Oracle backend that shells out to a local Ollama install.
//!
//! Availability is probed once with `ollama list`. Each inference is an
//! `ollama run <model> <prompt>` child process that is killed when its
//! deadline passes. Instances hold only immutable settings, so concurrent
//! calls are independent processes.
//!
//! The CLI exposes no decoding knobs. Length bounds and the n-gram
//! constraint are stated in the prompt and then enforced on the reply. Beam
//! width, length penalty and early stopping are logged but have no effect
//! here.

use std::io::Read;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::{
    enforce_summary_bounds, parse_classification, Classification, GenerationParams,
    SentimentOracle, SummaryOracle,
};
use crate::error::OracleError;

const POLL_INTERVAL: Duration = Duration::from_millis(25);

#[derive(Debug, Clone)]
pub struct OllamaBackend {
    bin: String,
    model: String,
}

impl OllamaBackend {
    /// Check that the runtime answers and the model is installed.
    pub fn probe(bin: &str, model: &str, timeout: Duration) -> Result<Self, OracleError> {
        let mut cmd = Command::new(bin);
        cmd.arg("list");
        let listing = run_with_timeout(cmd, timeout)?;
        if !listing_has_model(&listing, model) {
            return Err(OracleError::Unavailable(format!("model {model} is not installed")));
        }
        info!(bin, model, "ollama model available");
        Ok(Self {
            bin: bin.to_string(),
            model: model.to_string(),
        })
    }

    fn run(&self, prompt: &str, timeout: Duration) -> Result<String, OracleError> {
        let mut cmd = Command::new(&self.bin);
        cmd.arg("run").arg(&self.model).arg(prompt);
        run_with_timeout(cmd, timeout)
    }
}

impl SentimentOracle for OllamaBackend {
    fn name(&self) -> &str {
        &self.model
    }

    fn classify(&self, text: &str, timeout: Duration) -> Result<Classification, OracleError> {
        let reply = self.run(&classification_prompt(text), timeout)?;
        parse_classification(&reply)
    }
}

impl SummaryOracle for OllamaBackend {
    fn name(&self) -> &str {
        &self.model
    }

    fn summarize(
        &self,
        text: &str,
        params: &GenerationParams,
        timeout: Duration,
    ) -> Result<String, OracleError> {
        debug!(
            num_beams = params.num_beams,
            length_penalty = params.length_penalty,
            early_stopping = params.early_stopping,
            "decoding settings not supported by the ollama cli"
        );
        let reply = self.run(&summary_prompt(text, params), timeout)?;
        let summary = enforce_summary_bounds(reply.trim(), params.no_repeat_ngram_size, params.max_length);
        if summary.is_empty() {
            return Err(OracleError::Malformed("empty summary".to_string()));
        }
        Ok(summary)
    }
}

fn classification_prompt(text: &str) -> String {
    format!(
        "Classify the sentiment of the following news text as positive, negative or neutral. \
         Reply with exactly one line: the label followed by your confidence between 0 and 1, \
         for example \"negative 0.82\".\n\nText:\n{text}"
    )
}

fn summary_prompt(text: &str, params: &GenerationParams) -> String {
    format!(
        "Summarize the following news article in {} to {} words. Do not repeat any sequence of {} words. \
         Reply with the summary only.\n\nArticle:\n{text}",
        params.min_length, params.max_length, params.no_repeat_ngram_size
    )
}

// Lines look like: NAME  ID  SIZE  MODIFIED. A model given without a tag
// matches any installed tag of it.
fn listing_has_model(listing: &str, model: &str) -> bool {
    listing.lines().skip(1).any(|line| {
        let name = line.split_whitespace().next().unwrap_or("");
        name == model || name.split(':').next() == Some(model)
    })
}

/// Run a command, capturing stdout. The child is killed at the deadline.
fn run_with_timeout(mut cmd: Command, timeout: Duration) -> Result<String, OracleError> {
    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| OracleError::Unavailable(format!("failed to invoke oracle runtime: {e}")))?;

    // drain pipes on their own threads so a chatty child cannot block on a full pipe
    let stdout = child.stdout.take().map(|mut out| {
        thread::spawn(move || {
            let mut buf = String::new();
            let _ = out.read_to_string(&mut buf);
            buf
        })
    });
    let stderr = child.stderr.take().map(|mut err| {
        thread::spawn(move || {
            let mut buf = String::new();
            let _ = err.read_to_string(&mut buf);
            buf
        })
    });

    let deadline = Instant::now() + timeout;
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) if Instant::now() >= deadline => {
                let _ = child.kill();
                let _ = child.wait();
                warn!(?timeout, "oracle call timed out");
                return Err(OracleError::Timeout(timeout));
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(e) => return Err(OracleError::Inference(e.to_string())),
        }
    };

    let out = stdout.and_then(|h| h.join().ok()).unwrap_or_default();
    let err = stderr.and_then(|h| h.join().ok()).unwrap_or_default();
    if !status.success() {
        return Err(OracleError::Inference(format!("exit {status}: {}", err.trim())));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_has_model() {
        let listing = "NAME                ID              SIZE      MODIFIED\n\
                       mistral:latest      61e88e884507    4.1 GB    2 weeks ago\n\
                       gemma3:4b           a2af6cc3eb7f    3.3 GB    3 days ago\n";
        assert!(listing_has_model(listing, "mistral"));
        assert!(listing_has_model(listing, "gemma3:4b"));
        assert!(!listing_has_model(listing, "gemma3:12b"));
        assert!(!listing_has_model(listing, "NAME"));
    }

    #[test]
    fn test_default_models_match_typical_listing() {
        let models = crate::config::AppConfig::default().models;
        let listing = "NAME                                                        ID              SIZE      MODIFIED\n\
                       llama3.2:latest                                             a80c4f17acd5    2.0 GB    5 days ago\n\
                       hf.co/cardiffnlp/twitter-roberta-base-sentiment-latest:latest  3c1b0e2f9a11    0.5 GB    1 day ago\n";
        assert!(listing_has_model(listing, &models.sentiment_model));
        assert!(listing_has_model(listing, &models.summarization_model));
    }

    #[test]
    fn test_probe_missing_binary() {
        let err = OllamaBackend::probe("/nonexistent/ollama-bin", "mistral", Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, OracleError::Unavailable(_)));
    }

    #[test]
    fn test_prompts_mention_bounds() {
        let params = GenerationParams {
            min_length: 30,
            max_length: 150,
            num_beams: 4,
            length_penalty: 2.0,
            early_stopping: true,
            no_repeat_ngram_size: 3,
        };
        let prompt = summary_prompt("body", &params);
        assert!(prompt.contains("30 to 150 words"));
        assert!(prompt.ends_with("body"));
        assert!(classification_prompt("x").ends_with("x"));
    }

    #[cfg(unix)]
    #[test]
    fn test_run_with_timeout_kills_slow_child() {
        let mut cmd = Command::new("sleep");
        cmd.arg("5");
        let start = Instant::now();
        let err = run_with_timeout(cmd, Duration::from_millis(100)).unwrap_err();
        assert_eq!(err, OracleError::Timeout(Duration::from_millis(100)));
        assert!(start.elapsed() < Duration::from_secs(4));
    }

    #[cfg(unix)]
    #[test]
    fn test_run_with_timeout_captures_stdout() {
        let mut cmd = Command::new("echo");
        cmd.arg("positive 0.9");
        let out = run_with_timeout(cmd, Duration::from_secs(5)).unwrap();
        assert_eq!(out.trim(), "positive 0.9");
    }
}
