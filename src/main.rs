use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use newslens::article::load_articles;
use newslens::{AppConfig, Pipeline, PipelineContext};

const EXIT_NOT_FOUND: u8 = 2;

#[derive(Parser)]
#[command(name = "newslens", about = "Summarize, score and compare news articles")]
struct Cli {
    /// Config file (TOML). Falls back to $NEWSLENS_CONFIG, then ./newslens.toml.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Skip the model backend and use the lexical and extractive fallbacks only.
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a JSON file or a directory of JSON article files.
    Analyze {
        #[arg(short, long)]
        input: PathBuf,
        /// Write the report here instead of stdout.
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Summarize a single text.
    Summarize {
        #[command(flatten)]
        source: TextSource,
        #[arg(long)]
        max_length: Option<usize>,
        #[arg(long)]
        min_length: Option<usize>,
    },
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct TextSource {
    #[arg(short, long)]
    text: Option<String>,
    /// Plain text or PDF.
    #[arg(short, long)]
    file: Option<PathBuf>,
}

fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("newslens=info"));

    if std::env::var("NEWSLENS_LOG_JSON").is_ok() {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .with_writer(io::stderr)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(io::stderr)
            .init();
    }
}

fn read_text_file(p: &Path) -> Result<String> {
    let mut s = String::new();
    let mut f = File::open(p).with_context(|| format!("Failed to open {}", p.display()))?;
    f.read_to_string(&mut s)?;
    Ok(s)
}

fn read_file_content(p: &Path) -> Result<String> {
    let ext = p.extension().and_then(|s| s.to_str()).unwrap_or("");
    if ext.eq_ignore_ascii_case("pdf") {
        pdf_extract::extract_text(p).map_err(|e| anyhow!("PDF extraction failed: {}", e))
    } else {
        read_text_file(p)
    }
}

fn write_json<T: Serialize>(value: &T, out: Option<&Path>) -> Result<()> {
    let body = serde_json::to_string_pretty(value)?;
    match out {
        Some(path) => {
            std::fs::write(path, body + "\n").with_context(|| format!("Failed to write {}", path.display()))?;
            info!(path = %path.display(), "report written");
        }
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{body}")?;
        }
    }
    Ok(())
}

fn not_found(message: &str) -> Result<ExitCode> {
    write_json(&json!({ "error": message }), None)?;
    Ok(ExitCode::from(EXIT_NOT_FOUND))
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = AppConfig::resolve(cli.config.as_deref())?;
    if cli.offline {
        config.oracle.enabled = false;
    }
    Ok(config)
}

fn run_analyze(pipeline: &Pipeline, input: &Path, out: Option<&Path>) -> Result<ExitCode> {
    let articles = load_articles(input)?;
    if articles.is_empty() {
        warn!(input = %input.display(), "no articles found");
        return not_found("No news articles found");
    }

    let pb = ProgressBar::with_draw_target(Some(articles.len() as u64), ProgressDrawTarget::stderr());
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {wide_bar} {pos}/{len} {msg}")?
            .progress_chars("=>-"),
    );
    pb.set_message("analyzing articles");

    let report = pipeline.analyze_with_progress(&articles, || pb.inc(1))?;
    pb.finish_and_clear();

    match report {
        Some(report) => {
            write_json(&report, out)?;
            Ok(ExitCode::SUCCESS)
        }
        None => not_found("No news articles found"),
    }
}

fn run_summarize(
    pipeline: &Pipeline,
    source: &TextSource,
    max_length: Option<usize>,
    min_length: Option<usize>,
) -> Result<ExitCode> {
    let text = match (&source.text, &source.file) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) => read_file_content(path)?,
        (None, None) => String::new(),
    };

    match pipeline.summarize_text_with(&text, max_length, min_length) {
        Some(response) => {
            write_json(&response, None)?;
            Ok(ExitCode::SUCCESS)
        }
        None => not_found("No text provided"),
    }
}

fn main() -> Result<ExitCode> {
    init_logging();
    let cli = Cli::parse();

    let config = load_config(&cli)?;
    let ctx = PipelineContext::new(config)?;
    let pipeline = Pipeline::new(&ctx);

    match &cli.command {
        Commands::Analyze { input, out } => run_analyze(&pipeline, input, out.as_deref()),
        Commands::Summarize {
            source,
            max_length,
            min_length,
        } => run_summarize(&pipeline, source, *max_length, *min_length),
    }
}
