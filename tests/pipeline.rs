use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use newslens::article::{Article, RawArticle};
use newslens::config::AppConfig;
use newslens::context::PipelineContext;
use newslens::error::{OracleError, Outcome};
use newslens::nlp::{ScoringMethod, SentimentLabel, SentimentScorer, Summarizer};
use newslens::oracle::{Classification, GenerationParams, SentimentOracle, SummaryOracle};
use newslens::service::Pipeline;

/// Classifies everything as positive unless the text contains "FAIL".
/// Records the length in chars of every input it sees.
#[derive(Default)]
struct StubClassifier {
    seen: Mutex<Vec<usize>>,
    calls: AtomicUsize,
}

impl SentimentOracle for StubClassifier {
    fn name(&self) -> &str {
        "stub-classifier"
    }

    fn classify(&self, text: &str, _timeout: Duration) -> Result<Classification, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(text.chars().count());
        if text.contains("FAIL") {
            return Err(OracleError::Inference("stub failure".to_string()));
        }
        Ok(Classification {
            label: SentimentLabel::Positive,
            confidence: 0.93,
        })
    }
}

struct TimeoutClassifier;

impl SentimentOracle for TimeoutClassifier {
    fn name(&self) -> &str {
        "slow-classifier"
    }

    fn classify(&self, _text: &str, timeout: Duration) -> Result<Classification, OracleError> {
        Err(OracleError::Timeout(timeout))
    }
}

/// Returns a fixed summary unless the text contains "FAIL".
#[derive(Default)]
struct StubSummarizer {
    params: Mutex<Option<GenerationParams>>,
}

impl SummaryOracle for StubSummarizer {
    fn name(&self) -> &str {
        "stub-summarizer"
    }

    fn summarize(&self, text: &str, params: &GenerationParams, _timeout: Duration) -> Result<String, OracleError> {
        *self.params.lock().unwrap() = Some(params.clone());
        if text.contains("FAIL") {
            return Err(OracleError::Unavailable("stub down".to_string()));
        }
        Ok("oracle summary".to_string())
    }
}

fn context(
    sentiment: Option<Arc<dyn SentimentOracle>>,
    summary: Option<Arc<dyn SummaryOracle>>,
) -> PipelineContext {
    PipelineContext::with_oracles(AppConfig::default(), sentiment, summary).unwrap()
}

fn offline() -> PipelineContext {
    context(None, None)
}

fn long_text(lead: &str) -> String {
    let mut text = format!("{lead}. ");
    for i in 0..12 {
        text.push_str(&format!("Sentence number {i} adds more words here. "));
    }
    text
}

fn article(url: &str, title: &str, text: &str) -> Article {
    Article::from_raw(RawArticle {
        title: Some(title.to_string()),
        text: Some(text.to_string()),
        url: Some(url.to_string()),
        publish_date: Some("2024-05-01".to_string()),
        ..Default::default()
    })
    .unwrap()
}

#[test]
fn score_batch_keeps_order_with_mixed_failures() {
    let scorer = SentimentScorer::new(&context(Some(Arc::new(StubClassifier::default())), None));
    let texts = vec![
        "a wonderful day",
        "FAIL but a terrible disaster",
        "another day",
        "FAIL with great joy",
        "fine",
    ];
    let results = scorer.score_batch(&texts);
    assert_eq!(results.len(), texts.len());
    let methods: Vec<ScoringMethod> = results.iter().map(|r| r.method).collect();
    assert_eq!(
        methods,
        vec![
            ScoringMethod::Transformer,
            ScoringMethod::Textblob,
            ScoringMethod::Transformer,
            ScoringMethod::Textblob,
            ScoringMethod::Transformer,
        ]
    );
    assert_eq!(results[1].label, SentimentLabel::Negative);
    assert_eq!(results[3].label, SentimentLabel::Positive);
    assert_eq!(results[0].score, 0.93);
}

#[test]
fn scorer_without_classifier_is_degraded() {
    let scorer = SentimentScorer::new(&offline());
    assert!(scorer.is_degraded());
    let outcome = scorer.score_primary_outcome("An excellent result.");
    assert!(outcome.is_degraded());
    let result = outcome.value().unwrap();
    assert_eq!(result.method, ScoringMethod::Textblob);
    assert_eq!(result.label, SentimentLabel::Positive);
}

#[test]
fn classifier_timeout_falls_back() {
    let scorer = SentimentScorer::new(&context(Some(Arc::new(TimeoutClassifier)), None));
    match scorer.score_primary_outcome("Awful news.") {
        Outcome::Degraded { value, reason } => {
            assert_eq!(value.method, ScoringMethod::Textblob);
            assert_eq!(value.label, SentimentLabel::Negative);
            assert!(reason.contains("timed out"), "{reason}");
        }
        other => panic!("expected degraded outcome, got {other:?}"),
    }
}

#[test]
fn classifier_input_truncated_to_512_chars() {
    let stub = Arc::new(StubClassifier::default());
    let scorer = SentimentScorer::new(&context(Some(stub.clone() as Arc<dyn SentimentOracle>), None));
    scorer.score_primary(&"é".repeat(2000));
    scorer.score_primary("short");
    assert_eq!(*stub.seen.lock().unwrap(), vec![512, 5]);
    assert_eq!(stub.calls.load(Ordering::SeqCst), 2);
}

#[test]
fn summarize_batch_keeps_order_with_mixed_failures() {
    let summarizer = Summarizer::new(&context(None, Some(Arc::new(StubSummarizer::default()))));
    let failing = long_text("FAIL first");
    let texts = vec![long_text("Opening"), failing.clone(), "Too short to summarize.".to_string()];
    let results = summarizer.summarize_batch(&texts, None, None);
    assert_eq!(results.len(), 3);
    assert_eq!(results[0], "oracle summary");
    assert_eq!(results[1], "FAIL first. Sentence number 0 adds more words here. Sentence number 1 adds more words here.");
    assert_eq!(results[2], "Too short to summarize.");
}

#[test]
fn short_text_passes_through_verbatim() {
    let summarizer = Summarizer::new(&context(None, Some(Arc::new(StubSummarizer::default()))));
    let text = "  Exactly as written.  Even  the spacing. ";
    assert_eq!(summarizer.summarize(text, None, None), text);
    assert_eq!(summarizer.summarize("", None, None), "");
}

#[test]
fn summary_bounds_reach_the_oracle() {
    let stub = Arc::new(StubSummarizer::default());
    let summarizer = Summarizer::new(&context(None, Some(stub.clone() as Arc<dyn SummaryOracle>)));
    summarizer.summarize(&long_text("Lead"), Some(60), Some(90));
    let params = stub.params.lock().unwrap().clone().unwrap();
    assert_eq!(params.max_length, 60);
    assert_eq!(params.min_length, 60);
    assert_eq!(params.num_beams, 4);
}

#[test]
fn summarizer_without_model_uses_extractive_fallback() {
    let summarizer = Summarizer::new(&offline());
    assert!(summarizer.is_degraded());
    let outcome = summarizer.summarize_outcome(&long_text("Lead"), None, None);
    assert!(outcome.is_degraded());
    assert_eq!(
        outcome.value().unwrap(),
        "Lead. Sentence number 0 adds more words here. Sentence number 1 adds more words here."
    );
}

#[test]
fn analyze_empty_collection_is_not_found() {
    let pipeline = Pipeline::new(&offline());
    assert!(pipeline.analyze(&[]).unwrap().is_none());
}

#[test]
fn analyze_full_report() {
    let pipeline = Pipeline::new(&context(Some(Arc::new(StubClassifier::default())), None));
    let articles = vec![
        article("https://a.example/1", "Launch", "NASA launched a rocket from Texas. The launch was a great success."),
        article("https://a.example/2", "Orbit", "The rocket reached orbit. Engineers were happy."),
        article("https://b.example/1", "Loss", "FAIL A terrible storm caused awful damage in Florida."),
    ];
    let report = pipeline.analyze(&articles).unwrap().unwrap();

    let titles: Vec<&str> = report.articles.iter().map(|a| a.title.as_str()).collect();
    assert_eq!(titles, vec!["Launch", "Orbit", "Loss"]);
    assert_eq!(report.articles[0].source, "a.example");
    assert_eq!(report.articles[0].summary, articles[0].text);
    assert_eq!(report.articles[0].sentiment.method, ScoringMethod::Transformer);
    assert_eq!(report.articles[2].sentiment.method, ScoringMethod::Textblob);
    assert_eq!(report.articles[2].sentiment.label, SentimentLabel::Negative);
    assert_eq!(report.articles[0].publish_date.as_deref(), Some("2024-05-01T00:00:00+00:00"));

    let stats = report.sentiment_stats;
    assert_eq!(stats.total, 3);
    assert_eq!(stats.positive_count + stats.negative_count + stats.neutral_count, stats.total);
    assert_eq!(stats.positive_count, 2);
    assert_eq!(stats.negative_count, 1);

    assert_eq!(report.analysis.total_articles, 3);
    assert_eq!(report.analysis.entity_frequencies.get("NASA"), Some(&1));

    let sources: Vec<&str> = report.source_analysis.keys().collect();
    assert_eq!(sources, vec!["a.example", "b.example"]);
    assert_eq!(report.source_analysis.get("a.example").unwrap().article_count, 2);
    assert_eq!(report.source_analysis.get("b.example").unwrap().article_count, 1);
    // per-source sentiment stays lexical while the classifier is live
    for (_, summary) in report.source_analysis.iter() {
        assert_eq!(summary.avg_sentiment.method, ScoringMethod::Textblob);
    }
    assert_eq!(
        report.source_analysis.get("a.example").unwrap().avg_sentiment.label,
        SentimentLabel::Positive
    );

    assert_eq!(report.charts.sentiment.values, vec![2, 1, 0]);
    assert_eq!(report.charts.sources.article_counts, vec![2, 1]);
    assert!(!report.charts.word_cloud.is_empty());
}

#[test]
fn analyze_reports_progress_per_article() {
    let pipeline = Pipeline::new(&offline());
    let articles: Vec<Article> = (0..7)
        .map(|i| article(&format!("https://s{}.example/{i}", i % 2), "T", "Some text here."))
        .collect();
    let ticks = AtomicUsize::new(0);
    let report = pipeline
        .analyze_with_progress(&articles, || {
            ticks.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap()
        .unwrap();
    assert_eq!(ticks.load(Ordering::SeqCst), 7);
    assert_eq!(report.articles.len(), 7);
    let sources: Vec<&str> = report.source_analysis.keys().collect();
    assert_eq!(sources, vec!["s0.example", "s1.example"]);
}

#[test]
fn summarize_text_rejects_empty_input() {
    let pipeline = Pipeline::new(&offline());
    assert!(pipeline.summarize_text("").is_none());
    let response = pipeline.summarize_text(&long_text("Lead")).unwrap();
    assert!(response.summary.starts_with("Lead. Sentence number 0"));
    assert!(response.summary.ends_with("here."));
}

#[test]
fn report_serializes_to_json() {
    let pipeline = Pipeline::new(&offline());
    let articles = vec![
        article("https://z.example/1", "Z", "Good news."),
        article("https://a.example/1", "A", "Bad news."),
    ];
    let report = pipeline.analyze(&articles).unwrap().unwrap();
    let json = serde_json::to_value(&report).unwrap();
    let sources = json["source_analysis"].as_object().unwrap();
    assert!(sources.contains_key("z.example") && sources.contains_key("a.example"));
    assert_eq!(json["articles"][0]["sentiment"]["method"], "textblob");
    assert!(json["articles"][1]["sentiment"]["label"].is_string());
}
