//! Pipeline orchestrator.
//!
//! Two runs, each non-destructive (a failing topic is logged, recorded in
//! `errors` and skipped):
//!
//!   Collect:   fetch listing once → parse once → per topic (bounded pool)
//!              filter → render collection artifact
//!   Summarize: catalog latest collection artifact per topic → load records
//!              → summarize each → render summary artifact
//!
//! Both are driven from the CLI and the scheduler.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, instrument, warn};

use arxivdigest_artifacts::{
    list_latest_per_topic, load_records, ArtifactContent, ArtifactKind, ArtifactName, ArtifactRenderer,
};
use arxivdigest_common::{PaperRecord, SummarizedPaper, Topic};
use arxivdigest_llm::Summarizer;

use crate::error::{FetchError, TopicError};
use crate::listing::Listing;
use crate::sources::ListingSource;

pub const DEFAULT_CONCURRENCY: usize = 4;
pub const UNKNOWN_TOPIC: &str = "Unknown";

// ── Job config ────────────────────────────────────────────────────────────────

/// Parameters for one Collect run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectJob {
    pub topics: Vec<Topic>,
    pub category: String,
    pub max_papers_per_topic: usize,
    pub output_dir: PathBuf,
    /// Topics rendered in parallel.
    pub concurrency: usize,
}

impl Default for CollectJob {
    fn default() -> Self {
        Self {
            topics: Vec::new(),
            category: "cs".to_string(),
            max_papers_per_topic: 100,
            output_dir: PathBuf::from("ArxivPapers"),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

/// Parameters for one Summarize run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizeJob {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl Default for SummarizeJob {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("ArxivPapers"),
            output_dir: PathBuf::from("ArxivSummaries"),
        }
    }
}

// ── Result summary ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize)]
pub struct CollectResult {
    /// Topic → collection artifact, only for topics that produced one.
    pub artifacts: BTreeMap<String, PathBuf>,
    pub listing_entries: usize,
    pub papers_collected: usize,
    pub errors: Vec<String>,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SummarizeResult {
    /// Topic → summary artifact.
    pub artifacts: BTreeMap<String, PathBuf>,
    pub papers_summarized: usize,
    pub errors: Vec<String>,
    pub duration_ms: u64,
}

// ── Collect ───────────────────────────────────────────────────────────────────

/// Runs one Collect pass.
///
/// A fetch failure aborts the whole run; everything after the fetch is
/// isolated per topic.
#[instrument(skip(job, source, renderer), fields(category = %job.category, topics = job.topics.len()))]
pub async fn run_collect(
    job: &CollectJob,
    source: &dyn ListingSource,
    renderer: Arc<ArtifactRenderer>,
) -> Result<CollectResult, FetchError> {
    let t0 = Instant::now();
    let generated_at = Local::now().naive_local();
    let mut result = CollectResult::default();

    if job.topics.is_empty() {
        warn!("No topics configured; nothing to collect");
        return Ok(result);
    }

    let raw = source.fetch(&job.category).await?;
    let listing = Arc::new(Listing::parse(&raw));
    result.listing_entries = listing.len();
    info!(entries = listing.len(), "Listing ready");

    let semaphore = Arc::new(Semaphore::new(job.concurrency.max(1)));
    let mut tasks = JoinSet::new();

    for topic in &job.topics {
        let permit = match semaphore.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(e) => {
                error!(error = %e, "Worker pool closed");
                result.errors.push(format!("Worker pool closed: {e}"));
                break;
            }
        };
        let listing = listing.clone();
        let renderer = renderer.clone();
        let topic = topic.clone();
        let output_dir = job.output_dir.clone();
        let max = job.max_papers_per_topic;

        tasks.spawn_blocking(move || {
            let _permit = permit;
            let records = listing.matching(&topic, max);
            let count = records.len();
            let rendered = renderer.render(
                topic.as_str(),
                ArtifactContent::Collection(&records),
                &output_dir,
                generated_at,
            );
            (topic, count, rendered)
        });
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((topic, count, Ok(Some(path)))) => {
                info!(topic = %topic, papers = count, path = %path.display(), "Collection artifact written");
                result.papers_collected += count;
                result.artifacts.insert(topic.to_string(), path);
            }
            Ok((topic, _, Ok(None))) => {
                info!(topic = %topic, "No papers matched");
            }
            Ok((topic, _, Err(e))) => {
                error!(topic = %topic, error = %e, "Collection artifact failed");
                result.errors.push(format!("{topic}: {e}"));
            }
            Err(e) => {
                error!(error = %e, "Collect worker panicked");
                result.errors.push(TopicError::from(e).to_string());
            }
        }
    }

    result.duration_ms = t0.elapsed().as_millis() as u64;
    info!(
        artifacts = result.artifacts.len(),
        papers = result.papers_collected,
        errors = result.errors.len(),
        duration_ms = result.duration_ms,
        "Collect run complete"
    );
    Ok(result)
}

// ── Summarize ─────────────────────────────────────────────────────────────────

/// Runs one Summarize pass over the latest collection artifact of each topic.
#[instrument(skip(job, summarizer, renderer), fields(input = %job.input_dir.display(), summarizer = summarizer.name()))]
pub async fn run_summarize(
    job: &SummarizeJob,
    summarizer: Arc<dyn Summarizer>,
    renderer: Arc<ArtifactRenderer>,
) -> SummarizeResult {
    let t0 = Instant::now();
    let generated_at = Local::now().naive_local();
    let mut result = SummarizeResult::default();

    let latest = list_latest_per_topic(&job.input_dir, ArtifactKind::Collection);
    if latest.is_empty() {
        warn!("No collection artifacts found");
    }

    for (topic, path) in latest {
        match summarize_into(&topic, &path, &job.output_dir, summarizer.as_ref(), &renderer, generated_at).await {
            Ok(Some((out, count))) => {
                result.papers_summarized += count;
                result.artifacts.insert(topic, out);
            }
            Ok(None) => {}
            Err(e) => {
                error!(topic = %topic, path = %path.display(), error = %e, "Summary artifact failed");
                result.errors.push(format!("{topic}: {e}"));
            }
        }
    }

    result.duration_ms = t0.elapsed().as_millis() as u64;
    info!(
        artifacts = result.artifacts.len(),
        papers = result.papers_summarized,
        errors = result.errors.len(),
        duration_ms = result.duration_ms,
        "Summarize run complete"
    );
    result
}

/// Summarize one named collection artifact. The topic is decoded from the
/// file name, or `Unknown` when the name does not follow the grammar.
#[instrument(skip(summarizer, renderer))]
pub async fn summarize_artifact(
    path: &Path,
    output_dir: &Path,
    summarizer: Arc<dyn Summarizer>,
    renderer: Arc<ArtifactRenderer>,
) -> Result<Option<PathBuf>, TopicError> {
    let topic = path
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(ArtifactName::parse)
        .map(|name| name.topic)
        .unwrap_or_else(|| UNKNOWN_TOPIC.to_string());
    let generated_at = Local::now().naive_local();

    let out = summarize_into(&topic, path, output_dir, summarizer.as_ref(), &renderer, generated_at).await?;
    Ok(out.map(|(path, _)| path))
}

async fn summarize_into(
    topic: &str,
    path: &Path,
    output_dir: &Path,
    summarizer: &dyn Summarizer,
    renderer: &Arc<ArtifactRenderer>,
    generated_at: NaiveDateTime,
) -> Result<Option<(PathBuf, usize)>, TopicError> {
    let source = path.to_path_buf();
    let layout = renderer.layout().clone();
    let records: Vec<PaperRecord> =
        tokio::task::spawn_blocking(move || load_records(&source, &layout)).await??;
    if records.is_empty() {
        warn!(topic, path = %path.display(), "No records recovered from artifact");
        return Ok(None);
    }
    info!(topic, papers = records.len(), "Summarizing artifact");

    let mut papers = Vec::with_capacity(records.len());
    for record in records {
        let summary = summarizer.summarize(&record).await;
        papers.push(SummarizedPaper { record, summary });
    }
    let count = papers.len();

    let renderer = renderer.clone();
    let topic_owned = topic.to_string();
    let output_dir = output_dir.to_path_buf();
    let rendered = tokio::task::spawn_blocking(move || {
        renderer.render(&topic_owned, ArtifactContent::Summary(&papers), &output_dir, generated_at)
    })
    .await??;

    Ok(rendered.map(|p| (p, count)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use arxivdigest_llm::ExtractiveSummarizer;

    struct CountingSource {
        body: Result<String, u16>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ListingSource for CountingSource {
        async fn fetch(&self, category: &str) -> Result<String, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.body {
                Ok(b) => Ok(b.clone()),
                Err(status) => Err(FetchError::status(format!("test://{category}"), *status, "unavailable")),
            }
        }
    }

    fn listing(subjects: &[&str]) -> String {
        let mut html = String::from("<dl>");
        for (i, s) in subjects.iter().enumerate() {
            html.push_str(&format!(
                r#"<dt><a href="/abs/2401.{i:05}" title="Abstract">x</a></dt>
<dd><div class="list-title">Title: Paper {i}</div>
<div class="list-authors">Authors: Someone</div>
<div class="list-subjects">Subjects: {s}</div>
<p class="mathjax">First. Second. Third. Fourth.</p></dd>"#
            ));
        }
        html.push_str("</dl>");
        html
    }

    #[tokio::test]
    async fn test_collect_fetches_once_for_all_topics() {
        let dir = tempfile::tempdir().unwrap();
        let source = CountingSource {
            body: Ok(listing(&["Machine Learning (cs.LG)", "Robotics (cs.RO)", "Machine Learning (cs.LG)"])),
            calls: AtomicUsize::new(0),
        };
        let job = CollectJob {
            topics: vec![Topic::new("Machine Learning"), Topic::new("Robotics"), Topic::new("Quantum")],
            output_dir: dir.path().to_path_buf(),
            ..Default::default()
        };

        let result = run_collect(&job, &source, Arc::new(ArtifactRenderer::default())).await.unwrap();

        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(result.listing_entries, 3);
        assert_eq!(result.papers_collected, 3);
        assert_eq!(
            result.artifacts.keys().cloned().collect::<Vec<_>>(),
            vec!["Machine Learning".to_string(), "Robotics".to_string()]
        );
        assert!(result.errors.is_empty());
    }

    #[tokio::test]
    async fn test_collect_fetch_failure_aborts_run() {
        let dir = tempfile::tempdir().unwrap();
        let source = CountingSource { body: Err(503), calls: AtomicUsize::new(0) };
        let job = CollectJob {
            topics: vec![Topic::new("AI")],
            output_dir: dir.path().to_path_buf(),
            ..Default::default()
        };

        let err = run_collect(&job, &source, Arc::new(ArtifactRenderer::default())).await.unwrap_err();
        assert_eq!(err.status, Some(503));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_collect_without_topics_does_not_fetch() {
        let source = CountingSource { body: Ok(String::new()), calls: AtomicUsize::new(0) };
        let result = run_collect(&CollectJob::default(), &source, Arc::new(ArtifactRenderer::default()))
            .await
            .unwrap();
        assert!(result.artifacts.is_empty());
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_summarize_artifact_with_unrecognised_name_uses_unknown_topic() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = Arc::new(ArtifactRenderer::default());
        let records = vec![PaperRecord::new("T", "A", "S", "One. Two. Three. Four.", None)];
        let at = Local::now().naive_local();
        let rendered = renderer
            .render("Whatever", ArtifactContent::Collection(&records), dir.path(), at)
            .unwrap()
            .unwrap();
        let renamed = dir.path().join("my_papers.pdf");
        std::fs::rename(&rendered, &renamed).unwrap();
        std::fs::rename(
            rendered.with_extension("json"),
            renamed.with_extension("json"),
        )
        .unwrap();

        let out_dir = dir.path().join("summaries");
        let out = summarize_artifact(&renamed, &out_dir, Arc::new(ExtractiveSummarizer), renderer)
            .await
            .unwrap()
            .unwrap();
        let name = ArtifactName::parse(out.file_name().unwrap().to_str().unwrap()).unwrap();
        assert_eq!(name.topic, UNKNOWN_TOPIC);
        assert_eq!(name.kind, ArtifactKind::Summary);
    }

    #[tokio::test]
    async fn test_summarize_empty_input_dir() {
        let dir = tempfile::tempdir().unwrap();
        let job = SummarizeJob {
            input_dir: dir.path().join("none"),
            output_dir: dir.path().join("out"),
        };
        let result = run_summarize(&job, Arc::new(ExtractiveSummarizer), Arc::new(ArtifactRenderer::default())).await;
        assert!(result.artifacts.is_empty());
        assert!(result.errors.is_empty());
    }
}
