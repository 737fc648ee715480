//! End-to-end: static listing → Collect → Summarize.
//!
//! Run with: cargo test --package arxivdigest-ingestion --test pipeline_e2e

use std::fs;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Local, NaiveDate};
use pretty_assertions::assert_eq;

use arxivdigest_artifacts::sidecar::{sidecar_path, Sidecar};
use arxivdigest_artifacts::{
    load_records, ArtifactContent, ArtifactKind, ArtifactName, ArtifactRenderer, LayoutConfig,
};
use arxivdigest_common::{PaperRecord, Topic};
use arxivdigest_ingestion::pipeline::{run_collect, run_summarize, CollectJob, SummarizeJob};
use arxivdigest_ingestion::{ArxivListingClient, FetchError, ListingSource};
use arxivdigest_llm::{build_summarizer, ExtractiveSummarizer};

const ML_ABSTRACT: &str = "We introduce a sparse mixture of experts for tabular data. \
    The router is trained with a load-balancing loss. \
    Experiments cover forty public benchmarks. \
    The model matches gradient boosting at a fraction of the cost. \
    Code is available.";

struct StaticListing(String);

#[async_trait]
impl ListingSource for StaticListing {
    async fn fetch(&self, _category: &str) -> Result<String, FetchError> {
        Ok(self.0.clone())
    }
}

fn three_entry_listing() -> String {
    format!(
        r##"<html><body><h3>New submissions</h3><dl id="articles">
<dt><a name="item1">[1]</a> <a href="/abs/2405.00001" title="Abstract" id="2405.00001">arXiv:2405.00001</a></dt>
<dd><div class="meta">
  <div class="list-title mathjax"><span class="descriptor">Title:</span> Legged Locomotion on Ice</div>
  <div class="list-authors"><span class="descriptor">Authors:</span> <a href="#">R. Walker</a></div>
  <div class="list-subjects"><span class="descriptor">Subjects:</span> <span class="primary-subject">Robotics (cs.RO)</span></div>
  <p class="mathjax">Robots slip. We fix that.</p>
</div></dd>
<dt><a name="item2">[2]</a> <a href="/abs/2405.00002" title="Abstract" id="2405.00002">arXiv:2405.00002</a></dt>
<dd><div class="meta">
  <div class="list-title mathjax"><span class="descriptor">Title:</span> Sparse Experts for Tabular Data</div>
  <div class="list-authors"><span class="descriptor">Authors:</span> <a href="#">Grace Hopper</a>, <a href="#">Alan Turing</a></div>
  <div class="list-subjects"><span class="descriptor">Subjects:</span> <span class="primary-subject">Machine Learning (cs.LG)</span>; Artificial Intelligence (cs.AI)</div>
  <p class="mathjax">{ML_ABSTRACT}</p>
</div></dd>
<dt><a name="item3">[3]</a> <a href="/abs/2405.00003" title="Abstract" id="2405.00003">arXiv:2405.00003</a></dt>
<dd><div class="meta">
  <div class="list-title mathjax"><span class="descriptor">Title:</span> Lattice Codes Revisited</div>
  <div class="list-authors"><span class="descriptor">Authors:</span> <a href="#">C. Shannon</a></div>
  <div class="list-subjects"><span class="descriptor">Subjects:</span> <span class="primary-subject">Information Theory (cs.IT)</span></div>
  <p class="mathjax">Codes are good.</p>
</div></dd>
</dl></body></html>"##
    )
}

/// Occupies the collection artifact names `topic` would get this minute and
/// the next, so a Collect run started now cannot write that topic.
fn occupy_collection_name(dir: &Path, topic: &str) {
    fs::create_dir_all(dir).unwrap();
    let now = Local::now().naive_local();
    for at in [now, now + Duration::minutes(1)] {
        let name = ArtifactName::new(ArtifactKind::Collection, topic, at);
        fs::write(dir.join(name.file_name()), b"taken").unwrap();
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_collect_then_summarize() {
    let root = tempfile::tempdir().unwrap();
    let papers_dir = root.path().join("ArxivPapers");
    let summaries_dir = root.path().join("ArxivSummaries");
    let renderer = Arc::new(ArtifactRenderer::default());

    let job = CollectJob {
        topics: vec![Topic::new("Machine Learning")],
        output_dir: papers_dir.clone(),
        ..Default::default()
    };
    let collected = run_collect(&job, &StaticListing(three_entry_listing()), renderer.clone())
        .await
        .unwrap();

    assert_eq!(collected.listing_entries, 3);
    assert_eq!(collected.artifacts.len(), 1);
    let artifact = &collected.artifacts["Machine Learning"];
    let records = load_records(artifact, &LayoutConfig::default()).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].title, "Sparse Experts for Tabular Data");
    assert_eq!(records[0].authors, "Grace Hopper, Alan Turing");
    assert_eq!(records[0].paper_id.as_deref(), Some("2405.00002"));

    let summarized = run_summarize(
        &SummarizeJob { input_dir: papers_dir, output_dir: summaries_dir.clone() },
        Arc::new(ExtractiveSummarizer),
        renderer,
    )
    .await;

    assert!(summarized.errors.is_empty(), "{:?}", summarized.errors);
    assert_eq!(summarized.artifacts.len(), 1);
    let summary_path = &summarized.artifacts["Machine Learning"];
    let sidecar = Sidecar::load(&sidecar_path(summary_path)).unwrap();
    assert_eq!(sidecar.kind, ArtifactKind::Summary);
    assert_eq!(sidecar.papers.len(), 1);
    assert_eq!(
        sidecar.papers[0].summary.as_deref(),
        Some(
            "We introduce a sparse mixture of experts for tabular data. \
             The router is trained with a load-balancing loss. \
             Experiments cover forty public benchmarks."
        )
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_summarize_from_pdf_text_without_sidecar() {
    let root = tempfile::tempdir().unwrap();
    let papers_dir = root.path().join("papers");
    let renderer = Arc::new(ArtifactRenderer::default());

    let job = CollectJob {
        topics: vec![Topic::new("cs.LG"), Topic::new("Robotics")],
        output_dir: papers_dir.clone(),
        ..Default::default()
    };
    let collected = run_collect(&job, &StaticListing(three_entry_listing()), renderer.clone())
        .await
        .unwrap();
    assert_eq!(collected.artifacts.len(), 2);
    for path in collected.artifacts.values() {
        fs::remove_file(sidecar_path(path)).unwrap();
    }

    // AI requested without a key: extractive fallback
    let summarizer = build_summarizer(true, None);
    let summarized = run_summarize(
        &SummarizeJob { input_dir: papers_dir, output_dir: root.path().join("summaries") },
        summarizer,
        renderer,
    )
    .await;

    assert_eq!(summarized.artifacts.len(), 2);
    assert_eq!(summarized.papers_summarized, 2);
    let robotics = Sidecar::load(&sidecar_path(&summarized.artifacts["Robotics"])).unwrap();
    assert_eq!(robotics.papers[0].summary.as_deref(), Some("Robots slip. We fix that."));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_same_minute_rerun_reports_topic_error() {
    let root = tempfile::tempdir().unwrap();
    let renderer = Arc::new(ArtifactRenderer::default());
    let job = CollectJob {
        topics: vec![Topic::new("Information Theory")],
        output_dir: root.path().to_path_buf(),
        ..Default::default()
    };
    occupy_collection_name(root.path(), "Information Theory");

    // The name is already taken: the collision is reported and the existing
    // file is left as it was.
    let result = run_collect(&job, &StaticListing(three_entry_listing()), renderer).await.unwrap();
    assert!(result.artifacts.is_empty());
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].starts_with("Information Theory:"), "{:?}", result.errors);
    for entry in fs::read_dir(root.path()).unwrap() {
        assert_eq!(fs::read(entry.unwrap().path()).unwrap(), b"taken");
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_failing_topic_does_not_stop_collect() {
    let root = tempfile::tempdir().unwrap();
    let papers_dir = root.path().join("papers");
    occupy_collection_name(&papers_dir, "Robotics");

    let job = CollectJob {
        topics: vec![Topic::new("Robotics"), Topic::new("Machine Learning")],
        output_dir: papers_dir.clone(),
        ..Default::default()
    };
    let result = run_collect(
        &job,
        &StaticListing(three_entry_listing()),
        Arc::new(ArtifactRenderer::default()),
    )
    .await
    .unwrap();

    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].starts_with("Robotics:"), "{:?}", result.errors);
    assert_eq!(result.artifacts.keys().collect::<Vec<_>>(), vec!["Machine Learning"]);
    assert!(result.artifacts["Machine Learning"].exists());
    assert_eq!(result.papers_collected, 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unreadable_artifact_does_not_stop_summarize() {
    let root = tempfile::tempdir().unwrap();
    let papers_dir = root.path().join("papers");
    let renderer = Arc::new(ArtifactRenderer::default());

    let ml = [PaperRecord::new(
        "Sparse Experts for Tabular Data",
        "Grace Hopper",
        "Machine Learning (cs.LG)",
        ML_ABSTRACT,
        Some("https://arxiv.org/abs/2405.00002".into()),
    )];
    let at = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(9, 0, 0).unwrap();
    renderer
        .render("Machine Learning", ArtifactContent::Collection(&ml), &papers_dir, at)
        .unwrap()
        .unwrap();
    // Robotics has no sidecar and its PDF cannot be parsed
    fs::write(papers_dir.join("arxiv_papers_01012024_0900_Robotics.pdf"), b"not a pdf").unwrap();

    let summarized = run_summarize(
        &SummarizeJob { input_dir: papers_dir, output_dir: root.path().join("summaries") },
        Arc::new(ExtractiveSummarizer),
        renderer,
    )
    .await;

    assert_eq!(summarized.errors.len(), 1);
    assert!(summarized.errors[0].starts_with("Robotics:"), "{:?}", summarized.errors);
    assert_eq!(summarized.artifacts.keys().collect::<Vec<_>>(), vec!["Machine Learning"]);
    assert_eq!(summarized.papers_summarized, 1);
    let sidecar = Sidecar::load(&sidecar_path(&summarized.artifacts["Machine Learning"])).unwrap();
    assert_eq!(sidecar.papers[0].record.title, "Sparse Experts for Tabular Data");
}

#[tokio::test]
#[ignore] // Requires network access
async fn test_live_collect_cs() {
    let root = tempfile::tempdir().unwrap();
    let client = ArxivListingClient::new().unwrap();
    let job = CollectJob {
        topics: vec![Topic::new("Machine Learning")],
        output_dir: root.path().to_path_buf(),
        max_papers_per_topic: 5,
        ..Default::default()
    };
    let result = run_collect(&job, &client, Arc::new(ArtifactRenderer::default()))
        .await
        .expect("arXiv fetch failed");
    println!("{result:#?}");
    assert!(result.errors.is_empty());
}
