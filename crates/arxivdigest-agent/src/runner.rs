//! Wires configuration, topics and directories to the two pipeline runs.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use tracing::{error, info, warn};

use arxivdigest_artifacts::ArtifactRenderer;
use arxivdigest_common::load_topics;
use arxivdigest_ingestion::{
    run_collect, run_summarize, ArxivListingClient, CollectJob, CollectResult, SummarizeJob,
    SummarizeResult,
};
use arxivdigest_llm::build_summarizer;

use crate::config::Config;
use crate::scheduler::{Job, JobRunner};

pub struct PipelineRunner {
    config: Config,
    topics_file: PathBuf,
    papers_dir: PathBuf,
    summaries_dir: PathBuf,
    renderer: Arc<ArtifactRenderer>,
}

impl PipelineRunner {
    pub fn new(config: Config, topics_file: PathBuf, papers_dir: PathBuf, summaries_dir: PathBuf) -> Self {
        Self {
            config,
            topics_file,
            papers_dir,
            summaries_dir,
            renderer: Arc::new(ArtifactRenderer::default()),
        }
    }

    /// Fetch the listing and write one collection artifact per matching topic.
    pub async fn collect(&self) -> anyhow::Result<CollectResult> {
        let topics = load_topics(&self.topics_file)
            .with_context(|| format!("reading topics file {}", self.topics_file.display()))?;
        if topics.is_empty() {
            warn!(path = %self.topics_file.display(), "Topics file lists no topics");
            return Ok(CollectResult::default());
        }

        let client = ArxivListingClient::new()?.with_list_type(self.config.list_type());
        let job = CollectJob {
            topics,
            category: self.config.arxiv_category.clone(),
            max_papers_per_topic: self.config.max_papers_per_topic,
            output_dir: self.papers_dir.clone(),
            ..Default::default()
        };
        let result = run_collect(&job, &client, self.renderer.clone()).await?;
        for (topic, path) in &result.artifacts {
            info!(topic = %topic, path = %path.display(), "Collection artifact written");
        }
        Ok(result)
    }

    /// Summarize the latest collection artifact of each topic.
    pub async fn summarize(&self) -> SummarizeResult {
        let api_key = self.config.api_key();
        let summarizer = build_summarizer(self.config.use_ai_summaries, api_key.as_deref());
        let job = SummarizeJob {
            input_dir: self.papers_dir.clone(),
            output_dir: self.summaries_dir.clone(),
        };
        let result = run_summarize(&job, summarizer, self.renderer.clone()).await;
        for (topic, path) in &result.artifacts {
            info!(topic = %topic, path = %path.display(), "Summary artifact written");
        }
        result
    }
}

#[async_trait]
impl JobRunner for PipelineRunner {
    async fn run(&self, job: Job) {
        match job {
            Job::Collect => {
                if let Err(e) = self.collect().await {
                    error!("Scheduled collect failed: {e:#}");
                }
            }
            Job::Summarize => {
                self.summarize().await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn runner(root: &std::path::Path) -> PipelineRunner {
        PipelineRunner::new(
            Config::default(),
            root.join("topics.txt"),
            root.join("ArxivPapers"),
            root.join("ArxivSummaries"),
        )
    }

    #[tokio::test]
    async fn test_collect_without_topics_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = runner(dir.path()).collect().await.unwrap_err();
        assert!(format!("{err:#}").contains("topics.txt"));
    }

    #[tokio::test]
    async fn test_collect_with_blank_topics_file_does_nothing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("topics.txt"), "\n   \n").unwrap();
        let result = runner(dir.path()).collect().await.unwrap();
        assert!(result.artifacts.is_empty());
        assert!(!dir.path().join("ArxivPapers").exists());
    }

    #[tokio::test]
    async fn test_summarize_with_no_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let result = runner(dir.path()).summarize().await;
        assert_eq!(result.artifacts.len(), 0);
        assert!(result.errors.is_empty());
    }
}
