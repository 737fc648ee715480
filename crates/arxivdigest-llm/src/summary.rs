//! Paper summarizers.
//!
//! `ExtractiveSummarizer` is deterministic and never calls out.
//! `DelegatedSummarizer` asks an LLM backend and falls back to the extractive
//! summary on any failure, so `summarize` itself cannot fail.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use arxivdigest_common::PaperRecord;

use crate::backend::{LlmBackend, LlmError, LlmRequest, Message, OpenAiBackend};

pub const SUMMARY_MODEL: &str = "gpt-3.5-turbo";
pub const SUMMARY_MAX_TOKENS: u32 = 150;
pub const SUMMARY_TEMPERATURE: f32 = 0.3;

const SYSTEM_PROMPT: &str =
    "You are a scientific paper summarizer. Create concise, accurate summaries of research papers.";

const SENTENCE_SEPARATOR: &str = ". ";
const EXTRACTIVE_SENTENCES: usize = 3;

// ── Trait ─────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, paper: &PaperRecord) -> String;
    fn name(&self) -> &'static str;
}

// ── Extractive ───────────────────────────────────────────────────────────────

/// First three `". "`-separated sentences of the abstract.
///
/// Abstracts with three sentences or fewer come back trimmed but otherwise
/// unchanged; longer ones are cut after the third sentence and closed with a
/// period.
pub fn extractive_summary(abstract_text: &str) -> String {
    let trimmed = abstract_text.trim();
    let sentences: Vec<&str> = trimmed.split(SENTENCE_SEPARATOR).collect();
    if sentences.len() <= EXTRACTIVE_SENTENCES {
        return trimmed.to_string();
    }
    let mut summary = sentences[..EXTRACTIVE_SENTENCES].join(SENTENCE_SEPARATOR);
    if !summary.ends_with('.') {
        summary.push('.');
    }
    summary
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractiveSummarizer;

#[async_trait]
impl Summarizer for ExtractiveSummarizer {
    async fn summarize(&self, paper: &PaperRecord) -> String {
        extractive_summary(&paper.abstract_text)
    }

    fn name(&self) -> &'static str { "extractive" }
}

// ── Delegated ────────────────────────────────────────────────────────────────

pub struct DelegatedSummarizer {
    backend: Arc<dyn LlmBackend>,
}

impl DelegatedSummarizer {
    pub fn new(backend: Arc<dyn LlmBackend>) -> Self {
        Self { backend }
    }

    async fn try_summarize(&self, paper: &PaperRecord) -> Result<String, LlmError> {
        let resp = self.backend.complete(build_request(paper)).await?;
        let content = resp.content.trim();
        if content.is_empty() {
            return Err(LlmError::EmptyCompletion);
        }
        debug!(
            model = %resp.model,
            prompt_tokens = resp.prompt_tokens,
            completion_tokens = resp.completion_tokens,
            "Delegated summary generated"
        );
        Ok(content.to_string())
    }
}

#[async_trait]
impl Summarizer for DelegatedSummarizer {
    async fn summarize(&self, paper: &PaperRecord) -> String {
        match self.try_summarize(paper).await {
            Ok(summary) => summary,
            Err(e) => {
                warn!(
                    title = %paper.title,
                    backend = self.backend.model_id(),
                    error = %e,
                    "Delegated summary failed; using extractive summary"
                );
                extractive_summary(&paper.abstract_text)
            }
        }
    }

    fn name(&self) -> &'static str { "delegated" }
}

pub fn build_request(paper: &PaperRecord) -> LlmRequest {
    let prompt = format!(
        "Title: {}\nAuthors: {}\nSubjects: {}\nAbstract: {}\n\n\
         Please provide a 3-4 sentence summary of this research paper, highlighting the main \
         problem addressed, methodology used, and key findings.",
        paper.title, paper.authors, paper.subjects, paper.abstract_text
    );
    LlmRequest {
        messages: vec![Message::system(SYSTEM_PROMPT), Message::user(prompt)],
        model: Some(SUMMARY_MODEL.to_string()),
        max_tokens: Some(SUMMARY_MAX_TOKENS),
        temperature: Some(SUMMARY_TEMPERATURE),
    }
}

// ── Selection ────────────────────────────────────────────────────────────────

/// Delegated only when AI summaries are requested and a key is available.
pub fn build_summarizer(use_ai: bool, api_key: Option<&str>) -> Arc<dyn Summarizer> {
    let key = api_key.map(str::trim).filter(|k| !k.is_empty());
    match (use_ai, key) {
        (true, Some(key)) => match OpenAiBackend::new(key, SUMMARY_MODEL) {
            Ok(backend) => Arc::new(DelegatedSummarizer::new(Arc::new(backend))),
            Err(e) => {
                warn!(error = %e, "Could not build LLM client; using extractive summaries");
                Arc::new(ExtractiveSummarizer)
            }
        },
        (true, None) => {
            warn!("AI summaries requested but no API key configured; using extractive summaries");
            Arc::new(ExtractiveSummarizer)
        }
        (false, _) => Arc::new(ExtractiveSummarizer),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
