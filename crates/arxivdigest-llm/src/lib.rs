//! arxivdigest-llm: LLM backend abstraction and paper summarizers.

pub mod backend;
pub mod summary;

pub use backend::{LlmBackend, LlmError, OpenAiBackend};
pub use summary::{build_summarizer, extractive_summary, DelegatedSummarizer, ExtractiveSummarizer, Summarizer};
