//! arxivdigest-common: Shared types and text helpers used across all arxivdigest crates.

pub mod paper;
pub mod text;
pub mod topic;

// Re-export commonly used types
pub use paper::{PaperRecord, SummarizedPaper};
pub use topic::{load_topics, parse_topics, Topic};
