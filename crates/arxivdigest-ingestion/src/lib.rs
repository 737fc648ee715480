//! arxivdigest-ingestion: Listing retrieval and the two pipeline runs.
//! - Listing fetch (arXiv `/list/{category}/{new|recent}`)
//! - Topic-filtered entry extraction
//! - Collect run: listing → per-topic collection artifacts
//! - Summarize run: latest collection artifacts → summary artifacts

pub mod error;
pub mod listing;
pub mod pipeline;
pub mod sources;

pub use error::{FetchError, TopicError};
pub use listing::{extract, Listing};
pub use pipeline::{run_collect, run_summarize, summarize_artifact, CollectJob, CollectResult, SummarizeJob, SummarizeResult};
pub use sources::{arxiv::{ArxivListingClient, ListType}, ListingSource};
