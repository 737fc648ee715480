//! Listing source clients.

pub mod arxiv;

use async_trait::async_trait;

use crate::error::FetchError;

/// Anything that can hand back the raw listing page for a category.
#[async_trait]
pub trait ListingSource: Send + Sync {
    /// Fetch the raw listing content. One call per Collect run.
    async fn fetch(&self, category: &str) -> Result<String, FetchError>;
}
