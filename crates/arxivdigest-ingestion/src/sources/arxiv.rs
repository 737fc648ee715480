//! arXiv listing client.
//!
//! Fetches the HTML listing page:
//!   https://arxiv.org/list/{category}/{new|recent}
//!
//! Only the first page is read; the listing is not paginated.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, instrument};
use url::Url;

use super::ListingSource;
use crate::error::FetchError;

pub const ARXIV_BASE_URL: &str = "https://arxiv.org";
const FETCH_TIMEOUT: Duration = Duration::from_secs(15);
const USER_AGENT: &str = concat!("arxivdigest/", env!("CARGO_PKG_VERSION"));

/// Which listing to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListType {
    #[default]
    New,
    Recent,
}

impl ListType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListType::New    => "new",
            ListType::Recent => "recent",
        }
    }
}

impl fmt::Display for ListType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "new"    => Ok(ListType::New),
            "recent" => Ok(ListType::Recent),
            other    => Err(format!("unknown listing type: {other}")),
        }
    }
}

pub struct ArxivListingClient {
    client:    reqwest::Client,
    base_url:  String,
    list_type: ListType,
}

impl ArxivListingClient {
    pub fn new() -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| FetchError::transport(ARXIV_BASE_URL, e))?;
        Ok(Self {
            client,
            base_url: ARXIV_BASE_URL.to_string(),
            list_type: ListType::default(),
        })
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_list_type(mut self, list_type: ListType) -> Self {
        self.list_type = list_type;
        self
    }

    pub fn listing_url(&self, category: &str) -> Result<Url, FetchError> {
        let raw = format!("{}/list/{}/{}", self.base_url, category.trim(), self.list_type);
        Url::parse(&raw).map_err(|e| FetchError::transport(raw, e))
    }
}

#[async_trait]
impl ListingSource for ArxivListingClient {
    #[instrument(skip(self))]
    async fn fetch(&self, category: &str) -> Result<String, FetchError> {
        let url = self.listing_url(category)?;
        info!(url = %url, "Fetching arXiv listing");

        let resp = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchError::transport(url.as_str(), e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::status(url.as_str(), status.as_u16(), format!("HTTP {status}")));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| FetchError::transport(url.as_str(), e))?;
        debug!(bytes = body.len(), "Listing fetched");
        Ok(body)
    }
}
