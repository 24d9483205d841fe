//! Hacker News discussion lookup via the Algolia search API.
//!
//! Enriches stored articles with a link to the best-matching HN submission
//! for their URL. Lookups are best-effort from the pipeline's point of view:
//! the worker logs failures and persists the article without a link.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use readstack_core::DiscussionFinder;
use readstack_shared::{ReadstackError, Result};

/// Public Algolia endpoint for Hacker News search.
const DEFAULT_BASE_URL: &str = "https://hn.algolia.com";

/// Upper bound on candidate hits requested per lookup.
const HITS_PER_PAGE: &str = "1000";

/// Bounded timeout so a slow index cannot stall the single ingestion worker.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// User-Agent string for lookup requests.
const USER_AGENT: &str = concat!("readstack/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(rename = "objectID")]
    object_id: String,
    #[serde(default)]
    points: i64,
}

/// Client for the HN search index, restricted to URL-field matches.
pub struct HnClient {
    client: Client,
    base_url: String,
}

impl HnClient {
    /// Create a client against the public HN search index.
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Use a non-default index location. Integration tests point this at a
    /// mock server.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| {
                ReadstackError::Enrichment(format!("failed to build HTTP client: {e}"))
            })?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// Find the HN discussion for `url`, if any.
    ///
    /// Zero hits is not an error. With multiple hits the submission with the
    /// most points wins; ties keep the first hit returned by the index.
    pub async fn find(&self, url: &str) -> Result<Option<String>> {
        let endpoint = format!("{}/api/v1/search", self.base_url);
        let response = self
            .client
            .get(&endpoint)
            .query(&[
                ("restrictSearchableAttributes", "url"),
                ("hitsPerPage", HITS_PER_PAGE),
                ("query", url),
            ])
            .send()
            .await
            .map_err(|e| ReadstackError::Enrichment(format!("HN search request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ReadstackError::Enrichment(format!(
                "HN search returned status {status}"
            )));
        }

        let parsed: SearchResponse = response.json().await.map_err(|e| {
            ReadstackError::Enrichment(format!("HN search response unreadable: {e}"))
        })?;

        let best = parsed
            .hits
            .iter()
            .reduce(|best, hit| if hit.points > best.points { hit } else { best });

        Ok(best.map(|hit| {
            debug!(object_id = %hit.object_id, points = hit.points, "matched HN submission");
            discussion_link(&hit.object_id)
        }))
    }
}

#[async_trait]
impl DiscussionFinder for HnClient {
    async fn find_discussion(&self, url: &str) -> Result<Option<String>> {
        self.find(url).await
    }
}

/// Item page for an HN submission id.
fn discussion_link(object_id: &str) -> String {
    format!("https://news.ycombinator.com/item?id={object_id}")
}
