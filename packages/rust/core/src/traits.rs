//! Contracts the pipeline expects from its collaborators.
//!
//! The core treats persistence, discussion lookup, and site publication as
//! external concerns. Concrete implementations live in `readstack-storage`,
//! `readstack-hackernews`, and `readstack-site`; tests substitute mocks.

use async_trait::async_trait;

use readstack_shared::{Article, Result, SiteBundle};

/// Durable article persistence.
#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Insert a single article. Treated as atomic and durable.
    async fn insert(&self, article: &Article) -> Result<()>;

    /// Fetch every stored article. Ordering is left to the renderer.
    async fn get_all(&self) -> Result<Vec<Article>>;
}

/// Lookup of an external discussion link for a normalized URL.
#[async_trait]
pub trait DiscussionFinder: Send + Sync {
    /// Return the best-matching discussion link, or `None` when there is no
    /// match. Implementations must bound their network timeouts so a slow
    /// index cannot stall the single ingestion worker.
    async fn find_discussion(&self, url: &str) -> Result<Option<String>>;
}

/// Renders stored articles into an uploadable artifact and ships it.
#[async_trait]
pub trait SitePublisher: Send + Sync {
    /// Render `articles` into a publishable bundle.
    async fn build(&self, articles: &[Article]) -> Result<SiteBundle>;

    /// Upload a previously built bundle to the remote host.
    async fn upload(&self, bundle: SiteBundle) -> Result<()>;
}
