//! Coalesced site publication behind a process-wide exclusion lock.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, instrument};

use readstack_shared::Result;

use crate::traits::{ArticleStore, SitePublisher};

/// Owns the only lock in the system: at most one fetch+build+upload cycle
/// runs at a time. A concurrent trigger (e.g. the manual regenerate
/// endpoint) blocks until the in-flight publish completes.
pub struct PublishCoordinator {
    store: Arc<dyn ArticleStore>,
    site: Arc<dyn SitePublisher>,
    lock: Mutex<()>,
}

impl PublishCoordinator {
    pub fn new(store: Arc<dyn ArticleStore>, site: Arc<dyn SitePublisher>) -> Self {
        Self {
            store,
            site,
            lock: Mutex::new(()),
        }
    }

    /// Fetch all articles, build the site, and upload the bundle.
    ///
    /// The lock covers the whole sequence, not individual steps, so an
    /// interleaved partial site state is impossible. Any failing step aborts
    /// the publish; there are no automatic retries.
    #[instrument(skip_all)]
    pub async fn publish(&self) -> Result<()> {
        let _guard = self.lock.lock().await;

        let articles = self.store.get_all().await?;
        info!(count = articles.len(), "rebuilding site");

        let bundle = self.site.build(&articles).await?;
        self.site.upload(bundle).await?;

        info!("site published");
        Ok(())
    }
}
