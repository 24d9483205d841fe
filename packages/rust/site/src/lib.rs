//! Static site rendering and upload for the reading list.
//!
//! [`StaticSite`] implements the pipeline's publish contract: `build`
//! renders the month-grouped HTML listing into an in-memory bundle and
//! `upload` ships that bundle to the configured pages host.

mod render;
mod upload;

pub use render::render_site;
pub use upload::Uploader;

use async_trait::async_trait;

use readstack_core::SitePublisher;
use readstack_shared::{Article, PublishConfig, Result, SiteBundle};

/// Site pipeline: render the listing, then ship it to the pages host.
pub struct StaticSite {
    uploader: Uploader,
}

impl StaticSite {
    pub fn new(config: &PublishConfig) -> Result<Self> {
        Ok(Self {
            uploader: Uploader::new(config)?,
        })
    }
}

#[async_trait]
impl SitePublisher for StaticSite {
    async fn build(&self, articles: &[Article]) -> Result<SiteBundle> {
        Ok(render_site(articles))
    }

    async fn upload(&self, bundle: SiteBundle) -> Result<()> {
        self.uploader.upload(bundle).await
    }
}
