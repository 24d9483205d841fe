//! Bundle upload to the static pages host.

use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use tracing::{info, warn};

use readstack_shared::{PublishConfig, ReadstackError, Result, SiteBundle};

/// Bounded timeout so a stuck upload cannot stall the worker's publish step.
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(10);

/// Ships site bundles to the pages host as multipart uploads.
pub struct Uploader {
    client: Client,
    endpoint: String,
    site_slug: String,
    authorization: String,
}

impl Uploader {
    pub fn new(config: &PublishConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(UPLOAD_TIMEOUT)
            .build()
            .map_err(|e| ReadstackError::Publish(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            site_slug: config.site_slug.clone(),
            authorization: format!("Basic {}", BASE64.encode(config.auth.as_bytes())),
        })
    }

    /// POST the bundle as one multipart request: a `slug` field plus one
    /// file part per bundle entry, named by its path within the site.
    pub async fn upload(&self, bundle: SiteBundle) -> Result<()> {
        let file_count = bundle.files.len();
        let mut form = Form::new().text("slug", self.site_slug.clone());
        for file in bundle.files {
            form = form.part("file", Part::bytes(file.content).file_name(file.path));
        }

        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::AUTHORIZATION, &self.authorization)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ReadstackError::Publish(format!("upload request failed: {e}")))?;

        let status = response.status();
        if !(status.is_success() || status.is_redirection()) {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, body, "upload rejected by pages host");
            return Err(ReadstackError::Publish(format!(
                "pages host returned status {status}"
            )));
        }

        info!(files = file_count, slug = %self.site_slug, "site bundle uploaded");
        Ok(())
    }
}
