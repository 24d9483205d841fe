//! readstackd, the reading list ingestion daemon.
//!
//! Accepts article submissions over HTTP, hands them to the single
//! ingestion worker, and republishes the static listing site after each
//! coalesced burst of submissions.

mod routes;

use std::sync::Arc;

use color_eyre::eyre::{Result, WrapErr};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use readstack_core::{IngestWorker, PublishCoordinator, ingest_channel};
use readstack_hackernews::HnClient;
use readstack_shared::Config;
use readstack_site::StaticSite;
use readstack_storage::Storage;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env().wrap_err("load configuration")?;

    let storage = Arc::new(
        Storage::open(&config.database_path)
            .await
            .wrap_err("open article database")?,
    );
    let finder = Arc::new(HnClient::new()?);
    let site = Arc::new(StaticSite::new(&config.publish)?);
    let coordinator = Arc::new(PublishCoordinator::new(storage.clone(), site));

    let (ingest, jobs) = ingest_channel();
    let worker = IngestWorker::new(jobs, storage.clone(), finder, coordinator.clone());
    tokio::spawn(worker.run());

    let app = routes::router(routes::AppState {
        ingest,
        storage,
        coordinator,
        ingest_token: Arc::new(config.ingest_token),
    });

    let listener = TcpListener::bind(&config.http_addr)
        .await
        .wrap_err_with(|| format!("bind {}", config.http_addr))?;
    info!(address = %config.http_addr, "starting HTTP server");
    axum::serve(listener, app).await.wrap_err("serve HTTP")?;
    Ok(())
}
