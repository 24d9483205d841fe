//! Ingestion-to-publish pipeline for the reading list.
//!
//! One background worker owns all article writes: it consumes submission
//! jobs from a bounded queue, enriches and persists each one, and coalesces
//! bursts of submissions into a single site rebuild behind a trailing
//! debounce window. The [`PublishCoordinator`] guarantees at most one
//! concurrent fetch+build+upload cycle system-wide.
//!
//! Collaborators (store, discussion lookup, site builder/uploader) are
//! traits defined in [`traits`]; concrete implementations live in the
//! sibling crates.

pub mod normalize;
pub mod publish;
pub mod traits;
pub mod worker;

pub use normalize::normalize_url;
pub use publish::PublishCoordinator;
pub use traits::{ArticleStore, DiscussionFinder, SitePublisher};
pub use worker::{
    DEBOUNCE_WINDOW, IngestHandle, IngestWorker, QUEUE_CAPACITY, SubmissionJob, ingest_channel,
};
