//! Debounced ingestion worker: the single writer for article persistence.
//!
//! HTTP handlers enqueue [`SubmissionJob`]s through a cloneable
//! [`IngestHandle`] and block (with a bounded wait) on each job's completion
//! signal. The worker serializes all writes, so the store needs no locking,
//! and coalesces bursts of submissions into one site publish: the debounce
//! window restarts on every successful persist and the site is only rebuilt
//! once it elapses quietly.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, Instant};
use tracing::{debug, error, info, warn};

use readstack_shared::{Article, ArticleId, NewArticle, ReadstackError, Result};

use crate::normalize::normalize_url;
use crate::publish::PublishCoordinator;
use crate::traits::{ArticleStore, DiscussionFinder};

/// Capacity of the submission queue. Small on purpose: a slow worker applies
/// backpressure to HTTP callers instead of buffering unboundedly; a full
/// queue blocks the enqueuer, it never drops jobs.
pub const QUEUE_CAPACITY: usize = 5;

/// Quiet period after the last successful persist before the site is
/// rebuilt. Restarts on every new arrival (trailing debounce).
pub const DEBOUNCE_WINDOW: Duration = Duration::from_secs(20);

/// Bound on how long a submitting caller waits for its completion signal.
pub const SUBMIT_WAIT: Duration = Duration::from_secs(30);

/// Maximum stored description length, in characters.
const DESCRIPTION_LIMIT: usize = 500;

/// Appended to descriptions cut at [`DESCRIPTION_LIMIT`].
const TRUNCATION_MARKER: &str = " [trimmed]";

// ---------------------------------------------------------------------------
// SubmissionJob / IngestHandle
// ---------------------------------------------------------------------------

/// A submission owned by the worker once enqueued.
///
/// Carries a single-use completion channel which the worker resolves exactly
/// once, with either the new article's id or the error that failed the job.
pub struct SubmissionJob {
    article: NewArticle,
    done: oneshot::Sender<Result<ArticleId>>,
}

impl SubmissionJob {
    /// Wrap a submission, returning the receiver for its terminal result.
    pub fn new(article: NewArticle) -> (Self, oneshot::Receiver<Result<ArticleId>>) {
        let (done, rx) = oneshot::channel();
        (Self { article, done }, rx)
    }

    /// Resolve the completion signal. Consumes the job, so a second
    /// resolution is unrepresentable.
    fn finish(self, result: Result<ArticleId>) {
        if self.done.send(result).is_err() {
            // The caller gave up waiting; the article's fate is already
            // decided, only the acknowledgement is lost.
            debug!("submission caller went away before completion");
        }
    }
}

/// Cloneable submission side of the worker queue.
#[derive(Clone)]
pub struct IngestHandle {
    tx: mpsc::Sender<SubmissionJob>,
}

impl IngestHandle {
    /// Enqueue an article and wait for its terminal result.
    ///
    /// Blocks while the queue is full. The wait on the completion signal is
    /// bounded by [`SUBMIT_WAIT`] so a wedged pipeline cannot hang callers
    /// indefinitely.
    pub async fn submit(&self, article: NewArticle) -> Result<ArticleId> {
        let (job, rx) = SubmissionJob::new(article);
        self.tx
            .send(job)
            .await
            .map_err(|_| ReadstackError::QueueClosed)?;

        match time::timeout(SUBMIT_WAIT, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(ReadstackError::QueueClosed),
            Err(_) => Err(ReadstackError::SubmitTimeout),
        }
    }
}

/// Create the bounded submission channel connecting HTTP handlers to the
/// worker.
pub fn ingest_channel() -> (IngestHandle, mpsc::Receiver<SubmissionJob>) {
    let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
    (IngestHandle { tx }, rx)
}

// ---------------------------------------------------------------------------
// IngestWorker
// ---------------------------------------------------------------------------

/// The single background consumer of the submission queue.
pub struct IngestWorker {
    rx: mpsc::Receiver<SubmissionJob>,
    store: Arc<dyn ArticleStore>,
    finder: Arc<dyn DiscussionFinder>,
    coordinator: Arc<PublishCoordinator>,
}

impl IngestWorker {
    pub fn new(
        rx: mpsc::Receiver<SubmissionJob>,
        store: Arc<dyn ArticleStore>,
        finder: Arc<dyn DiscussionFinder>,
        coordinator: Arc<PublishCoordinator>,
    ) -> Self {
        Self {
            rx,
            store,
            finder,
            coordinator,
        }
    }

    /// Run until the submission channel closes.
    ///
    /// Two states: Idle (blocked on the next job) and Draining (absorbing a
    /// burst behind an armed debounce window). Only a successful persist
    /// moves the worker into Draining.
    pub async fn run(mut self) {
        while let Some(job) = self.rx.recv().await {
            if !self.process(job).await {
                // Nothing was persisted; there is nothing new to publish.
                continue;
            }
            if !self.drain().await {
                return;
            }
        }
        info!("ingestion worker stopped");
    }

    /// Draining state: absorb further jobs until the debounce window elapses
    /// quietly, then publish once. A successful persist re-arms a fresh
    /// window; a failed job leaves the current window running so earlier
    /// persisted articles still get published.
    ///
    /// Returns `false` when the channel closed (a final publish has already
    /// been flushed).
    async fn drain(&mut self) -> bool {
        let mut deadline = Instant::now() + DEBOUNCE_WINDOW;
        loop {
            tokio::select! {
                _ = time::sleep_until(deadline) => {
                    self.publish().await;
                    return true;
                }
                job = self.rx.recv() => match job {
                    Some(job) => {
                        if self.process(job).await {
                            deadline = Instant::now() + DEBOUNCE_WINDOW;
                        }
                    }
                    None => {
                        // Shutting down with persisted articles pending:
                        // flush one last publish instead of dropping them.
                        self.publish().await;
                        info!("ingestion worker stopped");
                        return false;
                    }
                },
            }
        }
    }

    /// Invoke the coordinator. A publish failure is logged only; nobody is
    /// waiting on it synchronously and the next successful ingestion will
    /// trigger another attempt.
    async fn publish(&self) {
        if let Err(err) = self.coordinator.publish().await {
            error!(error = %err, "site publish failed");
        }
    }

    /// Process one job end to end and resolve its completion signal.
    ///
    /// Returns `true` when an article was persisted.
    async fn process(&self, job: SubmissionJob) -> bool {
        let url = match normalize_url(&job.article.url) {
            Ok(url) => url,
            Err(err) => {
                warn!(url = %job.article.url, "rejected submission with unparseable URL");
                job.finish(Err(err));
                return false;
            }
        };

        // Best effort: a failed lookup must never block persistence.
        let discussion_url = match self.finder.find_discussion(&url).await {
            Ok(found) => found,
            Err(err) => {
                warn!(error = %err, url = %url, "discussion lookup failed");
                None
            }
        };

        let article = Article {
            id: ArticleId::new(),
            url,
            title: job.article.title.clone(),
            description: clip_description(&job.article.description),
            image_url: job.article.image_url.clone(),
            date: job.article.date,
            discussion_url,
            is_favourite: job.article.is_favourite,
        };

        match self.store.insert(&article).await {
            Ok(()) => {
                info!(id = %article.id, url = %article.url, "article persisted");
                job.finish(Ok(article.id));
                true
            }
            Err(err) => {
                error!(error = %err, url = %article.url, "unable to persist article");
                job.finish(Err(err));
                false
            }
        }
    }
}

/// Truncate to [`DESCRIPTION_LIMIT`] characters, marking cut descriptions.
fn clip_description(description: &str) -> String {
    match description.char_indices().nth(DESCRIPTION_LIMIT) {
        Some((cut, _)) => {
            let mut clipped = description[..cut].to_string();
            clipped.push_str(TRUNCATION_MARKER);
            clipped
        }
        None => description.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::Utc;
    use readstack_shared::SiteBundle;
    use tokio::task::JoinHandle;

    use crate::traits::SitePublisher;

    #[derive(Default)]
    struct MemStore {
        articles: Mutex<Vec<Article>>,
        fail_next: AtomicBool,
    }

    impl MemStore {
        fn stored(&self) -> Vec<Article> {
            self.articles.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ArticleStore for MemStore {
        async fn insert(&self, article: &Article) -> Result<()> {
            if self.fail_next.swap(false, Ordering::SeqCst) {
                return Err(ReadstackError::Storage("disk on fire".into()));
            }
            self.articles.lock().unwrap().push(article.clone());
            Ok(())
        }

        async fn get_all(&self) -> Result<Vec<Article>> {
            Ok(self.stored())
        }
    }

    struct FixedFinder(Option<String>);

    #[async_trait]
    impl DiscussionFinder for FixedFinder {
        async fn find_discussion(&self, _url: &str) -> Result<Option<String>> {
            Ok(self.0.clone())
        }
    }

    struct FailingFinder;

    #[async_trait]
    impl DiscussionFinder for FailingFinder {
        async fn find_discussion(&self, _url: &str) -> Result<Option<String>> {
            Err(ReadstackError::Enrichment("index unreachable".into()))
        }
    }

    #[derive(Default)]
    struct CountingSite {
        publishes: AtomicUsize,
    }

    #[async_trait]
    impl SitePublisher for CountingSite {
        async fn build(&self, _articles: &[Article]) -> Result<SiteBundle> {
            Ok(SiteBundle::new())
        }

        async fn upload(&self, _bundle: SiteBundle) -> Result<()> {
            self.publishes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct Pipeline {
        handle: IngestHandle,
        store: Arc<MemStore>,
        site: Arc<CountingSite>,
        worker: JoinHandle<()>,
    }

    fn pipeline(finder: Arc<dyn DiscussionFinder>) -> Pipeline {
        let store = Arc::new(MemStore::default());
        let site = Arc::new(CountingSite::default());
        let coordinator = Arc::new(PublishCoordinator::new(store.clone(), site.clone()));
        let (handle, rx) = ingest_channel();
        let worker = tokio::spawn(IngestWorker::new(rx, store.clone(), finder, coordinator).run());
        Pipeline {
            handle,
            store,
            site,
            worker,
        }
    }

    fn submission(url: &str) -> NewArticle {
        NewArticle {
            url: url.into(),
            title: "A title".into(),
            description: "A description".into(),
            image_url: String::new(),
            date: Utc::now(),
            is_favourite: false,
        }
    }

    fn publishes(p: &Pipeline) -> usize {
        p.site.publishes.load(Ordering::SeqCst)
    }

    #[tokio::test(start_paused = true)]
    async fn burst_of_submissions_publishes_once() {
        let p = pipeline(Arc::new(FixedFinder(None)));

        for n in 0..3 {
            p.handle
                .submit(submission(&format!("https://example.com/{n}")))
                .await
                .expect("submit");
        }
        assert_eq!(publishes(&p), 0);

        time::sleep(DEBOUNCE_WINDOW + Duration::from_secs(5)).await;
        assert_eq!(publishes(&p), 1);
        assert_eq!(p.store.stored().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn spaced_submissions_publish_each() {
        let p = pipeline(Arc::new(FixedFinder(None)));

        p.handle
            .submit(submission("https://example.com/first"))
            .await
            .expect("submit");
        time::sleep(DEBOUNCE_WINDOW + Duration::from_secs(5)).await;
        assert_eq!(publishes(&p), 1);

        p.handle
            .submit(submission("https://example.com/second"))
            .await
            .expect("submit");
        time::sleep(DEBOUNCE_WINDOW + Duration::from_secs(5)).await;
        assert_eq!(publishes(&p), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn new_arrival_restarts_the_window() {
        let p = pipeline(Arc::new(FixedFinder(None)));

        p.handle
            .submit(submission("https://example.com/a"))
            .await
            .expect("submit");
        time::sleep(Duration::from_secs(15)).await;

        p.handle
            .submit(submission("https://example.com/b"))
            .await
            .expect("submit");
        // 30s after the first submission but only 15s after the second:
        // the restarted window has not elapsed yet.
        time::sleep(Duration::from_secs(15)).await;
        assert_eq!(publishes(&p), 0);

        time::sleep(Duration::from_secs(10)).await;
        assert_eq!(publishes(&p), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn persistence_failure_fails_only_that_job() {
        let p = pipeline(Arc::new(FixedFinder(None)));

        p.store.fail_next.store(true, Ordering::SeqCst);
        let err = p
            .handle
            .submit(submission("https://example.com/doomed"))
            .await
            .expect_err("insert failure should surface");
        assert!(matches!(err, ReadstackError::Storage(_)));

        // A failed job never arms the window, so no publish happens.
        time::sleep(DEBOUNCE_WINDOW + Duration::from_secs(5)).await;
        assert_eq!(publishes(&p), 0);

        // The worker is still alive and processes the next job normally.
        p.handle
            .submit(submission("https://example.com/fine"))
            .await
            .expect("submit after failure");
        time::sleep(DEBOUNCE_WINDOW + Duration::from_secs(5)).await;
        assert_eq!(publishes(&p), 1);
        assert_eq!(p.store.stored().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_url_is_rejected_without_persistence() {
        let p = pipeline(Arc::new(FixedFinder(None)));

        let err = p
            .handle
            .submit(submission("definitely not a url"))
            .await
            .expect_err("invalid URL should fail the job");
        assert!(matches!(err, ReadstackError::InvalidUrl { .. }));

        time::sleep(DEBOUNCE_WINDOW + Duration::from_secs(5)).await;
        assert!(p.store.stored().is_empty());
        assert_eq!(publishes(&p), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn enrichment_failure_degrades_to_no_link() {
        let p = pipeline(Arc::new(FailingFinder));

        p.handle
            .submit(submission("https://example.com/post"))
            .await
            .expect("lookup failure must not fail the submission");

        let stored = p.store.stored();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].discussion_url, None);
    }

    #[tokio::test(start_paused = true)]
    async fn discussion_link_is_attached_when_found() {
        let link = "https://news.ycombinator.com/item?id=1".to_string();
        let p = pipeline(Arc::new(FixedFinder(Some(link.clone()))));

        p.handle
            .submit(submission("https://example.com/post#comments"))
            .await
            .expect("submit");

        let stored = p.store.stored();
        assert_eq!(stored[0].discussion_url.as_deref(), Some(link.as_str()));
        // The fragment was stripped before storage.
        assert_eq!(stored[0].url, "https://example.com/post");
    }

    #[tokio::test(start_paused = true)]
    async fn long_description_is_clipped_on_persist() {
        let p = pipeline(Arc::new(FixedFinder(None)));

        let mut long = submission("https://example.com/long");
        long.description = "x".repeat(600);
        p.handle.submit(long).await.expect("submit");

        let mut short = submission("https://example.com/short");
        short.description = "y".repeat(400);
        p.handle.submit(short).await.expect("submit");

        let stored = p.store.stored();
        assert_eq!(
            stored[0].description,
            format!("{}{}", "x".repeat(500), TRUNCATION_MARKER)
        );
        assert_eq!(stored[1].description, "y".repeat(400));
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_mid_drain_flushes_a_final_publish() {
        let p = pipeline(Arc::new(FixedFinder(None)));

        p.handle
            .submit(submission("https://example.com/last"))
            .await
            .expect("submit");
        assert_eq!(publishes(&p), 0);

        let site = p.site.clone();
        drop(p.handle);
        p.worker.await.expect("worker task");
        assert_eq!(site.publishes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn clip_description_counts_characters_not_bytes() {
        let multibyte = "é".repeat(501);
        let clipped = clip_description(&multibyte);
        assert_eq!(
            clipped,
            format!("{}{}", "é".repeat(500), TRUNCATION_MARKER)
        );

        let exact = "z".repeat(500);
        assert_eq!(clip_description(&exact), exact);
    }
}
