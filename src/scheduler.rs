//! Debounced validation.
//!
//! Each open document has at most one pending validation. Scheduling a new
//! one aborts the previous task first, so a burst of edits collapses into a
//! single run over the latest content. A fired task removes its own entry
//! from the pending map and then validates while holding only its document's
//! guard; `retire` takes the same guard, so a close can never be followed by
//! a late publish, and unrelated documents never wait on each other.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::task::JoinHandle;
use tower_lsp::lsp_types::Url;

use crate::diagnostics::DiagnosticsPublisher;
use crate::documents::DocumentStore;
use crate::resource;

pub const DEFAULT_DEBOUNCE_MS: u64 = 500;

struct PendingValidation {
    ticket: u64,
    handle: JoinHandle<()>,
}

/// Shared between the scheduler and its spawned tasks.
///
/// Lock order is always a document guard first, then `pending`. The
/// `pending` lock is never held across parsing or publishing.
#[derive(Default)]
struct SchedulerState {
    pending: Mutex<HashMap<Url, PendingValidation>>,
    guards: Mutex<HashMap<Url, Arc<Mutex<()>>>>,
}

impl SchedulerState {
    /// Serializes the validate-and-publish step with `retire` for one uri.
    async fn lock_document(&self, uri: &Url) -> OwnedMutexGuard<()> {
        let guard = {
            let mut guards = self.guards.lock().await;
            Arc::clone(guards.entry(uri.clone()).or_default())
        };
        guard.lock_owned().await
    }
}

pub struct ValidationScheduler {
    documents: Arc<DocumentStore>,
    publisher: Arc<dyn DiagnosticsPublisher>,
    state: Arc<SchedulerState>,
    next_ticket: AtomicU64,
    delay_ms: AtomicU64,
}

impl ValidationScheduler {
    pub fn new(
        documents: Arc<DocumentStore>,
        publisher: Arc<dyn DiagnosticsPublisher>,
        delay: Duration,
    ) -> Self {
        Self {
            documents,
            publisher,
            state: Arc::new(SchedulerState::default()),
            next_ticket: AtomicU64::new(0),
            delay_ms: AtomicU64::new(delay.as_millis() as u64),
        }
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms.load(Ordering::Relaxed))
    }

    /// Applies to validations scheduled from now on.
    pub fn set_delay(&self, delay: Duration) {
        self.delay_ms
            .store(delay.as_millis() as u64, Ordering::Relaxed);
    }

    /// Cancel any pending validation for `uri` and start a fresh timer.
    pub async fn schedule(&self, uri: Url) {
        let mut pending = self.state.pending.lock().await;
        if let Some(previous) = pending.remove(&uri) {
            previous.handle.abort();
            log::debug!("Cancelled pending validation for {}", uri);
        }

        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
        let delay = self.delay();
        let task = ValidationTask {
            uri: uri.clone(),
            ticket,
            documents: Arc::clone(&self.documents),
            publisher: Arc::clone(&self.publisher),
            state: Arc::clone(&self.state),
        };
        let handle = tokio::spawn(task.run(delay));
        log::debug!("Scheduled validation for {} in {:?}", uri, delay);

        pending.insert(uri, PendingValidation { ticket, handle });
    }

    /// Cancel any pending validation and clear the client's diagnostics.
    ///
    /// Waits for a validation of `uri` that is already publishing, so the
    /// empty list is always the last thing the client sees for it.
    pub async fn retire(&self, uri: &Url) {
        let _guard = self.state.lock_document(uri).await;
        if let Some(previous) = self.state.pending.lock().await.remove(uri) {
            previous.handle.abort();
            log::debug!("Cancelled pending validation for closed {}", uri);
        }
        self.publisher.publish(uri.clone(), Vec::new(), None).await;
        self.state.guards.lock().await.remove(uri);
    }

    pub async fn is_pending(&self, uri: &Url) -> bool {
        self.state.pending.lock().await.contains_key(uri)
    }

    pub async fn pending_count(&self) -> usize {
        self.state.pending.lock().await.len()
    }

    /// Abort every pending validation.
    pub async fn shutdown(&self) {
        let mut pending = self.state.pending.lock().await;
        for (_, previous) in pending.drain() {
            previous.handle.abort();
        }
    }
}

struct ValidationTask {
    uri: Url,
    ticket: u64,
    documents: Arc<DocumentStore>,
    publisher: Arc<dyn DiagnosticsPublisher>,
    state: Arc<SchedulerState>,
}

impl ValidationTask {
    async fn run(self, delay: Duration) {
        tokio::time::sleep(delay).await;

        let _guard = self.state.lock_document(&self.uri).await;
        {
            let mut pending = self.state.pending.lock().await;
            let current = pending
                .get(&self.uri)
                .is_some_and(|entry| entry.ticket == self.ticket);
            if !current {
                return;
            }
            pending.remove(&self.uri);
        }

        let Some(document) = self.documents.get(&self.uri).await else {
            log::debug!("Skipping validation of closed document {}", self.uri);
            return;
        };

        let analysis = resource::analyze(&document.text, document.uri.as_str());
        log::debug!(
            "Validated {} (version {}): {} diagnostic(s)",
            self.uri,
            document.version,
            analysis.diagnostics.len()
        );
        self.publisher
            .publish(self.uri, analysis.diagnostics, Some(document.version))
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;
    use tower_lsp::lsp_types::Diagnostic;

    #[derive(Default)]
    struct Recorder {
        published: StdMutex<Vec<(Url, Vec<Diagnostic>, Option<i32>)>>,
    }

    #[tower_lsp::async_trait]
    impl DiagnosticsPublisher for Recorder {
        async fn publish(&self, uri: Url, diagnostics: Vec<Diagnostic>, version: Option<i32>) {
            self.published
                .lock()
                .unwrap()
                .push((uri, diagnostics, version));
        }
    }

    impl Recorder {
        fn take(&self) -> Vec<(Url, Vec<Diagnostic>, Option<i32>)> {
            std::mem::take(&mut *self.published.lock().unwrap())
        }
    }

    fn setup() -> (Arc<DocumentStore>, Arc<Recorder>, ValidationScheduler) {
        let documents = Arc::new(DocumentStore::new());
        let recorder = Arc::new(Recorder::default());
        let scheduler = ValidationScheduler::new(
            Arc::clone(&documents),
            recorder.clone(),
            Duration::from_millis(100),
        );
        (documents, recorder, scheduler)
    }

    fn uri(name: &str) -> Url {
        Url::parse(&format!("file:///{name}")).unwrap()
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn burst_of_edits_validates_once_with_latest_content() {
        let (documents, recorder, scheduler) = setup();
        let a = uri("a.lg");
        documents.open(a.clone(), 1, "# A\n- ${bad1()}".into()).await;
        scheduler.schedule(a.clone()).await;

        for version in 2..=5 {
            tokio::time::sleep(Duration::from_millis(20)).await;
            let text = if version == 5 {
                "# A\n- fine".to_string()
            } else {
                format!("# A\n- ${{bad{version}()}}")
            };
            documents.change(a.clone(), version, text).await;
            scheduler.schedule(a.clone()).await;
            assert_eq!(scheduler.pending_count().await, 1);
        }

        settle().await;
        let published = recorder.take();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].0, a);
        assert!(published[0].1.is_empty());
        assert_eq!(published[0].2, Some(5));
        assert!(!scheduler.is_pending(&a).await);
    }

    #[tokio::test(start_paused = true)]
    async fn publishes_errors_after_the_quiet_period() {
        let (documents, recorder, scheduler) = setup();
        let a = uri("a.lg");
        documents.open(a.clone(), 1, "# A\n- ${nope()}".into()).await;
        scheduler.schedule(a.clone()).await;

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(recorder.take().is_empty());

        settle().await;
        let published = recorder.take();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].1.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn retire_cancels_and_clears() {
        let (documents, recorder, scheduler) = setup();
        let a = uri("a.lg");
        documents.open(a.clone(), 1, "# A\n- ${nope()}".into()).await;
        scheduler.schedule(a.clone()).await;

        documents.close(&a).await;
        scheduler.retire(&a).await;
        settle().await;

        let published = recorder.take();
        assert_eq!(published, vec![(a.clone(), Vec::new(), None)]);
        assert!(!scheduler.is_pending(&a).await);
    }

    #[tokio::test(start_paused = true)]
    async fn documents_are_scheduled_independently() {
        let (documents, recorder, scheduler) = setup();
        let (a, b) = (uri("a.lg"), uri("b.lg"));
        documents.open(a.clone(), 1, "# A\n- ${nope()}".into()).await;
        documents.open(b.clone(), 1, "# B\n- ok".into()).await;
        scheduler.schedule(a.clone()).await;
        scheduler.schedule(b.clone()).await;
        assert_eq!(scheduler.pending_count().await, 2);

        documents.close(&a).await;
        scheduler.retire(&a).await;
        assert_eq!(scheduler.pending_count().await, 1);
        settle().await;

        let published = recorder.take();
        assert_eq!(published.len(), 2);
        assert_eq!(published[0], (a, Vec::new(), None));
        assert_eq!(published[1].0, b);
        assert_eq!(published[1].2, Some(1));
    }

    /// Holds every publish for one uri until a permit is released.
    struct GatedRecorder {
        gated: Url,
        gate: tokio::sync::Semaphore,
        inner: Recorder,
    }

    #[tower_lsp::async_trait]
    impl DiagnosticsPublisher for GatedRecorder {
        async fn publish(&self, uri: Url, diagnostics: Vec<Diagnostic>, version: Option<i32>) {
            if uri == self.gated {
                self.gate.acquire().await.unwrap().forget();
            }
            self.inner.publish(uri, diagnostics, version).await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn slow_publish_does_not_block_other_documents() {
        let (a, b) = (uri("a.lg"), uri("b.lg"));
        let documents = Arc::new(DocumentStore::new());
        let publisher = Arc::new(GatedRecorder {
            gated: a.clone(),
            gate: tokio::sync::Semaphore::new(0),
            inner: Recorder::default(),
        });
        let scheduler = ValidationScheduler::new(
            Arc::clone(&documents),
            publisher.clone(),
            Duration::from_millis(100),
        );

        documents.open(a.clone(), 1, "# A\n- ${nope()}".into()).await;
        documents.open(b.clone(), 1, "# B\n- ok".into()).await;
        scheduler.schedule(a.clone()).await;
        settle().await;
        // a's validation has fired and is stuck in publish.
        assert!(!scheduler.is_pending(&a).await);
        assert!(publisher.inner.take().is_empty());

        let short = Duration::from_millis(10);
        tokio::time::timeout(short, scheduler.schedule(b.clone()))
            .await
            .expect("schedule for another document must not wait");
        settle().await;
        tokio::time::timeout(short, scheduler.retire(&b))
            .await
            .expect("retire for another document must not wait");
        let published = publisher.inner.take();
        assert_eq!(published.len(), 2);
        assert!(published.iter().all(|(uri, _, _)| *uri == b));

        // Closing a waits for its in-flight publish, then clears.
        documents.close(&a).await;
        tokio::join!(scheduler.retire(&a), async {
            publisher.gate.add_permits(2);
        });
        let published = publisher.inner.take();
        assert_eq!(published.len(), 2);
        assert_eq!(published[0].0, a);
        assert_eq!(published[0].1.len(), 1);
        assert_eq!(published[1], (a, Vec::new(), None));
    }

    #[tokio::test(start_paused = true)]
    async fn empty_document_publishes_an_empty_list() {
        let (documents, recorder, scheduler) = setup();
        let a = uri("a.lg");
        documents.open(a.clone(), 1, String::new()).await;
        scheduler.schedule(a.clone()).await;
        settle().await;

        let published = recorder.take();
        assert_eq!(published.len(), 1);
        assert!(published[0].1.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_aborts_everything() {
        let (documents, recorder, scheduler) = setup();
        let a = uri("a.lg");
        documents.open(a.clone(), 1, "# A\n- x".into()).await;
        scheduler.schedule(a.clone()).await;
        scheduler.shutdown().await;
        settle().await;

        assert!(recorder.take().is_empty());
        assert_eq!(scheduler.pending_count().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn delay_changes_apply_to_new_schedules() {
        let (documents, recorder, scheduler) = setup();
        scheduler.set_delay(Duration::from_millis(2_000));
        let a = uri("a.lg");
        documents.open(a.clone(), 1, "# A\n- x".into()).await;
        scheduler.schedule(a.clone()).await;

        settle().await;
        assert!(recorder.take().is_empty());
        tokio::time::sleep(Duration::from_millis(1_500)).await;
        assert_eq!(recorder.take().len(), 1);
    }
}
