//! Startup reconciliation, live mutation forwarding and the retry loop

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use super::{Change, Dispatch, Mutation, MutationDispatcher, SyncError, SyncQueue};
use crate::models::{Bookmark, CompanyNote, Interview, Question};
use crate::remote::{PullResponse, PushBatch, RemoteClient};
use crate::services::LocalStore;

/// Default period between retry passes
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(5);

/// Told how many records startup hydration restored, before the bulk push
pub type HydrationCallback = Box<dyn FnOnce(usize) + Send>;

/// Counts from one queue flush
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    /// Items the remote accepted
    pub replayed: usize,
    /// Items that can never succeed and were dropped
    pub discarded: usize,
    /// Items that failed again and went back on the queue
    pub requeued: usize,
}

/// Summary of a completed startup reconciliation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Remote records written locally because they were missing
    pub hydrated: usize,
    /// Local-only records the remote accepted in the bulk push
    pub pushed: usize,
    pub flush: FlushReport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    Reconciled(SyncReport),
    /// The pull failed; the retry loop was started instead
    Offline,
    /// `init_sync` already ran on this engine
    AlreadyInitialized,
}

/// What happened to one live mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    Synced,
    Discarded,
    /// The remote was unreachable; the mutation waits in the queue
    Queued,
}

struct RetryTask {
    generation: u64,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct RetrySlot {
    next_generation: u64,
    task: Option<RetryTask>,
}

struct EngineInner {
    store: Arc<dyn LocalStore>,
    dispatcher: MutationDispatcher,
    queue: SyncQueue,
    retry_interval: Duration,
    initialized: AtomicBool,
    retry: Mutex<RetrySlot>,
}

impl Drop for EngineInner {
    fn drop(&mut self) {
        let slot = self.retry.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(task) = slot.task.take() {
            task.handle.abort();
        }
    }
}

/// Sync session for one local store and one remote
///
/// Clones share state, so `init_sync` runs at most once across all of them.
#[derive(Clone)]
pub struct SyncEngine {
    inner: Arc<EngineInner>,
}

impl SyncEngine {
    pub fn new(
        store: Arc<dyn LocalStore>,
        remote: Arc<dyn RemoteClient>,
        retry_interval: Duration,
    ) -> Self {
        let queue = SyncQueue::new(Arc::clone(&store));
        Self {
            inner: Arc::new(EngineInner {
                store,
                dispatcher: MutationDispatcher::new(remote),
                queue,
                retry_interval,
                initialized: AtomicBool::new(false),
                retry: Mutex::new(RetrySlot::default()),
            }),
        }
    }

    pub fn queue(&self) -> &SyncQueue {
        &self.inner.queue
    }

    pub fn dispatcher(&self) -> &MutationDispatcher {
        &self.inner.dispatcher
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.initialized.load(Ordering::SeqCst)
    }

    /// Reconcile the local store against a full remote pull, once
    pub async fn init_sync(&self) -> Result<InitOutcome, SyncError> {
        self.init_sync_with(None).await
    }

    /// Like [`SyncEngine::init_sync`], calling `on_hydrated` as soon as
    /// hydration has restored at least one record
    ///
    /// The callback runs before the bulk push, so it fires even when the push
    /// or the queue flush later fails.
    pub async fn init_sync_with(
        &self,
        on_hydrated: Option<HydrationCallback>,
    ) -> Result<InitOutcome, SyncError> {
        if self.inner.initialized.swap(true, Ordering::SeqCst) {
            return Ok(InitOutcome::AlreadyInitialized);
        }

        let Some(remote) = self.inner.dispatcher.remote().pull().await else {
            tracing::info!("Remote unreachable at startup; continuing offline");
            self.start_retry_loop();
            return Ok(InitOutcome::Offline);
        };

        let store = &self.inner.store;
        let local_questions = store.all_questions().await?;
        let local_bookmarks = store.all_bookmarks().await?;
        let local_interviews = store.all_interviews().await?;
        let local_notes = store.all_company_notes().await?;

        let hydrated = self
            .hydrate(
                &remote,
                &local_questions,
                &local_bookmarks,
                &local_interviews,
                &local_notes,
            )
            .await?;
        if hydrated > 0 {
            if let Some(on_hydrated) = on_hydrated {
                on_hydrated(hydrated);
            }
        }

        let batch = PushBatch {
            questions: local_only(&local_questions, &remote.questions, |q| &q.id),
            bookmarks: local_only(&local_bookmarks, &remote.bookmarks, |b| &b.id),
            interviews: local_only(&local_interviews, &remote.interviews, |i| &i.id),
            notes: local_only(&local_notes, &remote.notes, |n| &n.company),
            deletions: Vec::new(),
        };
        let pushed = self.push_local_only(batch).await?;

        let flush = self.flush_queue().await;
        if flush.requeued > 0 {
            self.start_retry_loop();
        }

        let report = SyncReport {
            hydrated,
            pushed,
            flush,
        };
        tracing::info!(
            hydrated = report.hydrated,
            pushed = report.pushed,
            replayed = report.flush.replayed,
            requeued = report.flush.requeued,
            "Startup reconciliation finished"
        );
        Ok(InitOutcome::Reconciled(report))
    }

    /// Write remote records missing locally, without triggering sync
    async fn hydrate(
        &self,
        remote: &PullResponse,
        questions: &[Question],
        bookmarks: &[Bookmark],
        interviews: &[Interview],
        notes: &[CompanyNote],
    ) -> Result<usize, SyncError> {
        let store = &self.inner.store;
        let mut hydrated = 0;

        for question in missing_locally(&remote.questions, questions, |q| &q.id) {
            store.put_question_direct(question).await?;
            hydrated += 1;
        }
        for bookmark in missing_locally(&remote.bookmarks, bookmarks, |b| &b.id) {
            store.put_bookmark_direct(bookmark).await?;
            hydrated += 1;
        }
        for interview in missing_locally(&remote.interviews, interviews, |i| &i.id) {
            store.put_interview_direct(interview).await?;
            hydrated += 1;
        }
        // An existing local note always wins, however old it is
        for note in missing_locally(&remote.notes, notes, |n| &n.company) {
            store.put_company_note_direct(note).await?;
            hydrated += 1;
        }

        Ok(hydrated)
    }

    /// Push local-only records in one call; on failure queue them as creates
    async fn push_local_only(&self, batch: PushBatch) -> Result<usize, SyncError> {
        if batch.is_empty() {
            return Ok(0);
        }

        let accepted = self
            .inner
            .dispatcher
            .remote()
            .push(&batch)
            .await
            .is_some_and(|ack| ack.success);
        if accepted {
            return Ok(batch.len());
        }

        tracing::warn!(records = batch.len(), "Bulk push failed; queueing records");
        let mutations = batch
            .questions
            .into_iter()
            .map(|q| Mutation::Question(Change::Create(q)))
            .chain(
                batch
                    .bookmarks
                    .into_iter()
                    .map(|b| Mutation::Bookmark(Change::Create(b))),
            )
            .chain(
                batch
                    .interviews
                    .into_iter()
                    .map(|i| Mutation::Interview(Change::Create(i))),
            )
            .chain(
                batch
                    .notes
                    .into_iter()
                    .map(|n| Mutation::CompanyNote(Change::Create(n))),
            );
        for mutation in mutations {
            self.inner.queue.enqueue(&mutation.to_queue_item()).await?;
        }
        Ok(0)
    }

    /// Forward one local write to the remote, queueing it if that fails
    pub async fn record_mutation(&self, mutation: Mutation) -> Result<MutationOutcome, SyncError> {
        match self.inner.dispatcher.dispatch(&mutation).await {
            Ok(Dispatch::Applied) => Ok(MutationOutcome::Synced),
            Ok(Dispatch::Discarded) => Ok(MutationOutcome::Discarded),
            Err(SyncError::RemoteUnavailable) => {
                tracing::debug!(
                    op = %mutation.op(),
                    store = %mutation.store(),
                    "Remote unavailable; queueing mutation"
                );
                self.inner.queue.enqueue(&mutation.to_queue_item()).await?;
                self.start_retry_loop();
                Ok(MutationOutcome::Queued)
            }
            Err(error) => Err(error),
        }
    }

    /// Drain the queue and replay every item in FIFO order
    ///
    /// The queue is cleared before the first replay, so items that fail again
    /// are re-enqueued behind anything written meanwhile. Store failures are
    /// logged and end the pass early.
    pub async fn flush_queue(&self) -> FlushReport {
        let mut report = FlushReport::default();
        let items = match self.inner.queue.drain().await {
            Ok(items) => items,
            Err(error) => {
                tracing::warn!("Failed to read sync queue: {error}");
                return report;
            }
        };

        for item in items {
            let Some(mutation) = Mutation::from_queue_item(&item) else {
                tracing::debug!(op = %item.op, store = %item.store, "Discarding unsupported queue item");
                report.discarded += 1;
                continue;
            };

            match self.inner.dispatcher.dispatch(&mutation).await {
                Ok(Dispatch::Applied) => report.replayed += 1,
                Ok(Dispatch::Discarded) => report.discarded += 1,
                Err(_) => {
                    if let Err(error) = self.inner.queue.enqueue(&item).await {
                        tracing::warn!(store = %item.store, "Failed to requeue mutation: {error}");
                    }
                    report.requeued += 1;
                }
            }
        }

        if report.replayed + report.requeued + report.discarded > 0 {
            tracing::debug!(
                replayed = report.replayed,
                discarded = report.discarded,
                requeued = report.requeued,
                "Flushed sync queue"
            );
        }
        report
    }

    /// Start the periodic retry task unless one is already running
    pub fn start_retry_loop(&self) {
        let mut slot = self
            .inner
            .retry
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if slot
            .task
            .as_ref()
            .is_some_and(|task| !task.handle.is_finished())
        {
            return;
        }

        let generation = slot.next_generation;
        slot.next_generation += 1;
        let handle = tokio::spawn(run_retry_loop(
            Arc::downgrade(&self.inner),
            generation,
            self.inner.retry_interval,
        ));
        slot.task = Some(RetryTask { generation, handle });
        tracing::debug!(period = ?self.inner.retry_interval, "Retry loop started");
    }

    /// Abort the retry task, if any
    pub fn stop_retry_loop(&self) {
        let task = self
            .inner
            .retry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .task
            .take();
        if let Some(task) = task {
            task.handle.abort();
            tracing::debug!("Retry loop stopped");
        }
    }

    pub fn is_retry_running(&self) -> bool {
        self.inner
            .retry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .task
            .as_ref()
            .is_some_and(|task| !task.handle.is_finished())
    }

    /// Release the retry slot if it still belongs to `generation`
    fn release_retry_slot(&self, generation: u64) {
        let mut slot = self
            .inner
            .retry
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if slot
            .task
            .as_ref()
            .is_some_and(|task| task.generation == generation)
        {
            slot.task = None;
        }
    }
}

async fn run_retry_loop(inner: Weak<EngineInner>, generation: u64, period: Duration) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let Some(inner) = inner.upgrade() else {
            return;
        };
        let engine = SyncEngine { inner };

        match engine.inner.queue.snapshot().await {
            Ok(items) if items.is_empty() => {
                engine.release_retry_slot(generation);
                tracing::debug!("Sync queue empty; retry loop finished");
                // A mutation queued between the read and the release saw a live
                // loop and didn't start one
                if engine
                    .inner
                    .queue
                    .snapshot()
                    .await
                    .is_ok_and(|items| !items.is_empty())
                {
                    engine.start_retry_loop();
                }
                return;
            }
            Ok(_) => {
                engine.flush_queue().await;
            }
            Err(error) => {
                tracing::warn!("Failed to read sync queue, retrying next tick: {error}");
            }
        }
    }
}

fn local_only<T: Clone>(local: &[T], remote: &[T], key: impl Fn(&T) -> &String) -> Vec<T> {
    let remote_keys: HashSet<&String> = remote.iter().map(&key).collect();
    local
        .iter()
        .filter(|record| !remote_keys.contains(&key(*record)))
        .cloned()
        .collect()
}

fn missing_locally<'a, T>(
    remote: &'a [T],
    local: &[T],
    key: impl Fn(&T) -> &String,
) -> Vec<&'a T> {
    let local_keys: HashSet<&String> = local.iter().map(&key).collect();
    remote
        .iter()
        .filter(|record| !local_keys.contains(&key(*record)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{QuestionKind, SyncOp, SyncQueueItem};
    use crate::services::LocalDataStore;
    use crate::sync::testing::{FakeRemote, MemoryStore, RemoteCall};
    use pretty_assertions::assert_eq;
    use std::sync::atomic::AtomicUsize;

    const PERIOD: Duration = Duration::from_millis(5_000);

    fn engine(store: Arc<dyn LocalStore>, remote: &Arc<FakeRemote>) -> SyncEngine {
        SyncEngine::new(store, Arc::clone(remote) as Arc<dyn RemoteClient>, PERIOD)
    }

    fn question(id: &str, text: &str) -> Question {
        let mut question = Question::new(QuestionKind::Behavioral, text);
        question.id = id.to_string();
        question
    }

    fn create_item(question: &Question) -> SyncQueueItem {
        Mutation::Question(Change::Create(question.clone())).to_queue_item()
    }

    #[tokio::test]
    async fn flush_requeues_exactly_the_failed_items() {
        let store = Arc::new(MemoryStore::default());
        let remote = Arc::new(FakeRemote::online());
        remote.fail_id("q1");
        remote.fail_id("q2");

        let items: Vec<SyncQueueItem> = ["q1", "q2", "q3", "q4"]
            .iter()
            .map(|id| create_item(&question(id, "Q")))
            .collect();
        for item in &items {
            store.enqueue(item).await.unwrap();
        }

        let engine = engine(store.clone(), &remote);
        let report = engine.flush_queue().await;

        assert_eq!(
            report,
            FlushReport {
                replayed: 2,
                discarded: 0,
                requeued: 2,
            }
        );
        // Original items, original timestamps, original order
        assert_eq!(store.queue_items().await.unwrap(), items[..2].to_vec());
    }

    #[tokio::test]
    async fn flush_discards_unsupported_items() {
        let store = Arc::new(MemoryStore::default());
        let remote = Arc::new(FakeRemote::offline());
        store
            .enqueue(&SyncQueueItem::new(SyncOp::Delete, "companyNotes", None, Some("Acme".into())))
            .await
            .unwrap();
        store
            .enqueue(&SyncQueueItem::new(SyncOp::Create, "flashcards", None, None))
            .await
            .unwrap();

        let report = engine(store.clone(), &remote).flush_queue().await;

        assert_eq!(report.discarded, 2);
        assert!(store.queue_items().await.unwrap().is_empty());
        assert!(remote.calls().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn flush_survives_missing_queue_table() {
        let store = LocalDataStore::open_in_memory().await.unwrap();
        store.execute_raw("DROP TABLE sync_queue").await.unwrap();
        let remote = Arc::new(FakeRemote::online());

        let report = engine(Arc::new(store), &remote).flush_queue().await;
        assert_eq!(report, FlushReport::default());
    }

    #[tokio::test]
    async fn failed_live_mutation_is_queued_and_starts_retry() {
        let store = Arc::new(MemoryStore::default());
        let remote = Arc::new(FakeRemote::offline());
        let engine = engine(store.clone(), &remote);

        let q1 = question("q1", "Tell me about conflict");
        let outcome = engine
            .record_mutation(Mutation::Question(Change::Create(q1.clone())))
            .await
            .unwrap();

        assert_eq!(outcome, MutationOutcome::Queued);
        let queued = store.queue_items().await.unwrap();
        assert_eq!(queued.len(), 1);
        assert_eq!(queued[0].op, SyncOp::Create);
        assert_eq!(queued[0].store, "questions");
        assert_eq!(queued[0].data, Some(serde_json::to_value(&q1).unwrap()));
        assert!(engine.is_retry_running());

        engine.stop_retry_loop();
        assert!(!engine.is_retry_running());
    }

    #[tokio::test]
    async fn discarded_live_mutation_is_not_queued() {
        let store = Arc::new(MemoryStore::default());
        let remote = Arc::new(FakeRemote::offline());
        let engine = engine(store.clone(), &remote);

        let outcome = engine
            .record_mutation(Mutation::CompanyNote(Change::Delete("Acme".into())))
            .await
            .unwrap();

        assert_eq!(outcome, MutationOutcome::Discarded);
        assert!(store.queue_items().await.unwrap().is_empty());
        assert!(!engine.is_retry_running());
    }

    #[tokio::test(start_paused = true)]
    async fn retry_loop_drains_then_cancels_itself() {
        let store = Arc::new(MemoryStore::default());
        let remote = Arc::new(FakeRemote::online());
        store.enqueue(&create_item(&question("q1", "Q"))).await.unwrap();

        let engine = engine(store.clone(), &remote);
        engine.start_retry_loop();
        engine.start_retry_loop();
        assert!(engine.is_retry_running());

        tokio::time::sleep(PERIOD + Duration::from_millis(10)).await;
        assert!(store.queue_items().await.unwrap().is_empty());
        assert_eq!(remote.calls(), vec![RemoteCall::UpsertQuestion("q1".into())]);
        assert!(engine.is_retry_running());

        tokio::time::sleep(PERIOD).await;
        assert!(!engine.is_retry_running());
    }

    #[tokio::test(start_paused = true)]
    async fn retry_loop_keeps_ticking_through_queue_errors() {
        let store = Arc::new(MemoryStore::default());
        let remote = Arc::new(FakeRemote::online());
        store.set_queue_failing(true);

        let engine = engine(store.clone(), &remote);
        engine.start_retry_loop();

        tokio::time::sleep(PERIOD * 3 + Duration::from_millis(10)).await;
        assert!(engine.is_retry_running());

        store.set_queue_failing(false);
        tokio::time::sleep(PERIOD).await;
        assert!(!engine.is_retry_running());
    }

    #[tokio::test(start_paused = true)]
    async fn offline_start_recovers_through_retry_loop() {
        let store = Arc::new(MemoryStore::default());
        let remote = Arc::new(FakeRemote::offline());
        let engine = engine(store.clone(), &remote);

        assert_eq!(engine.init_sync().await.unwrap(), InitOutcome::Offline);
        assert!(engine.is_retry_running());

        let q1 = question("q1", "Q");
        engine
            .record_mutation(Mutation::Question(Change::Create(q1)))
            .await
            .unwrap();
        tokio::time::sleep(PERIOD + Duration::from_millis(10)).await;
        assert_eq!(store.queue_items().await.unwrap().len(), 1);

        remote.set_online(true);
        tokio::time::sleep(PERIOD).await;
        assert!(store.queue_items().await.unwrap().is_empty());

        tokio::time::sleep(PERIOD).await;
        assert!(!engine.is_retry_running());
        assert_eq!(engine.init_sync().await.unwrap(), InitOutcome::AlreadyInitialized);
    }

    #[tokio::test]
    async fn init_hydrates_missing_records_directly() {
        let store = Arc::new(MemoryStore::default());
        let remote = Arc::new(FakeRemote::online());
        remote.set_pull_response(PullResponse {
            questions: vec![question("q9", "Remote question")],
            ..PullResponse::default()
        });

        let outcome = engine(store.clone(), &remote).init_sync().await.unwrap();

        let InitOutcome::Reconciled(report) = outcome else {
            panic!("expected reconciliation, got {outcome:?}");
        };
        assert_eq!(report.hydrated, 1);
        assert_eq!(report.pushed, 0);
        let ids: Vec<String> = store
            .all_questions()
            .await
            .unwrap()
            .into_iter()
            .map(|q| q.id)
            .collect();
        assert_eq!(ids, vec!["q9".to_string()]);
        // Nothing to push, nothing queued
        assert_eq!(remote.calls(), vec![RemoteCall::Pull]);
    }

    #[tokio::test]
    async fn init_pushes_local_only_records_in_one_batch() {
        let store = Arc::new(MemoryStore::default());
        let remote = Arc::new(FakeRemote::online());
        let local = question("q1", "Local only");
        let shared = question("q2", "On both sides");
        store.put_question_direct(&local).await.unwrap();
        store.put_question_direct(&shared).await.unwrap();
        let note = CompanyNote::new("Acme", "Bring questions");
        store.put_company_note_direct(&note).await.unwrap();
        remote.set_pull_response(PullResponse {
            questions: vec![shared],
            ..PullResponse::default()
        });

        let outcome = engine(store.clone(), &remote).init_sync().await.unwrap();

        let InitOutcome::Reconciled(report) = outcome else {
            panic!("expected reconciliation, got {outcome:?}");
        };
        assert_eq!(report.pushed, 2);
        assert_eq!(
            remote.calls(),
            vec![
                RemoteCall::Pull,
                RemoteCall::Push(PushBatch {
                    questions: vec![local],
                    notes: vec![note],
                    ..PushBatch::default()
                }),
            ]
        );
    }

    #[tokio::test]
    async fn failed_push_queues_records_as_creates() {
        let store = Arc::new(MemoryStore::default());
        let remote = Arc::new(FakeRemote::online());
        remote.fail_id("push");
        remote.fail_id("q1");
        let local = question("q1", "Local only");
        store.put_question_direct(&local).await.unwrap();

        let engine = engine(store.clone(), &remote);
        let InitOutcome::Reconciled(report) = engine.init_sync().await.unwrap() else {
            panic!("expected reconciliation");
        };

        assert_eq!(report.pushed, 0);
        assert_eq!(report.flush.requeued, 1);
        let queued = store.queue_items().await.unwrap();
        assert_eq!(queued.len(), 1);
        assert_eq!(
            Mutation::from_queue_item(&queued[0]),
            Some(Mutation::Question(Change::Create(local)))
        );
        assert!(engine.is_retry_running());
        engine.stop_retry_loop();
    }

    #[tokio::test]
    async fn hydration_callback_fires_before_push_even_when_init_fails() {
        let store = Arc::new(MemoryStore::default());
        let remote = Arc::new(FakeRemote::online());
        remote.set_pull_response(PullResponse {
            questions: vec![question("q9", "Remote question")],
            ..PullResponse::default()
        });
        remote.fail_id("push");
        store
            .put_question_direct(&question("q1", "Local only"))
            .await
            .unwrap();
        // The failed push falls back to the queue, which is broken too
        store.set_queue_failing(true);

        let fired = Arc::new(AtomicUsize::new(0));
        let calls_at_callback = Arc::new(Mutex::new(Vec::new()));
        let (counter, seen, observed_remote) = (
            Arc::clone(&fired),
            Arc::clone(&calls_at_callback),
            Arc::clone(&remote),
        );
        let result = engine(store.clone(), &remote)
            .init_sync_with(Some(Box::new(move |hydrated: usize| {
                assert_eq!(hydrated, 1);
                counter.fetch_add(1, Ordering::SeqCst);
                *seen.lock().unwrap() = observed_remote.calls();
            })))
            .await;

        assert!(matches!(result, Err(SyncError::Store(_))));
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(*calls_at_callback.lock().unwrap(), vec![RemoteCall::Pull]);
        assert_eq!(store.all_questions().await.unwrap().len(), 2);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn init_never_overwrites_local_note() {
        let store = LocalDataStore::open_in_memory().await.unwrap();
        store
            .put_company_note_direct(&CompanyNote::new("Acme", "local"))
            .await
            .unwrap();
        let remote = Arc::new(FakeRemote::online());
        remote.set_pull_response(PullResponse {
            notes: vec![
                CompanyNote::new("Acme", "remote"),
                CompanyNote::new("Globex", "remote only"),
            ],
            ..PullResponse::default()
        });

        let outcome = engine(Arc::new(store.clone()), &remote)
            .init_sync()
            .await
            .unwrap();

        assert!(matches!(outcome, InitOutcome::Reconciled(report) if report.hydrated == 1));
        assert_eq!(
            store.get_company_note("Acme").await.unwrap().unwrap().content,
            "local"
        );
        assert_eq!(
            store.get_company_note("Globex").await.unwrap().unwrap().content,
            "remote only"
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn repeated_init_against_same_snapshot_never_duplicates() {
        let store = LocalDataStore::open_in_memory().await.unwrap();
        let remote = Arc::new(FakeRemote::online());
        remote.set_pull_response(PullResponse {
            questions: vec![question("q9", "Remote question")],
            ..PullResponse::default()
        });

        for expected_hydrated in [1, 0] {
            let engine = engine(Arc::new(store.clone()), &remote);
            let outcome = engine.init_sync().await.unwrap();
            assert!(
                matches!(outcome, InitOutcome::Reconciled(report) if report.hydrated == expected_hydrated)
            );
        }

        assert_eq!(store.list_questions().await.unwrap().len(), 1);
    }
}
