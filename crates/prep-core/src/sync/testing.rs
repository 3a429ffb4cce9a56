//! In-memory doubles for sync tests

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::models::{Bookmark, CompanyNote, Interview, Question, SyncQueueItem};
use crate::remote::{DeleteAck, PullResponse, PushAck, PushBatch, RecordAck, RemoteClient};
use crate::services::{LocalStore, MutationObserver};

/// One observed remote call, keyed by the id it targeted
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteCall {
    Pull,
    Push(PushBatch),
    UpsertQuestion(String),
    UpdateQuestion(String),
    DeleteQuestion(String),
    UpsertBookmark(String),
    UpdateBookmark(String),
    DeleteBookmark(String),
    UpsertInterview(String),
    UpdateInterview(String),
    DeleteInterview(String),
    UpsertNote(String),
}

/// Records every call; answers `None` while offline or for ids in `failing`
#[derive(Default)]
pub struct FakeRemote {
    online: AtomicBool,
    pull_response: Mutex<PullResponse>,
    failing: Mutex<HashSet<String>>,
    calls: Mutex<Vec<RemoteCall>>,
}

impl FakeRemote {
    pub fn online() -> Self {
        let remote = Self::default();
        remote.set_online(true);
        remote
    }

    pub fn offline() -> Self {
        Self::default()
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub fn set_pull_response(&self, response: PullResponse) {
        *self.pull_response.lock().unwrap_or_else(PoisonError::into_inner) = response;
    }

    /// Make calls targeting `id` fail even while online
    ///
    /// `"pull"` and `"push"` target the bulk endpoints.
    pub fn fail_id(&self, id: &str) {
        self.failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.to_string());
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn reset_calls(&self) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn record(&self, call: RemoteCall) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }

    fn answer<T>(&self, id: &str, value: T) -> Option<T> {
        let failing = self
            .failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(id);
        (self.online.load(Ordering::SeqCst) && !failing).then_some(value)
    }

    fn record_ack(&self, call: RemoteCall, id: &str) -> Option<RecordAck> {
        self.record(call);
        self.answer(id, RecordAck { id: id.to_string() })
    }

    fn delete_ack(&self, call: RemoteCall, id: &str) -> Option<DeleteAck> {
        self.record(call);
        self.answer(id, DeleteAck { deleted: true })
    }
}

#[async_trait]
impl RemoteClient for FakeRemote {
    async fn pull(&self) -> Option<PullResponse> {
        self.record(RemoteCall::Pull);
        let response = self
            .pull_response
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        self.answer("pull", response)
    }

    async fn push(&self, batch: &PushBatch) -> Option<PushAck> {
        self.record(RemoteCall::Push(batch.clone()));
        self.answer("push", PushAck { success: true })
    }

    async fn upsert_question(&self, question: &Question) -> Option<RecordAck> {
        self.record_ack(RemoteCall::UpsertQuestion(question.id.clone()), &question.id)
    }

    async fn update_question(&self, id: &str, _question: &Question) -> Option<RecordAck> {
        self.record_ack(RemoteCall::UpdateQuestion(id.to_string()), id)
    }

    async fn delete_question(&self, id: &str) -> Option<DeleteAck> {
        self.delete_ack(RemoteCall::DeleteQuestion(id.to_string()), id)
    }

    async fn upsert_bookmark(&self, bookmark: &Bookmark) -> Option<RecordAck> {
        self.record_ack(RemoteCall::UpsertBookmark(bookmark.id.clone()), &bookmark.id)
    }

    async fn update_bookmark(&self, id: &str, _bookmark: &Bookmark) -> Option<RecordAck> {
        self.record_ack(RemoteCall::UpdateBookmark(id.to_string()), id)
    }

    async fn delete_bookmark(&self, id: &str) -> Option<DeleteAck> {
        self.delete_ack(RemoteCall::DeleteBookmark(id.to_string()), id)
    }

    async fn upsert_interview(&self, interview: &Interview) -> Option<RecordAck> {
        self.record_ack(
            RemoteCall::UpsertInterview(interview.id.clone()),
            &interview.id,
        )
    }

    async fn update_interview(&self, id: &str, _interview: &Interview) -> Option<RecordAck> {
        self.record_ack(RemoteCall::UpdateInterview(id.to_string()), id)
    }

    async fn delete_interview(&self, id: &str) -> Option<DeleteAck> {
        self.delete_ack(RemoteCall::DeleteInterview(id.to_string()), id)
    }

    async fn upsert_note(&self, company: &str, note: &CompanyNote) -> Option<CompanyNote> {
        self.record(RemoteCall::UpsertNote(company.to_string()));
        self.answer(company, note.clone())
    }
}

/// Vec-backed [`LocalStore`] that never touches a database
///
/// Queue reads and writes can be made to fail to exercise error paths.
#[derive(Default)]
pub struct MemoryStore {
    questions: Mutex<Vec<Question>>,
    bookmarks: Mutex<Vec<Bookmark>>,
    interviews: Mutex<Vec<Interview>>,
    notes: Mutex<Vec<CompanyNote>>,
    queue: Mutex<Vec<SyncQueueItem>>,
    queue_failing: AtomicBool,
    observer: Mutex<Option<MutationObserver>>,
}

impl MemoryStore {
    pub fn set_queue_failing(&self, failing: bool) {
        self.queue_failing.store(failing, Ordering::SeqCst);
    }

    pub fn has_observer(&self) -> bool {
        self.observer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn check_queue(&self) -> Result<()> {
        if self.queue_failing.load(Ordering::SeqCst) {
            Err(Error::Database("no such table: sync_queue".to_string()))
        } else {
            Ok(())
        }
    }
}

fn all<T: Clone>(records: &Mutex<Vec<T>>) -> Vec<T> {
    records
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

fn upsert<T: Clone>(records: &Mutex<Vec<T>>, record: &T, same: impl Fn(&T) -> bool) {
    let mut records = records.lock().unwrap_or_else(PoisonError::into_inner);
    match records.iter_mut().find(|existing| same(existing)) {
        Some(existing) => *existing = record.clone(),
        None => records.push(record.clone()),
    }
}

#[async_trait]
impl LocalStore for MemoryStore {
    async fn all_questions(&self) -> Result<Vec<Question>> {
        Ok(all(&self.questions))
    }

    async fn all_bookmarks(&self) -> Result<Vec<Bookmark>> {
        Ok(all(&self.bookmarks))
    }

    async fn all_interviews(&self) -> Result<Vec<Interview>> {
        Ok(all(&self.interviews))
    }

    async fn all_company_notes(&self) -> Result<Vec<CompanyNote>> {
        Ok(all(&self.notes))
    }

    async fn put_question_direct(&self, question: &Question) -> Result<()> {
        upsert(&self.questions, question, |q| q.id == question.id);
        Ok(())
    }

    async fn put_bookmark_direct(&self, bookmark: &Bookmark) -> Result<()> {
        upsert(&self.bookmarks, bookmark, |b| b.id == bookmark.id);
        Ok(())
    }

    async fn put_interview_direct(&self, interview: &Interview) -> Result<()> {
        upsert(&self.interviews, interview, |i| i.id == interview.id);
        Ok(())
    }

    async fn put_company_note_direct(&self, note: &CompanyNote) -> Result<()> {
        upsert(&self.notes, note, |n| n.company == note.company);
        Ok(())
    }

    async fn queue_items(&self) -> Result<Vec<SyncQueueItem>> {
        self.check_queue()?;
        Ok(all(&self.queue))
    }

    async fn enqueue(&self, item: &SyncQueueItem) -> Result<()> {
        self.check_queue()?;
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(item.clone());
        Ok(())
    }

    async fn clear_queue(&self) -> Result<()> {
        self.check_queue()?;
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        Ok(())
    }

    fn set_mutation_observer(&self, observer: Option<MutationObserver>) {
        *self.observer.lock().unwrap_or_else(PoisonError::into_inner) = observer;
    }
}
