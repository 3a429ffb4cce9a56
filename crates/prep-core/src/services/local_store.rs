//! Observable local data store shared by the UI and the sync engine.

use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use libsql::Value;
use tokio::sync::Mutex;

use crate::db::{Database, LibSqlQueueRepository, LibSqlTable};
use crate::error::{Error, Result};
use crate::models::{
    Bookmark, BookmarkStatus, CompanyNote, Interview, InterviewStatus, Question, QuestionKind,
    SyncQueueItem,
};
use crate::sync::{Change, Mutation};

/// Callback invoked after every committed local write
pub type MutationObserver = Arc<dyn Fn(Mutation) + Send + Sync>;

/// Narrow store interface consumed by the sync engine
///
/// The `put_*_direct` primitives write without notifying the mutation
/// observer, so hydrated records are never echoed back to the remote.
#[async_trait]
pub trait LocalStore: Send + Sync {
    async fn all_questions(&self) -> Result<Vec<Question>>;
    async fn all_bookmarks(&self) -> Result<Vec<Bookmark>>;
    async fn all_interviews(&self) -> Result<Vec<Interview>>;
    async fn all_company_notes(&self) -> Result<Vec<CompanyNote>>;

    async fn put_question_direct(&self, question: &Question) -> Result<()>;
    async fn put_bookmark_direct(&self, bookmark: &Bookmark) -> Result<()>;
    async fn put_interview_direct(&self, interview: &Interview) -> Result<()>;
    async fn put_company_note_direct(&self, note: &CompanyNote) -> Result<()>;

    /// Queued items in enqueue order
    async fn queue_items(&self) -> Result<Vec<SyncQueueItem>>;
    async fn enqueue(&self, item: &SyncQueueItem) -> Result<()>;
    async fn clear_queue(&self) -> Result<()>;

    /// Read every queued item, then clear the queue
    async fn drain_queue(&self) -> Result<Vec<SyncQueueItem>> {
        let items = self.queue_items().await?;
        self.clear_queue().await?;
        Ok(items)
    }

    /// Install (or remove) the observer notified after local writes
    fn set_mutation_observer(&self, observer: Option<MutationObserver>);
}

/// libSQL-backed store for questions, bookmarks, interviews and company notes.
#[derive(Clone)]
pub struct LocalDataStore {
    db: Arc<Mutex<Database>>,
    db_path: Option<PathBuf>,
    observer: Arc<RwLock<Option<MutationObserver>>>,
}

impl LocalDataStore {
    /// Open a store at the given filesystem path, creating parent directories.
    pub async fn open_path(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::open(&db_path).await?;
        tracing::debug!("Opened local store at {}", db_path.display());
        Ok(Self::from_database(db, Some(db_path)))
    }

    /// Open an in-memory store (primarily for tests).
    pub async fn open_in_memory() -> Result<Self> {
        let db = Database::open_in_memory().await?;
        Ok(Self::from_database(db, None))
    }

    fn from_database(db: Database, db_path: Option<PathBuf>) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            db_path,
            observer: Arc::new(RwLock::new(None)),
        }
    }

    pub fn db_path(&self) -> Option<&PathBuf> {
        self.db_path.as_ref()
    }

    fn notify(&self, mutation: Mutation) {
        let observer = self
            .observer
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(observer) = observer {
            observer(mutation);
        }
    }

    // ---------------------------------------------------------------------
    // Questions
    // ---------------------------------------------------------------------

    pub async fn add_question(&self, question: Question) -> Result<Question> {
        {
            let db = self.db.lock().await;
            LibSqlTable::<Question>::new(db.connection())
                .put(&question)
                .await?;
        }
        self.notify(Mutation::Question(Change::Create(question.clone())));
        Ok(question)
    }

    pub async fn update_question(&self, question: Question) -> Result<Question> {
        {
            let db = self.db.lock().await;
            let table = LibSqlTable::<Question>::new(db.connection());
            if table.get(&question.id).await?.is_none() {
                return Err(Error::NotFound(format!("question {}", question.id)));
            }
            table.put(&question).await?;
        }
        self.notify(Mutation::Question(Change::Update(question.clone())));
        Ok(question)
    }

    pub async fn delete_question(&self, id: &str) -> Result<()> {
        let removed = {
            let db = self.db.lock().await;
            LibSqlTable::<Question>::new(db.connection())
                .delete(id)
                .await?
        };
        if !removed {
            return Err(Error::NotFound(format!("question {id}")));
        }
        self.notify(Mutation::Question(Change::Delete(id.to_string())));
        Ok(())
    }

    pub async fn get_question(&self, id: &str) -> Result<Option<Question>> {
        let db = self.db.lock().await;
        LibSqlTable::<Question>::new(db.connection()).get(id).await
    }

    /// All questions, newest first
    pub async fn list_questions(&self) -> Result<Vec<Question>> {
        let db = self.db.lock().await;
        LibSqlTable::<Question>::new(db.connection()).list().await
    }

    pub async fn questions_by_kind(&self, kind: QuestionKind) -> Result<Vec<Question>> {
        let db = self.db.lock().await;
        LibSqlTable::<Question>::new(db.connection())
            .list_where("kind", Value::Text(kind.as_str().to_string()))
            .await
    }

    pub async fn questions_by_company(&self, company: &str) -> Result<Vec<Question>> {
        let db = self.db.lock().await;
        LibSqlTable::<Question>::new(db.connection())
            .list_where("company", Value::Text(company.to_string()))
            .await
    }

    pub async fn questions_by_kind_and_company(
        &self,
        kind: QuestionKind,
        company: &str,
    ) -> Result<Vec<Question>> {
        let db = self.db.lock().await;
        LibSqlTable::<Question>::new(db.connection())
            .select(
                "WHERE kind = ? AND company = ? ORDER BY created_at DESC",
                vec![
                    Value::Text(kind.as_str().to_string()),
                    Value::Text(company.to_string()),
                ],
            )
            .await
    }

    /// Favorite questions, optionally restricted to one kind
    pub async fn favorite_questions(&self, kind: Option<QuestionKind>) -> Result<Vec<Question>> {
        let db = self.db.lock().await;
        let table = LibSqlTable::<Question>::new(db.connection());
        match kind {
            Some(kind) => {
                table
                    .select(
                        "WHERE is_favorite = 1 AND kind = ? ORDER BY created_at DESC",
                        vec![Value::Text(kind.as_str().to_string())],
                    )
                    .await
            }
            None => {
                table
                    .select("WHERE is_favorite = 1 ORDER BY created_at DESC", Vec::new())
                    .await
            }
        }
    }

    /// Case-insensitive match against question text, company and tags
    pub async fn search_questions(&self, query: &str) -> Result<Vec<Question>> {
        let needle = query.trim().to_lowercase();
        let questions = self.list_questions().await?;
        if needle.is_empty() {
            return Ok(questions);
        }

        Ok(questions
            .into_iter()
            .filter(|question| {
                question.question.to_lowercase().contains(&needle)
                    || question
                        .company
                        .as_ref()
                        .is_some_and(|company| company.to_lowercase().contains(&needle))
                    || question
                        .tags
                        .iter()
                        .any(|tag| tag.to_lowercase().contains(&needle))
            })
            .collect())
    }

    /// Distinct companies referenced by questions, sorted
    pub async fn question_companies(&self) -> Result<Vec<String>> {
        let db = self.db.lock().await;
        LibSqlTable::<Question>::new(db.connection())
            .distinct("company")
            .await
    }

    // ---------------------------------------------------------------------
    // Bookmarks
    // ---------------------------------------------------------------------

    pub async fn add_bookmark(&self, bookmark: Bookmark) -> Result<Bookmark> {
        {
            let db = self.db.lock().await;
            LibSqlTable::<Bookmark>::new(db.connection())
                .put(&bookmark)
                .await?;
        }
        self.notify(Mutation::Bookmark(Change::Create(bookmark.clone())));
        Ok(bookmark)
    }

    pub async fn update_bookmark(&self, bookmark: Bookmark) -> Result<Bookmark> {
        {
            let db = self.db.lock().await;
            let table = LibSqlTable::<Bookmark>::new(db.connection());
            if table.get(&bookmark.id).await?.is_none() {
                return Err(Error::NotFound(format!("bookmark {}", bookmark.id)));
            }
            table.put(&bookmark).await?;
        }
        self.notify(Mutation::Bookmark(Change::Update(bookmark.clone())));
        Ok(bookmark)
    }

    pub async fn delete_bookmark(&self, id: &str) -> Result<()> {
        let removed = {
            let db = self.db.lock().await;
            LibSqlTable::<Bookmark>::new(db.connection())
                .delete(id)
                .await?
        };
        if !removed {
            return Err(Error::NotFound(format!("bookmark {id}")));
        }
        self.notify(Mutation::Bookmark(Change::Delete(id.to_string())));
        Ok(())
    }

    pub async fn get_bookmark(&self, id: &str) -> Result<Option<Bookmark>> {
        let db = self.db.lock().await;
        LibSqlTable::<Bookmark>::new(db.connection()).get(id).await
    }

    pub async fn list_bookmarks(&self) -> Result<Vec<Bookmark>> {
        let db = self.db.lock().await;
        LibSqlTable::<Bookmark>::new(db.connection()).list().await
    }

    pub async fn bookmarks_by_status(&self, status: BookmarkStatus) -> Result<Vec<Bookmark>> {
        let db = self.db.lock().await;
        LibSqlTable::<Bookmark>::new(db.connection())
            .list_where("status", Value::Text(status.as_str().to_string()))
            .await
    }

    pub async fn bookmark_categories(&self) -> Result<Vec<String>> {
        let db = self.db.lock().await;
        LibSqlTable::<Bookmark>::new(db.connection())
            .distinct("category")
            .await
    }

    // ---------------------------------------------------------------------
    // Interviews
    // ---------------------------------------------------------------------

    pub async fn add_interview(&self, interview: Interview) -> Result<Interview> {
        {
            let db = self.db.lock().await;
            LibSqlTable::<Interview>::new(db.connection())
                .put(&interview)
                .await?;
        }
        self.notify(Mutation::Interview(Change::Create(interview.clone())));
        Ok(interview)
    }

    /// Update an interview, bumping `updated_at`
    pub async fn update_interview(&self, mut interview: Interview) -> Result<Interview> {
        interview.touch();
        {
            let db = self.db.lock().await;
            let table = LibSqlTable::<Interview>::new(db.connection());
            if table.get(&interview.id).await?.is_none() {
                return Err(Error::NotFound(format!("interview {}", interview.id)));
            }
            table.put(&interview).await?;
        }
        self.notify(Mutation::Interview(Change::Update(interview.clone())));
        Ok(interview)
    }

    pub async fn delete_interview(&self, id: &str) -> Result<()> {
        let removed = {
            let db = self.db.lock().await;
            LibSqlTable::<Interview>::new(db.connection())
                .delete(id)
                .await?
        };
        if !removed {
            return Err(Error::NotFound(format!("interview {id}")));
        }
        self.notify(Mutation::Interview(Change::Delete(id.to_string())));
        Ok(())
    }

    pub async fn get_interview(&self, id: &str) -> Result<Option<Interview>> {
        let db = self.db.lock().await;
        LibSqlTable::<Interview>::new(db.connection()).get(id).await
    }

    /// All interviews ordered by start time
    pub async fn list_interviews(&self) -> Result<Vec<Interview>> {
        let db = self.db.lock().await;
        LibSqlTable::<Interview>::new(db.connection()).list().await
    }

    pub async fn interviews_by_company(&self, company: &str) -> Result<Vec<Interview>> {
        let db = self.db.lock().await;
        LibSqlTable::<Interview>::new(db.connection())
            .list_where("company", Value::Text(company.to_string()))
            .await
    }

    /// Scheduled interviews starting at or after `now`, soonest first
    pub async fn upcoming_interviews(&self, now: i64) -> Result<Vec<Interview>> {
        let db = self.db.lock().await;
        LibSqlTable::<Interview>::new(db.connection())
            .select(
                "WHERE status = ? AND date_time >= ? ORDER BY date_time ASC",
                vec![
                    Value::Text(InterviewStatus::Scheduled.as_str().to_string()),
                    Value::Integer(now),
                ],
            )
            .await
    }

    // ---------------------------------------------------------------------
    // Company notes
    // ---------------------------------------------------------------------

    /// Create or replace the note for `note.company`
    pub async fn save_company_note(&self, note: CompanyNote) -> Result<CompanyNote> {
        let existed = {
            let db = self.db.lock().await;
            let table = LibSqlTable::<CompanyNote>::new(db.connection());
            let existed = table.get(&note.company).await?.is_some();
            table.put(&note).await?;
            existed
        };
        let change = if existed {
            Change::Update(note.clone())
        } else {
            Change::Create(note.clone())
        };
        self.notify(Mutation::CompanyNote(change));
        Ok(note)
    }

    pub async fn get_company_note(&self, company: &str) -> Result<Option<CompanyNote>> {
        let db = self.db.lock().await;
        LibSqlTable::<CompanyNote>::new(db.connection())
            .get(company)
            .await
    }

    pub async fn list_company_notes(&self) -> Result<Vec<CompanyNote>> {
        let db = self.db.lock().await;
        LibSqlTable::<CompanyNote>::new(db.connection()).list().await
    }

    #[cfg(test)]
    pub(crate) async fn execute_raw(&self, sql: &str) -> Result<()> {
        let db = self.db.lock().await;
        db.connection().execute(sql, ()).await?;
        Ok(())
    }
}

#[async_trait]
impl LocalStore for LocalDataStore {
    async fn all_questions(&self) -> Result<Vec<Question>> {
        self.list_questions().await
    }

    async fn all_bookmarks(&self) -> Result<Vec<Bookmark>> {
        self.list_bookmarks().await
    }

    async fn all_interviews(&self) -> Result<Vec<Interview>> {
        self.list_interviews().await
    }

    async fn all_company_notes(&self) -> Result<Vec<CompanyNote>> {
        self.list_company_notes().await
    }

    async fn put_question_direct(&self, question: &Question) -> Result<()> {
        let db = self.db.lock().await;
        LibSqlTable::<Question>::new(db.connection())
            .put(question)
            .await
    }

    async fn put_bookmark_direct(&self, bookmark: &Bookmark) -> Result<()> {
        let db = self.db.lock().await;
        LibSqlTable::<Bookmark>::new(db.connection())
            .put(bookmark)
            .await
    }

    async fn put_interview_direct(&self, interview: &Interview) -> Result<()> {
        let db = self.db.lock().await;
        LibSqlTable::<Interview>::new(db.connection())
            .put(interview)
            .await
    }

    async fn put_company_note_direct(&self, note: &CompanyNote) -> Result<()> {
        let db = self.db.lock().await;
        LibSqlTable::<CompanyNote>::new(db.connection())
            .put(note)
            .await
    }

    async fn queue_items(&self) -> Result<Vec<SyncQueueItem>> {
        let db = self.db.lock().await;
        LibSqlQueueRepository::new(db.connection()).list().await
    }

    async fn enqueue(&self, item: &SyncQueueItem) -> Result<()> {
        let db = self.db.lock().await;
        LibSqlQueueRepository::new(db.connection())
            .push(item)
            .await
    }

    async fn clear_queue(&self) -> Result<()> {
        let db = self.db.lock().await;
        LibSqlQueueRepository::new(db.connection()).clear().await?;
        Ok(())
    }

    async fn drain_queue(&self) -> Result<Vec<SyncQueueItem>> {
        // One lock for both steps so an enqueue can't land between read and clear
        let db = self.db.lock().await;
        let repo = LibSqlQueueRepository::new(db.connection());
        let items = repo.list().await?;
        repo.clear().await?;
        Ok(items)
    }

    fn set_mutation_observer(&self, observer: Option<MutationObserver>) {
        *self
            .observer
            .write()
            .unwrap_or_else(PoisonError::into_inner) = observer;
    }
}
