//! Routes one mutation to exactly one remote call

use std::sync::Arc;

use serde_json::Value;

use super::{Change, Mutation, SyncError};
use crate::models::SyncOp;
use crate::remote::RemoteClient;

/// Result of handing a mutation to the remote
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// The remote accepted the mutation
    Applied,
    /// The mutation can never succeed and was dropped without a remote call
    Discarded,
}

impl Mutation {
    /// Perform the remote call this mutation maps to
    ///
    /// Company note deletes have no remote counterpart and resolve to
    /// [`Dispatch::Discarded`].
    pub async fn apply(&self, remote: &dyn RemoteClient) -> Result<Dispatch, SyncError> {
        let acknowledged = match self {
            Self::Question(Change::Create(question)) => {
                remote.upsert_question(question).await.is_some()
            }
            Self::Question(Change::Update(question)) => {
                remote.update_question(&question.id, question).await.is_some()
            }
            Self::Question(Change::Delete(id)) => remote.delete_question(id).await.is_some(),
            Self::Bookmark(Change::Create(bookmark)) => {
                remote.upsert_bookmark(bookmark).await.is_some()
            }
            Self::Bookmark(Change::Update(bookmark)) => {
                remote.update_bookmark(&bookmark.id, bookmark).await.is_some()
            }
            Self::Bookmark(Change::Delete(id)) => remote.delete_bookmark(id).await.is_some(),
            Self::Interview(Change::Create(interview)) => {
                remote.upsert_interview(interview).await.is_some()
            }
            Self::Interview(Change::Update(interview)) => remote
                .update_interview(&interview.id, interview)
                .await
                .is_some(),
            Self::Interview(Change::Delete(id)) => remote.delete_interview(id).await.is_some(),
            Self::CompanyNote(Change::Create(note) | Change::Update(note)) => {
                remote.upsert_note(&note.company, note).await.is_some()
            }
            Self::CompanyNote(Change::Delete(company)) => {
                tracing::debug!(%company, "Company note deletes are not synced; discarding");
                return Ok(Dispatch::Discarded);
            }
        };

        if acknowledged {
            Ok(Dispatch::Applied)
        } else {
            Err(SyncError::RemoteUnavailable)
        }
    }
}

/// Shared entry point mapping mutations onto a [`RemoteClient`]
#[derive(Clone)]
pub struct MutationDispatcher {
    remote: Arc<dyn RemoteClient>,
}

impl MutationDispatcher {
    pub fn new(remote: Arc<dyn RemoteClient>) -> Self {
        Self { remote }
    }

    pub fn remote(&self) -> &dyn RemoteClient {
        self.remote.as_ref()
    }

    pub async fn dispatch(&self, mutation: &Mutation) -> Result<Dispatch, SyncError> {
        let outcome = mutation.apply(self.remote.as_ref()).await;
        tracing::debug!(
            op = %mutation.op(),
            store = %mutation.store(),
            ok = outcome.is_ok(),
            "Dispatched mutation"
        );
        outcome
    }

    /// Dispatch an untyped mutation descriptor
    ///
    /// Shapes that can never succeed (unknown store, delete without an id,
    /// missing or undecodable snapshot) are discarded without a remote call.
    pub async fn handle_mutation(
        &self,
        op: SyncOp,
        store: &str,
        data: Option<&Value>,
        entity_id: Option<&str>,
    ) -> Result<Dispatch, SyncError> {
        match Mutation::from_parts(op, store, data, entity_id) {
            Some(mutation) => self.dispatch(&mutation).await,
            None => {
                tracing::debug!(%op, store, "Discarding unsupported mutation");
                Ok(Dispatch::Discarded)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Bookmark, CompanyNote, Interview, Question, QuestionKind};
    use crate::sync::testing::{FakeRemote, RemoteCall};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn dispatcher(remote: &Arc<FakeRemote>) -> MutationDispatcher {
        MutationDispatcher::new(Arc::clone(remote) as Arc<dyn RemoteClient>)
    }

    #[tokio::test]
    async fn delete_without_id_is_discarded() {
        let remote = Arc::new(FakeRemote::online());
        let outcome = dispatcher(&remote)
            .handle_mutation(SyncOp::Delete, "questions", None, None)
            .await;

        assert!(matches!(outcome, Ok(Dispatch::Discarded)));
        assert!(remote.calls().is_empty());
    }

    #[tokio::test]
    async fn unknown_store_and_note_delete_are_discarded() {
        let remote = Arc::new(FakeRemote::online());
        let dispatcher = dispatcher(&remote);

        let unknown = dispatcher
            .handle_mutation(SyncOp::Create, "flashcards", Some(&json!({"id": "f1"})), None)
            .await;
        let note_delete = dispatcher
            .handle_mutation(SyncOp::Delete, "companyNotes", None, Some("Acme"))
            .await;

        assert!(matches!(unknown, Ok(Dispatch::Discarded)));
        assert!(matches!(note_delete, Ok(Dispatch::Discarded)));
        assert!(remote.calls().is_empty());
    }

    #[tokio::test]
    async fn remote_failure_is_reported() {
        let remote = Arc::new(FakeRemote::offline());
        let mut question = Question::new(QuestionKind::Behavioral, "Tell me about conflict");
        question.id = "q1".to_string();
        let data = serde_json::to_value(&question).unwrap();

        let outcome = dispatcher(&remote)
            .handle_mutation(SyncOp::Create, "questions", Some(&data), None)
            .await;

        assert!(matches!(outcome, Err(SyncError::RemoteUnavailable)));
        assert_eq!(
            outcome.unwrap_err().to_string(),
            "sync failed"
        );
        assert_eq!(remote.calls(), vec![RemoteCall::UpsertQuestion("q1".into())]);
    }

    #[tokio::test]
    async fn routes_every_supported_pair_to_one_call() {
        let remote = Arc::new(FakeRemote::online());
        let dispatcher = dispatcher(&remote);

        let mut question = Question::new(QuestionKind::Technical, "Two sum");
        question.id = "q1".into();
        let mut bookmark = Bookmark::new("Docs", "https://docs.rs", "docs");
        bookmark.id = "b1".into();
        let mut interview = Interview::new("Acme", 1_000, "onsite");
        interview.id = "i1".into();
        let note = CompanyNote::new("Acme & Co", "Ask about on-call");

        let cases: Vec<(SyncOp, &str, Option<Value>, Option<&str>, RemoteCall)> = vec![
            (SyncOp::Create, "questions", Some(json!(question)), None, RemoteCall::UpsertQuestion("q1".into())),
            (SyncOp::Update, "questions", Some(json!(question)), None, RemoteCall::UpdateQuestion("q1".into())),
            (SyncOp::Delete, "questions", None, Some("q1"), RemoteCall::DeleteQuestion("q1".into())),
            (SyncOp::Create, "bookmarks", Some(json!(bookmark)), None, RemoteCall::UpsertBookmark("b1".into())),
            (SyncOp::Update, "bookmarks", Some(json!(bookmark)), None, RemoteCall::UpdateBookmark("b1".into())),
            (SyncOp::Delete, "bookmarks", None, Some("b1"), RemoteCall::DeleteBookmark("b1".into())),
            (SyncOp::Create, "interviews", Some(json!(interview)), None, RemoteCall::UpsertInterview("i1".into())),
            (SyncOp::Update, "interviews", Some(json!(interview)), None, RemoteCall::UpdateInterview("i1".into())),
            (SyncOp::Delete, "interviews", None, Some("i1"), RemoteCall::DeleteInterview("i1".into())),
            (SyncOp::Create, "companyNotes", Some(json!(note)), None, RemoteCall::UpsertNote("Acme & Co".into())),
            (SyncOp::Update, "companyNotes", Some(json!(note)), None, RemoteCall::UpsertNote("Acme & Co".into())),
        ];

        for (op, store, data, entity_id, expected) in cases {
            remote.reset_calls();
            let outcome = dispatcher
                .handle_mutation(op, store, data.as_ref(), entity_id)
                .await;
            assert!(matches!(outcome, Ok(Dispatch::Applied)), "{op} {store}");
            assert_eq!(remote.calls(), vec![expected]);
        }
    }
}
