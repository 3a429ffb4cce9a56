use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use libsql::Connection;
use prep_core::db::{Database, LibSqlTable, Record};
use prep_core::models::{Bookmark, CompanyNote, Interview, Question, StoreName};
use prep_core::remote::{DeleteAck, PullResponse, PushAck, PushBatch, RecordAck};
use prep_core::util::unix_millis_now;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::AppError;

#[derive(Clone)]
pub struct AppState {
    db: Arc<Mutex<Database>>,
}

impl AppState {
    pub fn new(db: Database) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
        }
    }
}

/// A record kind served under `/api/{kind}`
trait Entity: Record + Send + Sync + 'static {
    const KIND: &'static str;

    fn set_key(&mut self, key: String);
}

impl Entity for Question {
    const KIND: &'static str = "question";

    fn set_key(&mut self, key: String) {
        self.id = key;
    }
}

impl Entity for Bookmark {
    const KIND: &'static str = "bookmark";

    fn set_key(&mut self, key: String) {
        self.id = key;
    }
}

impl Entity for Interview {
    const KIND: &'static str = "interview";

    fn set_key(&mut self, key: String) {
        self.id = key;
    }
}

pub fn app_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(healthz))
        .route(
            "/questions",
            get(list_records::<Question>).post(create_record::<Question>),
        )
        .route(
            "/questions/{id}",
            put(update_record::<Question>).delete(delete_record::<Question>),
        )
        .route(
            "/bookmarks",
            get(list_records::<Bookmark>).post(create_record::<Bookmark>),
        )
        .route(
            "/bookmarks/{id}",
            put(update_record::<Bookmark>).delete(delete_record::<Bookmark>),
        )
        .route(
            "/interviews",
            get(list_records::<Interview>).post(create_record::<Interview>),
        )
        .route(
            "/interviews/{id}",
            put(update_record::<Interview>).delete(delete_record::<Interview>),
        )
        .route("/notes/{company}", get(get_note).put(put_note))
        .route("/sync/pull", post(sync_pull))
        .route("/sync/push", post(sync_push));

    Router::new()
        .route("/healthz", get(healthz))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_headers(Any)
                .allow_methods(Any),
        )
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: i64,
}

async fn healthz() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: unix_millis_now(),
    })
}

async fn list_records<T: Entity>(State(state): State<AppState>) -> Result<Json<Vec<T>>, AppError> {
    let db = state.db.lock().await;
    let records = LibSqlTable::<T>::new(db.connection()).list().await?;
    Ok(Json(records))
}

async fn create_record<T: Entity>(
    State(state): State<AppState>,
    payload: Result<Json<T>, JsonRejection>,
) -> Result<(StatusCode, Json<RecordAck>), AppError> {
    let Json(record) = payload.map_err(|rejection| AppError::bad_request(rejection.body_text()))?;
    if record.key().trim().is_empty() {
        return Err(AppError::bad_request(format!("{} id must not be empty", T::KIND)));
    }

    let db = state.db.lock().await;
    LibSqlTable::<T>::new(db.connection()).put(&record).await?;
    tracing::debug!(kind = T::KIND, id = record.key(), "Upserted record");
    Ok((
        StatusCode::CREATED,
        Json(RecordAck {
            id: record.key().to_string(),
        }),
    ))
}

async fn update_record<T: Entity>(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<T>, JsonRejection>,
) -> Result<Json<RecordAck>, AppError> {
    let Json(mut record) =
        payload.map_err(|rejection| AppError::bad_request(rejection.body_text()))?;
    record.set_key(id.clone());

    let db = state.db.lock().await;
    LibSqlTable::<T>::new(db.connection()).put(&record).await?;
    tracing::debug!(kind = T::KIND, id = %id, "Updated record");
    Ok(Json(RecordAck { id }))
}

async fn delete_record<T: Entity>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteAck>, AppError> {
    let db = state.db.lock().await;
    // Deletes are idempotent; a missing row still reports success
    let removed = LibSqlTable::<T>::new(db.connection()).delete(&id).await?;
    tracing::debug!(kind = T::KIND, id = %id, removed, "Deleted record");
    Ok(Json(DeleteAck { deleted: true }))
}

async fn get_note(
    State(state): State<AppState>,
    Path(company): Path<String>,
) -> Result<Json<CompanyNote>, AppError> {
    let db = state.db.lock().await;
    LibSqlTable::<CompanyNote>::new(db.connection())
        .get(&company)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Not found"))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NoteBody {
    content: Option<String>,
    updated_at: Option<i64>,
}

async fn put_note(
    State(state): State<AppState>,
    Path(company): Path<String>,
    payload: Result<Json<NoteBody>, JsonRejection>,
) -> Result<Json<CompanyNote>, AppError> {
    let Json(body) = payload.map_err(|rejection| AppError::bad_request(rejection.body_text()))?;
    let (Some(content), Some(updated_at)) = (body.content, body.updated_at) else {
        return Err(AppError::bad_request(
            "Missing required fields: content, updatedAt",
        ));
    };

    let note = CompanyNote {
        company,
        content,
        updated_at,
    };
    let db = state.db.lock().await;
    LibSqlTable::<CompanyNote>::new(db.connection())
        .put(&note)
        .await?;
    Ok(Json(note))
}

async fn sync_pull(State(state): State<AppState>) -> Result<Json<PullResponse>, AppError> {
    let db = state.db.lock().await;
    let conn = db.connection();
    let response = PullResponse {
        questions: LibSqlTable::<Question>::new(conn).list().await?,
        bookmarks: LibSqlTable::<Bookmark>::new(conn).list().await?,
        interviews: LibSqlTable::<Interview>::new(conn).list().await?,
        notes: LibSqlTable::<CompanyNote>::new(conn).list().await?,
    };
    Ok(Json(response))
}

async fn sync_push(
    State(state): State<AppState>,
    payload: Result<Json<PushBatch>, JsonRejection>,
) -> Result<Json<PushAck>, AppError> {
    let Json(batch) = payload.map_err(|rejection| AppError::bad_request(rejection.body_text()))?;

    let db = state.db.lock().await;
    let conn = db.connection();
    conn.execute("BEGIN TRANSACTION", ()).await?;
    if let Err(error) = apply_batch(conn, &batch).await {
        conn.execute("ROLLBACK", ()).await.ok();
        return Err(error);
    }
    if let Err(error) = conn.execute("COMMIT", ()).await {
        conn.execute("ROLLBACK", ()).await.ok();
        return Err(error.into());
    }

    tracing::info!(records = batch.len(), "Applied sync push");
    Ok(Json(PushAck { success: true }))
}

async fn apply_batch(conn: &Connection, batch: &PushBatch) -> Result<(), AppError> {
    put_all(conn, &batch.questions).await?;
    put_all(conn, &batch.bookmarks).await?;
    put_all(conn, &batch.interviews).await?;
    put_all(conn, &batch.notes).await?;

    for deletion in &batch.deletions {
        match deletion.store {
            StoreName::Questions => {
                LibSqlTable::<Question>::new(conn).delete(&deletion.id).await?;
            }
            StoreName::Bookmarks => {
                LibSqlTable::<Bookmark>::new(conn).delete(&deletion.id).await?;
            }
            StoreName::Interviews => {
                LibSqlTable::<Interview>::new(conn).delete(&deletion.id).await?;
            }
            StoreName::CompanyNotes => {
                tracing::debug!(company = %deletion.id, "Ignoring company note deletion");
            }
        }
    }
    Ok(())
}

async fn put_all<T: Record>(conn: &Connection, records: &[T]) -> Result<(), AppError> {
    let table = LibSqlTable::<T>::new(conn);
    for record in records {
        table.put(record).await?;
    }
    Ok(())
}
