//! reqwest-backed remote client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{DeleteAck, PullResponse, PushAck, PushBatch, RecordAck, RemoteClient};
use crate::error::{Error, Result};
use crate::models::{Bookmark, CompanyNote, Interview, Question};
use crate::util::{is_http_url, normalize_text_option};

/// Remote client speaking the preptrack JSON API
#[derive(Debug, Clone)]
pub struct HttpRemoteClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpRemoteClient {
    /// Build a client rooted at `base_url` (e.g. `http://localhost:3001/api`)
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        let base_url = normalize_base_url(base_url.into())?;
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            base_url,
            client: builder.build()?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn send<B, R>(&self, method: Method, path: &str, body: Option<&B>) -> Option<R>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let url = format!("{}{path}", self.base_url);
        let mut request = self
            .client
            .request(method.clone(), &url)
            .header("Accept", "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(error) => {
                tracing::debug!(%method, %url, "Remote request failed: {error}");
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(%method, %url, status = status.as_u16(), "Remote rejected request");
            return None;
        }

        match response.json::<R>().await {
            Ok(payload) => Some(payload),
            Err(error) => {
                tracing::warn!(%method, %url, "Undecodable remote response: {error}");
                None
            }
        }
    }

    async fn send_empty<R: DeserializeOwned>(&self, method: Method, path: &str) -> Option<R> {
        self.send::<(), R>(method, path, None).await
    }
}

#[async_trait]
impl RemoteClient for HttpRemoteClient {
    async fn pull(&self) -> Option<PullResponse> {
        self.send_empty(Method::POST, "/sync/pull").await
    }

    async fn push(&self, batch: &PushBatch) -> Option<PushAck> {
        self.send(Method::POST, "/sync/push", Some(batch)).await
    }

    async fn upsert_question(&self, question: &Question) -> Option<RecordAck> {
        self.send(Method::POST, "/questions", Some(question)).await
    }

    async fn update_question(&self, id: &str, question: &Question) -> Option<RecordAck> {
        self.send(Method::PUT, &record_path("questions", id), Some(question))
            .await
    }

    async fn delete_question(&self, id: &str) -> Option<DeleteAck> {
        self.send_empty(Method::DELETE, &record_path("questions", id))
            .await
    }

    async fn upsert_bookmark(&self, bookmark: &Bookmark) -> Option<RecordAck> {
        self.send(Method::POST, "/bookmarks", Some(bookmark)).await
    }

    async fn update_bookmark(&self, id: &str, bookmark: &Bookmark) -> Option<RecordAck> {
        self.send(Method::PUT, &record_path("bookmarks", id), Some(bookmark))
            .await
    }

    async fn delete_bookmark(&self, id: &str) -> Option<DeleteAck> {
        self.send_empty(Method::DELETE, &record_path("bookmarks", id))
            .await
    }

    async fn upsert_interview(&self, interview: &Interview) -> Option<RecordAck> {
        self.send(Method::POST, "/interviews", Some(interview)).await
    }

    async fn update_interview(&self, id: &str, interview: &Interview) -> Option<RecordAck> {
        self.send(Method::PUT, &record_path("interviews", id), Some(interview))
            .await
    }

    async fn delete_interview(&self, id: &str) -> Option<DeleteAck> {
        self.send_empty(Method::DELETE, &record_path("interviews", id))
            .await
    }

    async fn upsert_note(&self, company: &str, note: &CompanyNote) -> Option<CompanyNote> {
        self.send(Method::PUT, &record_path("notes", company), Some(note))
            .await
    }
}

fn record_path(kind: &str, key: &str) -> String {
    format!("/{kind}/{}", urlencoding::encode(key))
}

fn normalize_base_url(raw: String) -> Result<String> {
    let base_url = normalize_text_option(Some(raw))
        .ok_or_else(|| Error::InvalidInput("remote base URL must not be empty".to_string()))?;
    if is_http_url(&base_url) {
        Ok(base_url.trim_end_matches('/').to_string())
    } else {
        Err(Error::InvalidInput(
            "remote base URL must include http:// or https://".to_string(),
        ))
    }
}
