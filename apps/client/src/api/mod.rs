//! API client: the single point of entry for all backend HTTP traffic.
//!
//! ARCHITECTURAL RULE: controllers never touch reqwest directly. They are
//! written against `ChatBackend` / `ResumeBackend`, which `ApiClient`
//! implements for the real backend and tests implement with fakes.
//!
//! No request carries a timeout and nothing is retried automatically: a hung
//! request stays pending until the user aborts it.

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt, TryStreamExt};
use reqwest::{multipart, Client, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub mod types;

use types::{
    ChatRequest, Conversation, ResumeChatRequest, ResumeChatResponse, StoredMessage,
    SubmitRequest, SubmitResponse, UploadResponse,
};

/// Raw body of a streaming response, chunked as it arrives off the wire.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, ApiError>> + Send>>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Conversation list + streaming completion endpoints used by the chat widget.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn list_conversations(&self) -> Result<Vec<Conversation>, ApiError>;

    async fn create_conversation(&self) -> Result<Conversation, ApiError>;

    async fn conversation_messages(&self, chat_id: i64) -> Result<Vec<StoredMessage>, ApiError>;

    async fn delete_conversation(&self, chat_id: i64) -> Result<(), ApiError>;

    /// Opens `POST /chat` and hands back the undecoded event-stream body.
    async fn open_chat_stream(&self, request: &ChatRequest) -> Result<ByteStream, ApiError>;
}

/// Interview, upload and submission endpoints used by the resume widget.
#[async_trait]
pub trait ResumeBackend: Send + Sync {
    async fn resume_chat(&self, request: &ResumeChatRequest)
        -> Result<ResumeChatResponse, ApiError>;

    async fn upload_resume(
        &self,
        file_name: &str,
        contents: Vec<u8>,
    ) -> Result<UploadResponse, ApiError>;

    async fn submit_resume(&self, request: &SubmitRequest<'_>) -> Result<SubmitResponse, ApiError>;
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// The HTTP client shared by both widgets.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        Ok(Self {
            client: Client::builder().build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        debug!("GET {path}");
        let response = self.client.get(self.url(path)).send().await?;
        let response = ensure_success(response).await?;
        Ok(response.json().await?)
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        debug!("POST {path}");
        let response = self.client.post(self.url(path)).json(body).send().await?;
        read_json_lenient(response).await
    }
}

#[async_trait]
impl ChatBackend for ApiClient {
    async fn list_conversations(&self) -> Result<Vec<Conversation>, ApiError> {
        self.get_json("/api/conversations").await
    }

    async fn create_conversation(&self) -> Result<Conversation, ApiError> {
        debug!("POST /api/conversations");
        let response = self
            .client
            .post(self.url("/api/conversations"))
            .send()
            .await?;
        let response = ensure_success(response).await?;
        Ok(response.json().await?)
    }

    async fn conversation_messages(&self, chat_id: i64) -> Result<Vec<StoredMessage>, ApiError> {
        self.get_json(&format!("/api/conversations/{chat_id}/messages"))
            .await
    }

    async fn delete_conversation(&self, chat_id: i64) -> Result<(), ApiError> {
        debug!("DELETE /api/conversations/{chat_id}");
        let response = self
            .client
            .delete(self.url(&format!("/api/conversations/{chat_id}")))
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn open_chat_stream(&self, request: &ChatRequest) -> Result<ByteStream, ApiError> {
        debug!("POST /chat (chat_id={})", request.chat_id);
        let response = self
            .client
            .post(self.url("/chat"))
            .json(request)
            .send()
            .await?;
        let response = ensure_success(response).await?;
        Ok(response.bytes_stream().map_err(ApiError::Http).boxed())
    }
}

#[async_trait]
impl ResumeBackend for ApiClient {
    async fn resume_chat(
        &self,
        request: &ResumeChatRequest,
    ) -> Result<ResumeChatResponse, ApiError> {
        self.post_json("/api/resume-chat", request).await
    }

    async fn upload_resume(
        &self,
        file_name: &str,
        contents: Vec<u8>,
    ) -> Result<UploadResponse, ApiError> {
        debug!("POST /api/upload-resume ({file_name}, {} bytes)", contents.len());
        let part = multipart::Part::bytes(contents).file_name(file_name.to_string());
        let form = multipart::Form::new().part("file", part);
        let response = self
            .client
            .post(self.url("/api/upload-resume"))
            .multipart(form)
            .send()
            .await?;
        read_json_lenient(response).await
    }

    async fn submit_resume(&self, request: &SubmitRequest<'_>) -> Result<SubmitResponse, ApiError> {
        self.post_json("/api/submit-resume", request).await
    }
}

async fn ensure_success(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ApiError::Api {
        status: status.as_u16(),
        message: error_message(&body),
    })
}

/// The resume endpoints report logical failures as an `error` field, sometimes
/// with a non-2xx status. A body that still parses as `T` is handed back so the
/// caller can surface the backend's own reason.
async fn read_json_lenient<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let status = response.status();
    let body = response.text().await?;
    if status.is_success() {
        return Ok(serde_json::from_str(&body)?);
    }
    serde_json::from_str(&body).map_err(|_| ApiError::Api {
        status: status.as_u16(),
        message: error_message(&body),
    })
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .map(|e| e.error)
        .unwrap_or_else(|_| body.trim().to_string())
}
