//! Wire types for every backend endpoint the two widgets consume.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::resume::fields::ResumeProfile;

// ────────────────────────────────────────────────────────────────────────────
// Conversations and the streaming chat endpoint
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: i64,
    pub title: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    // Persisted bot turns are stored under the model's own role name.
    #[serde(alias = "model")]
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub role: Role,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(default)]
    pub image: Option<String>,
}

/// Body of `POST /chat`. `image` is always present, `null` when nothing is attached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub chat_id: i64,
    pub message: String,
    pub image: Option<String>,
    pub temperature: f64,
}

/// One JSON payload carried on a `data: ` line of the chat event stream.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StreamFragment {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Resume interview endpoints
// ────────────────────────────────────────────────────────────────────────────

/// Body of `POST /api/resume-chat`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResumeChatRequest {
    pub message: String,
    pub step: i32,
    pub data: ResumeProfile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ResumeChatResponse {
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub suggestions: Vec<String>,
    #[serde(default)]
    pub next_step: Option<i32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub keep_step: bool,
    #[serde(default)]
    pub data: Option<ResumeProfile>,
    #[serde(default, deserialize_with = "opaque_id")]
    pub session_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub finished: bool,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub data: Option<ResumeProfile>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "opaque_id")]
    pub resume_id: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Body of `POST /api/submit-resume`: the whole profile plus the two correlation ids.
#[derive(Debug, Clone, Serialize)]
pub struct SubmitRequest<'a> {
    #[serde(flatten)]
    pub profile: &'a ResumeProfile,
    pub resume_session_id: Option<&'a str>,
    pub upload_resume_id: Option<&'a str>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SubmitResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl SubmitResponse {
    pub fn is_success(&self) -> bool {
        self.status.as_deref() == Some("success")
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Ids are opaque to the client; accept either a JSON string or a number.
fn opaque_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
