use thiserror::Error;

use crate::api::ApiError;
use crate::resume::fields::Field;
use crate::resume::store::StoreError;

/// Client-level error type shared by both widgets.
///
/// A user-initiated stop is not an error; it surfaces as `StreamEnd::Aborted`.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Network error: {0}")]
    Transport(#[from] ApiError),

    #[error("{0}")]
    Backend(String),

    #[error("Please fill in the missing fields: {}", labels(.0))]
    MissingFields(Vec<Field>),

    #[error("A request is already in flight")]
    SendInFlight,

    #[error("Please select a chat first.")]
    NoActiveConversation,

    #[error("Nothing to send")]
    EmptyMessage,

    #[error("The interview is complete")]
    InterviewFinished,

    #[error("No suggestion numbered {0}")]
    NoSuggestion(usize),

    #[error("Image error: {0}")]
    Image(String),

    #[error("Local storage error: {0}")]
    Store(#[from] StoreError),
}

fn labels(fields: &[Field]) -> String {
    fields
        .iter()
        .map(|f| f.label())
        .collect::<Vec<_>>()
        .join(", ")
}

impl ClientError {
    /// Text shown inline in the transcript for this error.
    pub fn inline_message(&self) -> String {
        match self {
            ClientError::Transport(e) => format!("Error: {e}"),
            other => other.to_string(),
        }
    }
}
