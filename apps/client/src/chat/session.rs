//! Streaming Chat Session: one cancellable send at a time.
//!
//! Lifecycle: built once at startup, reset on "new chat". All state that was
//! ambient in the page (current chat, attachment, abort handle) lives here and
//! is reached through `&mut self` from the input loop.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::types::{ChatRequest, Role};
use crate::api::ChatBackend;
use crate::chat::conversations::ConversationList;
use crate::chat::image::load_image;
use crate::chat::stream::{StreamEnd, StreamReader};
use crate::chat::ChatView;
use crate::errors::ClientError;

/// Result of a send that reached the backend (or was stopped before it could).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendOutcome {
    /// Everything rendered into the bot bubble.
    pub text: String,
    pub end: StreamEnd,
}

/// Stops the in-flight send from outside the session (e.g. a Ctrl-C watcher).
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    slot: Arc<Mutex<Option<CancellationToken>>>,
}

impl StopHandle {
    /// Aborts the in-flight request, if any. Returns whether one was running.
    pub fn stop(&self) -> bool {
        match self.lock().as_ref() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    #[cfg(test)]
    pub fn is_busy(&self) -> bool {
        self.lock().is_some()
    }

    /// Claims the single in-flight slot. A second claim is rejected.
    fn begin(&self) -> Result<CancellationToken, ClientError> {
        let mut slot = self.lock();
        if slot.is_some() {
            return Err(ClientError::SendInFlight);
        }
        let token = CancellationToken::new();
        *slot = Some(token.clone());
        Ok(token)
    }

    fn finish(&self) {
        self.lock().take();
    }

    fn lock(&self) -> MutexGuard<'_, Option<CancellationToken>> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

pub struct ChatSession<B, V> {
    pub(crate) backend: B,
    pub(crate) view: V,
    pub(crate) conversations: ConversationList,
    attachment: Option<String>,
    temperature: f64,
    inflight: StopHandle,
}

impl<B: ChatBackend, V: ChatView> ChatSession<B, V> {
    pub fn new(backend: B, view: V, temperature: f64) -> Self {
        Self {
            backend,
            view,
            conversations: ConversationList::default(),
            attachment: None,
            temperature,
            inflight: StopHandle::default(),
        }
    }

    #[cfg(test)]
    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn current_chat(&self) -> Option<i64> {
        self.conversations.current()
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn set_temperature(&mut self, temperature: f64) {
        self.temperature = temperature;
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.inflight.clone()
    }

    pub fn has_attachment(&self) -> bool {
        self.attachment.is_some()
    }

    pub async fn attach_image(&mut self, path: &Path) -> Result<(), ClientError> {
        match load_image(path).await {
            Ok(uri) => {
                self.attachment = Some(uri);
                self.view.notify(&format!("Attached {}", path.display()));
                Ok(())
            }
            Err(e) => {
                self.view.notify(&e.to_string());
                Err(e)
            }
        }
    }

    pub fn clear_image(&mut self) {
        self.attachment = None;
    }

    /// Drops per-conversation input state when switching to a fresh chat.
    pub(crate) fn reset_input(&mut self) {
        self.attachment = None;
    }

    /// Sends `text` (and the attached image, if any) to the active conversation
    /// and streams the reply into a new bot bubble.
    ///
    /// Precondition failures return `Err` without touching the transcript. Once
    /// the user message is appended, every ending is reported as `Ok`: a stop
    /// leaves the partial reply as-is, any other failure is rendered inline.
    pub async fn send_message(&mut self, text: &str) -> Result<SendOutcome, ClientError> {
        let text = text.trim();
        if text.is_empty() && self.attachment.is_none() {
            return Err(ClientError::EmptyMessage);
        }
        let Some(chat_id) = self.conversations.current() else {
            let err = ClientError::NoActiveConversation;
            self.view.notify(&err.to_string());
            return Err(err);
        };
        let cancel = self.inflight.begin()?;

        let image = self.attachment.take();
        self.view.append_message(Role::User, text, image.as_deref());
        self.view.begin_bot_message();
        self.view.set_busy(true);

        let request = ChatRequest {
            chat_id,
            message: text.to_string(),
            image,
            temperature: self.temperature,
        };
        let outcome = self.stream_reply(&request, &cancel).await;

        self.inflight.finish();
        self.view.set_busy(false);

        if let StreamEnd::Done { title } = &outcome.end {
            if let Some(title) = title {
                self.conversations.set_title(chat_id, title);
            }
            // The backend may have derived a title from this exchange.
            if let Err(e) = self.refresh_conversations().await {
                warn!("Conversation list refresh failed: {e}");
                self.view.render_conversations(
                    self.conversations.items(),
                    self.conversations.current(),
                );
            }
        }
        Ok(outcome)
    }

    async fn stream_reply(
        &mut self,
        request: &ChatRequest,
        cancel: &CancellationToken,
    ) -> SendOutcome {
        let opened = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            result = self.backend.open_chat_stream(request) => Some(result),
        };
        let stream = match opened {
            None => {
                info!("Chat {} stopped before the stream opened", request.chat_id);
                return SendOutcome {
                    text: String::new(),
                    end: StreamEnd::Aborted,
                };
            }
            Some(Ok(stream)) => stream,
            Some(Err(e)) => {
                let err = ClientError::from(e);
                warn!("Chat request failed: {err}");
                self.view.append_bot_error(&err.inline_message());
                return SendOutcome {
                    text: String::new(),
                    end: StreamEnd::Failed(err.to_string()),
                };
            }
        };

        let view = &mut self.view;
        let mut reader = StreamReader::default();
        let result = reader
            .run(stream, cancel, |text| view.render_bot_text(text))
            .await;

        let end = match result {
            Ok(StreamEnd::Failed(message)) => {
                warn!("Backend reported a stream error: {message}");
                self.view.append_bot_error(&format!("Error: {message}"));
                StreamEnd::Failed(message)
            }
            Ok(StreamEnd::Aborted) => {
                info!("Chat {} stopped by user", request.chat_id);
                StreamEnd::Aborted
            }
            Ok(end) => {
                debug!("Chat {} stream ended: {end:?}", request.chat_id);
                end
            }
            Err(e) => {
                let err = ClientError::from(e);
                warn!("Chat stream broke off: {err}");
                self.view.append_bot_error(&err.inline_message());
                StreamEnd::Failed(err.to_string())
            }
        };

        SendOutcome {
            text: reader.into_text(),
            end,
        }
    }
}
