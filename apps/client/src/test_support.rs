//! In-memory backends and recording views for controller tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use bytes::Bytes;
use futures::{stream, StreamExt};

use crate::api::types::{
    ChatRequest, Conversation, ResumeChatRequest, ResumeChatResponse, Role, StoredMessage,
    SubmitRequest, SubmitResponse, UploadResponse,
};
use crate::api::{ApiError, ByteStream, ChatBackend, ResumeBackend};
use crate::chat::ChatView;
use crate::resume::fields::ResumeProfile;
use crate::resume::suggestions::ChipSelection;
use crate::resume::ResumeView;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap()
}

/// What `open_chat_stream` hands back.
#[derive(Debug, Clone, Default)]
pub struct StreamScript {
    chunks: Vec<String>,
    hang: bool,
    fail: Option<(u16, String)>,
}

impl StreamScript {
    pub fn chunks(chunks: &[&str]) -> Self {
        Self {
            chunks: chunks.iter().map(|c| c.to_string()).collect(),
            ..Self::default()
        }
    }

    /// Keeps the body open after the scripted chunks instead of ending it.
    pub fn then_hang(mut self) -> Self {
        self.hang = true;
        self
    }

    /// The request itself fails with a non-2xx status.
    pub fn fail(status: u16, message: &str) -> Self {
        Self {
            fail: Some((status, message.to_string())),
            ..Self::default()
        }
    }

    fn open(&self) -> Result<ByteStream, ApiError> {
        if let Some((status, message)) = &self.fail {
            return Err(ApiError::Api {
                status: *status,
                message: message.clone(),
            });
        }
        let chunks: Vec<Result<Bytes, ApiError>> = self
            .chunks
            .iter()
            .map(|c| Ok(Bytes::from(c.clone())))
            .collect();
        let body = stream::iter(chunks);
        if self.hang {
            Ok(body.chain(stream::pending()).boxed())
        } else {
            Ok(body.boxed())
        }
    }
}

#[derive(Default)]
struct ChatBackendState {
    conversations: Vec<Conversation>,
    messages: HashMap<i64, Vec<StoredMessage>>,
    script: StreamScript,
    list_calls: usize,
    listing_fails: bool,
    chat_requests: Vec<ChatRequest>,
}

#[derive(Default)]
pub struct FakeChatBackend {
    state: Mutex<ChatBackendState>,
}

impl FakeChatBackend {
    /// `conversations` in backend order (newest first).
    pub fn with_conversations(conversations: Vec<Conversation>) -> Self {
        let backend = Self::default();
        lock(&backend.state).conversations = conversations;
        backend
    }

    pub fn set_stream(&self, script: StreamScript) {
        lock(&self.state).script = script;
    }

    pub fn set_messages(&self, chat_id: i64, messages: Vec<StoredMessage>) {
        lock(&self.state).messages.insert(chat_id, messages);
    }

    /// Every later `list_conversations` answers with a 500.
    pub fn fail_listing(&self) {
        lock(&self.state).listing_fails = true;
    }

    pub fn list_calls(&self) -> usize {
        lock(&self.state).list_calls
    }

    pub fn chat_requests(&self) -> Vec<ChatRequest> {
        lock(&self.state).chat_requests.clone()
    }

    pub fn conversation_count(&self) -> usize {
        lock(&self.state).conversations.len()
    }
}

#[async_trait]
impl ChatBackend for FakeChatBackend {
    async fn list_conversations(&self) -> Result<Vec<Conversation>, ApiError> {
        let mut state = lock(&self.state);
        state.list_calls += 1;
        if state.listing_fails {
            return Err(ApiError::Api {
                status: 500,
                message: "Internal Server Error".to_string(),
            });
        }
        Ok(state.conversations.clone())
    }

    async fn create_conversation(&self) -> Result<Conversation, ApiError> {
        let mut state = lock(&self.state);
        let id = state.conversations.iter().map(|c| c.id).max().unwrap_or(0) + 1;
        let created = Conversation {
            id,
            title: "New Chat".to_string(),
        };
        state.conversations.insert(0, created.clone());
        Ok(created)
    }

    async fn conversation_messages(&self, chat_id: i64) -> Result<Vec<StoredMessage>, ApiError> {
        Ok(lock(&self.state)
            .messages
            .get(&chat_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn delete_conversation(&self, chat_id: i64) -> Result<(), ApiError> {
        let mut state = lock(&self.state);
        state.conversations.retain(|c| c.id != chat_id);
        state.messages.remove(&chat_id);
        Ok(())
    }

    async fn open_chat_stream(&self, request: &ChatRequest) -> Result<ByteStream, ApiError> {
        let mut state = lock(&self.state);
        state.chat_requests.push(request.clone());
        state.script.open()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    Conversations { ids: Vec<i64>, current: Option<i64> },
    ClearTranscript,
    Message {
        role: Role,
        text: String,
        image: Option<String>,
    },
    BotStarted,
    BotText(String),
    BotError(String),
    Busy(bool),
    Confirm(String),
    Notify(String),
}

pub struct RecordingChatView {
    pub events: Vec<ChatEvent>,
    confirm_answer: bool,
}

impl Default for RecordingChatView {
    fn default() -> Self {
        Self {
            events: Vec::new(),
            confirm_answer: true,
        }
    }
}

impl RecordingChatView {
    /// A view whose user answers "no" to every confirmation.
    pub fn declining() -> Self {
        Self {
            events: Vec::new(),
            confirm_answer: false,
        }
    }

    /// Contents of the most recent bot bubble.
    pub fn bot_text(&self) -> String {
        let mut text = String::new();
        for event in &self.events {
            match event {
                ChatEvent::BotStarted => text.clear(),
                ChatEvent::BotText(t) => text = t.clone(),
                _ => {}
            }
        }
        text
    }

    pub fn errors(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ChatEvent::BotError(m) => Some(m.clone()),
                _ => None,
            })
            .collect()
    }

    /// Every `set_busy` call, in order.
    pub fn busy_changes(&self) -> Vec<bool> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ChatEvent::Busy(b) => Some(*b),
                _ => None,
            })
            .collect()
    }

    pub fn position(&self, wanted: impl Fn(&ChatEvent) -> bool) -> Option<usize> {
        self.events.iter().position(wanted)
    }
}

impl ChatView for RecordingChatView {
    fn render_conversations(&mut self, conversations: &[Conversation], current: Option<i64>) {
        self.events.push(ChatEvent::Conversations {
            ids: conversations.iter().map(|c| c.id).collect(),
            current,
        });
    }

    fn clear_transcript(&mut self) {
        self.events.push(ChatEvent::ClearTranscript);
    }

    fn append_message(&mut self, role: Role, text: &str, image: Option<&str>) {
        self.events.push(ChatEvent::Message {
            role,
            text: text.to_string(),
            image: image.map(str::to_string),
        });
    }

    fn begin_bot_message(&mut self) {
        self.events.push(ChatEvent::BotStarted);
    }

    fn render_bot_text(&mut self, text: &str) {
        self.events.push(ChatEvent::BotText(text.to_string()));
    }

    fn append_bot_error(&mut self, message: &str) {
        self.events.push(ChatEvent::BotError(message.to_string()));
    }

    fn set_busy(&mut self, busy: bool) {
        self.events.push(ChatEvent::Busy(busy));
    }

    fn confirm(&mut self, prompt: &str) -> bool {
        self.events.push(ChatEvent::Confirm(prompt.to_string()));
        self.confirm_answer
    }

    fn notify(&mut self, message: &str) {
        self.events.push(ChatEvent::Notify(message.to_string()));
    }
}

#[derive(Default)]
struct ResumeBackendState {
    turns: VecDeque<ResumeChatResponse>,
    turn_requests: Vec<ResumeChatRequest>,
    upload: Option<UploadResponse>,
    uploads: Vec<(String, usize)>,
    submit: Option<SubmitResponse>,
    submissions: Vec<serde_json::Value>,
}

/// Answers turns from a queue; an empty queue answers with a 503.
#[derive(Default)]
pub struct FakeResumeBackend {
    state: Mutex<ResumeBackendState>,
}

impl FakeResumeBackend {
    pub fn push_turn(&self, response: ResumeChatResponse) {
        lock(&self.state).turns.push_back(response);
    }

    pub fn set_upload(&self, response: UploadResponse) {
        lock(&self.state).upload = Some(response);
    }

    pub fn set_submit(&self, response: SubmitResponse) {
        lock(&self.state).submit = Some(response);
    }

    pub fn turn_requests(&self) -> Vec<ResumeChatRequest> {
        lock(&self.state).turn_requests.clone()
    }

    pub fn uploads(&self) -> Vec<(String, usize)> {
        lock(&self.state).uploads.clone()
    }

    /// Submitted bodies as they would appear on the wire.
    pub fn submissions(&self) -> Vec<serde_json::Value> {
        lock(&self.state).submissions.clone()
    }
}

fn unavailable() -> ApiError {
    ApiError::Api {
        status: 503,
        message: "Service Unavailable".to_string(),
    }
}

#[async_trait]
impl ResumeBackend for FakeResumeBackend {
    async fn resume_chat(
        &self,
        request: &ResumeChatRequest,
    ) -> Result<ResumeChatResponse, ApiError> {
        let mut state = lock(&self.state);
        state.turn_requests.push(request.clone());
        state.turns.pop_front().ok_or_else(unavailable)
    }

    async fn upload_resume(
        &self,
        file_name: &str,
        contents: Vec<u8>,
    ) -> Result<UploadResponse, ApiError> {
        let mut state = lock(&self.state);
        state.uploads.push((file_name.to_string(), contents.len()));
        state.upload.clone().ok_or_else(unavailable)
    }

    async fn submit_resume(&self, request: &SubmitRequest<'_>) -> Result<SubmitResponse, ApiError> {
        let mut state = lock(&self.state);
        state.submissions.push(serde_json::to_value(request)?);
        state.submit.clone().ok_or_else(unavailable)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResumeEvent {
    User(String),
    Bot(String, bool),
    Error(String),
    Typing(bool),
    Chips(Vec<String>),
    Input(String),
    Preview(ResumeProfile),
    PreviewRevealed,
    Locked(String),
    Success(String),
}

#[derive(Default)]
pub struct RecordingResumeView {
    pub events: Vec<ResumeEvent>,
}

impl RecordingResumeView {
    pub fn errors(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ResumeEvent::Error(m) => Some(m.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn last_preview(&self) -> Option<ResumeProfile> {
        self.events.iter().rev().find_map(|e| match e {
            ResumeEvent::Preview(p) => Some(p.clone()),
            _ => None,
        })
    }

    pub fn last_chips(&self) -> Vec<String> {
        self.events
            .iter()
            .rev()
            .find_map(|e| match e {
                ResumeEvent::Chips(c) => Some(c.clone()),
                _ => None,
            })
            .unwrap_or_default()
    }

    pub fn last_input(&self) -> Option<String> {
        self.events.iter().rev().find_map(|e| match e {
            ResumeEvent::Input(v) => Some(v.clone()),
            _ => None,
        })
    }

    pub fn typing(&self) -> bool {
        self.events
            .iter()
            .rev()
            .find_map(|e| match e {
                ResumeEvent::Typing(t) => Some(*t),
                _ => None,
            })
            .unwrap_or(false)
    }
}

impl ResumeView for RecordingResumeView {
    fn append_user_message(&mut self, text: &str) {
        self.events.push(ResumeEvent::User(text.to_string()));
    }

    fn append_bot_message(&mut self, text: &str, formatted: bool) {
        self.events
            .push(ResumeEvent::Bot(text.to_string(), formatted));
    }

    fn append_error(&mut self, message: &str) {
        self.events.push(ResumeEvent::Error(message.to_string()));
    }

    fn show_typing(&mut self, typing: bool) {
        self.events.push(ResumeEvent::Typing(typing));
    }

    fn render_suggestions(&mut self, chips: &[String], _selection: &ChipSelection) {
        self.events.push(ResumeEvent::Chips(chips.to_vec()));
    }

    fn set_input(&mut self, value: &str) {
        self.events.push(ResumeEvent::Input(value.to_string()));
    }

    fn update_preview(&mut self, profile: &ResumeProfile) {
        self.events.push(ResumeEvent::Preview(profile.clone()));
    }

    fn reveal_preview(&mut self) {
        self.events.push(ResumeEvent::PreviewRevealed);
    }

    fn lock_input(&mut self, placeholder: &str) {
        self.events.push(ResumeEvent::Locked(placeholder.to_string()));
    }

    fn show_success(&mut self, message: &str) {
        self.events.push(ResumeEvent::Success(message.to_string()));
    }
}
