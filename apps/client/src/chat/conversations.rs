//! Conversation List Manager: a transient cache of the backend's chat list
//! plus the currently selected id. The backend owns every record.

use tracing::{debug, info};

use crate::api::types::{Conversation, Role};
use crate::api::ChatBackend;
use crate::chat::session::ChatSession;
use crate::chat::ChatView;
use crate::errors::ClientError;

pub const EMPTY_CHAT_PLACEHOLDER: &str = "Start a new conversation!";
pub const DELETE_PROMPT: &str = "Delete this chat?";

#[derive(Debug, Clone, Default)]
pub struct ConversationList {
    items: Vec<Conversation>,
    current: Option<i64>,
}

/// Where to go after deleting a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfterDelete {
    /// The deleted chat was not active; just refresh.
    Stay,
    /// Load the first remaining chat.
    Load(i64),
    /// Nothing left; create a replacement.
    Create,
}

impl ConversationList {
    pub fn current(&self) -> Option<i64> {
        self.current
    }

    pub fn items(&self) -> &[Conversation] {
        &self.items
    }

    pub fn replace(&mut self, items: Vec<Conversation>) {
        self.items = items;
    }

    pub fn select(&mut self, chat_id: i64) {
        self.current = Some(chat_id);
    }

    pub fn set_title(&mut self, chat_id: i64, title: &str) {
        if let Some(item) = self.items.iter_mut().find(|c| c.id == chat_id) {
            item.title = title.to_string();
        }
    }

    /// Drops `deleted` from the cache and decides what becomes active.
    pub fn remove(&mut self, deleted: i64) -> AfterDelete {
        self.items.retain(|c| c.id != deleted);
        if self.current != Some(deleted) {
            return AfterDelete::Stay;
        }
        self.current = None;
        match self.items.first() {
            Some(first) => AfterDelete::Load(first.id),
            None => AfterDelete::Create,
        }
    }
}

impl<B: ChatBackend, V: ChatView> ChatSession<B, V> {
    /// Re-fetches the list and re-renders the sidebar.
    pub async fn refresh_conversations(&mut self) -> Result<(), ClientError> {
        let items = self.backend.list_conversations().await?;
        debug!("Loaded {} conversations", items.len());
        self.conversations.replace(items);
        self.view
            .render_conversations(self.conversations.items(), self.conversations.current());
        Ok(())
    }

    /// Creates a conversation, refreshes the list and opens the new chat.
    pub async fn new_chat(&mut self) -> Result<i64, ClientError> {
        let created = self.backend.create_conversation().await?;
        info!("Created conversation {}", created.id);
        self.reset_input();
        self.refresh_conversations().await?;
        self.select_chat(created.id).await?;
        Ok(created.id)
    }

    /// Makes `chat_id` active and replays its stored messages in order.
    pub async fn select_chat(&mut self, chat_id: i64) -> Result<(), ClientError> {
        self.conversations.select(chat_id);
        self.view
            .render_conversations(self.conversations.items(), Some(chat_id));
        self.view.clear_transcript();

        let messages = self.backend.conversation_messages(chat_id).await?;
        if messages.is_empty() {
            self.view
                .append_message(Role::Assistant, EMPTY_CHAT_PLACEHOLDER, None);
        }
        for message in &messages {
            self.view
                .append_message(message.role, &message.content, message.image.as_deref());
        }
        Ok(())
    }

    /// Deletes after the user confirms. Returns `false` if they declined.
    pub async fn delete_chat(&mut self, chat_id: i64) -> Result<bool, ClientError> {
        if !self.view.confirm(DELETE_PROMPT) {
            return Ok(false);
        }
        self.backend.delete_conversation(chat_id).await?;
        info!("Deleted conversation {chat_id}");

        match self.conversations.remove(chat_id) {
            AfterDelete::Stay => self.refresh_conversations().await?,
            AfterDelete::Load(next) => {
                self.refresh_conversations().await?;
                self.select_chat(next).await?;
            }
            AfterDelete::Create => {
                self.new_chat().await?;
            }
        }
        Ok(true)
    }
}
