// Streaming chat widget: conversation sidebar + one cancellable completion stream.
// Controllers talk to the backend only through `ChatBackend` and draw only
// through `ChatView`.

pub mod conversations;
pub mod image;
pub mod session;
pub mod stream;

pub use session::{ChatSession, StopHandle};

use crate::api::types::{Conversation, Role};

/// Rendering layer for the chat widget.
pub trait ChatView: Send {
    fn render_conversations(&mut self, conversations: &[Conversation], current: Option<i64>);

    fn clear_transcript(&mut self);

    fn append_message(&mut self, role: Role, text: &str, image: Option<&str>);

    /// Opens an empty bot bubble that subsequent `render_bot_text` calls fill.
    fn begin_bot_message(&mut self);

    /// Replaces the open bot bubble's contents with `text` (the full reply so far).
    fn render_bot_text(&mut self, text: &str);

    fn append_bot_error(&mut self, message: &str);

    /// Send hidden / stop shown while `busy`.
    fn set_busy(&mut self, busy: bool);

    fn confirm(&mut self, prompt: &str) -> bool;

    fn notify(&mut self, message: &str);
}
