// Resume interview widget: a backend-driven walk over a fixed field list,
// mirrored into a live preview and a local store.
// The pure transitions live in `state`; `interview` projects them onto I/O.

pub mod fields;
pub mod interview;
pub mod state;
pub mod store;
pub mod suggestions;

pub use interview::ResumeInterview;

use crate::resume::fields::ResumeProfile;
use crate::resume::suggestions::ChipSelection;

/// Rendering layer for the resume widget.
pub trait ResumeView: Send {
    fn append_user_message(&mut self, text: &str);

    /// `formatted` marks text that may carry markup (questions, critiques).
    fn append_bot_message(&mut self, text: &str, formatted: bool);

    fn append_error(&mut self, message: &str);

    fn show_typing(&mut self, typing: bool);

    /// Replaces the chip row; an empty slice clears it.
    fn render_suggestions(&mut self, chips: &[String], selection: &ChipSelection);

    /// Sets the pending text in the input box without sending it.
    fn set_input(&mut self, value: &str);

    fn update_preview(&mut self, profile: &ResumeProfile);

    fn reveal_preview(&mut self);

    fn lock_input(&mut self, placeholder: &str);

    fn show_success(&mut self, message: &str);
}
