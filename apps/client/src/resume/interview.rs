//! Resume Interview Client: drives turns against `/api/resume-chat`, handles
//! chip clicks, uploads and final submission.
//!
//! Step and profile change only through `InterviewState` methods; this type
//! just performs the I/O around those transitions. Local persistence is
//! best-effort: a failed write is logged and the interview carries on.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::api::{ApiError, ResumeBackend};
use crate::errors::ClientError;
use crate::resume::fields::Field;
use crate::resume::state::{InterviewState, TurnEffects, UploadEffects};
use crate::resume::store::{LocalStore, RESUME_SESSION_ID, RESUME_UPLOAD_ID};
use crate::resume::suggestions::{click, ChipAction, ChipSelection};
use crate::resume::ResumeView;

pub const FINISHED_PLACEHOLDER: &str = "Interview complete.";
pub const SUBMITTED_MESSAGE: &str = "Your resume has been submitted successfully!";
const SUBMIT_FALLBACK_ERROR: &str = "Submission failed. Please try again.";
const UPLOAD_FALLBACK_MESSAGE: &str = "Resume uploaded. I've filled in what I could find.";

pub struct ResumeInterview<B, V> {
    backend: B,
    view: V,
    store: LocalStore,
    state: InterviewState,
    selection: ChipSelection,
    pending_input: String,
    busy: bool,
}

impl<B: ResumeBackend, V: ResumeView> ResumeInterview<B, V> {
    /// Rebuilds the interview from the local store (profile and ids, never the step).
    pub fn restore(backend: B, mut view: V, store: LocalStore) -> Self {
        let profile = store.load_profile();
        let session_id = read_key(&store, RESUME_SESSION_ID);
        let upload_id = read_key(&store, RESUME_UPLOAD_ID);
        if profile.has_values() {
            info!("Restored interview profile from {}", store.path().display());
            view.update_preview(&profile);
            view.reveal_preview();
        }
        Self {
            backend,
            view,
            store,
            state: InterviewState::restored(profile, session_id, upload_id),
            selection: ChipSelection::default(),
            pending_input: String::new(),
            busy: false,
        }
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    #[cfg(test)]
    pub fn state(&self) -> &InterviewState {
        &self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state.finished
    }

    /// Text accumulated by multi-select chips, waiting for the user to send it.
    pub fn pending_input(&self) -> &str {
        &self.pending_input
    }

    /// First contact: a silent turn that establishes (or resumes) the session.
    pub async fn start(&mut self) -> Result<(), ClientError> {
        self.turn("", false).await
    }

    /// Sends a user-typed answer.
    pub async fn send(&mut self, text: &str) -> Result<(), ClientError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ClientError::EmptyMessage);
        }
        if self.state.finished {
            return Err(ClientError::InterviewFinished);
        }
        self.turn(text, true).await
    }

    /// Clicks the `number`-th chip (1-based, as displayed).
    pub async fn click_suggestion(&mut self, number: usize) -> Result<(), ClientError> {
        let Some(chip) = number
            .checked_sub(1)
            .and_then(|i| self.state.suggestions.get(i))
            .cloned()
        else {
            return Err(ClientError::NoSuggestion(number));
        };

        match click(&chip, self.state.active_field(), &mut self.selection) {
            ChipAction::Send(text) => self.send(&text).await,
            ChipAction::SetInput(value) => {
                self.pending_input = value;
                self.view.set_input(&self.pending_input);
                self.view
                    .render_suggestions(&self.state.suggestions, &self.selection);
                Ok(())
            }
        }
    }

    async fn turn(&mut self, message: &str, echo: bool) -> Result<(), ClientError> {
        if self.busy {
            return Err(ClientError::SendInFlight);
        }
        if echo {
            self.view.append_user_message(message);
            self.state.begin_turn();
            self.selection.clear();
            self.pending_input.clear();
            self.view.set_input("");
            self.view.render_suggestions(&[], &self.selection);
        }

        self.busy = true;
        self.view.show_typing(true);
        let result = self.backend.resume_chat(&self.state.request(message)).await;
        self.view.show_typing(false);
        self.busy = false;

        let response = result.map_err(|e| self.transport_failure(e))?;
        let effects = self.state.apply(response);
        self.project_turn(effects)
    }

    fn project_turn(&mut self, effects: TurnEffects) -> Result<(), ClientError> {
        if let Some(error) = effects.error {
            warn!("Interview turn rejected by backend: {error}");
            self.view.append_error(&format!("⚠️ {error}"));
            return Err(ClientError::Backend(error));
        }

        if let Some(reply) = &effects.reply {
            self.view.append_bot_message(reply, false);
        }
        if effects.session_changed {
            if let Some(id) = &self.state.session_id {
                persist(self.store.set(RESUME_SESSION_ID, id));
            }
        }
        if effects.profile_changed {
            persist(self.store.save_profile(&self.state.profile));
            self.view.update_preview(&self.state.profile);
        }
        if effects.step_changed {
            debug!("Interview step is now {}", self.state.step);
        }
        if let Some(question) = &effects.question {
            self.view.append_bot_message(question, true);
        }
        self.view
            .render_suggestions(&effects.suggestions, &self.selection);

        if effects.finished_now {
            info!("Interview finished");
            self.view.reveal_preview();
            self.view.lock_input(FINISHED_PLACEHOLDER);
        }
        Ok(())
    }

    /// Uploads a resume file, merges the extracted fields and re-syncs the
    /// backend's step with a silent turn.
    pub async fn upload(&mut self, path: &Path) -> Result<(), ClientError> {
        if self.busy {
            return Err(ClientError::SendInFlight);
        }
        let contents = tokio::fs::read(path)
            .await
            .map_err(|e| self.transport_failure(ApiError::Io(e)))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "resume".to_string());

        self.busy = true;
        self.view.show_typing(true);
        let result = self.backend.upload_resume(&file_name, contents).await;
        self.view.show_typing(false);
        self.busy = false;

        let response = result.map_err(|e| self.transport_failure(e))?;
        let effects = self.state.apply_upload(response);
        self.project_upload(effects)?;

        self.turn("", false).await
    }

    fn project_upload(&mut self, effects: UploadEffects) -> Result<(), ClientError> {
        if let Some(error) = effects.error {
            warn!("Upload rejected by backend: {error}");
            self.view.append_error(&format!("⚠️ {error}"));
            return Err(ClientError::Backend(error));
        }

        persist(self.store.save_profile(&self.state.profile));
        if effects.upload_id_changed {
            if let Some(id) = &self.state.upload_id {
                persist(self.store.set(RESUME_UPLOAD_ID, id));
            }
        }
        self.view.update_preview(&self.state.profile);
        if effects.reveal_preview {
            self.view.reveal_preview();
        }
        let message = effects
            .message
            .unwrap_or_else(|| UPLOAD_FALLBACK_MESSAGE.to_string());
        self.view.append_bot_message(&message, false);
        Ok(())
    }

    /// Validates locally, then submits the whole profile.
    pub async fn submit(&mut self) -> Result<(), ClientError> {
        if let Err(err) = self.state.validate_submission() {
            self.view.append_error(&err.to_string());
            return Err(err);
        }
        if self.busy {
            return Err(ClientError::SendInFlight);
        }

        self.busy = true;
        let result = self
            .backend
            .submit_resume(&self.state.submit_request())
            .await;
        self.busy = false;

        let response = result.map_err(|e| self.transport_failure(e))?;
        if !response.is_success() {
            let reason = response
                .error
                .unwrap_or_else(|| SUBMIT_FALLBACK_ERROR.to_string());
            warn!("Resume submission rejected: {reason}");
            self.view.append_error(&format!("⚠️ {reason}"));
            return Err(ClientError::Backend(reason));
        }

        info!("Resume submitted");
        persist(self.store.clear_interview());
        self.state = InterviewState::default();
        self.selection.clear();
        self.pending_input.clear();
        self.view.show_success(SUBMITTED_MESSAGE);
        Ok(())
    }

    /// Corrects one field of the preview form. Works after the interview has
    /// finished, so a failed submission can be fixed and retried.
    pub fn edit_field(&mut self, field: Field, value: &str) {
        if !self.state.edit_field(field, value) {
            return;
        }
        info!("Edited {}", field.key());
        persist(self.store.save_profile(&self.state.profile));
        self.view.update_preview(&self.state.profile);
    }

    /// Forgets everything collected so far, locally and in the store.
    pub fn clear_profile(&mut self) -> Result<(), ClientError> {
        self.store.clear_interview()?;
        self.state = InterviewState::default();
        self.selection.clear();
        self.pending_input.clear();
        self.view.set_input("");
        self.view.render_suggestions(&[], &self.selection);
        self.view.update_preview(&self.state.profile);
        info!("Cleared interview profile");
        Ok(())
    }

    fn transport_failure(&mut self, e: ApiError) -> ClientError {
        let err = ClientError::from(e);
        warn!("Resume request failed: {err}");
        self.view.append_error(&err.inline_message());
        err
    }
}

fn read_key(store: &LocalStore, key: &str) -> Option<String> {
    store.get(key).unwrap_or_else(|e| {
        warn!("Ignoring unreadable {key}: {e}");
        None
    })
}

fn persist<E: std::fmt::Display>(result: Result<(), E>) {
    if let Err(e) = result {
        warn!("Local store write failed: {e}");
    }
}
