//! Pure interview state transitions: (state, backend response) → (state', effects).
//!
//! Nothing here performs I/O. The controller feeds responses in and projects
//! the returned effects onto the view and the local store.

use crate::api::types::{ResumeChatRequest, ResumeChatResponse, SubmitRequest, UploadResponse};
use crate::errors::ClientError;
use crate::resume::fields::{Field, ResumeProfile};

/// Step sent before the backend has ever assigned one.
pub const INITIAL_STEP: i32 = -1;

#[derive(Debug, Clone, PartialEq)]
pub struct InterviewState {
    /// Only ever written from a backend `next_step`.
    pub step: i32,
    pub profile: ResumeProfile,
    pub session_id: Option<String>,
    pub upload_id: Option<String>,
    pub suggestions: Vec<String>,
    pub finished: bool,
}

impl Default for InterviewState {
    fn default() -> Self {
        Self {
            step: INITIAL_STEP,
            profile: ResumeProfile::default(),
            session_id: None,
            upload_id: None,
            suggestions: Vec::new(),
            finished: false,
        }
    }
}

/// What a single `/api/resume-chat` turn changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TurnEffects {
    pub reply: Option<String>,
    pub question: Option<String>,
    pub suggestions: Vec<String>,
    pub step_changed: bool,
    pub profile_changed: bool,
    pub session_changed: bool,
    pub finished_now: bool,
    pub error: Option<String>,
}

/// What an upload response changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadEffects {
    pub message: Option<String>,
    pub reveal_preview: bool,
    pub upload_id_changed: bool,
    pub error: Option<String>,
}

impl InterviewState {
    /// State rebuilt from the local store. The step is never restored: it stays
    /// at `INITIAL_STEP` until the backend reports one.
    pub fn restored(
        profile: ResumeProfile,
        session_id: Option<String>,
        upload_id: Option<String>,
    ) -> Self {
        Self {
            profile,
            session_id,
            upload_id,
            ..Self::default()
        }
    }

    pub fn active_field(&self) -> Option<Field> {
        Field::at_step(self.step)
    }

    pub fn request(&self, message: &str) -> ResumeChatRequest {
        ResumeChatRequest {
            message: message.to_string(),
            step: self.step,
            data: self.profile.clone(),
            session_id: self.session_id.clone(),
        }
    }

    /// Chips from the previous turn disappear once the user answers.
    pub fn begin_turn(&mut self) {
        self.suggestions.clear();
    }

    pub fn apply(&mut self, response: ResumeChatResponse) -> TurnEffects {
        if let Some(error) = response.error {
            return TurnEffects {
                error: Some(error),
                ..TurnEffects::default()
            };
        }

        let mut effects = TurnEffects {
            reply: response.response.filter(|r| !r.is_empty()),
            question: response.question.filter(|q| !q.is_empty()),
            ..TurnEffects::default()
        };

        if let Some(session_id) = response.session_id {
            if self.session_id.as_deref() != Some(session_id.as_str()) {
                self.session_id = Some(session_id);
                effects.session_changed = true;
            }
        }

        // keep_step freezes both the step and the profile for this turn.
        if !response.keep_step {
            if let Some(next) = response.next_step {
                effects.step_changed = next != self.step;
                self.step = next;
            }
            if let Some(data) = response.data {
                effects.profile_changed = data != self.profile;
                self.profile = data;
            }
        }

        self.suggestions = response.suggestions;
        effects.suggestions = self.suggestions.clone();

        if response.finished && !self.finished {
            self.finished = true;
            effects.finished_now = true;
        }
        if self.finished {
            self.suggestions.clear();
            effects.suggestions.clear();
        }

        effects
    }

    pub fn apply_upload(&mut self, response: UploadResponse) -> UploadEffects {
        if let Some(error) = response.error {
            return UploadEffects {
                error: Some(error),
                ..UploadEffects::default()
            };
        }

        if let Some(data) = response.data {
            self.profile.merge(&data);
        }

        let mut effects = UploadEffects {
            message: response.message,
            reveal_preview: self.profile.has_values(),
            ..UploadEffects::default()
        };
        if let Some(id) = response.resume_id {
            effects.upload_id_changed = self.upload_id.as_deref() != Some(id.as_str());
            self.upload_id = Some(id);
        }
        effects
    }

    /// A direct edit from the preview form. Allowed at any point, including
    /// after the interview has finished. Returns whether the value changed.
    pub fn edit_field(&mut self, field: Field, value: &str) -> bool {
        let value = value.trim();
        if self.profile.field(field) == Some(value) {
            return false;
        }
        self.profile.set(field.key(), value);
        true
    }

    /// Local gate before `/api/submit-resume`; the backend is never contacted on failure.
    pub fn validate_submission(&self) -> Result<(), ClientError> {
        let missing = self.profile.missing_mandatory();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ClientError::MissingFields(missing))
        }
    }

    pub fn submit_request(&self) -> SubmitRequest<'_> {
        SubmitRequest {
            profile: &self.profile,
            resume_session_id: self.session_id.as_deref(),
            upload_resume_id: self.upload_id.as_deref(),
        }
    }
}
