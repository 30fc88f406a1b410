//! Per-session state.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::generation::{CancelFlag, GenerationPhase, GenerationRequest};
use crate::canvas::{CanvasError, CanvasStore, MAX_CANVASES};
use crate::config::ReasoningEffort;
use crate::message::{Message, Role};
use crate::notice::Notice;
use crate::usage::TokenUsage;

/// Unique identifier for a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Error, Debug)]
pub enum SessionError {
    /// A generation is already in flight; the trigger was rejected.
    #[error("A generation is already in flight")]
    Busy,

    #[error("The system role must be set before chatting")]
    SystemRoleNotSet,

    #[error("The system role is already set; reset the session to change it")]
    SystemRoleAlreadySet,

    #[error(transparent)]
    Canvas(#[from] CanvasError),
}

/// The complete mutable state of one chat session.
///
/// Owned exclusively by the running session. The generation state machine
/// borrows it for the duration of one streaming call and leaves it idle and
/// consistent on every exit path.
pub struct Session {
    pub id: SessionId,

    /// Conversation history. At most one system message, always first.
    pub messages: Vec<Message>,

    /// Reference code buffers.
    pub canvases: CanvasStore,

    /// Cumulative token usage for the life of the session.
    pub usage: TokenUsage,

    /// Usage reported for the most recent completed turn.
    pub last_usage: Option<TokenUsage>,

    /// Whether the system role has been fixed for this session.
    pub system_role_defined: bool,

    /// Identifier of the selected model profile, if any.
    pub selected_profile_id: Option<String>,

    /// Reasoning-effort hint forwarded to the provider.
    pub reasoning_effort: ReasoningEffort,

    pub(crate) phase: GenerationPhase,
    pub(crate) cancel: CancelFlag,
    pub(crate) pending: Option<GenerationRequest>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: SessionId::new(),
            messages: Vec::new(),
            canvases: CanvasStore::new(),
            usage: TokenUsage::default(),
            last_usage: None,
            system_role_defined: false,
            selected_profile_id: None,
            reasoning_effort: ReasoningEffort::default(),
            phase: GenerationPhase::Idle,
            cancel: CancelFlag::default(),
            pending: None,
        }
    }

    pub fn phase(&self) -> GenerationPhase {
        self.phase
    }

    pub(crate) fn ensure_idle(&self) -> Result<(), SessionError> {
        match self.phase {
            GenerationPhase::Idle => Ok(()),
            _ => Err(SessionError::Busy),
        }
    }

    /// Fix the system role. Allowed exactly once per session; resetting the
    /// session is the only way to change it afterwards.
    pub fn set_system_role(&mut self, prompt: impl Into<String>) -> Result<(), SessionError> {
        self.ensure_idle()?;
        if self.system_role_defined {
            return Err(SessionError::SystemRoleAlreadySet);
        }
        self.messages.insert(0, Message::system(prompt));
        self.system_role_defined = true;
        Ok(())
    }

    /// The system message for a special request; an empty stand-in when the
    /// role was never set.
    pub(crate) fn system_message(&self) -> Message {
        self.messages
            .iter()
            .find(|m| m.role == Role::System)
            .cloned()
            .unwrap_or_else(|| Message::system(""))
    }

    /// Return the session to its initial state. The id survives.
    pub fn reset(&mut self) -> Result<(), SessionError> {
        self.ensure_idle()?;
        self.messages.clear();
        self.canvases = CanvasStore::new();
        self.usage.reset();
        self.last_usage = None;
        self.system_role_defined = false;
        self.selected_profile_id = None;
        self.reasoning_effort = ReasoningEffort::default();
        self.pending = None;
        self.cancel.clear();
        Ok(())
    }

    /// Switch to another model profile. The conversation and counters start
    /// over; the reasoning-effort preference is kept.
    pub fn select_profile(&mut self, profile_id: impl Into<String>) -> Result<(), SessionError> {
        self.ensure_idle()?;
        let effort = self.reasoning_effort;
        self.reset()?;
        self.reasoning_effort = effort;
        self.selected_profile_id = Some(profile_id.into());
        Ok(())
    }

    /// Append a canvas, surfacing the bound as a notice instead of an error.
    pub fn add_canvas(&mut self) -> Option<Notice> {
        if self.canvases.add() {
            None
        } else {
            Some(Notice::CanvasLimitReached {
                limit: MAX_CANVASES,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod session_id {
        use super::*;

        #[test]
        fn new_generates_unique_ids() {
            assert_ne!(SessionId::new(), SessionId::new());
        }

        #[test]
        fn display_shows_inner_string() {
            let id = SessionId("sess-123".to_string());
            assert_eq!(format!("{id}"), "sess-123");
        }

        #[test]
        fn serialization_roundtrip() {
            let id = SessionId::new();
            let json = serde_json::to_string(&id).unwrap();
            let parsed: SessionId = serde_json::from_str(&json).unwrap();
            assert_eq!(parsed, id);
        }
    }

    mod lifecycle {
        use super::*;

        #[test]
        fn new_starts_idle_with_defaults() {
            let session = Session::new();

            assert!(session.messages.is_empty());
            assert!(!session.system_role_defined);
            assert_eq!(session.usage, TokenUsage::default());
            assert!(session.last_usage.is_none());
            assert_eq!(session.phase(), GenerationPhase::Idle);
            assert_eq!(session.canvases.len(), 1);
        }

        #[test]
        fn set_system_role_installs_first_message() {
            let mut session = Session::new();
            session.set_system_role("You are a CLI assistant.").unwrap();

            assert!(session.system_role_defined);
            assert_eq!(session.messages[0].role, Role::System);
            assert_eq!(session.messages[0].content, "You are a CLI assistant.");
        }

        #[test]
        fn set_system_role_twice_is_rejected() {
            let mut session = Session::new();
            session.set_system_role("first").unwrap();

            let result = session.set_system_role("second");

            assert!(matches!(result, Err(SessionError::SystemRoleAlreadySet)));
            assert_eq!(session.messages.len(), 1);
            assert_eq!(session.messages[0].content, "first");
        }

        #[test]
        fn reset_restores_defaults_but_keeps_id() {
            let mut session = Session::new();
            let id = session.id.clone();
            session.set_system_role("sys").unwrap();
            session.messages.push(Message::user("hello"));
            session.usage.merge(&TokenUsage {
                input_tokens: 10,
                output_tokens: 5,
                total_tokens: 15,
            });
            session.canvases.set_content(0, "x = 1").unwrap();
            session.selected_profile_id = Some("codex.env".to_string());

            session.reset().unwrap();

            assert_eq!(session.id, id);
            assert!(session.messages.is_empty());
            assert!(!session.system_role_defined);
            assert_eq!(session.usage, TokenUsage::default());
            assert!(session.selected_profile_id.is_none());
            assert_eq!(
                session.canvases.get(0),
                Some(crate::canvas::DEFAULT_CANVAS_CONTENT)
            );
        }

        #[test]
        fn select_profile_resets_but_keeps_effort() {
            let mut session = Session::new();
            session.reasoning_effort = ReasoningEffort::Low;
            session.set_system_role("sys").unwrap();
            session.usage.merge(&TokenUsage {
                input_tokens: 1,
                output_tokens: 1,
                total_tokens: 2,
            });

            session.select_profile("other.env").unwrap();

            assert_eq!(session.reasoning_effort, ReasoningEffort::Low);
            assert_eq!(session.selected_profile_id.as_deref(), Some("other.env"));
            assert_eq!(session.usage, TokenUsage::default());
            assert!(!session.system_role_defined);
        }

        #[test]
        fn system_message_falls_back_to_empty() {
            let session = Session::new();
            let system = session.system_message();
            assert_eq!(system.role, Role::System);
            assert!(system.content.is_empty());
        }
    }

    mod canvas_capacity {
        use super::*;

        #[test]
        fn add_canvas_surfaces_limit_as_notice() {
            let mut session = Session::new();
            session.canvases.set_multi_mode(true);

            for _ in 1..MAX_CANVASES {
                assert!(session.add_canvas().is_none());
            }

            let notice = session.add_canvas();
            assert_eq!(
                notice,
                Some(Notice::CanvasLimitReached {
                    limit: MAX_CANVASES
                })
            );
            assert_eq!(session.canvases.len(), MAX_CANVASES);
        }
    }
}
