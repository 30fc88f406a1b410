//! # codechat-core
//!
//! Core business logic for Codechat, a canvas-based chat frontend for
//! code-assistant models.
//!
//! This crate is framework-agnostic and can be used by:
//! - a desktop app (via commands)
//! - a web server (via REST/WebSocket)
//! - a terminal frontend
//!
//! ## Key Concepts
//!
//! - **Session**: the complete mutable state of one conversation
//! - **Canvas**: a user-editable code buffer attached as reference material
//! - **Special generation**: a model call synthesized from a canvas review
//!   or lint findings; its prompt stays out of the visible history but its
//!   answer joins the transcript
//! - **Notice**: a render effect returned by session operations instead of
//!   being drawn by the core

pub mod analysis;
pub mod canvas;
pub mod config;
pub mod debug_log;
pub mod message;
pub mod notice;
pub mod persistence;
pub mod prompt;
pub mod provider;
pub mod session;
pub mod usage;

// Re-export commonly used types
pub use analysis::{AnalysisOutcome, LintRunner};
pub use canvas::CanvasStore;
pub use message::{Message, Role};
pub use notice::Notice;
pub use provider::{AzureResponsesClient, ResponseClient};
pub use session::{GenerationPhase, Session, SessionId};
pub use usage::TokenUsage;
