//! History document import/export operations.
//!
//! # Import rules
//!
//! - The whole document is validated before any session state changes; a
//!   single malformed message rejects the import outright.
//! - A successful import always marks the system role as defined and zeroes
//!   the usage counters, whatever the imported messages contain.
//! - A `selectedModelConfigId` that no longer resolves is not fatal: the
//!   session keeps its current selection and a warning notice is surfaced.
//!
//! # File writes
//!
//! Saves go to a `.tmp` sibling first and are renamed into place, so an
//! interrupted write never corrupts an existing export.

use std::fs;
use std::path::Path;

use chrono::Utc;

use super::types::{HistoryDocument, ParsedHistory, SchemaError};
use crate::message::Message;
use crate::notice::Notice;
use crate::session::{Session, SessionError};

/// Snapshot a session into a portable document.
pub fn export_session(session: &Session) -> HistoryDocument {
    HistoryDocument {
        messages: session.messages.clone(),
        canvases: Some(session.canvases.snapshot()),
        selected_model_config_id: session.selected_profile_id.clone(),
        multi_canvas_mode_enabled: Some(session.canvases.multi_mode()),
        exported_at: Some(Utc::now()),
    }
}

/// Validate a raw JSON value as a history document.
///
/// Accepts the structured document or a legacy bare message array. Either
/// way every message must carry a valid role and string content, or the
/// whole parse fails.
pub fn parse_document(value: serde_json::Value) -> Result<ParsedHistory, SchemaError> {
    match value {
        serde_json::Value::Array(_) => {
            let messages: Vec<Message> = serde_json::from_value(value)?;
            Ok(ParsedHistory {
                document: HistoryDocument {
                    messages,
                    canvases: None,
                    selected_model_config_id: None,
                    multi_canvas_mode_enabled: None,
                    exported_at: None,
                },
                legacy: true,
            })
        }
        serde_json::Value::Object(ref map) if map.contains_key("messages") => {
            let document: HistoryDocument = serde_json::from_value(value)?;
            Ok(ParsedHistory {
                document,
                legacy: false,
            })
        }
        _ => Err(SchemaError::UnsupportedShape),
    }
}

/// Replace a session's state with an imported document.
///
/// Rejected while a generation is in flight. Legacy documents leave the
/// canvases at their pre-import value and surface a degraded-load notice.
pub fn apply_import(
    session: &mut Session,
    parsed: ParsedHistory,
    available_profiles: &[String],
) -> Result<Vec<Notice>, SessionError> {
    session.ensure_idle()?;

    let ParsedHistory { document, legacy } = parsed;
    let mut notices = Vec::new();

    session.messages = document.messages;

    if let Some(canvases) = document.canvases {
        let multi = document
            .multi_canvas_mode_enabled
            .unwrap_or(canvases.len() > 1);
        session.canvases.replace_all(canvases, multi);
    }

    match document.selected_model_config_id {
        Some(id) if available_profiles.contains(&id) => {
            session.selected_profile_id = Some(id);
        }
        Some(id) => {
            log::warn!("Imported history references unknown model profile {id}");
            notices.push(Notice::UnknownModelProfile { id });
        }
        None => {}
    }

    session.system_role_defined = true;
    session.usage.reset();
    session.last_usage = None;

    notices.push(if legacy {
        Notice::LegacyHistoryLoaded
    } else {
        Notice::HistoryLoaded
    });

    Ok(notices)
}

/// Save a document as pretty-printed UTF-8 JSON.
pub fn save_history(path: &Path, document: &HistoryDocument) -> Result<(), SchemaError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let temp_path = path.with_extension("json.tmp");
    let json = serde_json::to_string_pretty(document)?;
    fs::write(&temp_path, json)?;
    fs::rename(&temp_path, path)?;

    Ok(())
}

/// Load and validate a history file.
pub fn load_history(path: &Path) -> Result<ParsedHistory, SchemaError> {
    let contents = fs::read_to_string(path)?;
    let value: serde_json::Value = serde_json::from_str(&contents)?;
    parse_document(value)
}
