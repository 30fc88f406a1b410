//! History transfer document types.
//!
//! The document is the only persistence boundary of the core: a UTF-8 JSON
//! file the user explicitly exports and imports. Two shapes are accepted on
//! import: the structured document below, and a legacy bare message array
//! from which canvases cannot be recovered.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::message::Message;

#[derive(Error, Debug)]
pub enum SchemaError {
    /// Neither a structured document nor a legacy message array.
    #[error("Unsupported history document shape")]
    UnsupportedShape,

    /// A message failed validation, or the JSON itself is broken.
    #[error("Malformed history document: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A portable snapshot of one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryDocument {
    /// Conversation history, system message included.
    pub messages: Vec<Message>,

    /// Canvas buffers, sentinels included. Absent in legacy documents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canvases: Option<Vec<String>>,

    /// The model profile the session was using when exported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_model_config_id: Option<String>,

    /// Whether multi-canvas mode was enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multi_canvas_mode_enabled: Option<bool>,

    /// When the document was produced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exported_at: Option<DateTime<Utc>>,
}

/// A validated import, with its provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedHistory {
    pub document: HistoryDocument,
    /// True when the source was a legacy bare message array.
    pub legacy: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Role;

    #[test]
    fn optional_fields_are_omitted_when_absent() {
        let doc = HistoryDocument {
            messages: vec![Message::system("sys")],
            canvases: None,
            selected_model_config_id: None,
            multi_canvas_mode_enabled: None,
            exported_at: None,
        };

        let json = serde_json::to_string(&doc).unwrap();

        assert!(!json.contains("canvases"));
        assert!(!json.contains("selectedModelConfigId"));
        assert!(!json.contains("multiCanvasModeEnabled"));
    }

    #[test]
    fn field_names_are_camel_case() {
        let doc = HistoryDocument {
            messages: vec![],
            canvases: Some(vec!["x = 1".to_string()]),
            selected_model_config_id: Some("codex.env".to_string()),
            multi_canvas_mode_enabled: Some(true),
            exported_at: None,
        };

        let json = serde_json::to_string(&doc).unwrap();

        assert!(json.contains("\"selectedModelConfigId\":\"codex.env\""));
        assert!(json.contains("\"multiCanvasModeEnabled\":true"));
    }

    #[test]
    fn serialization_roundtrip() {
        let doc = HistoryDocument {
            messages: vec![Message::system("sys"), Message::user("hello")],
            canvases: Some(vec!["print(1)".to_string()]),
            selected_model_config_id: Some("codex.env".to_string()),
            multi_canvas_mode_enabled: Some(false),
            exported_at: Some(Utc::now()),
        };

        let json = serde_json::to_string(&doc).unwrap();
        let parsed: HistoryDocument = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed, doc);
        assert_eq!(parsed.messages[1].role, Role::User);
    }
}
