//! Session export and import.

pub mod history;
pub mod types;

pub use history::{apply_import, export_session, load_history, parse_document, save_history};
pub use types::{HistoryDocument, ParsedHistory, SchemaError};
