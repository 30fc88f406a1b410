//! Render effects returned by session operations.
//!
//! The session core never draws anything. Every operation that would have a
//! user-visible side effect returns a list of notices; the embedding UI
//! decides how to present them (toast, banner, inline warning).

use serde::{Deserialize, Serialize};

/// Something the UI should surface to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Notice {
    /// Response generation was interrupted by the user. Any partial text is
    /// kept as the assistant's turn.
    GenerationStopped,

    /// The provider finished without producing any text.
    EmptyResponse { finish_kind: String },

    /// The response was blocked by the provider's content filter.
    ContentFiltered,

    /// The provider call failed or errored mid-stream.
    TransportFailed { message: String },

    /// The canvas bound was reached; the add was refused.
    CanvasLimitReached { limit: usize },

    /// The targeted canvas holds no code to review or validate.
    NoCanvasContent { canvas: usize },

    /// The linter ran and found nothing to report.
    AnalysisPassed { canvas: usize },

    /// The linter could not parse the canvas as valid code.
    SyntaxRejected { canvas: usize },

    /// The linter itself could not be run.
    AnalysisToolFailed { message: String },

    /// Lint findings were escalated into a validation request.
    AnalysisFindings { canvas: usize, count: usize },

    /// A history document was imported.
    HistoryLoaded,

    /// A legacy history document was imported; canvases were not
    /// recoverable.
    LegacyHistoryLoaded,

    /// The imported document referenced a model profile that is no longer
    /// available; the current selection was kept.
    UnknownModelProfile { id: String },
}
