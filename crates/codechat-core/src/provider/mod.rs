//! Streaming model-provider abstraction.
//!
//! The session core drives a synchronous loop over an ordered sequence of
//! typed chunks. Only two chunk kinds matter: incremental text deltas and
//! the completion event carrying final usage totals and finish metadata.
//! Everything else a provider emits is ignored.

pub mod azure;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ReasoningEffort;
use crate::usage::TokenUsage;

pub use azure::AzureResponsesClient;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Provider request failed: {0}")]
    Request(String),

    #[error("Stream read failed: {0}")]
    Read(#[from] std::io::Error),
}

/// One streaming call, fully described.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderRequest {
    /// Model identifier (deployment name for Azure).
    pub model: String,
    /// The compiled linear input string.
    pub input: String,
    pub reasoning_effort: ReasoningEffort,
}

/// Why the model stopped producing output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinishDetails {
    /// Finish category, e.g. `stop` or `length`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Sub-reason for `stop` finishes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop: Option<String>,
}

impl FinishDetails {
    pub fn is_content_filter(&self) -> bool {
        self.kind == "stop" && self.stop.as_deref() == Some("content_filter")
    }
}

/// Payload of the completion event. Usage and finish metadata ride directly
/// on this event; providers that report them elsewhere are out of contract.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionSummary {
    pub usage: Option<TokenUsage>,
    pub finish: Option<FinishDetails>,
}

/// A typed chunk from the provider stream.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamChunk {
    /// Incremental output text.
    TextDelta(String),
    /// The stream finished; final accounting attached.
    Completed(CompletionSummary),
    /// Any other event type. The session skips these.
    Ignored,
}

/// Ordered chunk stream for one call.
pub type ChunkStream = Box<dyn Iterator<Item = Result<StreamChunk, TransportError>>>;

/// A provider that can answer a request with a chunk stream.
pub trait ResponseClient {
    fn open_stream(&self, request: &ProviderRequest) -> Result<ChunkStream, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    mod finish_details {
        use super::*;

        #[test]
        fn content_filter_is_detected() {
            let finish = FinishDetails {
                kind: "stop".to_string(),
                stop: Some("content_filter".to_string()),
            };
            assert!(finish.is_content_filter());
        }

        #[test]
        fn plain_stop_is_not_content_filter() {
            let finish = FinishDetails {
                kind: "stop".to_string(),
                stop: None,
            };
            assert!(!finish.is_content_filter());
        }

        #[test]
        fn length_finish_is_not_content_filter() {
            let finish = FinishDetails {
                kind: "length".to_string(),
                stop: Some("content_filter".to_string()),
            };
            assert!(!finish.is_content_filter());
        }

        #[test]
        fn deserializes_from_wire_shape() {
            let finish: FinishDetails =
                serde_json::from_str(r#"{"type": "stop", "stop": "content_filter"}"#).unwrap();
            assert_eq!(finish.kind, "stop");
            assert!(finish.is_content_filter());
        }
    }
}
