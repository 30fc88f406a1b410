//! Azure OpenAI Responses API client.
//!
//! Opens a streaming POST against the deployment's `responses` endpoint and
//! reads the reply as server-sent events: `data: `-prefixed JSON payloads,
//! one per line, dispatched by their `type` field.

use std::io::{BufRead, BufReader, Read};

use serde_json::json;

use super::{
    ChunkStream, CompletionSummary, FinishDetails, ProviderRequest, ResponseClient, StreamChunk,
    TransportError,
};
use crate::config::ModelProfile;
use crate::debug_log::StreamLog;
use crate::usage::TokenUsage;

/// Blocking streaming client for one model profile.
pub struct AzureResponsesClient {
    profile: ModelProfile,
    stream_log: StreamLog,
}

impl AzureResponsesClient {
    pub fn new(profile: ModelProfile) -> Self {
        Self {
            profile,
            stream_log: StreamLog::disabled(),
        }
    }

    /// Attach a raw-chunk transcript log (debug mode).
    pub fn with_stream_log(mut self, stream_log: StreamLog) -> Self {
        self.stream_log = stream_log;
        self
    }

    fn request_url(&self) -> String {
        format!(
            "{}/openai/responses?api-version={}",
            self.profile.endpoint.trim_end_matches('/'),
            self.profile.api_version
        )
    }
}

fn build_body(request: &ProviderRequest) -> serde_json::Value {
    json!({
        "model": request.model,
        "input": request.input,
        "stream": true,
        "reasoning": { "effort": request.reasoning_effort.as_str() },
    })
}

impl ResponseClient for AzureResponsesClient {
    fn open_stream(&self, request: &ProviderRequest) -> Result<ChunkStream, TransportError> {
        let response = ureq::post(&self.request_url())
            .set("api-key", &self.profile.api_key)
            .set("Accept", "text/event-stream")
            .send_json(build_body(request))
            .map_err(|e| TransportError::Request(e.to_string()))?;

        Ok(Box::new(SseChunkIter::new(
            response.into_reader(),
            self.stream_log.clone(),
        )))
    }
}

/// Iterator over the SSE lines of one response body.
struct SseChunkIter<R: Read> {
    reader: BufReader<R>,
    stream_log: StreamLog,
    done: bool,
}

impl<R: Read> SseChunkIter<R> {
    fn new(body: R, stream_log: StreamLog) -> Self {
        Self {
            reader: BufReader::new(body),
            stream_log,
            done: false,
        }
    }
}

impl<R: Read> Iterator for SseChunkIter<R> {
    type Item = Result<StreamChunk, TransportError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            let mut line = String::new();
            match self.reader.read_line(&mut line) {
                Ok(0) => {
                    self.done = true;
                    return None;
                }
                Ok(_) => {}
                Err(e) => {
                    self.done = true;
                    return Some(Err(TransportError::Read(e)));
                }
            }

            let line = line.trim();
            let Some(data) = line.strip_prefix("data: ") else {
                continue; // event/comment/blank lines
            };

            self.stream_log.record("DATA", data);

            if data == "[DONE]" {
                self.done = true;
                return None;
            }

            let chunk = parse_event(data);
            if let StreamChunk::Completed(_) = chunk {
                self.done = true;
            }
            return Some(Ok(chunk));
        }
    }
}

/// Dispatch one `data: ` payload by its `type` field.
fn parse_event(data: &str) -> StreamChunk {
    let payload: serde_json::Value = match serde_json::from_str(data) {
        Ok(v) => v,
        Err(e) => {
            log::warn!("Skipping malformed stream payload: {e}");
            return StreamChunk::Ignored;
        }
    };

    match payload.get("type").and_then(|t| t.as_str()) {
        Some("response.output_text.delta") => {
            match payload.get("delta").and_then(|d| d.as_str()) {
                Some(delta) if !delta.is_empty() => StreamChunk::TextDelta(delta.to_string()),
                _ => StreamChunk::Ignored,
            }
        }
        Some("response.completed") => {
            let response = payload.get("response");
            let usage = response
                .and_then(|r| r.get("usage"))
                .and_then(|u| serde_json::from_value::<TokenUsage>(u.clone()).ok());
            let finish = response
                .and_then(|r| r.get("finish_details"))
                .and_then(|f| serde_json::from_value::<FinishDetails>(f.clone()).ok());
            StreamChunk::Completed(CompletionSummary { usage, finish })
        }
        _ => StreamChunk::Ignored,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReasoningEffort;
    use std::io::Cursor;

    fn test_profile() -> ModelProfile {
        ModelProfile {
            id: "codex.env".to_string(),
            api_key: "secret".to_string(),
            endpoint: "https://example.openai.azure.com/".to_string(),
            deployment: "codex-mini".to_string(),
            api_version: "preview".to_string(),
        }
    }

    mod request_shape {
        use super::*;

        #[test]
        fn url_joins_endpoint_without_double_slash() {
            let client = AzureResponsesClient::new(test_profile());
            assert_eq!(
                client.request_url(),
                "https://example.openai.azure.com/openai/responses?api-version=preview"
            );
        }

        #[test]
        fn body_requests_streaming_with_effort_hint() {
            let body = build_body(&ProviderRequest {
                model: "codex-mini".to_string(),
                input: "SYSTEM...".to_string(),
                reasoning_effort: ReasoningEffort::Medium,
            });

            assert_eq!(body["model"], "codex-mini");
            assert_eq!(body["stream"], true);
            assert_eq!(body["reasoning"]["effort"], "medium");
        }
    }

    mod event_parsing {
        use super::*;

        #[test]
        fn delta_event_yields_text() {
            let chunk =
                parse_event(r#"{"type": "response.output_text.delta", "delta": "Hel"}"#);
            assert_eq!(chunk, StreamChunk::TextDelta("Hel".to_string()));
        }

        #[test]
        fn empty_delta_is_ignored() {
            let chunk = parse_event(r#"{"type": "response.output_text.delta", "delta": ""}"#);
            assert_eq!(chunk, StreamChunk::Ignored);
        }

        #[test]
        fn completed_event_carries_usage_and_finish() {
            let data = r#"{
                "type": "response.completed",
                "response": {
                    "usage": {"input_tokens": 12, "output_tokens": 3, "total_tokens": 15},
                    "finish_details": {"type": "stop", "stop": "content_filter"}
                }
            }"#;

            match parse_event(data) {
                StreamChunk::Completed(summary) => {
                    let usage = summary.usage.unwrap();
                    assert_eq!(usage.input_tokens, 12);
                    assert_eq!(usage.total_tokens, 15);
                    assert!(summary.finish.unwrap().is_content_filter());
                }
                other => panic!("Expected Completed, got {other:?}"),
            }
        }

        #[test]
        fn completed_event_without_accounting_still_completes() {
            match parse_event(r#"{"type": "response.completed", "response": {}}"#) {
                StreamChunk::Completed(summary) => {
                    assert!(summary.usage.is_none());
                    assert!(summary.finish.is_none());
                }
                other => panic!("Expected Completed, got {other:?}"),
            }
        }

        #[test]
        fn unknown_event_types_are_ignored() {
            assert_eq!(
                parse_event(r#"{"type": "response.output_item.added"}"#),
                StreamChunk::Ignored
            );
        }

        #[test]
        fn malformed_payload_is_ignored() {
            assert_eq!(parse_event("{not json"), StreamChunk::Ignored);
        }
    }

    mod sse_stream {
        use super::*;

        fn chunks_from(transcript: &str) -> Vec<StreamChunk> {
            SseChunkIter::new(Cursor::new(transcript.to_string()), StreamLog::disabled())
                .map(|c| c.unwrap())
                .collect()
        }

        #[test]
        fn reads_data_lines_in_order() {
            let transcript = "\
event: response.output_text.delta
data: {\"type\": \"response.output_text.delta\", \"delta\": \"Hel\"}

data: {\"type\": \"response.output_text.delta\", \"delta\": \"lo\"}

data: {\"type\": \"response.completed\", \"response\": {}}
";
            let chunks = chunks_from(transcript);

            assert_eq!(chunks.len(), 3);
            assert_eq!(chunks[0], StreamChunk::TextDelta("Hel".to_string()));
            assert_eq!(chunks[1], StreamChunk::TextDelta("lo".to_string()));
            assert!(matches!(chunks[2], StreamChunk::Completed(_)));
        }

        #[test]
        fn stops_after_completion_event() {
            let transcript = "\
data: {\"type\": \"response.completed\", \"response\": {}}
data: {\"type\": \"response.output_text.delta\", \"delta\": \"late\"}
";
            let chunks = chunks_from(transcript);
            assert_eq!(chunks.len(), 1);
        }

        #[test]
        fn done_marker_terminates_the_stream() {
            let transcript = "\
data: {\"type\": \"response.output_text.delta\", \"delta\": \"x\"}
data: [DONE]
";
            let chunks = chunks_from(transcript);
            assert_eq!(chunks, vec![StreamChunk::TextDelta("x".to_string())]);
        }

        #[test]
        fn eof_without_completion_just_ends() {
            let transcript = "data: {\"type\": \"response.output_text.delta\", \"delta\": \"x\"}\n";
            let chunks = chunks_from(transcript);
            assert_eq!(chunks.len(), 1);
        }

        #[test]
        fn non_data_lines_are_skipped() {
            let transcript = "\
: keep-alive
event: ping

data: {\"type\": \"response.completed\", \"response\": {}}
";
            let chunks = chunks_from(transcript);
            assert_eq!(chunks.len(), 1);
        }
    }
}
