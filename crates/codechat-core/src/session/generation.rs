//! The generation state machine.
//!
//! One logical generation is in flight at a time. A trigger freezes a
//! [`GenerationRequest`], the synchronous drive loop streams the response,
//! and terminal bookkeeping runs on every exit path: completion,
//! cancellation and transport failure all land back in `Idle` with usage
//! merged and any partial text preserved.
//!
//! Cancellation is cooperative: [`CancelFlag`] is set by the caller and
//! consulted at each chunk boundary, so the worst-case latency is one
//! chunk. The in-flight network call is never torn down abruptly.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::state::{Session, SessionError};
use crate::analysis::{AnalysisOutcome, LintRunner};
use crate::config::{ModelProfile, PromptTemplates};
use crate::message::Message;
use crate::notice::Notice;
use crate::prompt;
use crate::provider::{CompletionSummary, ProviderRequest, ResponseClient, StreamChunk};

/// Where the state machine currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationPhase {
    /// No generation in flight; triggers are accepted.
    Idle,
    /// A stream is open and chunks are being consumed.
    Streaming,
    /// A stop was requested; the loop will exit at the next chunk boundary.
    Cancelling,
}

/// Shared stop signal, polled at chunk boundaries.
///
/// Cloneable so a UI thread or signal handler can request a stop while the
/// drive loop blocks on the next chunk.
#[derive(Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn set(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn clear(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// One streaming call, frozen at trigger time.
///
/// Special requests carry a synthetic two-message list and no canvas
/// snapshot; their code is already embedded in the synthetic message.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub messages: Vec<Message>,
    pub canvases: Vec<String>,
    pub special: bool,
}

impl Session {
    /// Freeze a request and enter `Streaming`. Clears stale per-turn usage
    /// and any leftover stop signal.
    fn arm(&mut self, request: GenerationRequest) {
        self.last_usage = None;
        self.cancel.clear();
        self.pending = Some(request);
        self.phase = GenerationPhase::Streaming;
    }

    /// Start a normal chat turn from a new user message.
    pub fn begin_user_turn(&mut self, text: impl Into<String>) -> Result<(), SessionError> {
        self.ensure_idle()?;
        if !self.system_role_defined {
            return Err(SessionError::SystemRoleNotSet);
        }

        self.messages.push(Message::user(text));
        let request = GenerationRequest {
            messages: self.messages.clone(),
            canvases: self.canvases.snapshot(),
            special: false,
        };
        self.arm(request);
        Ok(())
    }

    /// Ask the model to review one canvas.
    ///
    /// A special request: the synthetic user message embeds the canvas code
    /// and is never appended to the visible history. The model's answer is.
    pub fn begin_canvas_review(&mut self, index: usize) -> Result<Vec<Notice>, SessionError> {
        self.ensure_idle()?;
        let code = self.canvas_code(index)?;
        if crate::canvas::is_blank(&code) {
            return Ok(vec![Notice::NoCanvasContent { canvas: index }]);
        }

        let instruction = format!(
            "### Reference Code (Canvas-{})\n```python\n{}\n```\nReview this code and suggest concrete improvements.",
            index + 1,
            code
        );
        self.arm_special(instruction);
        Ok(Vec::new())
    }

    /// Lint one canvas and, when there are findings, escalate them into a
    /// special validation request.
    ///
    /// Clean, empty and unparseable canvases produce notices only; a linter
    /// that cannot be run is surfaced the same way and never a prompt.
    pub fn begin_validation(
        &mut self,
        index: usize,
        runner: &LintRunner,
        templates: &PromptTemplates,
    ) -> Result<Vec<Notice>, SessionError> {
        self.ensure_idle()?;
        let code = self.canvas_code(index)?;

        let outcome = match runner.analyze(&code) {
            Ok(outcome) => outcome,
            Err(e) => {
                log::error!("Linter unavailable: {e}");
                return Ok(vec![Notice::AnalysisToolFailed {
                    message: e.to_string(),
                }]);
            }
        };

        match outcome {
            AnalysisOutcome::NoContent => Ok(vec![Notice::NoCanvasContent { canvas: index }]),
            AnalysisOutcome::SyntaxFailure => Ok(vec![Notice::SyntaxRejected { canvas: index }]),
            AnalysisOutcome::Clean => Ok(vec![Notice::AnalysisPassed { canvas: index }]),
            AnalysisOutcome::Findings(lines) => {
                let count = lines.len();
                let code_block = format!(
                    "\n\n# Code under analysis (Canvas-{})\n```python\n{}\n```",
                    index + 1,
                    code
                );
                let instruction = templates.render_validation(&code_block, &lines.join("\n"));
                self.arm_special(instruction);
                Ok(vec![Notice::AnalysisFindings {
                    canvas: index,
                    count,
                }])
            }
        }
    }

    fn canvas_code(&self, index: usize) -> Result<String, SessionError> {
        self.canvases
            .get(index)
            .map(str::to_string)
            .ok_or(SessionError::Canvas(crate::canvas::CanvasError::OutOfRange(
                index,
            )))
    }

    fn arm_special(&mut self, instruction: String) {
        let request = GenerationRequest {
            messages: vec![self.system_message(), Message::user(instruction)],
            canvases: Vec::new(),
            special: true,
        };
        self.arm(request);
    }

    /// Request a cooperative stop of the in-flight generation.
    pub fn request_stop(&self) {
        self.cancel.set();
    }

    /// A handle other threads can use to request a stop.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Run the frozen request to completion.
    ///
    /// Blocks until the stream ends, errors, or the stop signal is observed
    /// at a chunk boundary. Always returns with the session idle: usage
    /// merged, partial or full text appended as the assistant's turn when
    /// non-empty, the frozen request discarded, the stop signal cleared.
    pub fn drive<C: ResponseClient>(&mut self, client: &C, profile: &ModelProfile) -> Vec<Notice> {
        let Some(request) = self.pending.take() else {
            return Vec::new();
        };

        let provider_request = ProviderRequest {
            model: profile.deployment.clone(),
            input: prompt::compile(&request.messages, &request.canvases),
            reasoning_effort: self.reasoning_effort,
        };

        let mut collected = String::new();
        let mut summary: Option<CompletionSummary> = None;
        let mut cancelled = false;
        let mut notices = Vec::new();

        match client.open_stream(&provider_request) {
            Err(e) => {
                log::error!("Provider request failed: {e}");
                notices.push(Notice::TransportFailed {
                    message: e.to_string(),
                });
            }
            Ok(stream) => {
                for item in stream {
                    if self.cancel.is_set() {
                        self.phase = GenerationPhase::Cancelling;
                        cancelled = true;
                        notices.push(Notice::GenerationStopped);
                        break;
                    }
                    match item {
                        Ok(StreamChunk::TextDelta(delta)) => collected.push_str(&delta),
                        Ok(StreamChunk::Completed(s)) => summary = Some(s),
                        Ok(StreamChunk::Ignored) => {}
                        Err(e) => {
                            log::error!("Stream failed mid-generation: {e}");
                            notices.push(Notice::TransportFailed {
                                message: e.to_string(),
                            });
                            break;
                        }
                    }
                }
            }
        }

        // Terminal bookkeeping, identical on every exit path.
        self.phase = GenerationPhase::Idle;
        self.cancel.clear();

        if let Some(summary) = summary {
            if collected.is_empty() {
                match summary.finish {
                    Some(finish) if finish.is_content_filter() => {
                        notices.push(Notice::ContentFiltered);
                    }
                    finish => notices.push(Notice::EmptyResponse {
                        finish_kind: finish
                            .map(|f| f.kind)
                            .unwrap_or_else(|| "unknown".to_string()),
                    }),
                }
            }
            if let Some(report) = summary.usage {
                self.usage.merge(&report);
                self.last_usage = Some(report);
            }
        } else if cancelled && collected.is_empty() {
            notices.push(Notice::EmptyResponse {
                finish_kind: "cancelled".to_string(),
            });
        }

        if !collected.is_empty() {
            self.messages.push(Message::assistant(collected));
        }

        notices
    }
}
