//! Prompt compilation.
//!
//! The provider's responses endpoint takes one linear input string, not a
//! structured chat transcript. This module flattens {system role, history,
//! canvas snapshot} into that string. The format is a concatenation
//! strategy, not a protocol: the compiler knows nothing about the target
//! model's chat-turn structure.

use crate::canvas;
use crate::message::{Message, Role};

/// Header separating the reference code from the transcript.
const TRANSCRIPT_HEADER: &str = "\n\n---\n\n### Conversation History\n";

/// Flatten messages and canvases into a single model input string.
///
/// Order: system content, labeled reference-code blocks for every non-blank
/// canvas, transcript header, non-system messages as `ROLE: content` lines,
/// and a trailing `ASSISTANT:` marker for the model to continue from.
/// Deterministic: the same input always compiles to the same bytes.
pub fn compile(messages: &[Message], canvases: &[String]) -> String {
    let mut input = String::new();

    if let Some(system) = messages.iter().find(|m| m.role == Role::System) {
        input.push_str(&system.content);
    }

    for (i, code) in canvases.iter().enumerate() {
        if canvas::is_blank(code) {
            continue;
        }
        input.push_str(&format!(
            "\n\n### Reference Code (Canvas-{})\n```python\n{}\n```",
            i + 1,
            code
        ));
    }

    input.push_str(TRANSCRIPT_HEADER);

    for message in messages {
        if message.role == Role::System {
            continue;
        }
        input.push_str(&format!(
            "{}: {}\n\n",
            message.role.as_prompt_label(),
            message.content
        ));
    }

    input.push_str("ASSISTANT:");
    input
}
