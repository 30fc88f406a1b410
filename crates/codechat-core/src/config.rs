//! Model profile and prompt template configuration.
//!
//! Configuration reaches the core as an opaque key-value lookup; where
//! those values come from (env files, a settings screen) is the embedding
//! application's concern.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lookup keys for a model profile.
pub const KEY_API_KEY: &str = "AZURE_OPENAI_KEY";
pub const KEY_ENDPOINT: &str = "AZURE_OPENAI_ENDPOINT";
pub const KEY_DEPLOYMENT: &str = "AZURE_OPENAI_DEPLOYMENT";
pub const KEY_API_VERSION: &str = "AZURE_OPENAI_API_VERSION";

/// System prompt offered to the user on first run.
pub const DEFAULT_SYSTEM_PROMPT: &str = "\
You are codex-mini, an expert assistant for command-line work and script \
generation. Perform these tasks precisely and efficiently:

1. Translate natural language into shell commands.
2. Generate and edit Python, Bash and PowerShell scripts.
3. Refactor provided code to be more efficient or more readable.
4. When the prompt contains a \"### Reference Code (Canvas)\" block, treat \
that code as the primary context for answers and edits.
5. When reviewing or referring to code, always cite the source in the form \
(source: Canvas-1, lines 15-20).

Prefer concise, direct, runnable answers. Keep explanations to a minimum.";

/// Built-in template for escalating lint findings to the model.
///
/// `{code}` is replaced with the labeled code block, `{report}` with the
/// normalized findings.
const DEFAULT_VALIDATION_TEMPLATE: &str = "\
Static analysis reported issues in the code below. For each finding, explain \
what it means and propose a concrete fix, citing the affected lines.
{code}

### Lint Report
```text
{report}
```";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required configuration key: {0}")]
    MissingKey(&'static str),
}

/// How hard the model should think. Forwarded as a provider hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReasoningEffort {
    High,
    Medium,
    Low,
}

impl Default for ReasoningEffort {
    fn default() -> Self {
        ReasoningEffort::High
    }
}

impl ReasoningEffort {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasoningEffort::High => "high",
            ReasoningEffort::Medium => "medium",
            ReasoningEffort::Low => "low",
        }
    }
}

/// Credentials and routing for one deployed model.
///
/// A session cannot start without a complete profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelProfile {
    /// Identifier the history document refers to (e.g. the env file name).
    pub id: String,
    pub api_key: String,
    pub endpoint: String,
    pub deployment: String,
    pub api_version: String,
}

impl ModelProfile {
    /// Build a profile from an opaque key-value lookup.
    pub fn from_lookup(
        id: impl Into<String>,
        lookup: &HashMap<String, String>,
    ) -> Result<Self, ConfigError> {
        let get = |key: &'static str| -> Result<String, ConfigError> {
            lookup
                .get(key)
                .filter(|v| !v.trim().is_empty())
                .cloned()
                .ok_or(ConfigError::MissingKey(key))
        };

        Ok(Self {
            id: id.into(),
            api_key: get(KEY_API_KEY)?,
            endpoint: get(KEY_ENDPOINT)?,
            deployment: get(KEY_DEPLOYMENT)?,
            api_version: get(KEY_API_VERSION)?,
        })
    }
}

/// Prompt templates the session pulls from configuration.
#[derive(Debug, Clone)]
pub struct PromptTemplates {
    /// Template for the lint-findings validation request.
    pub validation: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            validation: DEFAULT_VALIDATION_TEMPLATE.to_string(),
        }
    }
}

impl PromptTemplates {
    /// Overlay templates from an opaque lookup; absent keys keep defaults.
    pub fn from_lookup(lookup: &HashMap<String, String>) -> Self {
        let mut templates = Self::default();
        if let Some(validation) = lookup.get("validation") {
            templates.validation = validation.clone();
        }
        templates
    }

    /// Render the validation template for one canvas.
    pub fn render_validation(&self, code_block: &str, report: &str) -> String {
        self.validation
            .replace("{code}", code_block)
            .replace("{report}", report)
    }
}
