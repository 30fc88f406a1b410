//! Token usage accounting.

use serde::{Deserialize, Serialize};

/// Token counts reported by the provider.
///
/// Used both as the per-turn report attached to a completion event and as
/// the session's cumulative counter. The cumulative counter only ever grows;
/// it is zeroed by session reset, history import, or a model profile switch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

impl TokenUsage {
    /// Add a per-turn report into this cumulative counter.
    pub fn merge(&mut self, report: &TokenUsage) {
        self.input_tokens += report.input_tokens;
        self.output_tokens += report.output_tokens;
        self.total_tokens += report.total_tokens;
    }

    /// Reset all counters to zero.
    pub fn reset(&mut self) {
        *self = TokenUsage::default();
    }
}
