//! Ordered store of editable code canvases.
//!
//! Canvases are reference code buffers attached to the conversation. The
//! store is bounded, keeps at least one buffer at all times, and tracks a
//! revision counter that a UI layer can key editor widgets off to force a
//! redraw after content changes outside the editor itself.

use thiserror::Error;

/// Maximum number of canvases a session may hold.
pub const MAX_CANVASES: usize = 20;

/// Placeholder content of a freshly created or cleared canvas.
///
/// The prompt compiler and the analyzer treat a buffer whose trimmed content
/// equals this sentinel as empty.
pub const DEFAULT_CANVAS_CONTENT: &str = "# Write your code here\n";

#[derive(Error, Debug)]
pub enum CanvasError {
    #[error("Canvas index out of range: {0}")]
    OutOfRange(usize),

    #[error("Uploaded file is not valid UTF-8 text: {0}")]
    Decode(#[from] std::str::Utf8Error),
}

/// Whether canvas content counts as empty for prompting and analysis.
pub fn is_blank(content: &str) -> bool {
    let trimmed = content.trim();
    trimmed.is_empty() || trimmed == DEFAULT_CANVAS_CONTENT.trim()
}

/// Ordered collection of code canvases.
#[derive(Debug, Clone)]
pub struct CanvasStore {
    buffers: Vec<String>,
    multi_mode: bool,
    revision: u64,
}

impl Default for CanvasStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CanvasStore {
    /// Create a store with a single default canvas, single-canvas mode.
    pub fn new() -> Self {
        Self {
            buffers: vec![DEFAULT_CANVAS_CONTENT.to_string()],
            multi_mode: false,
            revision: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    pub fn multi_mode(&self) -> bool {
        self.multi_mode
    }

    /// Monotonically incrementing counter, bumped by every content change.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.buffers.get(index).map(String::as_str)
    }

    /// Clone the buffers for freezing into a generation request.
    pub fn snapshot(&self) -> Vec<String> {
        self.buffers.clone()
    }

    /// Append a new default canvas. Returns false once the bound is reached;
    /// the caller surfaces that as a capacity notice, never as an error.
    /// In single-canvas mode the set stays at exactly one element, so adds
    /// are refused there too.
    pub fn add(&mut self) -> bool {
        if !self.multi_mode || self.buffers.len() >= MAX_CANVASES {
            return false;
        }
        self.buffers.push(DEFAULT_CANVAS_CONTENT.to_string());
        self.revision += 1;
        true
    }

    /// Overwrite one canvas with editor content.
    pub fn set_content(&mut self, index: usize, content: impl Into<String>) -> Result<(), CanvasError> {
        let buffer = self
            .buffers
            .get_mut(index)
            .ok_or(CanvasError::OutOfRange(index))?;
        *buffer = content.into();
        self.revision += 1;
        Ok(())
    }

    /// Reset one canvas to the default sentinel.
    pub fn clear(&mut self, index: usize) -> Result<(), CanvasError> {
        self.set_content(index, DEFAULT_CANVAS_CONTENT)
    }

    /// Reset every canvas to the default sentinel.
    pub fn clear_all(&mut self) {
        for buffer in &mut self.buffers {
            *buffer = DEFAULT_CANVAS_CONTENT.to_string();
        }
        self.revision += 1;
    }

    /// Toggle multi-canvas mode.
    ///
    /// Leaving multi mode truncates the store to its first canvas; the
    /// discarded buffers are gone for good. Entering multi mode leaves
    /// content untouched.
    pub fn set_multi_mode(&mut self, multi: bool) {
        if self.multi_mode && !multi && self.buffers.len() > 1 {
            self.buffers.truncate(1);
            self.revision += 1;
        }
        self.multi_mode = multi;
    }

    /// Overwrite one canvas with an uploaded file's raw bytes.
    pub fn replace_from_upload(&mut self, index: usize, raw: &[u8]) -> Result<(), CanvasError> {
        let text = std::str::from_utf8(raw)?;
        self.set_content(index, text)
    }

    /// Replace the whole set, e.g. from a history import. An empty list
    /// falls back to a single default canvas and an oversized one is cut at
    /// the bound, keeping the store invariants.
    pub fn replace_all(&mut self, buffers: Vec<String>, multi_mode: bool) {
        self.buffers = if buffers.is_empty() {
            vec![DEFAULT_CANVAS_CONTENT.to_string()]
        } else {
            buffers
        };
        self.multi_mode = multi_mode;
        if !self.multi_mode {
            self.buffers.truncate(1);
        } else {
            self.buffers.truncate(MAX_CANVASES);
        }
        self.revision += 1;
    }
}
