//! Raw provider-stream transcript logging.
//!
//! When enabled, every raw chunk received from the provider is appended to
//! a per-session log file with a timestamp. This is the debug channel a UI
//! can point users at when a stream misbehaves; it never affects session
//! state.

use std::{
    fs::{File, OpenOptions},
    io::Write,
    path::Path,
    sync::{Arc, Mutex},
};

use chrono::Utc;

/// Shared handle to an optional append-only transcript file.
///
/// Cloneable so the provider client can keep writing while the session owns
/// the original. A handle over `None` swallows writes.
#[derive(Clone, Default)]
pub struct StreamLog {
    file: Arc<Mutex<Option<File>>>,
}

impl StreamLog {
    /// A disabled log that discards everything.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Open (or create) `{dir}/{session_id}.stream.log` for appending.
    ///
    /// Falls back to a disabled log if the directory cannot be prepared;
    /// transcript logging must never block a generation.
    pub fn open(dir: &Path, session_id: &str) -> Self {
        let file = std::fs::create_dir_all(dir).ok().and_then(|_| {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(dir.join(format!("{session_id}.stream.log")))
                .ok()
        });
        if file.is_none() {
            log::warn!("Stream log unavailable under {}", dir.display());
        }
        Self {
            file: Arc::new(Mutex::new(file)),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.file.lock().map(|g| g.is_some()).unwrap_or(false)
    }

    /// Append one timestamped record.
    pub fn record(&self, label: &str, data: &str) {
        if let Ok(mut guard) = self.file.lock() {
            if let Some(ref mut file) = *guard {
                let ts = Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ");
                let _ = writeln!(file, "[{ts}] {label}: {data}");
                let _ = file.flush();
            }
        }
    }
}
