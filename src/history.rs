// src/history.rs

use serde::Serialize;
use std::fmt;
use std::sync::Mutex;

/// One alert record. Immutable once appended.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    /// Local wall-clock time, HH:MM:SS.
    pub timestamp: String,
    pub message: String,
}

impl fmt::Display for HistoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.timestamp, self.message)
    }
}

/// Append-only, in-memory alert history. Unbounded; lives for the process.
#[derive(Default)]
pub struct HistoryLog {
    entries: Mutex<Vec<HistoryEntry>>,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, message: &str) {
        let entry = HistoryEntry {
            timestamp: chrono::Local::now().format("%H:%M:%S").to_string(),
            message: message.to_string(),
        };
        self.entries.lock().unwrap().push(entry);
    }

    /// Full ordered history, oldest first.
    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.entries.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
