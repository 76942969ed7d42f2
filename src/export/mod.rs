//! Export contract for downstream consumers
//!
//! Threads leave this crate as nested JSON records consumed by the
//! embedding/preprocessing pipeline, and as flattened plain text ready
//! for embedding. Field names and nesting are the integration contract;
//! renaming anything here breaks the downstream side.

mod text;

pub use text::flatten_threads;

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Message, Thread};

/// Fixed datetime rendering used in exported records
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// Errors surfaced by the export boundary
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize threads: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// One message in the exported shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub message_id: String,
    /// Rendered with [`DATETIME_FORMAT`]
    pub datetime: String,
    /// Fractional epoch seconds
    pub timestamp: f64,
    pub sender: String,
    pub receiver: String,
    pub subject: String,
    pub body: String,
    pub references: Vec<String>,
    /// Empty string when the message replies to nothing
    pub in_reply_to: String,
    pub labels: Vec<String>,
}

impl From<&Message> for MessageRecord {
    fn from(msg: &Message) -> Self {
        Self {
            message_id: msg.id.0.clone(),
            datetime: format_datetime(msg.timestamp),
            timestamp: msg.timestamp.timestamp_millis() as f64 / 1000.0,
            sender: msg.sender.clone(),
            receiver: msg.receiver.clone(),
            subject: msg.subject.clone(),
            body: msg.body.clone(),
            references: msg.references.iter().map(|r| r.0.clone()).collect(),
            in_reply_to: msg
                .in_reply_to
                .as_ref()
                .map(|r| r.0.clone())
                .unwrap_or_default(),
            labels: msg.labels.clone(),
        }
    }
}

/// One thread in the exported shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadRecord {
    pub thread_id: String,
    pub total_messages: usize,
    pub labels: Vec<String>,
    pub reply_to_message_id: String,
    pub messages: Vec<MessageRecord>,
}

impl From<&Thread> for ThreadRecord {
    fn from(thread: &Thread) -> Self {
        Self {
            thread_id: thread.id.0.clone(),
            total_messages: thread.total_messages(),
            labels: thread.labels.clone(),
            reply_to_message_id: thread.reply_to_message_id.0.clone(),
            messages: thread.messages.iter().map(MessageRecord::from).collect(),
        }
    }
}

/// Convert reconstructed threads to their exported shape
pub fn thread_records(threads: &[Thread]) -> Vec<ThreadRecord> {
    threads.iter().map(ThreadRecord::from).collect()
}

/// Write threads as pretty-printed JSON
pub fn write_json(threads: &[Thread], path: &Path) -> Result<(), ExportError> {
    let records = thread_records(threads);
    let json = serde_json::to_string_pretty(&records)?;
    fs::write(path, json).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Write threads as embedding-ready flattened text
///
/// The output lands next to `json_path` with a `.txt` extension and the
/// written path is returned.
pub fn write_text(threads: &[Thread], json_path: &Path) -> Result<PathBuf, ExportError> {
    let records = thread_records(threads);
    let path = json_path.with_extension("txt");
    fs::write(&path, flatten_threads(&records)).map_err(|source| ExportError::Io {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

fn format_datetime(ts: DateTime<Utc>) -> String {
    ts.format(DATETIME_FORMAT).to_string()
}
