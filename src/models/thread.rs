//! Thread model representing a reconstructed conversation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::{Message, MessageId};

/// Unique identifier for a thread
///
/// Either provider-supplied, or synthesized during reconstruction (root
/// message id for reply graphs, a stable subject hash for the fallback).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ThreadId(pub String);

impl ThreadId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ThreadId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ThreadId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A thread: one conversation, messages in chronological order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thread {
    /// Thread id
    pub id: ThreadId,
    /// Member messages, sorted ascending by timestamp
    pub messages: Vec<Message>,
    /// Union of all member messages' labels, sorted for determinism
    pub labels: Vec<String>,
    /// Id of the chronologically last message (what a follow-up replies to)
    pub reply_to_message_id: MessageId,
    /// Timestamp of the chronologically last message
    pub last_message_at: DateTime<Utc>,
}

impl Thread {
    /// Assemble a thread from an unordered batch of member messages
    ///
    /// Sorts ascending by timestamp (stable, so equal timestamps keep
    /// their input order), unions labels, and anchors reply_to on the
    /// last message. Returns None for an empty batch.
    pub fn from_messages(id: ThreadId, mut messages: Vec<Message>) -> Option<Self> {
        if messages.is_empty() {
            return None;
        }

        messages.sort_by_key(|m| m.timestamp);

        let labels: BTreeSet<String> = messages
            .iter()
            .flat_map(|m| m.labels.iter().cloned())
            .collect();

        let last = messages.last().expect("non-empty after sort");
        let reply_to_message_id = last.id.clone();
        let last_message_at = last.timestamp;

        Some(Self {
            id,
            messages,
            labels: labels.into_iter().collect(),
            reply_to_message_id,
            last_message_at,
        })
    }

    /// Number of messages in the thread
    pub fn total_messages(&self) -> usize {
        self.messages.len()
    }
}
