//! Mail source integration
//!
//! This module provides:
//! - The `MailSource` seam the extraction pipeline fetches through
//! - The provider-neutral raw record shape sources hand over
//! - Normalization of raw records to domain models
//!
//! Authentication, pagination, and charset decoding live behind the
//! `MailSource` implementation; this crate only ever sees fully-fetched
//! raw records.

mod normalize;

pub use normalize::normalize_message;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Labels attached during normalization for folder-derived state
pub mod labels {
    pub const INBOX: &str = "INBOX";
    pub const SENT: &str = "SENT";
}

/// A raw message as handed over by a mail source
///
/// Header values are unparsed strings; bodies may be plain text, HTML, or
/// base64 payload data depending on what the provider exposes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawMessage {
    /// Message-ID header or provider message id
    pub message_id: Option<String>,
    /// Provider conversation id (e.g., Gmail X-GM-THRID); absent for
    /// sources without native threading
    pub thread_id: Option<String>,
    /// In-Reply-To header
    pub in_reply_to: Option<String>,
    /// References header entries, oldest ancestor first
    #[serde(default)]
    pub references: Vec<String>,
    /// Raw Date header
    pub date: Option<String>,
    /// Raw Subject header
    pub subject: Option<String>,
    /// Raw From header ("Name <addr>" or bare address)
    pub from: Option<String>,
    /// Raw To header
    pub to: Option<String>,
    /// Decoded plain-text body, when the source already extracted one
    pub body_text: Option<String>,
    /// Decoded HTML body
    pub body_html: Option<String>,
    /// Base64-encoded body payload (Gmail-style), decoded lazily
    pub body_data: Option<String>,
    /// Provider flags (e.g., "\\Seen", "\\Flagged")
    #[serde(default)]
    pub flags: Vec<String>,
    /// Folder the message was fetched from, when the source is folder-based
    pub folder: Option<String>,
}

/// A source of raw messages: a REST mail API or an IMAP session
///
/// Implementations own their credentials, connection lifecycle, and
/// pagination. Fetching is expected to be best-effort: a single broken
/// message should be skipped by the source, not fail the fetch.
pub trait MailSource {
    /// Fetch raw messages, optionally limited to the trailing
    /// `num_prev_days` days
    fn fetch_messages(&self, num_prev_days: Option<u32>) -> Result<Vec<RawMessage>>;
}
