//! Mailweave - email thread reconstruction
//!
//! This crate turns a flat batch of extracted email messages into
//! canonical conversation threads:
//! - Domain models (Message, Thread, EmailAddress)
//! - Raw-record normalization from a mail source (Gmail API or IMAP)
//! - Three-tier thread reconstruction (provider ids, reply graph,
//!   subject fallback)
//! - Export records for the embedding/retrieval pipeline (nested JSON
//!   plus flattened text)
//!
//! The reconstruction pass is pure and in-memory. Fetching, credentials,
//! and vector storage live in the surrounding system behind the
//! `MailSource` seam and the export contract.

pub mod export;
pub mod models;
pub mod source;
pub mod threading;

pub use export::{
    DATETIME_FORMAT, ExportError, MessageRecord, ThreadRecord, flatten_threads, thread_records,
    write_json, write_text,
};
pub use models::{EmailAddress, Message, MessageBuilder, MessageId, Thread, ThreadId};
pub use source::{MailSource, RawMessage, normalize_message};
pub use threading::reconstruct;
