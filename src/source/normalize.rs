//! Raw record normalization
//!
//! Converts provider-neutral raw records to domain Messages. Recovery
//! over rejection: a malformed field gets a safe default and a warning,
//! never an error, so partial extraction still yields a usable batch.

use chrono::{DateTime, Utc};
use log::warn;

use super::{RawMessage, labels};
use crate::models::{EmailAddress, Message, MessageId, ThreadId};

/// Normalize a raw source record to a domain Message
pub fn normalize_message(raw: RawMessage) -> Message {
    let id = MessageId::new(raw.message_id.unwrap_or_default());

    let sender = raw
        .from
        .map(|h| EmailAddress::parse(&h).email)
        .unwrap_or_default();
    let receiver = raw
        .to
        .map(|h| EmailAddress::parse(&h).email)
        .unwrap_or_default();

    let timestamp = parse_date(raw.date.as_deref());

    let body = extract_body(
        raw.body_text.as_deref(),
        raw.body_html.as_deref(),
        raw.body_data.as_deref(),
    );

    let mut msg_labels: Vec<String> = raw.flags;
    if let Some(folder) = &raw.folder {
        let folder = folder.to_lowercase();
        if folder.contains("sent") {
            msg_labels.push(labels::SENT.to_string());
        } else if folder.contains("inbox") {
            msg_labels.push(labels::INBOX.to_string());
        }
    }

    let mut builder = Message::builder(id)
        .timestamp(timestamp)
        .subject(raw.subject.unwrap_or_default())
        .sender(sender)
        .receiver(receiver)
        .body(body)
        .references(
            raw.references
                .into_iter()
                .map(MessageId::new)
                .collect(),
        )
        .labels(msg_labels);

    if let Some(thread_id) = raw.thread_id.filter(|t| !t.is_empty()) {
        builder = builder.thread_id(ThreadId::new(thread_id));
    }
    if let Some(in_reply_to) = raw.in_reply_to.filter(|r| !r.is_empty()) {
        builder = builder.in_reply_to(MessageId::new(in_reply_to));
    }

    builder.build()
}

/// Parse an RFC 2822 Date header to UTC, defaulting to now on failure
///
/// The default keeps sort order total: every message has a timestamp.
fn parse_date(date: Option<&str>) -> DateTime<Utc> {
    let Some(date) = date else {
        return Utc::now();
    };

    match DateTime::parse_from_rfc2822(date.trim()) {
        Ok(parsed) => parsed.with_timezone(&Utc),
        Err(e) => {
            warn!("Unparseable Date header {:?}: {}, defaulting to now", date, e);
            Utc::now()
        }
    }
}

/// Pick the best available body: plain text, then base64 payload, then
/// HTML stripped to text
fn extract_body(text: Option<&str>, html: Option<&str>, data: Option<&str>) -> String {
    if let Some(text) = text
        && !text.is_empty()
    {
        return text.to_string();
    }

    if let Some(data) = data
        && let Some(decoded) = decode_base64_body(data)
    {
        return decoded;
    }

    if let Some(html) = html {
        return strip_html(html);
    }

    String::new()
}

/// Decode base64-encoded body data
///
/// Gmail uses URL-safe base64 but padding can vary, so we try multiple
/// decoders.
fn decode_base64_body(data: &str) -> Option<String> {
    use base64::Engine;
    use base64::engine::general_purpose::{
        STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD,
    };

    let decoders: &[&base64::engine::GeneralPurpose] =
        &[&URL_SAFE_NO_PAD, &URL_SAFE, &STANDARD, &STANDARD_NO_PAD];

    for decoder in decoders {
        if let Ok(decoded) = decoder.decode(data) {
            if let Ok(s) = String::from_utf8(decoded) {
                return Some(s);
            }
        }
    }

    warn!("Undecodable base64 body payload ({} bytes)", data.len());
    None
}

/// Strip HTML tags and decode common entities, keeping the text content
fn strip_html(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;

    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }

    decode_html_entities(out.trim())
}

/// Decode HTML entities in text
fn decode_html_entities(s: &str) -> String {
    s.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
}
