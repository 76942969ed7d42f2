//! Message model representing a single extracted email

use super::ThreadId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a message (RFC 5322 Message-ID or provider message id)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this id carries an actual value
    ///
    /// Malformed messages arrive without a Message-ID header; they keep an
    /// empty id and are excluded from reply-graph construction.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for MessageId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for MessageId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// An email address with optional display name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailAddress {
    /// Display name (e.g., "John Doe")
    pub name: Option<String>,
    /// Email address (e.g., "john@example.com")
    pub email: String,
}

impl EmailAddress {
    /// Create a new email address with just the email
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            name: None,
            email: email.into(),
        }
    }

    /// Create a new email address with a display name
    pub fn with_name(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            email: email.into(),
        }
    }

    /// Parse an email address from a string like "John Doe <john@example.com>"
    pub fn parse(s: &str) -> Self {
        let s = s.trim();

        // Try to parse "Name <email>" format
        if let Some(angle_start) = s.rfind('<')
            && let Some(angle_end) = s.rfind('>')
            && angle_start < angle_end
        {
            let name = s[..angle_start].trim();
            let email = s[angle_start + 1..angle_end].trim();
            return Self {
                name: if name.is_empty() {
                    None
                } else {
                    Some(name.to_string())
                },
                email: email.to_string(),
            };
        }

        // No angle brackets: take the first token that looks like an address
        if s.contains(char::is_whitespace) {
            for token in s.split_whitespace() {
                let token = token.trim_matches(|c: char| !c.is_alphanumeric() && c != '@');
                if token.contains('@') {
                    return Self {
                        name: None,
                        email: token.to_string(),
                    };
                }
            }
        }

        // Otherwise, treat the whole string as an email
        Self {
            name: None,
            email: s.to_string(),
        }
    }

    /// Format the email address for display
    pub fn display(&self) -> String {
        match &self.name {
            Some(name) => format!("{} <{}>", name, self.email),
            None => self.email.clone(),
        }
    }
}

/// A single extracted email message
///
/// Produced transiently per extraction run by the mail source; never
/// persisted by this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Message id; empty for malformed messages
    pub id: MessageId,
    /// Provider-supplied conversation id, when the source threads natively
    pub thread_id: Option<ThreadId>,
    /// Message id this message replies to, if any
    pub in_reply_to: Option<MessageId>,
    /// Ancestor message ids, oldest first
    pub references: Vec<MessageId>,
    /// When the message was sent, normalized to UTC
    ///
    /// Always present: unparseable dates are defaulted at normalization
    /// time so sort order stays total.
    pub timestamp: DateTime<Utc>,
    /// Subject line, possibly carrying "Re:"/"Fwd:" prefixes
    pub subject: String,
    /// Bare sender address (header decoration stripped)
    pub sender: String,
    /// Bare receiver address
    pub receiver: String,
    /// Plain-text body
    pub body: String,
    /// Provider labels/flags (e.g., "INBOX", "SENT", "\\Seen")
    pub labels: Vec<String>,
}

impl Message {
    /// Create a new message builder
    pub fn builder(id: MessageId) -> MessageBuilder {
        MessageBuilder::new(id)
    }
}

/// Builder for creating Message instances
pub struct MessageBuilder {
    id: MessageId,
    thread_id: Option<ThreadId>,
    in_reply_to: Option<MessageId>,
    references: Vec<MessageId>,
    timestamp: Option<DateTime<Utc>>,
    subject: String,
    sender: String,
    receiver: String,
    body: String,
    labels: Vec<String>,
}

impl MessageBuilder {
    fn new(id: MessageId) -> Self {
        Self {
            id,
            thread_id: None,
            in_reply_to: None,
            references: Vec::new(),
            timestamp: None,
            subject: String::new(),
            sender: String::new(),
            receiver: String::new(),
            body: String::new(),
            labels: Vec::new(),
        }
    }

    pub fn thread_id(mut self, thread_id: ThreadId) -> Self {
        self.thread_id = Some(thread_id);
        self
    }

    pub fn in_reply_to(mut self, in_reply_to: MessageId) -> Self {
        self.in_reply_to = Some(in_reply_to);
        self
    }

    pub fn references(mut self, references: Vec<MessageId>) -> Self {
        self.references = references;
        self
    }

    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    pub fn sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = sender.into();
        self
    }

    pub fn receiver(mut self, receiver: impl Into<String>) -> Self {
        self.receiver = receiver.into();
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn labels(mut self, labels: Vec<String>) -> Self {
        self.labels = labels;
        self
    }

    pub fn build(self) -> Message {
        Message {
            id: self.id,
            thread_id: self.thread_id,
            in_reply_to: self.in_reply_to,
            references: self.references,
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
            subject: self.subject,
            sender: self.sender,
            receiver: self.receiver,
            body: self.body,
            labels: self.labels,
        }
    }
}
