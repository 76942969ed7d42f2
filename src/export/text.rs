//! Thread flattening for embedding
//!
//! Renders exported thread records as plain text, one labelled block per
//! thread. The downstream chunker splits on the separator lines, so the
//! layout here is part of the contract.

use super::{MessageRecord, ThreadRecord};

const THREAD_SEPARATOR: &str =
    "==========================================================";
const MESSAGE_SEPARATOR: &str =
    "----------------------------------------------------------";

/// Flatten thread records into embedding-ready text
pub fn flatten_threads(records: &[ThreadRecord]) -> String {
    let mut out: Vec<String> = records.iter().map(format_thread).collect();
    out.push(THREAD_SEPARATOR.to_string());
    out.join("\n")
}

fn format_thread(thread: &ThreadRecord) -> String {
    let mut lines = vec![
        THREAD_SEPARATOR.to_string(),
        format!("THREAD ID: {}", thread.thread_id),
        format!("Total Messages: {}", thread.total_messages),
        format!("Thread Labels: {}", thread.labels.join(", ")),
        format!("Reply To Message ID: {}", thread.reply_to_message_id),
    ];

    for (i, message) in thread.messages.iter().enumerate() {
        lines.push(MESSAGE_SEPARATOR.to_string());
        lines.push(String::new());
        lines.push(format_message(message, i + 1));
        lines.push(String::new());
    }

    lines.join("\n")
}

fn format_message(message: &MessageRecord, number: usize) -> String {
    [
        format!("MESSAGE {}", number),
        format!("ID: {}", message.message_id),
        format!("Date: {}", message.datetime),
        format!("From: {}", message.sender),
        format!("To: {}", message.receiver),
        format!("Subject: {}", message.subject),
        format!("Labels: {}", message.labels.join(", ")),
        format!("References: {:?}", message.references),
        format!("In Reply To: {}", message.in_reply_to),
        String::new(),
        "BODY:".to_string(),
        message.body.clone(),
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_record() -> ThreadRecord {
        ThreadRecord {
            thread_id: "t1".to_string(),
            total_messages: 1,
            labels: vec!["INBOX".to_string(), "SENT".to_string()],
            reply_to_message_id: "m1".to_string(),
            messages: vec![MessageRecord {
                message_id: "m1".to_string(),
                datetime: "2025-07-14 08:30:00 UTC".to_string(),
                timestamp: 1752481800.0,
                sender: "alice@example.com".to_string(),
                receiver: "bob@example.com".to_string(),
                subject: "Hello".to_string(),
                body: "Hi Bob".to_string(),
                references: vec![],
                in_reply_to: String::new(),
                labels: vec!["INBOX".to_string()],
            }],
        }
    }

    #[test]
    fn test_flatten_layout() {
        let text = flatten_threads(&[make_record()]);
        let expected = "\
==========================================================
THREAD ID: t1
Total Messages: 1
Thread Labels: INBOX, SENT
Reply To Message ID: m1
----------------------------------------------------------

MESSAGE 1
ID: m1
Date: 2025-07-14 08:30:00 UTC
From: alice@example.com
To: bob@example.com
Subject: Hello
Labels: INBOX
References: []
In Reply To: \n
BODY:
Hi Bob

==========================================================";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_flatten_empty() {
        assert_eq!(flatten_threads(&[]), THREAD_SEPARATOR);
    }

    #[test]
    fn test_message_numbering() {
        let mut record = make_record();
        let mut second = record.messages[0].clone();
        second.message_id = "m2".to_string();
        record.messages.push(second);
        record.total_messages = 2;

        let text = flatten_threads(&[record]);
        assert!(text.contains("MESSAGE 1"));
        assert!(text.contains("MESSAGE 2"));
    }
}
