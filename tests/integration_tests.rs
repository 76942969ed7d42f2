//! Integration tests for the mailweave crate
//!
//! These tests verify the complete flow from raw source records through
//! reconstruction to the exported contract.

use anyhow::Result;
use chrono::{Duration, Utc};
use mailweave::models::{Message, MessageId, Thread, ThreadId};
use mailweave::{
    MailSource, RawMessage, normalize_message, reconstruct, thread_records, write_json, write_text,
};
use tempfile::TempDir;

/// Canned source standing in for a Gmail/IMAP fetcher
struct FixtureSource {
    records: Vec<RawMessage>,
}

impl MailSource for FixtureSource {
    fn fetch_messages(&self, _num_prev_days: Option<u32>) -> Result<Vec<RawMessage>> {
        Ok(self.records.clone())
    }
}

/// Helper to create test messages
fn make_message(id: &str, subject: &str, age_hours: i64) -> Message {
    Message::builder(MessageId::new(id))
        .timestamp(Utc::now() - Duration::hours(age_hours))
        .subject(subject)
        .sender("alice@example.com")
        .receiver("bob@example.com")
        .body(format!("This is the body of {}", id))
        .labels(vec!["INBOX".to_string()])
        .build()
}

fn with_thread_id(mut msg: Message, thread_id: &str) -> Message {
    msg.thread_id = Some(ThreadId::new(thread_id));
    msg
}

fn with_reply_to(mut msg: Message, parent: &str) -> Message {
    msg.in_reply_to = Some(MessageId::new(parent));
    msg
}

#[test]
fn test_partition_under_provider_ids() {
    // Every id-bearing message lands in exactly one thread
    let messages = vec![
        with_thread_id(make_message("m1", "A", 5), "T1"),
        with_thread_id(make_message("m2", "Re: A", 4), "T1"),
        with_thread_id(make_message("m3", "B", 3), "T2"),
        with_thread_id(make_message("m4", "C", 2), "T3"),
        with_thread_id(make_message("m5", "Re: B", 1), "T2"),
    ];

    let threads = reconstruct(&messages);

    let mut seen: Vec<&str> = threads
        .iter()
        .flat_map(|t| t.messages.iter().map(|m| m.id.as_str()))
        .collect();
    seen.sort();
    assert_eq!(seen, vec!["m1", "m2", "m3", "m4", "m5"]);
}

#[test]
fn test_chronological_order_within_threads() {
    let messages = vec![
        with_thread_id(make_message("m1", "A", 1), "T1"),
        with_thread_id(make_message("m2", "A", 5), "T1"),
        with_thread_id(make_message("m3", "A", 3), "T1"),
    ];

    for thread in reconstruct(&messages) {
        for pair in thread.messages.windows(2) {
            assert!(pair[0].timestamp <= pair[1].timestamp);
        }
    }
}

#[test]
fn test_threads_sorted_newest_first() {
    let messages = vec![
        with_thread_id(make_message("m1", "Old", 10), "T1"),
        with_thread_id(make_message("m2", "New", 1), "T2"),
        with_thread_id(make_message("m3", "Middle", 5), "T3"),
    ];

    let threads = reconstruct(&messages);
    for pair in threads.windows(2) {
        assert!(pair[0].last_message_at >= pair[1].last_message_at);
    }
    assert_eq!(threads[0].id.as_str(), "T2");
    assert_eq!(threads[2].id.as_str(), "T1");
}

#[test]
fn test_reconstruction_is_deterministic() {
    let messages = vec![
        make_message("m1", "Root", 4),
        with_reply_to(make_message("m2", "Re: Root", 3), "m1"),
        make_message("m3", "Standalone", 2),
        with_reply_to(make_message("m4", "Re: Root", 1), "m2"),
    ];

    let first = reconstruct(&messages);
    let second = reconstruct(&messages);
    assert_eq!(first, second);
    assert_eq!(thread_records(&first), thread_records(&second));
}

#[test]
fn test_provider_ids_take_precedence() {
    // Reply headers and shared subjects would merge m1/m2; the explicit
    // ids keep them in separate conversations and must win.
    let messages = vec![
        with_thread_id(make_message("m1", "Topic", 2), "T1"),
        with_thread_id(with_reply_to(make_message("m2", "Re: Topic", 1), "m1"), "T2"),
    ];

    let threads = reconstruct(&messages);
    assert_eq!(threads.len(), 2);
    let ids: Vec<&str> = threads.iter().map(|t| t.id.as_str()).collect();
    assert!(ids.contains(&"T1") && ids.contains(&"T2"));
}

#[test]
fn test_raw_records_to_export_contract() {
    // Full pipeline: raw IMAP-style records -> normalize -> reconstruct
    // -> exported JSON and flattened text.
    let raws = vec![
        RawMessage {
            message_id: Some("<a@example.com>".to_string()),
            date: Some("Mon, 14 Jul 2025 10:30:00 +0000".to_string()),
            subject: Some("Project Update".to_string()),
            from: Some("Alice <alice@example.com>".to_string()),
            to: Some("bob@example.com".to_string()),
            body_text: Some("First update".to_string()),
            folder: Some("INBOX".to_string()),
            ..RawMessage::default()
        },
        RawMessage {
            message_id: Some("<b@example.com>".to_string()),
            in_reply_to: Some("<a@example.com>".to_string()),
            references: vec!["<a@example.com>".to_string()],
            date: Some("Mon, 14 Jul 2025 11:00:00 +0000".to_string()),
            subject: Some("Re: Project Update".to_string()),
            from: Some("Bob <bob@example.com>".to_string()),
            to: Some("alice@example.com".to_string()),
            body_text: Some("Thanks Alice".to_string()),
            folder: Some("[Gmail]/Sent Mail".to_string()),
            ..RawMessage::default()
        },
    ];

    let messages: Vec<Message> = raws.into_iter().map(normalize_message).collect();
    let threads = reconstruct(&messages);
    assert_eq!(threads.len(), 1);

    let records = thread_records(&threads);
    let record = &records[0];
    assert_eq!(record.thread_id, "<a@example.com>");
    assert_eq!(record.total_messages, 2);
    assert_eq!(record.labels, vec!["INBOX", "SENT"]);
    assert_eq!(record.reply_to_message_id, "<b@example.com>");
    assert_eq!(record.messages[0].sender, "alice@example.com");
    assert_eq!(record.messages[0].datetime, "2025-07-14 10:30:00 UTC");
    assert_eq!(record.messages[1].in_reply_to, "<a@example.com>");

    let dir = TempDir::new().unwrap();
    let json_path = dir.path().join("alice@example.com.json");
    write_json(&threads, &json_path).unwrap();
    let text_path = write_text(&threads, &json_path).unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(json[0]["thread_id"], "<a@example.com>");
    assert_eq!(json[0]["messages"][1]["subject"], "Re: Project Update");

    let text = std::fs::read_to_string(&text_path).unwrap();
    assert!(text.contains("THREAD ID: <a@example.com>"));
    assert!(text.contains("MESSAGE 2"));
    assert!(text.contains("BODY:\nThanks Alice"));
}

#[test]
fn test_unparseable_date_still_threads() {
    // A broken Date header defaults instead of failing, and
    // the message still lands in exactly one thread.
    let raw = RawMessage {
        message_id: Some("<broken@example.com>".to_string()),
        date: Some("not a real date".to_string()),
        subject: Some("Hello".to_string()),
        ..RawMessage::default()
    };

    let msg = normalize_message(raw);
    let threads = reconstruct(&[msg]);
    assert_eq!(threads.len(), 1);
    assert_eq!(threads[0].total_messages(), 1);
    assert_eq!(threads[0].reply_to_message_id.as_str(), "<broken@example.com>");
}

#[test]
fn test_unrelated_messages_become_singletons() {
    let messages = vec![
        make_message("m1", "Invoice", 3),
        make_message("m2", "Lunch?", 2),
        make_message("m3", "Weekly report", 1),
    ];

    let threads = reconstruct(&messages);
    assert_eq!(threads.len(), 3);
    assert!(threads.iter().all(|t| t.total_messages() == 1));
}

#[test]
fn test_empty_batch_round_trip() {
    let threads = reconstruct(&[]);
    assert!(threads.is_empty());

    let dir = TempDir::new().unwrap();
    let json_path = dir.path().join("empty.json");
    write_json(&threads, &json_path).unwrap();
    assert_eq!(std::fs::read_to_string(&json_path).unwrap(), "[]");
}

#[test]
fn test_message_without_id_kept_in_provider_bucket() {
    let mut anon = make_message("", "No id", 1);
    anon.thread_id = Some(ThreadId::new("T1"));
    let messages = vec![with_thread_id(make_message("m1", "No id", 2), "T1"), anon];

    let threads = reconstruct(&messages);
    assert_eq!(threads.len(), 1);
    assert_eq!(threads[0].total_messages(), 2);
}

#[test]
fn test_fetch_through_source_seam() {
    let source = FixtureSource {
        records: vec![
            RawMessage {
                message_id: Some("<x@example.com>".to_string()),
                thread_id: Some("T9".to_string()),
                date: Some("Tue, 15 Jul 2025 09:00:00 +0000".to_string()),
                subject: Some("Status".to_string()),
                from: Some("carol@example.com".to_string()),
                to: Some("dave@example.com".to_string()),
                body_text: Some("All green".to_string()),
                ..RawMessage::default()
            },
            RawMessage {
                message_id: Some("<y@example.com>".to_string()),
                thread_id: Some("T9".to_string()),
                date: Some("Tue, 15 Jul 2025 09:30:00 +0000".to_string()),
                subject: Some("Re: Status".to_string()),
                from: Some("dave@example.com".to_string()),
                to: Some("carol@example.com".to_string()),
                body_text: Some("Great".to_string()),
                ..RawMessage::default()
            },
        ],
    };

    let raws = source.fetch_messages(None).unwrap();
    let messages: Vec<Message> = raws.into_iter().map(normalize_message).collect();
    let threads = reconstruct(&messages);

    assert_eq!(threads.len(), 1);
    assert_eq!(threads[0].id.as_str(), "T9");
    assert_eq!(threads[0].reply_to_message_id.as_str(), "<y@example.com>");
}

#[test]
fn test_thread_model_accessors() {
    let thread = Thread::from_messages(
        ThreadId::new("t1"),
        vec![make_message("m1", "A", 2), make_message("m2", "A", 1)],
    )
    .unwrap();

    assert_eq!(thread.total_messages(), 2);
    assert_eq!(thread.last_message_at, thread.messages[1].timestamp);
}
