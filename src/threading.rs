//! Thread reconstruction
//!
//! Groups a flat batch of extracted messages into conversations. Three
//! strategies are tried in priority order, first hit wins for the whole
//! batch:
//!
//! 1. Provider thread ids (sources with native threading, e.g. Gmail)
//! 2. Reply-graph reconstruction from In-Reply-To/References headers
//! 3. Subject grouping after stripping one "Re:"/"Fwd:" prefix
//!
//! Whatever the strategy, the output is canonical: messages sorted
//! ascending by timestamp within each thread, threads sorted newest-first
//! by their last message. The whole pass is pure and in-memory; a second
//! call over the same batch yields the same result.

use std::collections::{HashMap, HashSet};

use log::{debug, warn};

use crate::models::{Message, Thread, ThreadId};

/// Reconstruct threads from a flat batch of messages
///
/// An empty batch yields an empty result. Malformed members (missing
/// subject, empty message id) are tolerated; they never abort the batch.
pub fn reconstruct(messages: &[Message]) -> Vec<Thread> {
    if messages.is_empty() {
        return Vec::new();
    }

    let buckets = if messages
        .iter()
        .any(|m| m.thread_id.as_ref().is_some_and(|t| !t.0.is_empty()))
    {
        debug!("Grouping {} messages by provider thread ids", messages.len());
        group_by_provider_id(messages)
    } else if let Some(buckets) = group_by_reply_graph(messages) {
        debug!("Reconstructed threads from reply graph");
        buckets
    } else {
        debug!("No thread ids or reply relationships, grouping by subject");
        group_by_subject(messages)
    };

    let mut threads: Vec<Thread> = buckets
        .into_iter()
        .filter_map(|(id, msgs)| Thread::from_messages(id, msgs))
        .collect();

    // Newest conversation first. Stable, so buckets that tie keep their
    // first-seen order and repeated runs agree.
    threads.sort_by(|a, b| b.last_message_at.cmp(&a.last_message_at));
    threads
}

/// Grouping buckets that preserve first-seen key order
///
/// HashMap iteration order would leak into the output wherever the final
/// thread sort ties, so buckets are kept in a Vec with a side index.
struct Buckets {
    order: Vec<(ThreadId, Vec<Message>)>,
    index: HashMap<String, usize>,
}

impl Buckets {
    fn new() -> Self {
        Self {
            order: Vec::new(),
            index: HashMap::new(),
        }
    }

    fn push(&mut self, key: ThreadId, message: Message) {
        if let Some(&i) = self.index.get(key.as_str()) {
            self.order[i].1.push(message);
        } else {
            self.index.insert(key.0.clone(), self.order.len());
            self.order.push((key, vec![message]));
        }
    }
}

impl IntoIterator for Buckets {
    type Item = (ThreadId, Vec<Message>);
    type IntoIter = std::vec::IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.order.into_iter()
    }
}

/// Strategy 1: group strictly by the provider-supplied thread id
///
/// Authoritative whenever present. Messages without a thread id cannot be
/// placed (the provider chose not to thread them) and are dropped with a
/// warning.
fn group_by_provider_id(messages: &[Message]) -> Buckets {
    let mut buckets = Buckets::new();
    let mut dropped = 0usize;

    for msg in messages {
        match msg.thread_id.as_ref().filter(|t| !t.0.is_empty()) {
            Some(thread_id) => buckets.push(thread_id.clone(), msg.clone()),
            None => dropped += 1,
        }
    }

    if dropped > 0 {
        warn!("{dropped} messages without a provider thread id were dropped");
    }

    buckets
}

/// Strategy 2: rebuild conversations from reply headers
///
/// A message's parent is its In-Reply-To when that resolves to a message
/// in the batch, else the first resolvable entry of its References.
/// Messages with no resolvable parent are roots; every message reachable
/// from a root through the child adjacency joins that root's thread,
/// keyed by the root's own message id.
///
/// Returns None when no message resolves a parent at all, signalling the
/// caller to fall back to subject grouping.
fn group_by_reply_graph(messages: &[Message]) -> Option<Buckets> {
    let by_id: HashMap<&str, &Message> = messages
        .iter()
        .filter(|m| !m.id.is_empty())
        .map(|m| (m.id.as_str(), m))
        .collect();

    // message id -> parent id, only for resolvable parents
    let mut parent: HashMap<&str, &str> = HashMap::new();
    // parent id -> child ids, in input order
    let mut children: HashMap<&str, Vec<&str>> = HashMap::new();

    for msg in messages {
        if msg.id.is_empty() {
            continue;
        }
        let resolved = msg
            .in_reply_to
            .as_ref()
            .filter(|p| by_id.contains_key(p.as_str()))
            .or_else(|| {
                msg.references
                    .iter()
                    .find(|r| by_id.contains_key(r.as_str()))
            });
        if let Some(p) = resolved {
            parent.insert(msg.id.as_str(), p.as_str());
            children.entry(p.as_str()).or_default().push(msg.id.as_str());
        }
    }

    if parent.is_empty() {
        return None;
    }

    let mut buckets = Buckets::new();
    let mut visited: HashSet<&str> = HashSet::new();

    // Roots in input order keeps the pass deterministic.
    for msg in messages {
        if msg.id.is_empty() || parent.contains_key(msg.id.as_str()) {
            continue;
        }
        expand_root(msg.id.as_str(), &by_id, &children, &mut visited, &mut buckets);
    }

    // A reference cycle with no root leaves its members unvisited; break
    // it at the first member in input order so every id-bearing message
    // still lands in exactly one thread.
    for msg in messages {
        if !msg.id.is_empty() && !visited.contains(msg.id.as_str()) {
            expand_root(msg.id.as_str(), &by_id, &children, &mut visited, &mut buckets);
        }
    }

    Some(buckets)
}

/// Depth-first expansion of one thread from a root message id
fn expand_root<'a>(
    root: &'a str,
    by_id: &HashMap<&str, &Message>,
    children: &HashMap<&str, Vec<&'a str>>,
    visited: &mut HashSet<&'a str>,
    buckets: &mut Buckets,
) {
    let thread_id = ThreadId::new(root);
    let mut stack = vec![root];

    while let Some(id) = stack.pop() {
        // First assignment wins; guards against cycles from malformed
        // reference chains.
        if !visited.insert(id) {
            continue;
        }
        if let Some(member) = by_id.get(id) {
            buckets.push(thread_id.clone(), (*member).clone());
        }
        if let Some(kids) = children.get(id) {
            for &kid in kids.iter().rev() {
                stack.push(kid);
            }
        }
    }
}

/// Strategy 3: group by subject after prefix normalization
///
/// Each bucket gets a synthetic id derived from a stable hash of the
/// normalized subject, so repeated runs over the same data agree.
fn group_by_subject(messages: &[Message]) -> Buckets {
    let mut buckets = Buckets::new();

    for msg in messages {
        let normalized = normalize_subject(&msg.subject);
        let thread_id = ThreadId::new(synthetic_thread_id(normalized));
        buckets.push(thread_id, msg.clone());
    }

    buckets
}

/// Strip a single leading "Re:" or "Fwd:" prefix, case-insensitively
///
/// Applied once, not recursively: "Re: Re: X" normalizes to "Re: X". One
/// reply hop is the dominant case; deeper nesting stays distinct.
fn normalize_subject(subject: &str) -> &str {
    for prefix in ["re:", "fwd:"] {
        // ASCII prefix match, so slicing past it lands on a char boundary
        if subject.as_bytes().len() >= prefix.len()
            && subject.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
        {
            return subject[prefix.len()..].trim_start();
        }
    }
    subject
}

/// Derive a stable synthetic thread id from a normalized subject
///
/// FNV-1a over the subject bytes, truncated to a 7-digit decimal string.
fn synthetic_thread_id(subject: &str) -> String {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x100_0000_01b3;

    let mut hash = FNV_OFFSET;
    for byte in subject.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }

    format!("thread_{:07}", hash % 10_000_000)
}
