//! Bounded in-memory history of recent chat messages.

use std::collections::VecDeque;

use parking_lot::Mutex;
use relay_core::ChatMessage;

/// FIFO buffer of the most recent messages, capped at a fixed capacity.
///
/// All access goes through one mutex, so appends from concurrently-running
/// connection handlers never tear and a snapshot is always a consistent
/// point-in-time view.
pub struct HistoryBuffer {
    capacity: usize,
    messages: Mutex<VecDeque<ChatMessage>>,
}

impl HistoryBuffer {
    /// Create an empty buffer holding at most `capacity` messages.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            messages: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Append at the tail, evicting from the head once over capacity.
    pub fn append(&self, message: ChatMessage) {
        let mut messages = self.messages.lock();
        messages.push_back(message);
        while messages.len() > self.capacity {
            let _ = messages.pop_front();
        }
    }

    /// Replace the contents with pre-loaded messages (oldest first),
    /// keeping only the newest `capacity` entries.
    pub fn preload(&self, preloaded: Vec<ChatMessage>) {
        let mut messages = self.messages.lock();
        messages.clear();
        messages.extend(preloaded);
        while messages.len() > self.capacity {
            let _ = messages.pop_front();
        }
    }

    /// Point-in-time copy of the buffer, oldest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<ChatMessage> {
        self.messages.lock().iter().cloned().collect()
    }

    /// Current number of buffered messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.lock().len()
    }

    /// Whether the buffer is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.lock().is_empty()
    }

    /// Maximum number of messages retained.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(n: usize) -> ChatMessage {
        ChatMessage {
            username: "u".into(),
            content: format!("m{n}"),
            timestamp: format!("2026-08-06T10:00:{:02}.000Z", n % 60),
        }
    }

    #[test]
    fn starts_empty() {
        let buf = HistoryBuffer::new(100);
        assert!(buf.is_empty());
        assert_eq!(buf.len(), 0);
        assert!(buf.snapshot().is_empty());
    }

    #[test]
    fn append_preserves_insertion_order() {
        let buf = HistoryBuffer::new(100);
        for n in 0..5 {
            buf.append(msg(n));
        }
        let snapshot = buf.snapshot();
        let contents: Vec<&str> = snapshot.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["m0", "m1", "m2", "m3", "m4"]);
    }

    #[test]
    fn never_exceeds_capacity() {
        let buf = HistoryBuffer::new(3);
        for n in 0..10 {
            buf.append(msg(n));
            assert!(buf.len() <= 3);
        }
        assert_eq!(buf.len(), 3);
    }

    #[test]
    fn evicts_oldest_first() {
        let buf = HistoryBuffer::new(3);
        for n in 0..5 {
            buf.append(msg(n));
        }
        let snapshot = buf.snapshot();
        let contents: Vec<&str> = snapshot.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["m2", "m3", "m4"]);
    }

    #[test]
    fn overflow_keeps_most_recent_in_relative_order() {
        let buf = HistoryBuffer::new(100);
        for n in 0..150 {
            buf.append(msg(n));
        }
        let snapshot = buf.snapshot();
        assert_eq!(snapshot.len(), 100);
        assert_eq!(snapshot[0].content, "m50");
        assert_eq!(snapshot[99].content, "m149");
    }

    #[test]
    fn zero_capacity_buffer_stays_empty() {
        let buf = HistoryBuffer::new(0);
        buf.append(msg(1));
        assert!(buf.is_empty());
    }

    #[test]
    fn snapshot_is_a_copy() {
        let buf = HistoryBuffer::new(10);
        buf.append(msg(0));
        let snapshot = buf.snapshot();
        buf.append(msg(1));
        assert_eq!(snapshot.len(), 1);
        assert_eq!(buf.len(), 2);
    }

    #[test]
    fn preload_replaces_contents() {
        let buf = HistoryBuffer::new(10);
        buf.append(msg(99));
        buf.preload(vec![msg(0), msg(1)]);
        let snapshot = buf.snapshot();
        let contents: Vec<&str> = snapshot.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["m0", "m1"]);
    }

    #[test]
    fn preload_truncates_to_capacity_keeping_newest() {
        let buf = HistoryBuffer::new(2);
        buf.preload(vec![msg(0), msg(1), msg(2)]);
        let snapshot = buf.snapshot();
        let contents: Vec<&str> = snapshot.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["m1", "m2"]);
    }

    #[test]
    fn capacity_accessor() {
        let buf = HistoryBuffer::new(42);
        assert_eq!(buf.capacity(), 42);
    }
}
