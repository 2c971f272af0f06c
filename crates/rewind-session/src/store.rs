//! Consumer-side console message model.
//!
//! Applies delivered batches in order, replaces logpoint placeholders
//! with their results, and honors clears. Bounded: the oldest messages
//! are evicted once the cap is reached.

use std::collections::VecDeque;

use rewind_core::ConsoleMessagePacket;

/// Default maximum number of retained messages.
pub const DEFAULT_MAX_MESSAGES: usize = 10_000;

/// Ordered store of delivered console messages.
#[derive(Debug)]
pub struct ConsoleStore {
    messages: VecDeque<ConsoleMessagePacket>,
    max_messages: usize,
}

impl Default for ConsoleStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_MESSAGES)
    }
}

impl ConsoleStore {
    pub fn new(max_messages: usize) -> Self {
        Self {
            messages: VecDeque::with_capacity(max_messages.min(1024)),
            max_messages,
        }
    }

    /// Apply one delivered batch, in batch order.
    ///
    /// A packet carrying a `logpoint_id` that is already present
    /// replaces the existing packets of that group in place (the result
    /// replacing its "Loading..." placeholder) instead of appending.
    pub fn add_batch(&mut self, batch: Vec<ConsoleMessagePacket>) {
        for packet in batch {
            self.add(packet);
        }
    }

    fn add(&mut self, packet: ConsoleMessagePacket) {
        if let Some(group) = packet.logpoint_id.clone() {
            if let Some(index) = self
                .messages
                .iter()
                .position(|m| m.logpoint_id.as_deref() == Some(group.as_str()))
            {
                self.messages
                    .retain(|m| m.logpoint_id.as_deref() != Some(group.as_str()));
                self.messages.insert(index.min(self.messages.len()), packet);
                return;
            }
        }

        self.messages.push_back(packet);
        while self.messages.len() > self.max_messages {
            self.messages.pop_front();
        }
    }

    /// Remove every message.
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Remove every message of one logpoint group; a no-op for unknown
    /// groups.
    pub fn clear_log_group(&mut self, log_group_id: &str) {
        self.messages
            .retain(|m| m.logpoint_id.as_deref() != Some(log_group_id));
    }

    pub fn messages(&self) -> impl Iterator<Item = &ConsoleMessagePacket> {
        self.messages.iter()
    }

    /// Messages of one logpoint group, in display order.
    pub fn log_group(&self, log_group_id: &str) -> Vec<&ConsoleMessagePacket> {
        self.messages
            .iter()
            .filter(|m| m.logpoint_id.as_deref() == Some(log_group_id))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.messages.iter().filter(|m| m.is_error()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rewind_core::MessageLevel;
    use serde_json::json;

    fn packet(text: &str) -> ConsoleMessagePacket {
        ConsoleMessagePacket::new(MessageLevel::Info, "ConsoleAPI", text)
    }

    fn logpoint_packet(text: &str, group: &str) -> ConsoleMessagePacket {
        let mut packet = packet(text);
        packet.logpoint_id = Some(group.into());
        packet
    }

    #[test]
    fn test_batches_append_in_order() {
        let mut store = ConsoleStore::default();
        store.add_batch(vec![packet("a"), packet("b")]);
        store.add_batch(vec![packet("c")]);

        let texts: Vec<&str> = store.messages().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_logpoint_result_replaces_placeholder_in_place() {
        let mut store = ConsoleStore::default();
        store.add_batch(vec![
            packet("before"),
            logpoint_packet("Loading...", "g1"),
            packet("after"),
        ]);

        let mut result = logpoint_packet("", "g1");
        result.argument_values = vec![json!(1), json!(2)];
        store.add_batch(vec![result]);

        assert_eq!(store.len(), 3);
        let group = store.log_group("g1");
        assert_eq!(group.len(), 1);
        assert_eq!(group[0].argument_values, vec![json!(1), json!(2)]);
        // Replacement kept the original position.
        let texts: Vec<&str> = store.messages().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["before", "", "after"]);
    }

    #[test]
    fn test_clear_log_group_is_idempotent() {
        let mut store = ConsoleStore::default();
        store.add_batch(vec![logpoint_packet("Loading...", "g1"), packet("keep")]);

        store.clear_log_group("g1");
        assert!(store.log_group("g1").is_empty());
        assert_eq!(store.len(), 1);

        // Clearing again (or clearing an unknown group) is a no-op.
        store.clear_log_group("g1");
        store.clear_log_group("never-seen");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_eviction_at_capacity() {
        let mut store = ConsoleStore::new(3);
        store.add_batch(vec![packet("0"), packet("1"), packet("2"), packet("3")]);
        let texts: Vec<&str> = store.messages().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_error_count() {
        let mut store = ConsoleStore::default();
        store.add_batch(vec![
            packet("fine"),
            ConsoleMessagePacket::new(MessageLevel::Error, "PageError", "boom"),
        ]);
        assert_eq!(store.error_count(), 1);
    }
}
