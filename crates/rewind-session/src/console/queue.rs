//! Pending message buffer awaiting the next batch flush.

use rewind_core::ConsoleMessagePacket;

/// Append-only buffer of not-yet-flushed packets.
///
/// Owned exclusively by the ingestion pipeline task. `take_all` is the
/// only way packets leave the queue on the flush path, so an append can
/// never be lost between building a batch and clearing the buffer.
#[derive(Debug, Default)]
pub struct PendingQueue {
    packets: Vec<ConsoleMessagePacket>,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a packet, preserving arrival order.
    pub fn push(&mut self, packet: ConsoleMessagePacket) {
        self.packets.push(packet);
    }

    /// Take the whole queue as one ordered batch, leaving it empty.
    pub fn take_all(&mut self) -> Vec<ConsoleMessagePacket> {
        std::mem::take(&mut self.packets)
    }

    /// Discard everything without delivering.
    pub fn clear(&mut self) {
        self.packets.clear();
    }

    /// Drop all pending packets of one logpoint group; returns how many
    /// were removed.
    pub fn remove_log_group(&mut self, log_group_id: &str) -> usize {
        let before = self.packets.len();
        self.packets
            .retain(|p| p.logpoint_id.as_deref() != Some(log_group_id));
        before - self.packets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }

    pub fn len(&self) -> usize {
        self.packets.len()
    }
}
