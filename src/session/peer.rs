//! Per-peer protocol state
//!
//! The address space is 0-15, so peers live in a fixed array rather than a
//! map. Port queues are created lazily; most sessions touch one or two.

use super::queue::{PortQueue, QueueEntry};

struct Peer {
    /// Latched by the first frame from this peer that carried a valid SMACK
    /// CRC. One-way for the lifetime of the session.
    smack_enabled: bool,
    queues: [Option<PortQueue>; 16],
}

impl Peer {
    fn new() -> Self {
        Self {
            smack_enabled: false,
            queues: Default::default(),
        }
    }
}

/// State for all 16 possible peer addresses plus their port queues
pub struct PeerTable {
    peers: [Peer; 16],
    queue_capacity: usize,
}

impl PeerTable {
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            peers: std::array::from_fn(|_| Peer::new()),
            queue_capacity,
        }
    }

    pub fn smack_enabled(&self, address: u8) -> bool {
        self.peers[(address & 0x0F) as usize].smack_enabled
    }

    /// Latch SMACK mode for a peer. Returns true when this call flipped it.
    pub fn enable_smack(&mut self, address: u8) -> bool {
        let peer = &mut self.peers[(address & 0x0F) as usize];
        let newly = !peer.smack_enabled;
        peer.smack_enabled = true;
        newly
    }

    fn queue_mut(&mut self, address: u8, port: u8) -> &mut PortQueue {
        let capacity = self.queue_capacity;
        self.peers[(address & 0x0F) as usize].queues[(port & 0x0F) as usize]
            .get_or_insert_with(|| PortQueue::new(capacity))
    }

    /// Enqueue for later drain; returns the dropped head on overflow.
    pub fn enqueue(&mut self, address: u8, port: u8, entry: QueueEntry) -> Option<QueueEntry> {
        self.queue_mut(address, port).enqueue(entry)
    }

    /// Drain one port's queue in FIFO order
    pub fn drain(&mut self, address: u8, port: u8) -> Vec<QueueEntry> {
        match &mut self.peers[(address & 0x0F) as usize].queues[(port & 0x0F) as usize] {
            Some(queue) => queue.drain(),
            None => Vec::new(),
        }
    }

    /// Put an undelivered tail back at the head of its queue
    pub fn requeue_front(&mut self, address: u8, port: u8, entries: Vec<QueueEntry>) {
        if !entries.is_empty() {
            self.queue_mut(address, port).requeue_front(entries);
        }
    }

    pub fn queue_len(&self, address: u8, port: u8) -> usize {
        self.peers[(address & 0x0F) as usize].queues[(port & 0x0F) as usize]
            .as_ref()
            .map_or(0, |q| q.len())
    }

    /// Total queued entries across every address and port
    pub fn pending_total(&self) -> usize {
        self.peers
            .iter()
            .flat_map(|p| p.queues.iter())
            .filter_map(|q| q.as_ref())
            .map(|q| q.len())
            .sum()
    }

    /// Discard everything still queued; returns how many entries were lost
    pub fn clear_queues(&mut self) -> usize {
        let mut dropped = 0;
        for peer in &mut self.peers {
            for queue in peer.queues.iter_mut().flatten() {
                dropped += queue.len();
                queue.drain();
            }
        }
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smack_latch_is_one_way() {
        let mut table = PeerTable::new(10);
        assert!(!table.smack_enabled(2));
        assert!(table.enable_smack(2));
        assert!(table.smack_enabled(2));
        // Second latch is a no-op
        assert!(!table.enable_smack(2));
        assert!(table.smack_enabled(2));
        // Other addresses unaffected
        assert!(!table.smack_enabled(3));
    }

    #[test]
    fn test_lazy_queue_creation() {
        let mut table = PeerTable::new(10);
        assert_eq!(table.queue_len(7, 0), 0);
        assert_eq!(table.pending_total(), 0);

        table.enqueue(7, 0, QueueEntry::new(0, vec![1]));
        table.enqueue(7, 3, QueueEntry::new(3, vec![2]));
        assert_eq!(table.queue_len(7, 0), 1);
        assert_eq!(table.queue_len(7, 3), 1);
        assert_eq!(table.pending_total(), 2);
    }

    #[test]
    fn test_drain_and_clear() {
        let mut table = PeerTable::new(10);
        for tag in 0..3 {
            table.enqueue(7, 0, QueueEntry::new(0, vec![tag]));
        }
        let drained = table.drain(7, 0);
        assert_eq!(drained.len(), 3);
        assert_eq!(table.queue_len(7, 0), 0);

        table.enqueue(1, 1, QueueEntry::new(1, vec![9]));
        assert_eq!(table.clear_queues(), 1);
        assert_eq!(table.pending_total(), 0);
    }
}
