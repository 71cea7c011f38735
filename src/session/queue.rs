//! Bounded per-port FIFO with drop-oldest overflow

use std::collections::VecDeque;
use std::time::Instant;

/// A payload parked for transmission until the bus master polls us
#[derive(Debug, Clone)]
pub struct QueueEntry {
    pub port: u8,
    pub payload: Vec<u8>,
    pub enqueued_at: Instant,
}

impl QueueEntry {
    pub fn new(port: u8, payload: Vec<u8>) -> Self {
        Self {
            port,
            payload,
            enqueued_at: Instant::now(),
        }
    }
}

/// Bounded FIFO. Enqueue past capacity drops the head entry; drop-oldest is
/// policy, not an error. `len() <= capacity` holds at every observation
/// point.
pub struct PortQueue {
    entries: VecDeque<QueueEntry>,
    capacity: usize,
}

impl PortQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(64)),
            capacity,
        }
    }

    /// Append an entry; returns the dropped head when the queue was full.
    pub fn enqueue(&mut self, entry: QueueEntry) -> Option<QueueEntry> {
        let dropped = if self.entries.len() >= self.capacity {
            self.entries.pop_front()
        } else {
            None
        };
        self.entries.push_back(entry);
        dropped
    }

    /// Return and clear all entries in FIFO order
    pub fn drain(&mut self) -> Vec<QueueEntry> {
        self.entries.drain(..).collect()
    }

    /// Restore an undelivered tail at the head, preserving order
    pub fn requeue_front(&mut self, entries: Vec<QueueEntry>) {
        for entry in entries.into_iter().rev() {
            self.entries.push_front(entry);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn peek(&self) -> Option<&QueueEntry> {
        self.entries.front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(tag: u8) -> QueueEntry {
        QueueEntry::new(0, vec![tag])
    }

    #[test]
    fn test_fifo_order() {
        let mut q = PortQueue::new(10);
        q.enqueue(entry(1));
        q.enqueue(entry(2));
        q.enqueue(entry(3));
        assert_eq!(q.len(), 3);
        assert_eq!(q.peek().unwrap().payload, vec![1]);

        let drained = q.drain();
        assert_eq!(
            drained.iter().map(|e| e.payload[0]).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert!(q.is_empty());
    }

    #[test]
    fn test_drop_oldest_on_overflow() {
        let mut q = PortQueue::new(3);
        for tag in 1..=5 {
            let dropped = q.enqueue(entry(tag));
            if tag <= 3 {
                assert!(dropped.is_none());
            } else {
                assert_eq!(dropped.unwrap().payload, vec![tag - 3]);
            }
        }
        // Bound held; the survivors are the last three in insertion order
        assert_eq!(q.len(), 3);
        let drained = q.drain();
        assert_eq!(
            drained.iter().map(|e| e.payload[0]).collect::<Vec<_>>(),
            vec![3, 4, 5]
        );
    }

    #[test]
    fn test_queue_bound_property() {
        let capacity = 7;
        for n in [0usize, 3, 7, 8, 25] {
            let mut q = PortQueue::new(capacity);
            for tag in 0..n {
                q.enqueue(entry(tag as u8));
            }
            assert_eq!(q.len(), n.min(capacity));
        }
    }

    #[test]
    fn test_requeue_front_preserves_order() {
        let mut q = PortQueue::new(10);
        q.enqueue(entry(4));
        q.enqueue(entry(5));

        // An aborted drain puts its undelivered tail back at the head
        q.requeue_front(vec![entry(2), entry(3)]);
        let drained = q.drain();
        assert_eq!(
            drained.iter().map(|e| e.payload[0]).collect::<Vec<_>>(),
            vec![2, 3, 4, 5]
        );
    }

    #[test]
    fn test_capacity_one() {
        let mut q = PortQueue::new(1);
        assert!(q.enqueue(entry(1)).is_none());
        let dropped = q.enqueue(entry(2)).unwrap();
        assert_eq!(dropped.payload, vec![1]);
        assert_eq!(q.len(), 1);
    }
}
