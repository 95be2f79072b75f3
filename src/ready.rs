/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Ready structures: the containers a process waits in between dispatches.
//!
//! Three containers cover the three scheduling policies plus bookkeeping:
//!
//! * [`PriorityQueue`] — stable min-ordered queue (HPF keys on priority,
//!   SRTN keys on remaining time; ties dequeue in arrival order).
//! * [`CircularQueue`] — O(1) enqueue-tail / dequeue-head ring for
//!   round-robin.  The classic `tail.next = head` intrusive linkage is
//!   index arithmetic on a ring buffer here, not a self-referential node.
//! * [`FifoQueue`] — plain FIFO, used for the terminated-process ledger.
//!
//! All three share the bulk waiting-time charge: one tick of waiting for
//! every queued process that had already arrived before the given tick.
//! [`ReadyQueue`] is the tagged wrapper the engine owns, so policy code is
//! written once against a single enqueue/dequeue/peek surface.

use std::collections::VecDeque;

use crate::clock::Tick;
use crate::pcb::Pcb;

/// Charge one tick of waiting to every process in `iter` that arrived
/// strictly before `now`.  A process is never charged the tick it arrived.
fn charge_waits<'a>(iter: impl Iterator<Item = &'a mut Pcb>, now: Tick) {
    for pcb in iter {
        if pcb.arrival < now {
            pcb.wait += 1;
        }
    }
}

// ── PriorityQueue ─────────────────────────────────────────────────────────────

/// Stable priority queue: smallest key dequeues first, FIFO among equal keys.
///
/// Backed by a sorted `Vec`; insertion finds the position after the last
/// element with key ≤ the new key, so equal-key entries keep their arrival
/// order.
#[derive(Debug, Default)]
pub struct PriorityQueue {
    items: Vec<(i64, Pcb)>,
}

impl PriorityQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `pcb` under `key`, after every element with key ≤ `key`.
    pub fn enqueue(&mut self, key: i64, pcb: Pcb) {
        let at = self.items.partition_point(|(k, _)| *k <= key);
        self.items.insert(at, (key, pcb));
    }

    /// Remove and return the head (smallest key, oldest among ties).
    pub fn dequeue(&mut self) -> Option<Pcb> {
        if self.items.is_empty() {
            None
        } else {
            Some(self.items.remove(0).1)
        }
    }

    /// The head, without removing it.
    pub fn peek(&self) -> Option<&Pcb> {
        self.items.first().map(|(_, pcb)| pcb)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Bulk waiting-time charge, see module docs.
    pub fn increment_waits(&mut self, now: Tick) {
        charge_waits(self.items.iter_mut().map(|(_, pcb)| pcb), now);
    }
}

// ── CircularQueue ─────────────────────────────────────────────────────────────

/// Circular FIFO for round-robin: enqueue at the tail, dequeue at the head,
/// the tail conceptually linking back to the head.
#[derive(Debug, Default)]
pub struct CircularQueue {
    ring: VecDeque<Pcb>,
}

impl CircularQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, pcb: Pcb) {
        self.ring.push_back(pcb);
    }

    pub fn dequeue(&mut self) -> Option<Pcb> {
        self.ring.pop_front()
    }

    pub fn peek(&self) -> Option<&Pcb> {
        self.ring.front()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ring.len()
    }

    pub fn increment_waits(&mut self, now: Tick) {
        charge_waits(self.ring.iter_mut(), now);
    }
}

// ── FifoQueue ─────────────────────────────────────────────────────────────────

/// Plain FIFO where neither ordering keys nor circularity matter.  The
/// engine uses it as the terminated-process ledger feeding the end-of-run
/// report.
#[derive(Debug, Default)]
pub struct FifoQueue {
    items: VecDeque<Pcb>,
}

impl FifoQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, pcb: Pcb) {
        self.items.push_back(pcb);
    }

    pub fn dequeue(&mut self) -> Option<Pcb> {
        self.items.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pcb> {
        self.items.iter()
    }

    pub fn increment_waits(&mut self, now: Tick) {
        charge_waits(self.items.iter_mut(), now);
    }
}

impl IntoIterator for FifoQueue {
    type Item = Pcb;
    type IntoIter = std::collections::vec_deque::IntoIter<Pcb>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

// ── ReadyQueue ────────────────────────────────────────────────────────────────

/// The ready structure the engine owns: priority-ordered for HPF/SRTN,
/// circular FIFO for round-robin.  One enqueue/dequeue surface so the policy
/// step code does not branch on container kind.
#[derive(Debug)]
pub enum ReadyQueue {
    Priority(PriorityQueue),
    Circular(CircularQueue),
}

impl ReadyQueue {
    pub fn priority() -> Self {
        ReadyQueue::Priority(PriorityQueue::new())
    }

    pub fn circular() -> Self {
        ReadyQueue::Circular(CircularQueue::new())
    }

    /// Enqueue under `key`.  The circular variant ignores the key — its
    /// order is purely arrival at the tail.
    pub fn enqueue(&mut self, key: i64, pcb: Pcb) {
        match self {
            ReadyQueue::Priority(q) => q.enqueue(key, pcb),
            ReadyQueue::Circular(q) => q.enqueue(pcb),
        }
    }

    pub fn dequeue(&mut self) -> Option<Pcb> {
        match self {
            ReadyQueue::Priority(q) => q.dequeue(),
            ReadyQueue::Circular(q) => q.dequeue(),
        }
    }

    pub fn peek(&self) -> Option<&Pcb> {
        match self {
            ReadyQueue::Priority(q) => q.peek(),
            ReadyQueue::Circular(q) => q.peek(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            ReadyQueue::Priority(q) => q.is_empty(),
            ReadyQueue::Circular(q) => q.is_empty(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ReadyQueue::Priority(q) => q.len(),
            ReadyQueue::Circular(q) => q.len(),
        }
    }

    pub fn increment_waits(&mut self, now: Tick) {
        match self {
            ReadyQueue::Priority(q) => q.increment_waits(now),
            ReadyQueue::Circular(q) => q.increment_waits(now),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pcb::ProcessSpec;

    fn pcb(id: u32, arrival: Tick) -> Pcb {
        Pcb::admit(ProcessSpec {
            id,
            arrival,
            run_time: 5,
            priority: 0,
            memory: 0,
        })
    }

    // ── PriorityQueue ─────────────────────────────────────────────────────────

    #[test]
    fn priority_dequeues_smallest_key_first() {
        let mut q = PriorityQueue::new();
        q.enqueue(3, pcb(1, 0));
        q.enqueue(1, pcb(2, 0));
        q.enqueue(2, pcb(3, 0));

        assert_eq!(q.dequeue().unwrap().id, 2);
        assert_eq!(q.dequeue().unwrap().id, 3);
        assert_eq!(q.dequeue().unwrap().id, 1);
        assert!(q.dequeue().is_none());
    }

    #[test]
    fn priority_ties_break_in_insertion_order() {
        let mut q = PriorityQueue::new();
        q.enqueue(5, pcb(10, 0));
        q.enqueue(5, pcb(11, 0));
        q.enqueue(5, pcb(12, 0));

        assert_eq!(q.dequeue().unwrap().id, 10);
        assert_eq!(q.dequeue().unwrap().id, 11);
        assert_eq!(q.dequeue().unwrap().id, 12);
    }

    #[test]
    fn priority_peek_does_not_remove() {
        let mut q = PriorityQueue::new();
        q.enqueue(1, pcb(7, 0));
        assert_eq!(q.peek().unwrap().id, 7);
        assert_eq!(q.len(), 1);
    }

    // ── CircularQueue ─────────────────────────────────────────────────────────

    #[test]
    fn circular_is_fifo() {
        let mut q = CircularQueue::new();
        q.enqueue(pcb(1, 0));
        q.enqueue(pcb(2, 0));
        q.enqueue(pcb(3, 0));

        assert_eq!(q.dequeue().unwrap().id, 1);
        // Re-enqueue at the tail — the round-robin rotation
        q.enqueue(pcb(1, 0));
        assert_eq!(q.dequeue().unwrap().id, 2);
        assert_eq!(q.dequeue().unwrap().id, 3);
        assert_eq!(q.dequeue().unwrap().id, 1);
        assert!(q.is_empty());
    }

    #[test]
    fn circular_drains_to_empty_and_recovers() {
        let mut q = CircularQueue::new();
        q.enqueue(pcb(1, 0));
        assert_eq!(q.dequeue().unwrap().id, 1);
        assert!(q.dequeue().is_none());

        q.enqueue(pcb(2, 0));
        assert_eq!(q.peek().unwrap().id, 2);
    }

    // ── Waiting-time charge ───────────────────────────────────────────────────

    #[test]
    fn increment_waits_skips_the_arrival_tick() {
        let mut q = PriorityQueue::new();
        q.enqueue(0, pcb(1, 3)); // arrives at tick 3
        q.enqueue(0, pcb(2, 5)); // arrives at tick 5

        q.increment_waits(3); // 3 < 3 is false, 5 < 3 is false
        q.increment_waits(4); // only id 1 charged
        q.increment_waits(6); // both charged

        let first = q.dequeue().unwrap();
        let second = q.dequeue().unwrap();
        assert_eq!(first.wait, 2);
        assert_eq!(second.wait, 1);
    }

    #[test]
    fn increment_waits_charges_every_variant() {
        let mut prio = ReadyQueue::priority();
        let mut ring = ReadyQueue::circular();
        prio.enqueue(0, pcb(1, 0));
        ring.enqueue(0, pcb(2, 0));

        prio.increment_waits(10);
        ring.increment_waits(10);

        assert_eq!(prio.dequeue().unwrap().wait, 1);
        assert_eq!(ring.dequeue().unwrap().wait, 1);
    }

    // ── FifoQueue ─────────────────────────────────────────────────────────────

    #[test]
    fn fifo_preserves_order() {
        let mut q = FifoQueue::new();
        for id in 1..=4 {
            q.enqueue(pcb(id, 0));
        }
        let ids: Vec<u32> = q.into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[test]
    fn fifo_iter_borrows() {
        let mut q = FifoQueue::new();
        q.enqueue(pcb(1, 0));
        q.enqueue(pcb(2, 0));
        assert_eq!(q.iter().count(), 2);
        assert_eq!(q.len(), 2);
    }
}
