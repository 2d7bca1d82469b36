//! Bounded ring buffer.

use crate::common::{SimError, TaskId, Tick};
use serde::Serialize;

/// One produced item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Item {
    pub id: u64,
    pub producer: TaskId,
    pub produced_at: Tick,
}

/// Fixed-capacity FIFO ring. Writes go to `tail`, reads come from `head`.
#[derive(Clone, Debug)]
pub struct BoundedBuffer {
    slots: Vec<Option<Item>>,
    head: usize,
    tail: usize,
    count: usize,
}

impl BoundedBuffer {
    pub fn new(capacity: i64) -> Result<Self, SimError> {
        let capacity =
            crate::common::error::require_positive("buffer capacity", capacity)? as usize;
        Ok(Self {
            slots: vec![None; capacity],
            head: 0,
            tail: 0,
            count: 0,
        })
    }

    /// Writes at the tail. Returns the slot index.
    pub fn push(&mut self, item: Item) -> Result<usize, SimError> {
        if self.is_full() {
            return Err(SimError::config("write to a full buffer"));
        }
        let slot = self.tail;
        self.slots[slot] = Some(item);
        self.tail = (self.tail + 1) % self.capacity();
        self.count += 1;
        Ok(slot)
    }

    /// Reads from the head. Returns the slot index and the item.
    pub fn pop(&mut self) -> Option<(usize, Item)> {
        let slot = self.head;
        let item = self.slots[slot].take()?;
        self.head = (self.head + 1) % self.capacity();
        self.count -= 1;
        Some((slot, item))
    }

    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|s| *s = None);
        self.head = 0;
        self.tail = 0;
        self.count = 0;
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn is_full(&self) -> bool {
        self.count == self.capacity()
    }

    pub fn head(&self) -> usize {
        self.head
    }

    pub fn tail(&self) -> usize {
        self.tail
    }

    pub fn slots(&self) -> &[Option<Item>] {
        &self.slots
    }

    /// Items in read order.
    pub fn items(&self) -> Vec<Item> {
        (0..self.count)
            .filter_map(|i| self.slots[(self.head + i) % self.capacity()])
            .collect()
    }

    /// `count` is in range, agrees with the head/tail distance and with the
    /// number of occupied slots.
    pub fn is_consistent(&self) -> bool {
        let c = self.capacity();
        let occupied = self.slots.iter().filter(|s| s.is_some()).count();
        self.count <= c
            && self.count % c == (self.tail + c - self.head) % c
            && occupied == self.count
    }
}
