//! Arena storage for fragmentation graph edges.
//!
//! Provides `EdgeId` (a dense, total-orderable identifier) and `EdgeArena`
//! (contiguous storage with free-list reuse). Adjacency lists store `EdgeId`s,
//! so an edge keeps its identity while the lists around it are reshuffled.
//!
//! # Determinism
//! - `EdgeId` ordering is by its inner `u32`.
//! - Iteration order over slots is by index (0..capacity).
//! - Freed slots are reused most-recently-freed first.

use std::fmt;
use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

/// Dense edge identifier.
///
/// The inner value indexes the arena's slot array. An id stays valid until
/// the edge is deallocated; after that it may be handed out again.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeId(u32);

impl EdgeId {
    /// Creates an `EdgeId` from a raw index.
    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw `u32` index.
    #[inline]
    pub const fn as_u32(&self) -> u32 {
        self.0
    }

    #[inline]
    pub(crate) const fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
struct EdgeSlot<T> {
    data: Option<T>,
    next_free: Option<u32>,
}

/// Contiguous storage for edge data with free-list reuse.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeArena<T> {
    slots: Vec<EdgeSlot<T>>,
    free_list_head: Option<u32>,
    live_count: usize,
}

impl<T> EdgeArena<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list_head: None,
            live_count: 0,
        }
    }

    /// Stores `data` and returns its id, reusing the most recently freed slot
    /// when there is one.
    pub fn allocate(&mut self, data: T) -> EdgeId {
        self.live_count += 1;
        if let Some(idx) = self.free_list_head {
            let slot = &mut self.slots[idx as usize];
            debug_assert!(slot.data.is_none(), "free slot should have no data");
            self.free_list_head = slot.next_free;
            slot.data = Some(data);
            slot.next_free = None;
            EdgeId(idx)
        } else {
            let idx = self.slots.len() as u32;
            self.slots.push(EdgeSlot {
                data: Some(data),
                next_free: None,
            });
            EdgeId(idx)
        }
    }

    /// Removes the edge at `id` and returns its data.
    ///
    /// Returns `None` if `id` is out of range or already free.
    pub fn deallocate(&mut self, id: EdgeId) -> Option<T> {
        let slot = self.slots.get_mut(id.index())?;
        let data = slot.data.take()?;
        slot.next_free = self.free_list_head;
        self.free_list_head = Some(id.0);
        self.live_count -= 1;
        Some(data)
    }

    pub fn get(&self, id: EdgeId) -> Option<&T> {
        self.slots.get(id.index()).and_then(|slot| slot.data.as_ref())
    }

    pub fn get_mut(&mut self, id: EdgeId) -> Option<&mut T> {
        self.slots
            .get_mut(id.index())
            .and_then(|slot| slot.data.as_mut())
    }

    pub fn contains(&self, id: EdgeId) -> bool {
        self.get(id).is_some()
    }

    /// Number of live edges.
    pub fn live_count(&self) -> usize {
        self.live_count
    }

    /// Total number of slots, including free ones.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Iterates over live edges by index.
    pub fn iter(&self) -> impl Iterator<Item = (EdgeId, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| slot.data.as_ref().map(|data| (EdgeId(idx as u32), data)))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (EdgeId, &mut T)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(idx, slot)| slot.data.as_mut().map(|data| (EdgeId(idx as u32), data)))
    }
}

impl<T> Default for EdgeArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Index<EdgeId> for EdgeArena<T> {
    type Output = T;

    /// # Panics
    /// Panics if `id` does not name a live edge.
    fn index(&self, id: EdgeId) -> &T {
        match self.get(id) {
            Some(data) => data,
            None => panic!("edge {id} is not live"),
        }
    }
}

impl<T> IndexMut<EdgeId> for EdgeArena<T> {
    fn index_mut(&mut self, id: EdgeId) -> &mut T {
        match self.get_mut(id) {
            Some(data) => data,
            None => panic!("edge {id} is not live"),
        }
    }
}
