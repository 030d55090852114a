//! Append-only Pool with a Usage Cursor
//!
//! Every frame-local buffer in the framework (quadtree nodes, resident
//! links, draw-order trees, LZW trie nodes) is sourced from this pool.
//! Objects are never freed while the pool lives: `reset` rewinds the cursor
//! and the next `acquire` recycles the slot in place.
//!
//! # Design Principles
//!
//! - **Zero Allocation**: After the peak demand is reached, no heap allocations occur
//! - **Cache Friendly**: Objects stored contiguously, addressed by index
//! - **Doubling Growth**: Capacity doubles whenever demand exceeds the previous peak
//!
//! # Example
//!
//! ```ignore
//! use gframe::util::Pool;
//!
//! let mut pool: Pool<Node> = Pool::with_capacity(16);
//!
//! // Take the next slot, recycling an old node if one exists
//! let index = pool.acquire(Node::default, Node::clear);
//! pool[index].depth = 1;
//!
//! // Start of the next frame
//! pool.reset();
//! ```

use std::ops::{Index, IndexMut};

// ============================================================================
// Pool Index
// ============================================================================

/// Index into a pool, identifying a specific slot.
///
/// Indices stay valid until the next `reset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PoolIndex(usize);

impl PoolIndex {
    /// Get the raw index value.
    #[must_use]
    #[inline]
    pub const fn raw(self) -> usize {
        self.0
    }
}

// ============================================================================
// Pool
// ============================================================================

/// A cursor-based pool of recyclable objects.
///
/// Slots `[0, used)` are live; slots `[used, len)` hold objects from a
/// previous cycle waiting to be recycled.
///
/// # Performance Characteristics
///
/// | Operation | Time Complexity |
/// |-----------|-----------------|
/// | `acquire` | O(1) amortized  |
/// | `reset`   | O(1)            |
/// | `get`     | O(1)            |
/// | `iter`    | O(used)         |
#[derive(Debug, Clone)]
pub struct Pool<T> {
    /// Every object ever created by the pool
    items: Vec<T>,
    /// Number of slots handed out since the last reset
    used: usize,
}

impl<T> Pool<T> {
    /// Create a new empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            used: 0,
        }
    }

    /// Create a pool with pre-allocated capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            used: 0,
        }
    }

    /// Take the next slot.
    ///
    /// A slot left over from a previous cycle is recycled through `reset`;
    /// otherwise a new object is created with `init`, doubling the backing
    /// storage when it is full.
    pub fn acquire(&mut self, init: impl FnOnce() -> T, reset: impl FnOnce(&mut T)) -> PoolIndex {
        let index = self.used;
        if index < self.items.len() {
            reset(&mut self.items[index]);
        } else {
            self.grow_if_full();
            self.items.push(init());
        }
        self.used += 1;
        PoolIndex(index)
    }

    /// Take the next slot, overwriting whatever it held.
    pub fn push(&mut self, value: T) -> PoolIndex {
        let index = self.used;
        if index < self.items.len() {
            self.items[index] = value;
        } else {
            self.grow_if_full();
            self.items.push(value);
        }
        self.used += 1;
        PoolIndex(index)
    }

    fn grow_if_full(&mut self) {
        let capacity = self.items.capacity();
        if self.items.len() == capacity {
            self.items.reserve_exact(capacity.max(4));
            log::trace!("Pool grew to {} slots", self.items.capacity());
        }
    }

    /// Rewind the cursor; every slot becomes recyclable.
    ///
    /// Allocated memory and the objects themselves are retained.
    #[inline]
    pub fn reset(&mut self) {
        self.used = 0;
    }

    /// Get a reference to a live object.
    #[must_use]
    #[inline]
    pub fn get(&self, index: PoolIndex) -> Option<&T> {
        self.as_slice().get(index.0)
    }

    /// Get a mutable reference to a live object.
    #[inline]
    pub fn get_mut(&mut self, index: PoolIndex) -> Option<&mut T> {
        let used = self.used;
        self.items[..used].get_mut(index.0)
    }

    /// Index of the live slot at `raw`, if any.
    #[must_use]
    #[inline]
    pub fn index_at(&self, raw: usize) -> Option<PoolIndex> {
        (raw < self.used).then_some(PoolIndex(raw))
    }

    /// Number of slots handed out since the last reset.
    #[must_use]
    #[inline]
    pub const fn used(&self) -> usize {
        self.used
    }

    /// Number of objects ever created (the peak demand).
    #[must_use]
    #[inline]
    pub fn peak(&self) -> usize {
        self.items.len()
    }

    /// Check if no slot is live.
    #[must_use]
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.used == 0
    }

    /// Live objects as a slice.
    #[must_use]
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.items[..self.used]
    }

    /// Iterate over live objects.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.as_slice().iter()
    }

    /// Iterate mutably over live objects.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        let used = self.used;
        self.items[..used].iter_mut()
    }

    /// Drop every object and release the cursor.
    pub fn clear(&mut self) {
        self.items.clear();
        self.used = 0;
    }
}

impl<T> Default for Pool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Index<PoolIndex> for Pool<T> {
    type Output = T;

    fn index(&self, index: PoolIndex) -> &T {
        &self.as_slice()[index.0]
    }
}

impl<T> IndexMut<PoolIndex> for Pool<T> {
    fn index_mut(&mut self, index: PoolIndex) -> &mut T {
        let used = self.used;
        &mut self.items[..used][index.0]
    }
}

// ============================================================================
// Tests
// ============================================================================
