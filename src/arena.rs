// Copyright 2014 Nick Fitzgerald
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The bump-pointer arena allocator.
//!
//! An `Arena<T>` is a contiguous, growable pool of `T` slots. Allocation
//! bumps a cursor and never frees a single slot; the whole pool is
//! bulk-freed by [`Arena::reset`]. This is deliberately the simplest
//! allocation strategy that supports the interpreter's two-region memory
//! discipline (see `context`): one arena lives for the process, the other is
//! reset after every top-level form.
//!
//! Slots are addressed by [`Index`], a plain `u32` plus a generation
//! counter. The generation is bumped on every [`Arena::reset`], so an index
//! captured before a reset can never alias a slot reused after it — using
//! one after the fact panics instead of reading garbage.

use std::fmt;

/// Initial slot capacity for a freshly created arena.
const INITIAL_CAPACITY: usize = 256;

/// A stable reference to a slot in an [`Arena<T>`].
///
/// Indices are only meaningful relative to the arena that produced them and
/// the generation that was current at the time. Comparing indices from two
/// different generations (e.g. before and after a [`Arena::reset`]) always
/// yields inequality, even if the raw slot happens to coincide.
pub struct Index<T> {
    slot: u32,
    generation: u32,
    _marker: std::marker::PhantomData<fn() -> T>,
}

impl<T> Index<T> {
    fn new(slot: u32, generation: u32) -> Index<T> {
        Index {
            slot,
            generation,
            _marker: std::marker::PhantomData,
        }
    }

    /// The raw slot number, ignoring generation. Only useful for debugging
    /// output and for building composite keys (e.g. in `are_equal`).
    pub fn raw(&self) -> u32 {
        self.slot
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl<T> Clone for Index<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Index<T> {}

impl<T> PartialEq for Index<T> {
    fn eq(&self, other: &Self) -> bool {
        self.slot == other.slot && self.generation == other.generation
    }
}

impl<T> Eq for Index<T> {}

impl<T> std::hash::Hash for Index<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.slot.hash(state);
        self.generation.hash(state);
    }
}

impl<T> fmt::Debug for Index<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Index(slot={}, gen={})", self.slot, self.generation)
    }
}

/// A bump-allocated pool of `T` values with O(1) amortized allocation and
/// O(1) bulk reset.
///
/// Growth doubles capacity (or grows to fit the requested allocation,
/// whichever is larger), matching the `max(2 * capacity, used + n)` rule
/// used by C-style bump allocators. Because slots are addressed by index
/// rather than raw pointer, growth (which may reallocate the backing
/// `Vec`) never invalidates an outstanding [`Index`].
pub struct Arena<T> {
    slots: Vec<T>,
    generation: u32,
}

impl<T> Arena<T> {
    /// Create a new, empty arena.
    pub fn new() -> Arena<T> {
        Arena {
            slots: Vec::with_capacity(INITIAL_CAPACITY),
            generation: 0,
        }
    }

    /// Number of live slots since the last reset.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Allocate a new slot holding `value` and return its index.
    ///
    /// Amortized O(1): growth only occurs when the backing `Vec` is at
    /// capacity, and doubles capacity (via `Vec::reserve`) so the
    /// amortized cost per allocation stays constant.
    pub fn alloc(&mut self, value: T) -> Index<T> {
        if self.slots.len() == self.slots.capacity() {
            let grow_to = std::cmp::max(self.slots.capacity() * 2, self.slots.len() + 1);
            self.slots.reserve(grow_to - self.slots.len());
            log::trace!(
                "arena: grew to capacity {} (generation {})",
                self.slots.capacity(),
                self.generation
            );
        }
        let slot = self.slots.len() as u32;
        self.slots.push(value);
        Index::new(slot, self.generation)
    }

    /// Fetch a reference to the slot at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` belongs to a generation other than the current
    /// one, or if its slot number is out of bounds for the current
    /// generation. Both are logic errors: a stale index from before a
    /// [`Arena::reset`] must never be dereferenced.
    pub fn get(&self, index: Index<T>) -> &T {
        assert_eq!(
            index.generation, self.generation,
            "stale arena index used after reset"
        );
        &self.slots[index.slot as usize]
    }

    /// Fetch a mutable reference to the slot at `index`. See [`Arena::get`]
    /// for panic conditions.
    pub fn get_mut(&mut self, index: Index<T>) -> &mut T {
        assert_eq!(
            index.generation, self.generation,
            "stale arena index used after reset"
        );
        &mut self.slots[index.slot as usize]
    }

    /// Bulk-free every slot allocated so far. O(1): the backing storage is
    /// truncated, not deallocated, so future allocations reuse the
    /// capacity. The generation counter is bumped so that indices captured
    /// before the reset are rejected by [`Arena::get`] rather than
    /// silently aliasing whatever gets allocated next.
    pub fn reset(&mut self) {
        self.slots.clear();
        self.generation = self.generation.wrapping_add(1);
        log::trace!("arena: reset (generation now {})", self.generation);
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Arena::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_and_get_roundtrip() {
        let mut arena: Arena<i64> = Arena::new();
        let a = arena.alloc(1);
        let b = arena.alloc(2);
        assert_eq!(*arena.get(a), 1);
        assert_eq!(*arena.get(b), 2);
    }

    #[test]
    fn reset_invalidates_generation() {
        let mut arena: Arena<i64> = Arena::new();
        let a = arena.alloc(42);
        assert_eq!(*arena.get(a), 42);
        arena.reset();
        assert_eq!(arena.len(), 0);
        assert_ne!(arena.generation(), a.generation());
    }

    #[test]
    #[should_panic(expected = "stale arena index")]
    fn using_stale_index_panics() {
        let mut arena: Arena<i64> = Arena::new();
        let a = arena.alloc(42);
        arena.reset();
        arena.alloc(7);
        let _ = arena.get(a);
    }

    #[test]
    fn grows_past_initial_capacity() {
        let mut arena: Arena<i64> = Arena::new();
        let mut indices = Vec::new();
        for i in 0..(INITIAL_CAPACITY as i64 * 4) {
            indices.push(arena.alloc(i));
        }
        for (i, idx) in indices.iter().enumerate() {
            assert_eq!(*arena.get(*idx), i as i64);
        }
    }
}
