//! Generational rent/release pool
//!
//! Records handed to the solver (vertex loops, agent records) are rebuilt
//! every step in the worst case. The pool keeps released values in place so
//! their heap storage (point buffers) survives across rent cycles: renting
//! into a previously released slot performs no allocation.
//!
//! Handles carry a generation counter, incremented on release, so a stale
//! handle can never reach a recycled record.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use thiserror::Error;

/// Errors from handle-based pool access.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("handle index {index} is out of bounds (pool has {len} slots)")]
    IndexOutOfBounds { index: u32, len: usize },

    #[error("stale handle: slot {index} is at generation {current}, handle holds {held}")]
    StaleHandle { index: u32, current: u32, held: u32 },
}

/// Restores a value to its idle state without discarding owned storage.
pub trait Recycle {
    fn recycle(&mut self);
}

/// Typed handle into a [`Pool`].
///
/// Format: [32-bit index | 32-bit generation]. The generation is bumped
/// when the slot is released, which invalidates outstanding handles.
pub struct Handle<T> {
    index: u32,
    generation: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    const fn new(index: u32, generation: u32) -> Self {
        Self {
            index,
            generation,
            _marker: PhantomData,
        }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

// Manual impls: the handle is Copy regardless of T.
impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.generation == other.generation
    }
}
impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
        self.generation.hash(state);
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({}v{})", self.index, self.generation)
    }
}

struct Slot<T> {
    generation: u32,
    live: bool,
    value: T,
}

/// Slot arena with a free list and rent/release counters.
pub struct Pool<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    rented_total: u64,
    released_total: u64,
}

impl<T> Default for Pool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Pool<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            rented_total: 0,
            released_total: 0,
        }
    }

    /// Number of live (rented) records.
    pub fn live(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Number of released slots ready for reuse without allocation.
    pub fn available(&self) -> usize {
        self.free.len()
    }

    pub fn rented_total(&self) -> u64 {
        self.rented_total
    }

    pub fn released_total(&self) -> u64 {
        self.released_total
    }

    /// True if `handle` refers to a live record in this pool.
    pub fn contains(&self, handle: Handle<T>) -> bool {
        self.slot(handle).is_ok()
    }

    pub fn get(&self, handle: Handle<T>) -> Result<&T, PoolError> {
        self.slot(handle).map(|s| &s.value)
    }

    pub fn get_mut(&mut self, handle: Handle<T>) -> Result<&mut T, PoolError> {
        self.slot_check(handle)?;
        Ok(&mut self.slots[handle.index as usize].value)
    }

    /// Iterate live records.
    pub fn iter(&self) -> impl Iterator<Item = (Handle<T>, &T)> {
        self.slots.iter().enumerate().filter_map(|(i, s)| {
            s.live
                .then(|| (Handle::new(i as u32, s.generation), &s.value))
        })
    }

    /// Iterate live records mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Handle<T>, &mut T)> {
        self.slots.iter_mut().enumerate().filter_map(|(i, s)| {
            s.live
                .then_some((Handle::new(i as u32, s.generation), &mut s.value))
        })
    }

    /// Drops every slot and its storage. Outstanding handles all go stale.
    pub fn dispose(&mut self) {
        let live = self.live() as u64;
        self.released_total += live;
        self.slots.clear();
        self.free.clear();
    }

    fn slot(&self, handle: Handle<T>) -> Result<&Slot<T>, PoolError> {
        let slot = self
            .slots
            .get(handle.index as usize)
            .ok_or(PoolError::IndexOutOfBounds {
                index: handle.index,
                len: self.slots.len(),
            })?;
        if !slot.live || slot.generation != handle.generation {
            return Err(PoolError::StaleHandle {
                index: handle.index,
                current: slot.generation,
                held: handle.generation,
            });
        }
        Ok(slot)
    }

    fn slot_check(&self, handle: Handle<T>) -> Result<(), PoolError> {
        self.slot(handle).map(|_| ())
    }
}

impl<T: Default + Recycle> Pool<T> {
    /// Rents a record, reusing a released slot when one is available.
    ///
    /// Reused slots keep their previous value's storage; the record was
    /// recycled to its idle state when it was released.
    pub fn rent(&mut self) -> Handle<T> {
        self.rented_total += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.live = true;
            return Handle::new(index, slot.generation);
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            live: true,
            value: T::default(),
        });
        Handle::new(index, 0)
    }

    /// Releases a record back to the pool, recycling it in place.
    pub fn release(&mut self, handle: Handle<T>) -> Result<(), PoolError> {
        self.slot_check(handle)?;
        let slot = &mut self.slots[handle.index as usize];
        slot.value.recycle();
        slot.generation = slot.generation.wrapping_add(1);
        slot.live = false;
        self.free.push(handle.index);
        self.released_total += 1;
        Ok(())
    }

    /// Releases every live record. Used for bulk teardown.
    pub fn release_all(&mut self) {
        for (i, slot) in self.slots.iter_mut().enumerate() {
            if slot.live {
                slot.value.recycle();
                slot.generation = slot.generation.wrapping_add(1);
                slot.live = false;
                self.free.push(i as u32);
                self.released_total += 1;
            }
        }
    }
}
