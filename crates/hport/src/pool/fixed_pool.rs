// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fixed-capacity, non-relocating record pool.
//!
//! Storage for all `N` slots is reserved once at construction and never grows
//! or moves. Every slot always holds a fully initialised record (its default
//! state until first acquired), so a slot whose owner crashed, or which was
//! purged while another process still looks at it, is structurally valid to
//! read. Liveness is tracked by an atomic state byte and a generation counter.
//!
//! # Slot state machine
//!
//! ```text
//! FREE --acquire CAS--> CONSTRUCTING --init done--> LIVE
//!  ^                                                 |
//!  +------ generation += 1 <--- CONSTRUCTING <-------+ release
//! ```
//!
//! Acquisition is a bounded scan with one CAS per free candidate: it never
//! blocks and never allocates.

use super::handle::Handle;
use std::sync::atomic::{AtomicU32, AtomicU8, AtomicUsize, Ordering};

const FREE: u8 = 0;
const CONSTRUCTING: u8 = 1;
const LIVE: u8 = 2;

struct Slot<T> {
    state: AtomicU8,
    generation: AtomicU32,
    record: T,
}

impl<T: Default> Default for Slot<T> {
    fn default() -> Self {
        Self {
            state: AtomicU8::new(FREE),
            generation: AtomicU32::new(0),
            record: T::default(),
        }
    }
}

/// Bounded pool of `N` records of type `T`.
pub struct FixedPool<T, const N: usize> {
    slots: Box<[Slot<T>]>,
    live: AtomicUsize,
}

impl<T: Default, const N: usize> FixedPool<T, N> {
    const CAPACITY_FITS_HANDLE: () = assert!(N < u32::MAX as usize, "pool capacity too large");

    /// Reserve storage for all `N` slots.
    #[must_use]
    pub fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::CAPACITY_FITS_HANDLE;

        Self {
            slots: (0..N).map(|_| Slot::default()).collect(),
            live: AtomicUsize::new(0),
        }
    }
}

impl<T, const N: usize> FixedPool<T, N> {
    /// Compile-time capacity of the pool.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Claim a free slot and construct its record with `init`.
    ///
    /// Returns `None` if all `N` slots are taken.
    pub fn acquire(&self, init: impl FnOnce(&T)) -> Option<Handle<T>> {
        for (index, slot) in self.slots.iter().enumerate() {
            if slot
                .state
                .compare_exchange(FREE, CONSTRUCTING, Ordering::AcqRel, Ordering::Relaxed)
                .is_err()
            {
                continue;
            }

            init(&slot.record);
            let generation = slot.generation.load(Ordering::Acquire);
            slot.state.store(LIVE, Ordering::Release);
            self.live.fetch_add(1, Ordering::AcqRel);

            let index = match u32::try_from(index) {
                Ok(value) => value,
                Err(_) => return None,
            };
            return Some(Handle::new(index, generation));
        }

        None
    }

    /// Resolve a handle to its live record.
    ///
    /// Returns `None` when the slot was released (or reused) since the handle
    /// was issued.
    #[must_use]
    pub fn get(&self, handle: Handle<T>) -> Option<&T> {
        let slot = self.slots.get(handle.index() as usize)?;
        if slot.state.load(Ordering::Acquire) != LIVE {
            return None;
        }
        if slot.generation.load(Ordering::Acquire) != handle.generation() {
            return None;
        }
        Some(&slot.record)
    }

    /// `true` while the handle still refers to a live entry.
    #[must_use]
    pub fn is_live(&self, handle: Handle<T>) -> bool {
        self.get(handle).is_some()
    }

    /// Record stored in the handle's slot, whether or not the handle is current.
    ///
    /// The memory is always a valid `T`; callers that need the entry itself
    /// check [`FixedPool::is_live`] first.
    #[must_use]
    pub fn slot_record(&self, handle: Handle<T>) -> Option<&T> {
        self.slots
            .get(handle.index() as usize)
            .map(|slot| &slot.record)
    }

    /// Return the slot to the free list and invalidate outstanding handles.
    ///
    /// Returns `false` if the handle was already stale.
    pub fn release(&self, handle: Handle<T>) -> bool {
        let Some(slot) = self.slots.get(handle.index() as usize) else {
            return false;
        };
        if slot.generation.load(Ordering::Acquire) != handle.generation() {
            return false;
        }
        if slot
            .state
            .compare_exchange(LIVE, CONSTRUCTING, Ordering::AcqRel, Ordering::Relaxed)
            .is_err()
        {
            return false;
        }

        slot.generation.fetch_add(1, Ordering::AcqRel);
        slot.state.store(FREE, Ordering::Release);
        self.live.fetch_sub(1, Ordering::AcqRel);
        true
    }

    /// Iterate over live entries in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (Handle<T>, &T)> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            if slot.state.load(Ordering::Acquire) != LIVE {
                return None;
            }
            let index = u32::try_from(index).ok()?;
            let generation = slot.generation.load(Ordering::Acquire);
            Some((Handle::new(index, generation), &slot.record))
        })
    }

    /// Handles of all live entries, collected into a bounded vector.
    ///
    /// Used to take a stable snapshot before mutating other pools.
    #[must_use]
    pub fn handles(&self) -> heapless::Vec<Handle<T>, N> {
        let mut out = heapless::Vec::new();
        for (handle, _) in self.iter() {
            // Capacity equals the slot count, so this cannot overflow.
            let _ = out.push(handle);
        }
        out
    }
}

impl<T: Default, const N: usize> Default for FixedPool<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU64;
    use std::sync::Arc;
    use std::thread;

    #[derive(Default)]
    struct Counter {
        value: AtomicU64,
    }

    #[test]
    fn test_acquire_until_full() {
        let pool: FixedPool<Counter, 4> = FixedPool::new();
        for i in 0..4 {
            let handle = pool.acquire(|c| c.value.store(i, Ordering::Relaxed));
            assert!(handle.is_some());
        }
        assert_eq!(pool.len(), 4);
        assert!(pool.acquire(|_| {}).is_none());
    }

    #[test]
    fn test_release_invalidates_handle_and_frees_slot() {
        let pool: FixedPool<Counter, 1> = FixedPool::new();
        let first = pool.acquire(|c| c.value.store(7, Ordering::Relaxed)).unwrap();
        assert_eq!(pool.get(first).unwrap().value.load(Ordering::Relaxed), 7);

        assert!(pool.release(first));
        assert!(pool.get(first).is_none());
        assert!(!pool.release(first)); // double release is rejected

        let second = pool.acquire(|c| c.value.store(9, Ordering::Relaxed)).unwrap();
        assert_eq!(second.index(), first.index()); // same slot reused
        assert_ne!(second, first); // different generation
        assert!(pool.get(first).is_none());
        assert_eq!(pool.get(second).unwrap().value.load(Ordering::Relaxed), 9);
    }

    #[test]
    fn test_stale_slot_is_still_readable() {
        let pool: FixedPool<Counter, 1> = FixedPool::new();
        let handle = pool.acquire(|c| c.value.store(3, Ordering::Relaxed)).unwrap();
        pool.release(handle);

        let record = pool.slot_record(handle).expect("index in range");
        assert_eq!(record.value.load(Ordering::Relaxed), 3);
        assert!(!pool.is_live(handle));
    }

    #[test]
    fn test_iter_skips_free_slots() {
        let pool: FixedPool<Counter, 3> = FixedPool::new();
        let a = pool.acquire(|_| {}).unwrap();
        let b = pool.acquire(|_| {}).unwrap();
        let c = pool.acquire(|_| {}).unwrap();
        pool.release(b);

        let live: Vec<_> = pool.iter().map(|(h, _)| h).collect();
        assert_eq!(live, vec![a, c]);
        assert_eq!(pool.handles().len(), 2);
    }

    #[test]
    fn test_concurrent_acquire_never_exceeds_capacity() {
        let pool: Arc<FixedPool<Counter, 64>> = Arc::new(FixedPool::new());
        let mut workers = Vec::new();
        for _ in 0..8 {
            let pool = Arc::clone(&pool);
            workers.push(thread::spawn(move || {
                let mut won = 0;
                for _ in 0..16 {
                    if pool.acquire(|_| {}).is_some() {
                        won += 1;
                    }
                }
                won
            }));
        }

        let total: usize = workers.into_iter().map(|w| w.join().unwrap()).sum();
        assert_eq!(total, 64);
        assert_eq!(pool.len(), 64);
    }
}
