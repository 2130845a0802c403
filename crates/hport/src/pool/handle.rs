// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Location-independent references into a [`FixedPool`](super::FixedPool).
//!
//! A handle is `(slot index, generation)`. It stays meaningful in every address
//! space that maps the registry, whatever the mapping base, and it can be stored
//! atomically in shared records through [`AtomicHandle`].
//!
//! Encoded as: upper 32 bits = generation, lower 32 bits = slot index.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};

/// Raw value of an empty [`AtomicHandle`]. Never produced by a pool.
const NO_HANDLE: u64 = u64::MAX;

/// Typed, generation-checked reference to a pool slot.
pub struct Handle<T> {
    index: u32,
    generation: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    pub(crate) const fn new(index: u32, generation: u32) -> Self {
        Self {
            index,
            generation,
            _marker: PhantomData,
        }
    }

    /// Slot index inside the pool.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.index
    }

    /// Slot generation at the time the handle was issued.
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }

    /// Pack into a single word for atomic storage.
    #[must_use]
    pub const fn to_raw(self) -> u64 {
        ((self.generation as u64) << 32) | self.index as u64
    }

    /// Unpack a word produced by [`Handle::to_raw`].
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        // Truncating casts split the two 32-bit halves
        Self::new(raw as u32, (raw >> 32) as u32)
    }
}

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

impl<T> PartialOrd for Handle<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Handle<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.index, self.generation).cmp(&(other.index, other.generation))
    }
}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_raw().hash(state);
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({}@{})", self.index, self.generation)
    }
}

/// Optional [`Handle`] readable and writable in a single atomic step.
///
/// Readers in other processes never observe a half-written reference.
pub struct AtomicHandle<T> {
    raw: AtomicU64,
    _marker: PhantomData<fn() -> T>,
}

impl<T> AtomicHandle<T> {
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            raw: AtomicU64::new(NO_HANDLE),
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub fn load(&self) -> Option<Handle<T>> {
        decode(self.raw.load(Ordering::Acquire))
    }

    pub fn store(&self, handle: Option<Handle<T>>) {
        self.raw.store(encode(handle), Ordering::Release);
    }

    /// Store `handle` and return the previous value.
    pub fn swap(&self, handle: Option<Handle<T>>) -> Option<Handle<T>> {
        decode(self.raw.swap(encode(handle), Ordering::AcqRel))
    }

    /// Clear the reference only if it still points at `expected`.
    ///
    /// Returns `true` when the reference was cleared.
    pub fn clear_if(&self, expected: Handle<T>) -> bool {
        self.raw
            .compare_exchange(
                expected.to_raw(),
                NO_HANDLE,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    pub fn take(&self) -> Option<Handle<T>> {
        self.swap(None)
    }
}

impl<T> Default for AtomicHandle<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> fmt::Debug for AtomicHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AtomicHandle").field(&self.load()).finish()
    }
}

fn encode<T>(handle: Option<Handle<T>>) -> u64 {
    handle.map_or(NO_HANDLE, Handle::to_raw)
}

fn decode<T>(raw: u64) -> Option<Handle<T>> {
    (raw != NO_HANDLE).then(|| Handle::from_raw(raw))
}
