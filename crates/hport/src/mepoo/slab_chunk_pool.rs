// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Size-class slab chunk pool with atomic occupancy bitmaps.
//!
//! Each size class owns up to 64 slots tracked by one `AtomicU64` bitmap
//! (bit set = in use). A chunk carries a reference count; it returns to its
//! class when the last reference is released.
//!
//! # Performance
//!
//! - allocate: one CAS on the bitmap in the common case
//! - retain/release: one atomic add, plus one CAS when the chunk is reclaimed

use super::chunk::{ChunkHeader, ChunkPool};
use crate::error::AllocationError;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

/// Size class configuration: (slot_size, slot_count)
const DEFAULT_SIZE_CLASSES: &[(usize, usize)] = &[
    (64, 64),    // 64B x 64 slots = 4 KB
    (256, 64),   // 256B x 64 slots = 16 KB
    (1024, 64),  // 1KB x 64 slots = 64 KB
    (4096, 32),  // 4KB x 32 slots = 128 KB
    (16384, 32), // 16KB x 32 slots = 512 KB
    (65536, 16), // 64KB x 16 slots = 1 MB
];

/// Bitmap width bounds the slot count of a class.
const MAX_SLOTS_PER_CLASS: usize = 64;

struct ChunkSlot {
    data: RwLock<Box<[u8]>>,
    refs: AtomicU32,
}

struct SizeClass {
    slots: Box<[ChunkSlot]>,
    bitmap: AtomicU64,
    slot_size: usize,
}

impl SizeClass {
    fn new(slot_size: usize, slot_count: usize) -> Self {
        let slot_count = slot_count.min(MAX_SLOTS_PER_CLASS);
        let slots = (0..slot_count)
            .map(|_| ChunkSlot {
                data: RwLock::new(vec![0u8; slot_size].into_boxed_slice()),
                refs: AtomicU32::new(0),
            })
            .collect();

        Self {
            slots,
            bitmap: AtomicU64::new(0),
            slot_size,
        }
    }

    fn try_reserve(&self) -> Option<u16> {
        loop {
            let bitmap = self.bitmap.load(Ordering::Acquire);

            // Find first free bit (bit=0 means free)
            let slot_index = (!bitmap).trailing_zeros() as usize;
            if slot_index >= self.slots.len() {
                return None; // Class full
            }

            let new_bitmap = bitmap | (1u64 << slot_index);
            if self
                .bitmap
                .compare_exchange(bitmap, new_bitmap, Ordering::AcqRel, Ordering::Relaxed)
                .is_ok()
            {
                self.slots[slot_index].refs.store(1, Ordering::Release);
                return u16::try_from(slot_index).ok();
            }
            // CAS failed, retry
        }
    }

    fn is_reserved(&self, slot_id: u16) -> bool {
        usize::from(slot_id) < self.slots.len()
            && self.bitmap.load(Ordering::Acquire) & (1u64 << slot_id) != 0
    }

    fn free_slot(&self, slot_id: u16) {
        let slot_mask = 1u64 << slot_id;
        self.bitmap.fetch_and(!slot_mask, Ordering::AcqRel);
    }

    fn used(&self) -> usize {
        self.bitmap.load(Ordering::Acquire).count_ones() as usize
    }
}

/// In-process chunk pool used by tests, benches and the demo.
pub struct SlabChunkPool {
    classes: Vec<SizeClass>,
}

impl SlabChunkPool {
    #[must_use]
    pub fn new() -> Self {
        Self::with_size_classes(DEFAULT_SIZE_CLASSES)
    }

    /// Pool with custom `(slot_size, slot_count)` classes, sorted by size.
    ///
    /// Slot counts above 64 are clamped.
    #[must_use]
    pub fn with_size_classes(classes: &[(usize, usize)]) -> Self {
        let mut sorted = classes.to_vec();
        sorted.sort_by_key(|&(size, _)| size);
        Self {
            classes: sorted
                .into_iter()
                .map(|(size, count)| SizeClass::new(size, count))
                .collect(),
        }
    }

    /// Total number of chunks across all classes.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.classes.iter().map(|c| c.slots.len()).sum()
    }

    fn slot(&self, chunk: ChunkHeader) -> Option<(&SizeClass, &ChunkSlot)> {
        let class = self.classes.get(usize::from(chunk.pool_id))?;
        if !class.is_reserved(chunk.slot_id) {
            return None;
        }
        let slot = class.slots.get(usize::from(chunk.slot_id))?;
        Some((class, slot))
    }
}

impl Default for SlabChunkPool {
    fn default() -> Self {
        Self::new()
    }
}

impl ChunkPool for SlabChunkPool {
    fn allocate(&self, size: usize) -> Result<ChunkHeader, AllocationError> {
        let len = u32::try_from(size).map_err(|_| AllocationError::InvalidChunkSize(size))?;
        let start = self
            .classes
            .iter()
            .position(|class| class.slot_size >= size)
            .ok_or(AllocationError::InvalidChunkSize(size))?;

        // Fall back to larger classes if the best fit is full
        for (pool_id, class) in self.classes.iter().enumerate().skip(start) {
            let Some(slot_id) = class.try_reserve() else {
                continue;
            };
            let Ok(pool_id) = u16::try_from(pool_id) else {
                class.free_slot(slot_id);
                break;
            };
            return Ok(ChunkHeader {
                pool_id,
                slot_id,
                len,
            });
        }

        log::debug!("[mepoo] no free chunk for {} bytes", size);
        Err(AllocationError::RunningOutOfChunks)
    }

    fn payload(&self, chunk: ChunkHeader, reader: &mut dyn FnMut(&[u8])) -> bool {
        let Some((_, slot)) = self.slot(chunk) else {
            return false;
        };
        let data = slot.data.read();
        let len = (chunk.len as usize).min(data.len());
        reader(&data[..len]);
        true
    }

    fn payload_mut(&self, chunk: ChunkHeader, writer: &mut dyn FnMut(&mut [u8])) -> bool {
        let Some((_, slot)) = self.slot(chunk) else {
            return false;
        };
        let mut data = slot.data.write();
        let len = (chunk.len as usize).min(data.len());
        writer(&mut data[..len]);
        true
    }

    fn retain(&self, chunk: ChunkHeader) {
        if let Some((_, slot)) = self.slot(chunk) {
            slot.refs.fetch_add(1, Ordering::AcqRel);
        }
    }

    fn release(&self, chunk: ChunkHeader) {
        let Some((class, slot)) = self.slot(chunk) else {
            log::warn!("[mepoo] release of unallocated chunk {:?}", chunk);
            return;
        };
        let previous = slot
            .refs
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |refs| refs.checked_sub(1));
        if previous == Ok(1) {
            class.free_slot(chunk.slot_id);
        }
    }

    fn used_chunks(&self) -> usize {
        self.classes.iter().map(SizeClass::used).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_picks_best_fit_class() {
        let pool = SlabChunkPool::new();
        let small = pool.allocate(10).expect("allocation should succeed");
        assert_eq!(small.pool_id, 0);
        assert_eq!(small.len, 10);

        let medium = pool.allocate(1000).expect("allocation should succeed");
        assert_eq!(medium.pool_id, 2);
        assert_eq!(pool.used_chunks(), 2);
    }

    #[test]
    fn test_oversized_request_is_rejected() {
        let pool = SlabChunkPool::with_size_classes(&[(64, 4)]);
        assert_eq!(
            pool.allocate(65),
            Err(AllocationError::InvalidChunkSize(65))
        );
    }

    #[test]
    fn test_fallback_then_exhaustion() {
        let pool = SlabChunkPool::with_size_classes(&[(16, 1), (32, 1)]);
        let a = pool.allocate(8).expect("allocation should succeed");
        let b = pool.allocate(8).expect("allocation should succeed");
        assert_eq!(a.pool_id, 0);
        assert_eq!(b.pool_id, 1); // Fallback to next size class
        assert_eq!(pool.allocate(8), Err(AllocationError::RunningOutOfChunks));
    }

    #[test]
    fn test_reference_counting_reclaims_on_last_release() {
        let pool = SlabChunkPool::with_size_classes(&[(64, 1)]);
        let chunk = pool.allocate(4).expect("allocation should succeed");
        pool.retain(chunk);

        pool.release(chunk);
        assert_eq!(pool.used_chunks(), 1);
        pool.release(chunk);
        assert_eq!(pool.used_chunks(), 0);

        // Slot reusable
        let again = pool.allocate(4).expect("allocation should succeed");
        assert_eq!(again.slot_id, chunk.slot_id);
    }

    #[test]
    fn test_payload_write_then_read() {
        let pool = SlabChunkPool::new();
        let chunk = pool.allocate(3).expect("allocation should succeed");
        assert!(pool.payload_mut(chunk, &mut |bytes| bytes.copy_from_slice(b"abc")));

        let mut seen = Vec::new();
        assert!(pool.payload(chunk, &mut |bytes| seen.extend_from_slice(bytes)));
        assert_eq!(seen, b"abc");

        pool.release(chunk);
        assert!(!pool.payload(chunk, &mut |_| {}));
    }
}
