// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Chunk pool seam and the chunk references handed to ports.
//!
//! A chunk is addressed by a [`ChunkHeader`]; the pool keeps a reference count
//! per chunk and reclaims it when the last holder releases. Ports never copy
//! payloads: publishers write in place, subscribers read in place, and every
//! queue or history entry owns exactly one reference.

use crate::error::AllocationError;
use std::fmt;
use std::sync::Arc;

/// Location of a chunk inside its pool.
///
/// Encoded as: `pool_id` = size class, `slot_id` = slot in that class,
/// `len` = payload bytes requested at allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkHeader {
    pub pool_id: u16,
    pub slot_id: u16,
    pub len: u32,
}

/// Payload memory provider.
///
/// Implementations must be usable from every participating process; the
/// registry only keeps an `Arc<dyn ChunkPool>` per publisher.
pub trait ChunkPool: Send + Sync {
    /// Allocate a chunk with a reference count of one.
    fn allocate(&self, size: usize) -> Result<ChunkHeader, AllocationError>;

    /// Run `reader` over the payload. Returns `false` if the chunk is not allocated.
    fn payload(&self, chunk: ChunkHeader, reader: &mut dyn FnMut(&[u8])) -> bool;

    /// Run `writer` over the payload. Returns `false` if the chunk is not allocated.
    fn payload_mut(&self, chunk: ChunkHeader, writer: &mut dyn FnMut(&mut [u8])) -> bool;

    /// Add a reference.
    fn retain(&self, chunk: ChunkHeader);

    /// Drop a reference; the chunk is reclaimed when the count reaches zero.
    fn release(&self, chunk: ChunkHeader);

    /// Number of chunks currently allocated.
    fn used_chunks(&self) -> usize;
}

/// One counted reference to a chunk.
///
/// Not `Clone`: use [`SharedChunk::share`], which takes a new reference.
/// The reference is returned with [`SharedChunk::release`].
pub struct SharedChunk {
    header: ChunkHeader,
    pool: Arc<dyn ChunkPool>,
}

impl SharedChunk {
    /// Wrap a header whose reference the caller already owns.
    pub fn from_owned(header: ChunkHeader, pool: Arc<dyn ChunkPool>) -> Self {
        Self { header, pool }
    }

    #[must_use]
    pub fn header(&self) -> ChunkHeader {
        self.header
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.header.len as usize
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.header.len == 0
    }

    /// Take an additional reference to the same chunk.
    #[must_use]
    pub fn share(&self) -> Self {
        self.pool.retain(self.header);
        Self {
            header: self.header,
            pool: Arc::clone(&self.pool),
        }
    }

    /// Read the payload in place.
    pub fn read<R>(&self, f: impl FnOnce(&[u8]) -> R) -> Option<R> {
        let mut f = Some(f);
        let mut out = None;
        self.pool.payload(self.header, &mut |bytes| {
            if let Some(f) = f.take() {
                out = Some(f(bytes));
            }
        });
        out
    }

    /// Copy the payload out.
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        self.read(<[u8]>::to_vec).unwrap_or_default()
    }

    /// Give the reference back to the pool.
    pub fn release(self) {
        self.pool.release(self.header);
    }
}

impl fmt::Debug for SharedChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedChunk")
            .field("header", &self.header)
            .finish_non_exhaustive()
    }
}

/// Chunk loaned to a publisher, writable until sent.
///
/// Dropping an unsent loan returns the chunk to its pool.
pub struct LoanedChunk {
    chunk: Option<SharedChunk>,
}

impl LoanedChunk {
    pub(crate) fn new(chunk: SharedChunk) -> Self {
        Self { chunk: Some(chunk) }
    }

    #[must_use]
    pub fn header(&self) -> Option<ChunkHeader> {
        self.chunk.as_ref().map(SharedChunk::header)
    }

    /// Mutate the payload in place.
    pub fn payload_mut<R>(&mut self, f: impl FnOnce(&mut [u8]) -> R) -> Option<R> {
        let chunk = self.chunk.as_ref()?;
        let mut f = Some(f);
        let mut out = None;
        chunk.pool.payload_mut(chunk.header, &mut |bytes| {
            if let Some(f) = f.take() {
                out = Some(f(bytes));
            }
        });
        out
    }

    /// Copy `data` to the start of the payload. Returns the number of bytes written.
    pub fn write(&mut self, data: &[u8]) -> usize {
        self.payload_mut(|payload| {
            let n = data.len().min(payload.len());
            payload[..n].copy_from_slice(&data[..n]);
            n
        })
        .unwrap_or(0)
    }

    pub(crate) fn into_shared(mut self) -> Option<SharedChunk> {
        self.chunk.take()
    }
}

impl Drop for LoanedChunk {
    fn drop(&mut self) {
        if let Some(chunk) = self.chunk.take() {
            chunk.release();
        }
    }
}

impl fmt::Debug for LoanedChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoanedChunk")
            .field("header", &self.header())
            .finish()
    }
}
