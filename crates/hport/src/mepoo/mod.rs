// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Payload memory: the chunk pool seam and a slab implementation.

mod chunk;
mod slab_chunk_pool;

pub use chunk::{ChunkHeader, ChunkPool, LoanedChunk, SharedChunk};
pub use slab_chunk_pool::SlabChunkPool;
