// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fixed-capacity registry storage.
//!
//! Provides [`FixedPool`], the bounded container every registry kind lives in,
//! and [`Handle`], the generation-checked reference other processes keep.

mod fixed_pool;
mod handle;

pub use fixed_pool::FixedPool;
pub use handle::{AtomicHandle, Handle};
