// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use crate::capro::ServiceDescription;
use crate::error::ChunkReceiveError;
use crate::mepoo::SharedChunk;
use crate::pool::Handle;
use crate::ports::SubscribeState;
use crate::sync::ConditionVariableData;

/// Capability set of a subscriber port as seen by [`BaseSubscriber`](super::BaseSubscriber).
///
/// Implemented by [`SubscriberPortUser`](crate::ports::SubscriberPortUser) over a
/// registry entry, and by test doubles.
pub trait SubscriberPort: Send + Sync {
    /// Express subscribe intent; discovery connects.
    fn subscribe(&self);

    /// Withdraw subscribe intent; discovery disconnects.
    fn unsubscribe(&self);

    fn subscription_state(&self) -> SubscribeState;

    fn has_new_chunks(&self) -> bool;

    /// Take the oldest queued chunk.
    fn try_get_chunk(&self) -> Result<SharedChunk, ChunkReceiveError>;

    /// Return a chunk obtained from [`SubscriberPort::try_get_chunk`].
    fn release_chunk(&self, chunk: SharedChunk);

    /// Drop everything still queued.
    fn release_queued_chunks(&self);

    /// Point the port at a wait-set condition variable, replacing any previous one.
    fn set_condition_variable(&self, condition_variable: Handle<ConditionVariableData>);

    fn unset_condition_variable(&self);

    fn service_description(&self) -> ServiceDescription;

    /// Whether the queue overflowed since the previous call.
    fn has_lost_chunks_since_last_call(&self) -> bool;

    /// Flag the underlying entry for purge.
    fn destroy(&self);
}
