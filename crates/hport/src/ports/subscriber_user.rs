// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Owner-side facade of a subscriber port.

use super::base::RegistryContext;
use super::subscriber::{SubscribeState, SubscriberPortData};
use crate::capro::ServiceDescription;
use crate::error::{ChunkReceiveError, ErrorKind};
use crate::mepoo::SharedChunk;
use crate::pool::Handle;
use crate::popo::SubscriberPort;
use crate::sync::ConditionVariableData;

/// Typed wrapper the owning process uses on its subscriber entry.
#[derive(Debug, Clone)]
pub struct SubscriberPortUser {
    context: RegistryContext,
    handle: Handle<SubscriberPortData>,
}

impl SubscriberPortUser {
    #[must_use]
    pub fn new(context: RegistryContext, handle: Handle<SubscriberPortData>) -> Self {
        Self { context, handle }
    }

    #[must_use]
    pub fn handle(&self) -> Handle<SubscriberPortData> {
        self.handle
    }

    /// Current wait-set condition variable reference.
    #[must_use]
    pub fn condition_variable(&self) -> Option<Handle<ConditionVariableData>> {
        self.data().and_then(SubscriberPortData::condition_variable)
    }

    fn data(&self) -> Option<&SubscriberPortData> {
        self.context.resolve(
            &self.context.pool.subscribers,
            self.handle,
            ErrorKind::PortUsedAfterDestruction("subscriber port"),
        )
    }
}

impl SubscriberPort for SubscriberPortUser {
    fn subscribe(&self) {
        if let Some(data) = self.data() {
            data.request_subscribe();
        }
    }

    fn unsubscribe(&self) {
        if let Some(data) = self.data() {
            data.request_unsubscribe();
        }
    }

    fn subscription_state(&self) -> SubscribeState {
        self.data()
            .map(SubscriberPortData::state)
            .unwrap_or_default()
    }

    fn has_new_chunks(&self) -> bool {
        self.data().is_some_and(SubscriberPortData::has_new_chunks)
    }

    fn try_get_chunk(&self) -> Result<SharedChunk, ChunkReceiveError> {
        let data = self.data().ok_or(ChunkReceiveError::NoChunkAvailable)?;
        data.try_take(self.context.pool.max_chunks_held_per_subscriber())
    }

    fn release_chunk(&self, chunk: SharedChunk) {
        match self.data() {
            Some(data) => data.release_held(chunk),
            None => chunk.release(),
        }
    }

    fn release_queued_chunks(&self) {
        if let Some(data) = self.data() {
            data.release_queued_chunks();
        }
    }

    fn set_condition_variable(&self, condition_variable: Handle<ConditionVariableData>) {
        if let Some(data) = self.data() {
            data.condition_variable.store(Some(condition_variable));
        }
    }

    fn unset_condition_variable(&self) {
        // Teardown path: a purged entry has no reference left to clear
        if let Some(data) = self.context.pool.subscribers.get(self.handle) {
            data.condition_variable.store(None);
        }
    }

    fn service_description(&self) -> ServiceDescription {
        self.data()
            .map(|data| data.header.service())
            .unwrap_or_default()
    }

    fn has_lost_chunks_since_last_call(&self) -> bool {
        self.data().is_some_and(SubscriberPortData::take_lost_chunks)
    }

    fn destroy(&self) {
        if let Some(data) = self.context.pool.subscribers.get(self.handle) {
            data.header.owner.mark_to_be_destroyed();
        }
    }
}
