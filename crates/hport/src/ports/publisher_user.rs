// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Owner-side facade of a publisher port.

use super::base::RegistryContext;
use super::publisher::PublisherPortData;
use crate::capro::ServiceDescription;
use crate::error::{AllocationError, ErrorKind};
use crate::mepoo::{LoanedChunk, SharedChunk};
use crate::pool::Handle;

/// Typed wrapper the owning process uses on its publisher entry.
///
/// Offer / stop-offer only express intent; the next discovery pass applies it.
#[derive(Debug, Clone)]
pub struct PublisherPortUser {
    context: RegistryContext,
    handle: Handle<PublisherPortData>,
}

impl PublisherPortUser {
    #[must_use]
    pub fn new(context: RegistryContext, handle: Handle<PublisherPortData>) -> Self {
        Self { context, handle }
    }

    #[must_use]
    pub fn handle(&self) -> Handle<PublisherPortData> {
        self.handle
    }

    pub fn offer(&self) {
        if let Some(data) = self.data() {
            data.request_offer(true);
        }
    }

    pub fn stop_offer(&self) {
        if let Some(data) = self.data() {
            data.request_offer(false);
        }
    }

    #[must_use]
    pub fn is_offered(&self) -> bool {
        self.data().is_some_and(PublisherPortData::is_offered)
    }

    #[must_use]
    pub fn has_subscribers(&self) -> bool {
        self.data()
            .is_some_and(|data| !data.subscribers.lock().is_empty())
    }

    #[must_use]
    pub fn service_description(&self) -> ServiceDescription {
        self.data()
            .map(|data| data.header.service())
            .unwrap_or_default()
    }

    /// Loan a writable chunk of `size` bytes from the publisher's payload pool.
    pub fn try_allocate_chunk(&self, size: usize) -> Result<LoanedChunk, AllocationError> {
        let pool = self
            .data()
            .and_then(PublisherPortData::payload_pool)
            .ok_or(AllocationError::RunningOutOfChunks)?;
        let header = pool.allocate(size)?;
        Ok(LoanedChunk::new(SharedChunk::from_owned(header, pool)))
    }

    /// Return an unsent loan.
    pub fn free_chunk(&self, chunk: LoanedChunk) {
        drop(chunk);
    }

    /// Deliver `chunk` to every connected subscriber and retain it in history.
    ///
    /// A full subscriber queue drops its oldest chunk and flags the loss. Each
    /// receiving subscriber's condition variable is notified.
    pub fn send_chunk(&self, chunk: LoanedChunk) {
        let Some(chunk) = chunk.into_shared() else {
            return;
        };
        let Some(data) = self.data() else {
            chunk.release();
            return;
        };

        let pool = &self.context.pool;
        for subscriber in data.connected_subscribers() {
            let Some(receiver) = pool.subscribers.get(subscriber) else {
                continue;
            };
            receiver.deliver(chunk.share());
            if let Some(cv) = receiver
                .condition_variable()
                .and_then(|cv| pool.condition_variables.get(cv))
            {
                cv.signal.notify();
            }
        }

        data.retain_in_history(chunk);
    }

    /// Allocate, copy `payload` in and send.
    pub fn send_copy(&self, payload: &[u8]) -> Result<(), AllocationError> {
        let mut chunk = self.try_allocate_chunk(payload.len())?;
        chunk.write(payload);
        self.send_chunk(chunk);
        Ok(())
    }

    /// Flag the entry for purge by the next discovery pass. Silent if it is
    /// already gone.
    pub fn destroy(&self) {
        if let Some(data) = self.context.pool.publishers.get(self.handle) {
            data.header.owner.mark_to_be_destroyed();
        }
    }

    fn data(&self) -> Option<&PublisherPortData> {
        self.context.resolve(
            &self.context.pool.publishers,
            self.handle,
            ErrorKind::PortUsedAfterDestruction("publisher port"),
        )
    }
}
