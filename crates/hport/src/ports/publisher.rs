// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Publisher port record.

use super::base::PortHeader;
use super::subscriber::SubscriberPortData;
use crate::capro::ServiceDescription;
use crate::config::{PortConfigInfo, MAX_PUBLISHER_HISTORY, MAX_SUBSCRIBERS_PER_PUBLISHER};
use crate::mepoo::{ChunkPool, SharedChunk};
use crate::pool::Handle;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Creation options of a publisher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublisherOptions {
    /// Samples retained for late-joining subscribers (capped at `MAX_PUBLISHER_HISTORY`).
    pub history_capacity: usize,
    pub node_name: String,
    /// Offer right away, without waiting for an explicit `offer()` + discovery.
    pub offer_on_create: bool,
}

impl Default for PublisherOptions {
    fn default() -> Self {
        Self {
            history_capacity: 0,
            node_name: String::new(),
            offer_on_create: true,
        }
    }
}

impl PublisherOptions {
    #[must_use]
    pub fn with_history(history_capacity: usize) -> Self {
        Self {
            history_capacity,
            ..Self::default()
        }
    }
}

pub(crate) type SubscriberList = heapless::Vec<Handle<SubscriberPortData>, MAX_SUBSCRIBERS_PER_PUBLISHER>;

/// Registry record of a publisher port.
///
/// The owner writes `offering_requested`; discovery alone writes `offered` and
/// the subscriber list.
#[derive(Default)]
pub struct PublisherPortData {
    pub(crate) header: PortHeader,
    history_capacity: AtomicUsize,
    offering_requested: AtomicBool,
    offered: AtomicBool,
    pub(crate) subscribers: Mutex<SubscriberList>,
    history: Mutex<heapless::Deque<SharedChunk, MAX_PUBLISHER_HISTORY>>,
    payload_pool: Mutex<Option<Arc<dyn ChunkPool>>>,
}

impl PublisherPortData {
    pub(crate) fn reset(
        &self,
        process_name: &str,
        service: ServiceDescription,
        options: &PublisherOptions,
        unique_id: u64,
        payload_pool: Arc<dyn ChunkPool>,
        config: PortConfigInfo,
    ) {
        self.header
            .reset(process_name, service, &options.node_name, unique_id, config);
        self.history_capacity.store(
            options.history_capacity.min(MAX_PUBLISHER_HISTORY),
            Ordering::Release,
        );
        self.offering_requested.store(false, Ordering::Release);
        self.offered.store(false, Ordering::Release);
        self.subscribers.lock().clear();
        self.release_history();
        *self.payload_pool.lock() = Some(payload_pool);
    }

    #[must_use]
    pub fn header(&self) -> &PortHeader {
        &self.header
    }

    #[must_use]
    pub fn history_capacity(&self) -> usize {
        self.history_capacity.load(Ordering::Acquire)
    }

    pub(crate) fn request_offer(&self, offer: bool) {
        self.offering_requested.store(offer, Ordering::Release);
    }

    #[must_use]
    pub fn is_offer_requested(&self) -> bool {
        self.offering_requested.load(Ordering::Acquire)
    }

    /// Offered state as last applied by discovery.
    #[must_use]
    pub fn is_offered(&self) -> bool {
        self.offered.load(Ordering::Acquire)
    }

    pub(crate) fn set_offered(&self, offered: bool) {
        self.offered.store(offered, Ordering::Release);
    }

    /// Snapshot of the connected subscribers.
    #[must_use]
    pub fn connected_subscribers(&self) -> SubscriberList {
        self.subscribers.lock().clone()
    }

    pub(crate) fn payload_pool(&self) -> Option<Arc<dyn ChunkPool>> {
        self.payload_pool.lock().clone()
    }

    /// Retain `chunk` for late joiners, evicting the oldest when full.
    pub(crate) fn retain_in_history(&self, chunk: SharedChunk) {
        let capacity = self.history_capacity();
        if capacity == 0 {
            chunk.release();
            return;
        }

        let mut history = self.history.lock();
        while history.len() >= capacity {
            match history.pop_front() {
                Some(evicted) => evicted.release(),
                None => break,
            }
        }
        if let Err(rejected) = history.push_back(chunk) {
            rejected.release();
        }
    }

    /// New references to the `count` most recent retained chunks, oldest first.
    pub(crate) fn recent_history(&self, count: usize) -> Vec<SharedChunk> {
        let history = self.history.lock();
        let skip = history.len().saturating_sub(count);
        history.iter().skip(skip).map(SharedChunk::share).collect()
    }

    #[must_use]
    pub fn retained_chunks(&self) -> usize {
        self.history.lock().len()
    }

    pub(crate) fn release_history(&self) {
        let mut history = self.history.lock();
        while let Some(chunk) = history.pop_front() {
            chunk.release();
        }
    }

    /// Drop every resource held by the record before its slot is freed.
    pub(crate) fn release_resources(&self) {
        self.subscribers.lock().clear();
        self.release_history();
        self.payload_pool.lock().take();
    }
}
