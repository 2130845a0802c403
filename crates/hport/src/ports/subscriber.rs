// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Subscriber port record and its subscription state machine.
//!
//! ```text
//! NotSubscribed        --subscribe()-->          SubscribeRequested
//! SubscribeRequested   --discovery: match-->     Subscribed
//! SubscribeRequested   --discovery: no match-->  WaitForOffer
//! WaitForOffer         --discovery: match-->     Subscribed
//! Subscribed           --discovery: publisher gone-->  WaitForOffer
//! Subscribed           --unsubscribe()-->        UnsubscribeRequested
//! UnsubscribeRequested --discovery: disconnect--> NotSubscribed
//! ```
//!
//! The owner and discovery both move the state, so every transition after
//! `reset` is a compare-and-swap from the state the writer observed. A loser
//! leaves the state alone and the next pass reconciles it with the intent.

use super::base::PortHeader;
use super::publisher::PublisherPortData;
use crate::capro::ServiceDescription;
use crate::config::{PortConfigInfo, MAX_PUBLISHERS_PER_SUBSCRIBER, MAX_SUBSCRIBER_QUEUE_CAPACITY};
use crate::error::ChunkReceiveError;
use crate::mepoo::SharedChunk;
use crate::pool::{AtomicHandle, Handle};
use crate::sync::ConditionVariableData;
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, AtomicUsize, Ordering};

/// Creation options of a subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriberOptions {
    /// Delivery queue capacity (clamped to `1..=MAX_SUBSCRIBER_QUEUE_CAPACITY`).
    pub queue_capacity: usize,
    /// Number of retained samples requested on connection.
    pub history_request: usize,
    pub node_name: String,
    /// Request the subscription right away.
    pub subscribe_on_create: bool,
}

impl Default for SubscriberOptions {
    fn default() -> Self {
        Self {
            queue_capacity: MAX_SUBSCRIBER_QUEUE_CAPACITY,
            history_request: 0,
            node_name: String::new(),
            subscribe_on_create: true,
        }
    }
}

/// Subscription state, advanced by the owner (requests) and discovery (outcomes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum SubscribeState {
    #[default]
    NotSubscribed = 0,
    SubscribeRequested = 1,
    Subscribed = 2,
    UnsubscribeRequested = 3,
    WaitForOffer = 4,
}

impl SubscribeState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::SubscribeRequested,
            2 => Self::Subscribed,
            3 => Self::UnsubscribeRequested,
            4 => Self::WaitForOffer,
            _ => Self::NotSubscribed,
        }
    }
}

impl fmt::Display for SubscribeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotSubscribed => "NOT_SUBSCRIBED",
            Self::SubscribeRequested => "SUBSCRIBE_REQUESTED",
            Self::Subscribed => "SUBSCRIBED",
            Self::UnsubscribeRequested => "UNSUBSCRIBE_REQUESTED",
            Self::WaitForOffer => "WAIT_FOR_OFFER",
        };
        f.write_str(name)
    }
}

pub(crate) type PublisherList = heapless::Vec<Handle<PublisherPortData>, MAX_PUBLISHERS_PER_SUBSCRIBER>;

/// Registry record of a subscriber port.
#[derive(Default)]
pub struct SubscriberPortData {
    pub(crate) header: PortHeader,
    queue_capacity: AtomicUsize,
    history_request: AtomicUsize,
    subscribe_requested: AtomicBool,
    state: AtomicU8,
    pub(crate) publishers: Mutex<PublisherList>,
    /// Weak reference set by wait-set attachment; never ownership.
    pub(crate) condition_variable: AtomicHandle<ConditionVariableData>,
    queue: Mutex<heapless::Deque<SharedChunk, MAX_SUBSCRIBER_QUEUE_CAPACITY>>,
    lost_chunks: AtomicBool,
    chunks_held: AtomicU32,
}

impl SubscriberPortData {
    pub(crate) fn reset(
        &self,
        process_name: &str,
        service: ServiceDescription,
        options: &SubscriberOptions,
        unique_id: u64,
        config: PortConfigInfo,
    ) {
        self.header
            .reset(process_name, service, &options.node_name, unique_id, config);
        self.queue_capacity.store(
            options.queue_capacity.clamp(1, MAX_SUBSCRIBER_QUEUE_CAPACITY),
            Ordering::Release,
        );
        self.history_request
            .store(options.history_request, Ordering::Release);
        self.subscribe_requested.store(false, Ordering::Release);
        self.set_state(SubscribeState::NotSubscribed);
        self.publishers.lock().clear();
        self.condition_variable.store(None);
        self.release_queued_chunks();
        self.lost_chunks.store(false, Ordering::Release);
        self.chunks_held.store(0, Ordering::Release);
    }

    #[must_use]
    pub fn header(&self) -> &PortHeader {
        &self.header
    }

    #[must_use]
    pub fn state(&self) -> SubscribeState {
        SubscribeState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub(crate) fn set_state(&self, state: SubscribeState) {
        self.state.store(state as u8, Ordering::Release);
    }

    /// Move from `from` to `to`. Returns `false` if another writer got there first.
    pub(crate) fn transition(&self, from: SubscribeState, to: SubscribeState) -> bool {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    #[must_use]
    pub fn is_subscribe_requested(&self) -> bool {
        self.subscribe_requested.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn history_request(&self) -> usize {
        self.history_request.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity.load(Ordering::Acquire)
    }

    /// Owner request: express subscribe intent.
    pub(crate) fn request_subscribe(&self) {
        self.subscribe_requested.store(true, Ordering::Release);
        let _ = self.state.compare_exchange(
            SubscribeState::NotSubscribed as u8,
            SubscribeState::SubscribeRequested as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    /// Owner request: withdraw subscribe intent.
    pub(crate) fn request_unsubscribe(&self) {
        self.subscribe_requested.store(false, Ordering::Release);
        let _ = self
            .state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                match SubscribeState::from_u8(current) {
                    // Never connected, nothing for discovery to tear down
                    SubscribeState::SubscribeRequested => {
                        Some(SubscribeState::NotSubscribed as u8)
                    }
                    SubscribeState::Subscribed | SubscribeState::WaitForOffer => {
                        Some(SubscribeState::UnsubscribeRequested as u8)
                    }
                    SubscribeState::NotSubscribed | SubscribeState::UnsubscribeRequested => None,
                }
            });
    }

    /// Snapshot of the connected publishers.
    #[must_use]
    pub fn connected_publishers(&self) -> PublisherList {
        self.publishers.lock().clone()
    }

    /// Current wait-set condition variable, if attached.
    #[must_use]
    pub fn condition_variable(&self) -> Option<Handle<ConditionVariableData>> {
        self.condition_variable.load()
    }

    /// Enqueue a chunk; a full queue drops its oldest entry and records the loss.
    pub(crate) fn deliver(&self, chunk: SharedChunk) {
        let capacity = self.queue_capacity().max(1);
        let mut queue = self.queue.lock();
        while queue.len() >= capacity {
            match queue.pop_front() {
                Some(dropped) => {
                    dropped.release();
                    self.lost_chunks.store(true, Ordering::Release);
                }
                None => break,
            }
        }
        if let Err(rejected) = queue.push_back(chunk) {
            rejected.release();
            self.lost_chunks.store(true, Ordering::Release);
        }
    }

    #[must_use]
    pub fn has_new_chunks(&self) -> bool {
        !self.queue.lock().is_empty()
    }

    #[must_use]
    pub fn queued_chunks(&self) -> usize {
        self.queue.lock().len()
    }

    pub(crate) fn try_take(&self, max_held: u32) -> Result<SharedChunk, ChunkReceiveError> {
        let mut queue = self.queue.lock();
        if queue.is_empty() {
            return Err(ChunkReceiveError::NoChunkAvailable);
        }
        if self.chunks_held.load(Ordering::Acquire) >= max_held {
            return Err(ChunkReceiveError::TooManyChunksHeldInParallel);
        }
        let chunk = queue
            .pop_front()
            .ok_or(ChunkReceiveError::NoChunkAvailable)?;
        self.chunks_held.fetch_add(1, Ordering::AcqRel);
        Ok(chunk)
    }

    pub(crate) fn release_held(&self, chunk: SharedChunk) {
        let _ = self
            .chunks_held
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |held| held.checked_sub(1));
        chunk.release();
    }

    #[must_use]
    pub fn chunks_held(&self) -> u32 {
        self.chunks_held.load(Ordering::Acquire)
    }

    pub(crate) fn release_queued_chunks(&self) {
        let mut queue = self.queue.lock();
        while let Some(chunk) = queue.pop_front() {
            chunk.release();
        }
    }

    /// Whether chunks were dropped since the previous call.
    pub(crate) fn take_lost_chunks(&self) -> bool {
        self.lost_chunks.swap(false, Ordering::AcqRel)
    }

    pub(crate) fn release_resources(&self) {
        self.publishers.lock().clear();
        self.condition_variable.store(None);
        self.release_queued_chunks();
    }
}
