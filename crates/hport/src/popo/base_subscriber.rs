// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Subscriber facade with wait-set attachment.

use super::subscriber_port::SubscriberPort;
use super::wait_set::{SubscriberEvent, TriggerId, WaitSet, WaitSetShared};
use crate::capro::ServiceDescription;
use crate::error::{ChunkReceiveError, WaitSetError};
use crate::mepoo::SharedChunk;
use crate::ports::SubscribeState;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};

struct Trigger {
    waitset: Weak<WaitSetShared>,
    id: TriggerId,
    event: SubscriberEvent,
}

/// Forwards to a [`SubscriberPort`] and manages its attachment to at most one
/// [`WaitSet`]. The port is destroyed when the subscriber is dropped.
pub struct BaseSubscriber<P: SubscriberPort> {
    port: Arc<P>,
    trigger: Mutex<Option<Trigger>>,
}

impl<P: SubscriberPort> BaseSubscriber<P> {
    #[must_use]
    pub fn new(port: P) -> Self {
        Self::with_shared_port(Arc::new(port))
    }

    /// Wrap a port the caller keeps a reference to.
    #[must_use]
    pub fn with_shared_port(port: Arc<P>) -> Self {
        Self {
            port,
            trigger: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn port(&self) -> &P {
        &self.port
    }

    pub fn subscribe(&self) {
        self.port.subscribe();
    }

    pub fn unsubscribe(&self) {
        self.port.unsubscribe();
    }

    #[must_use]
    pub fn subscription_state(&self) -> SubscribeState {
        self.port.subscription_state()
    }

    #[must_use]
    pub fn has_data(&self) -> bool {
        self.port.has_new_chunks()
    }

    pub fn take_chunk(&self) -> Result<SharedChunk, ChunkReceiveError> {
        self.port.try_get_chunk()
    }

    pub fn release_chunk(&self, chunk: SharedChunk) {
        self.port.release_chunk(chunk);
    }

    pub fn release_queued_data(&self) {
        self.port.release_queued_chunks();
    }

    #[must_use]
    pub fn service_description(&self) -> ServiceDescription {
        self.port.service_description()
    }

    #[must_use]
    pub fn has_missed_data(&self) -> bool {
        self.port.has_lost_chunks_since_last_call()
    }

    /// `true` while attached to a live wait-set.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.trigger
            .lock()
            .as_ref()
            .is_some_and(|t| t.waitset.strong_count() > 0)
    }

    pub(crate) fn is_attached_to(&self, waitset: &WaitSet) -> bool {
        self.trigger
            .lock()
            .as_ref()
            .and_then(|t| t.waitset.upgrade())
            .is_some_and(|shared| Arc::ptr_eq(&shared, &waitset.shared))
    }

    /// Clear the port's condition variable reference and leave the wait-set.
    ///
    /// No-op when detached or attached for another event. If the wait-set is
    /// already gone, its teardown cleared the reference and only the local
    /// trigger is dropped.
    pub fn disable_event(&self, event: SubscriberEvent) {
        let mut slot = self.trigger.lock();
        if slot.as_ref().map_or(true, |t| t.event != event) {
            return;
        }
        let Some(trigger) = slot.take() else {
            return;
        };

        if let Some(waitset) = trigger.waitset.upgrade() {
            self.port.unset_condition_variable();
            waitset.remove(trigger.id);
            log::debug!("[popo] {} detached", trigger.id);
        }
    }
}

impl<P: SubscriberPort + 'static> BaseSubscriber<P> {
    /// Attach `event` to `waitset`.
    ///
    /// A subscriber attached elsewhere joins the new wait-set before leaving the
    /// old one, so a rejected attach (`WaitSetFull`) keeps the existing
    /// attachment intact. The port's reference is then replaced by a single
    /// `set_condition_variable`. Attaching twice to the same wait-set is rejected.
    pub fn enable_event(
        &self,
        waitset: &WaitSet,
        event: SubscriberEvent,
    ) -> Result<TriggerId, WaitSetError> {
        let mut slot = self.trigger.lock();

        let previous = slot
            .as_ref()
            .and_then(|t| t.waitset.upgrade().map(|shared| (shared, t.id)));
        if let Some((shared, _)) = &previous {
            if Arc::ptr_eq(shared, &waitset.shared) {
                return Err(WaitSetError::AlreadyAttached);
            }
        }
        if !waitset.shared.is_condition_variable_live() {
            return Err(WaitSetError::ConditionVariableDestroyed);
        }

        let port = Arc::clone(&self.port) as Arc<dyn SubscriberPort>;
        let port: Weak<dyn SubscriberPort> = Arc::downgrade(&port);
        let id = waitset.shared.add(event, port)?;

        if let Some((old, old_id)) = previous {
            old.remove(old_id);
            log::debug!("[popo] {} left previous wait-set", old_id);
        }

        self.port
            .set_condition_variable(waitset.shared.condition_variable());
        *slot = Some(Trigger {
            waitset: Arc::downgrade(&waitset.shared),
            id,
            event,
        });
        log::debug!("[popo] {} attached for {:?}", id, event);
        Ok(id)
    }
}

impl<P: SubscriberPort> Drop for BaseSubscriber<P> {
    fn drop(&mut self) {
        let event = self.trigger.lock().as_ref().map(|t| t.event);
        if let Some(event) = event {
            self.disable_event(event);
        }
        self.port.destroy();
    }
}
