// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! WaitSet - collects subscriber events behind one condition variable
//!
//! Each wait-set owns a condition variable entry in the registry. Attaching a
//! subscriber stores that entry's handle in the subscriber port, so a publisher
//! in another process notifies it on delivery. Blocking on the condition
//! variable is left to an external waiter; [`WaitSet::try_wait`] polls.
//!
//! Teardown order matters: every member's port reference is cleared before the
//! condition variable is flagged for destruction, so no port ever points at a
//! purged condition variable.

use super::base_subscriber::BaseSubscriber;
use super::subscriber_port::SubscriberPort;
use crate::config::MAX_NUMBER_OF_ATTACHMENTS_PER_WAITSET;
use crate::error::{PortPoolError, WaitSetError};
use crate::pool::Handle;
use crate::roudi::PortManager;
use crate::sync::{ConditionListener, ConditionVariableData};
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Subscriber event a wait-set can watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubscriberEvent {
    /// At least one chunk is queued.
    HasData,
}

impl SubscriberEvent {
    fn holds(self, port: &dyn SubscriberPort) -> bool {
        match self {
            Self::HasData => port.has_new_chunks(),
        }
    }
}

/// Identifies one attachment of a wait-set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TriggerId(u64);

impl fmt::Display for TriggerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "trigger#{}", self.0)
    }
}

/// Attachment whose event currently holds, as returned by [`WaitSet::try_wait`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerInfo {
    pub id: TriggerId,
    pub event: SubscriberEvent,
}

struct Attachment {
    id: TriggerId,
    event: SubscriberEvent,
    port: Weak<dyn SubscriberPort>,
}

pub(crate) struct WaitSetShared {
    condition: ConditionListener,
    attachments: Mutex<heapless::Vec<Attachment, MAX_NUMBER_OF_ATTACHMENTS_PER_WAITSET>>,
    next_trigger_id: AtomicU64,
}

impl WaitSetShared {
    pub(crate) fn condition_variable(&self) -> Handle<ConditionVariableData> {
        self.condition.handle()
    }

    pub(crate) fn is_condition_variable_live(&self) -> bool {
        self.condition.is_live()
    }

    pub(crate) fn add(
        &self,
        event: SubscriberEvent,
        port: Weak<dyn SubscriberPort>,
    ) -> Result<TriggerId, WaitSetError> {
        let mut attachments = self.attachments.lock();
        let id = TriggerId(self.next_trigger_id.fetch_add(1, Ordering::Relaxed));
        attachments
            .push(Attachment { id, event, port })
            .map_err(|_| WaitSetError::WaitSetFull)?;
        Ok(id)
    }

    pub(crate) fn remove(&self, id: TriggerId) -> bool {
        let mut attachments = self.attachments.lock();
        match attachments.iter().position(|a| a.id == id) {
            Some(index) => {
                attachments.swap_remove(index);
                true
            }
            None => false,
        }
    }
}

/// Collector of subscriber events.
pub struct WaitSet {
    pub(crate) shared: Arc<WaitSetShared>,
}

impl WaitSet {
    /// Acquire a condition variable for `process_name` and build a wait-set on it.
    pub fn new(manager: &PortManager, process_name: &str) -> Result<Self, PortPoolError> {
        let handle = manager.acquire_condition_variable_data(process_name)?;
        Ok(Self::from_listener(ConditionListener::new(
            manager.context(),
            handle,
        )))
    }

    /// Build a wait-set on an already acquired condition variable.
    #[must_use]
    pub fn from_listener(condition: ConditionListener) -> Self {
        Self {
            shared: Arc::new(WaitSetShared {
                condition,
                attachments: Mutex::new(heapless::Vec::new()),
                next_trigger_id: AtomicU64::new(0),
            }),
        }
    }

    /// Attach `event` of `subscriber`, leaving any wait-set it was attached to.
    pub fn attach_event<P>(
        &self,
        subscriber: &BaseSubscriber<P>,
        event: SubscriberEvent,
    ) -> Result<TriggerId, WaitSetError>
    where
        P: SubscriberPort + 'static,
    {
        subscriber.enable_event(self, event)
    }

    /// Detach `event` of `subscriber`. No-op if it is attached elsewhere or not at all.
    pub fn detach_event<P>(&self, subscriber: &BaseSubscriber<P>, event: SubscriberEvent)
    where
        P: SubscriberPort,
    {
        if subscriber.is_attached_to(self) {
            subscriber.disable_event(event);
        }
    }

    /// Number of current attachments.
    #[must_use]
    pub fn size(&self) -> usize {
        self.shared.attachments.lock().len()
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        MAX_NUMBER_OF_ATTACHMENTS_PER_WAITSET
    }

    #[must_use]
    pub fn condition_variable(&self) -> Handle<ConditionVariableData> {
        self.shared.condition_variable()
    }

    #[must_use]
    pub fn was_notified(&self) -> bool {
        self.shared.condition.was_notified()
    }

    /// Consume the pending notification and report every attachment whose
    /// event currently holds. Never blocks.
    pub fn try_wait(&self) -> Vec<TriggerInfo> {
        self.shared.condition.reset();
        let attachments = self.shared.attachments.lock();
        attachments
            .iter()
            .filter(|a| a.port.upgrade().is_some_and(|port| a.event.holds(&*port)))
            .map(|a| TriggerInfo {
                id: a.id,
                event: a.event,
            })
            .collect()
    }
}

impl Drop for WaitSet {
    fn drop(&mut self) {
        let attachments = std::mem::take(&mut *self.shared.attachments.lock());
        let detached = attachments.len();
        for attachment in attachments {
            if let Some(port) = attachment.port.upgrade() {
                port.unset_condition_variable();
            }
        }
        self.shared.condition.destroy();
        log::debug!(
            "[popo] wait-set dropped, {} attachment(s) detached",
            detached
        );
    }
}

impl fmt::Debug for WaitSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaitSet")
            .field("condition_variable", &self.condition_variable())
            .field("size", &self.size())
            .finish()
    }
}
