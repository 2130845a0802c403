// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Cross-process condition variable record and its facades.
//!
//! The record only carries the notification state. Blocking on it is the job of
//! an external waiter; [`WaitSet`](crate::popo::WaitSet) polls it.

use crate::error::ErrorKind;
use crate::pool::Handle;
use crate::ports::{Ownership, RegistryContext};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Notified flag plus a monotonic notification counter.
#[derive(Debug, Default)]
pub struct Signal {
    notified: AtomicBool,
    count: AtomicU64,
}

impl Signal {
    pub(crate) fn clear(&self) {
        self.notified.store(false, Ordering::Release);
        self.count.store(0, Ordering::Release);
    }

    pub fn notify(&self) {
        self.count.fetch_add(1, Ordering::AcqRel);
        self.notified.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn was_notified(&self) -> bool {
        self.notified.load(Ordering::Acquire)
    }

    /// Consume the pending notification. Returns whether one was pending.
    pub fn reset(&self) -> bool {
        self.notified.swap(false, Ordering::AcqRel)
    }

    #[must_use]
    pub fn notification_count(&self) -> u64 {
        self.count.load(Ordering::Acquire)
    }
}

/// Registry record of a condition variable.
#[derive(Debug, Default)]
pub struct ConditionVariableData {
    pub(crate) owner: Ownership,
    pub(crate) signal: Signal,
}

impl ConditionVariableData {
    pub(crate) fn reset(&self, process_name: &str) {
        self.owner.reset(process_name);
        self.signal.clear();
    }

    #[must_use]
    pub fn owner(&self) -> &Ownership {
        &self.owner
    }

    #[must_use]
    pub fn signal(&self) -> &Signal {
        &self.signal
    }
}

/// Notifying side of a condition variable.
#[derive(Debug, Clone)]
pub struct ConditionNotifier {
    context: RegistryContext,
    handle: Handle<ConditionVariableData>,
}

impl ConditionNotifier {
    #[must_use]
    pub fn new(context: RegistryContext, handle: Handle<ConditionVariableData>) -> Self {
        Self { context, handle }
    }

    pub fn notify(&self) {
        if let Some(data) = self.context.resolve(
            &self.context.pool.condition_variables,
            self.handle,
            ErrorKind::ConditionVariableUsedAfterDestruction,
        ) {
            data.signal.notify();
        }
    }
}

/// Waiting side of a condition variable.
#[derive(Debug)]
pub struct ConditionListener {
    context: RegistryContext,
    handle: Handle<ConditionVariableData>,
}

impl ConditionListener {
    #[must_use]
    pub fn new(context: RegistryContext, handle: Handle<ConditionVariableData>) -> Self {
        Self { context, handle }
    }

    #[must_use]
    pub fn handle(&self) -> Handle<ConditionVariableData> {
        self.handle
    }

    /// `false` once the record was purged.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.context.pool.condition_variables.is_live(self.handle)
    }

    #[must_use]
    pub fn was_notified(&self) -> bool {
        self.data().is_some_and(|data| data.signal.was_notified())
    }

    /// Consume the pending notification.
    pub fn reset(&self) -> bool {
        self.data().is_some_and(|data| data.signal.reset())
    }

    /// Flag the record for purge. Silent if it is already gone.
    pub fn destroy(&self) {
        if let Some(data) = self.context.pool.condition_variables.get(self.handle) {
            data.owner.mark_to_be_destroyed();
        }
    }

    fn data(&self) -> Option<&ConditionVariableData> {
        self.context.resolve(
            &self.context.pool.condition_variables,
            self.handle,
            ErrorKind::ConditionVariableUsedAfterDestruction,
        )
    }
}
