// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Event variable: a condition variable with per-index activation flags.

use super::condition_variable::Signal;
use crate::config::MAX_NUMBER_OF_EVENTS_PER_LISTENER;
use crate::error::ErrorKind;
use crate::pool::Handle;
use crate::ports::{Ownership, RegistryContext};
use std::sync::atomic::{AtomicBool, Ordering};

/// Registry record of an event variable.
#[derive(Debug)]
pub struct EventVariableData {
    pub(crate) owner: Ownership,
    pub(crate) signal: Signal,
    active: [AtomicBool; MAX_NUMBER_OF_EVENTS_PER_LISTENER],
}

impl Default for EventVariableData {
    fn default() -> Self {
        Self {
            owner: Ownership::default(),
            signal: Signal::default(),
            active: std::array::from_fn(|_| AtomicBool::new(false)),
        }
    }
}

impl EventVariableData {
    pub(crate) fn reset(&self, process_name: &str) {
        self.owner.reset(process_name);
        self.signal.clear();
        for flag in &self.active {
            flag.store(false, Ordering::Release);
        }
    }

    #[must_use]
    pub fn owner(&self) -> &Ownership {
        &self.owner
    }

    /// Activate `index` and wake the listener. Out-of-range indices are ignored.
    pub fn notify(&self, index: usize) -> bool {
        let Some(flag) = self.active.get(index) else {
            return false;
        };
        flag.store(true, Ordering::Release);
        self.signal.notify();
        true
    }

    /// Collect and clear every active index, lowest first.
    pub fn take_notifications(&self) -> Vec<usize> {
        self.signal.reset();
        self.active
            .iter()
            .enumerate()
            .filter(|(_, flag)| flag.swap(false, Ordering::AcqRel))
            .map(|(index, _)| index)
            .collect()
    }
}

/// Notifies one index of an event variable.
#[derive(Debug, Clone)]
pub struct EventNotifier {
    context: RegistryContext,
    handle: Handle<EventVariableData>,
    index: usize,
}

impl EventNotifier {
    #[must_use]
    pub fn new(context: RegistryContext, handle: Handle<EventVariableData>, index: usize) -> Self {
        Self {
            context,
            handle,
            index,
        }
    }

    pub fn notify(&self) {
        let Some(data) = self.context.resolve(
            &self.context.pool.event_variables,
            self.handle,
            ErrorKind::PortUsedAfterDestruction("event variable"),
        ) else {
            return;
        };
        if !data.notify(self.index) {
            log::warn!(
                "[sync] event index {} out of range (max {})",
                self.index,
                MAX_NUMBER_OF_EVENTS_PER_LISTENER
            );
        }
    }
}

/// Listening side of an event variable.
#[derive(Debug)]
pub struct EventListener {
    context: RegistryContext,
    handle: Handle<EventVariableData>,
}

impl EventListener {
    #[must_use]
    pub fn new(context: RegistryContext, handle: Handle<EventVariableData>) -> Self {
        Self { context, handle }
    }

    #[must_use]
    pub fn was_notified(&self) -> bool {
        self.data().is_some_and(|data| data.signal.was_notified())
    }

    /// Indices notified since the last call.
    pub fn take_notifications(&self) -> Vec<usize> {
        self.data()
            .map(EventVariableData::take_notifications)
            .unwrap_or_default()
    }

    pub fn destroy(&self) {
        if let Some(data) = self.context.pool.event_variables.get(self.handle) {
            data.owner.mark_to_be_destroyed();
        }
    }

    fn data(&self) -> Option<&EventVariableData> {
        self.context.resolve(
            &self.context.pool.event_variables,
            self.handle,
            ErrorKind::PortUsedAfterDestruction("event variable"),
        )
    }
}

impl Drop for EventListener {
    fn drop(&mut self) {
        self.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notify_and_take_notifications() {
        let data = EventVariableData::default();
        assert!(data.notify(3));
        assert!(data.notify(0));
        assert!(data.notify(3));
        assert!(!data.notify(MAX_NUMBER_OF_EVENTS_PER_LISTENER));

        assert!(data.signal.was_notified());
        assert_eq!(data.take_notifications(), vec![0, 3]);
        assert!(!data.signal.was_notified());
        assert!(data.take_notifications().is_empty());
    }
}
