// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Reference-counted set of offered service descriptions.

use crate::capro::ServiceDescription;
use crate::config::MAX_SERVICE_REGISTRY_ENTRIES;
use parking_lot::RwLock;

#[derive(Debug, Clone, Copy)]
struct Entry {
    service: ServiceDescription,
    publishers: u32,
}

/// Offered services with the number of publishers offering each.
#[derive(Debug, Default)]
pub struct ServiceRegistry {
    entries: RwLock<heapless::Vec<Entry, MAX_SERVICE_REGISTRY_ENTRIES>>,
}

impl ServiceRegistry {
    /// Count one more publisher offering `service`.
    pub(crate) fn add(&self, service: ServiceDescription) {
        let mut entries = self.entries.write();
        if let Some(entry) = entries.iter_mut().find(|e| e.service == service) {
            entry.publishers += 1;
            return;
        }
        if entries
            .push(Entry {
                service,
                publishers: 1,
            })
            .is_err()
        {
            log::warn!("[roudi] service registry full, {} not tracked", service);
        }
    }

    /// Count one publisher fewer; the entry disappears with its last publisher.
    pub(crate) fn remove(&self, service: ServiceDescription) {
        let mut entries = self.entries.write();
        let Some(index) = entries.iter().position(|e| e.service == service) else {
            return;
        };
        entries[index].publishers = entries[index].publishers.saturating_sub(1);
        if entries[index].publishers == 0 {
            entries.swap_remove(index);
        }
    }

    /// Offered descriptions matching a (possibly wildcard) query.
    #[must_use]
    pub fn find(&self, query: &ServiceDescription) -> Vec<ServiceDescription> {
        let mut found: Vec<_> = self
            .entries
            .read()
            .iter()
            .filter(|e| query.matches(&e.service))
            .map(|e| e.service)
            .collect();
        found.sort_unstable();
        found
    }

    /// Number of publishers currently offering exactly `service`.
    #[must_use]
    pub fn publisher_count(&self, service: &ServiceDescription) -> u32 {
        self.entries
            .read()
            .iter()
            .find(|e| e.service == *service)
            .map_or(0, |e| e.publishers)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
