// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fields shared by every registry record, and the context facades resolve through.

use crate::capro::ServiceDescription;
use crate::config::PortConfigInfo;
use crate::error::{ErrorHandler, ErrorKind, Severity};
use crate::names::{truncated, NodeName, ProcessName};
use crate::pool::{FixedPool, Handle};
use crate::roudi::PortPool;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Owning process and destruction flag, carried by every record kind.
#[derive(Debug, Default)]
pub struct Ownership {
    process_name: RwLock<ProcessName>,
    to_be_destroyed: AtomicBool,
}

impl Ownership {
    pub(crate) fn reset(&self, process_name: &str) {
        *self.process_name.write() = truncated(process_name);
        self.to_be_destroyed.store(false, Ordering::Release);
    }

    #[must_use]
    pub fn process_name(&self) -> ProcessName {
        self.process_name.read().clone()
    }

    #[must_use]
    pub fn belongs_to(&self, process_name: &str) -> bool {
        let wanted: ProcessName = truncated(process_name);
        self.process_name.read().as_str() == wanted.as_str()
    }

    /// Flag for purge by the next discovery pass. Idempotent.
    pub fn mark_to_be_destroyed(&self) {
        self.to_be_destroyed.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_to_be_destroyed(&self) -> bool {
        self.to_be_destroyed.load(Ordering::Acquire)
    }
}

/// Header of publisher and subscriber records.
#[derive(Debug, Default)]
pub struct PortHeader {
    pub(crate) owner: Ownership,
    service: RwLock<ServiceDescription>,
    node_name: RwLock<NodeName>,
    unique_id: AtomicU64,
    config: RwLock<PortConfigInfo>,
}

impl PortHeader {
    pub(crate) fn reset(
        &self,
        process_name: &str,
        service: ServiceDescription,
        node_name: &str,
        unique_id: u64,
        config: PortConfigInfo,
    ) {
        self.owner.reset(process_name);
        *self.service.write() = service;
        *self.node_name.write() = truncated(node_name);
        self.unique_id.store(unique_id, Ordering::Release);
        *self.config.write() = config;
    }

    #[must_use]
    pub fn owner(&self) -> &Ownership {
        &self.owner
    }

    #[must_use]
    pub fn service(&self) -> ServiceDescription {
        *self.service.read()
    }

    #[must_use]
    pub fn node_name(&self) -> NodeName {
        self.node_name.read().clone()
    }

    /// Registry-wide unique id, never reused.
    #[must_use]
    pub fn unique_id(&self) -> u64 {
        self.unique_id.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn port_config(&self) -> PortConfigInfo {
        *self.config.read()
    }
}

/// What a facade needs to reach its record: the mapped registry and the
/// process-local error handler.
#[derive(Clone, Debug)]
pub struct RegistryContext {
    pub(crate) pool: Arc<PortPool>,
    pub(crate) errors: Arc<ErrorHandler>,
}

impl RegistryContext {
    #[must_use]
    pub fn new(pool: Arc<PortPool>, errors: Arc<ErrorHandler>) -> Self {
        Self { pool, errors }
    }

    #[must_use]
    pub fn pool(&self) -> &Arc<PortPool> {
        &self.pool
    }

    /// Resolve `handle`, reporting `stale` when the entry was purged.
    pub(crate) fn resolve<'a, T, const N: usize>(
        &self,
        pool: &'a FixedPool<T, N>,
        handle: Handle<T>,
        stale: ErrorKind,
    ) -> Option<&'a T> {
        let record = pool.get(handle);
        if record.is_none() {
            self.errors.report(stale, None, Severity::Fatal);
        }
        record
    }
}
