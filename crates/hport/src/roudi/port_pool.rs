// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! The registry: one fixed-capacity pool per record kind.
//!
//! A `PortPool` models the mapped management segment. Every participating
//! process reaches it through an `Arc`; records are addressed by
//! [`Handle`](crate::pool::Handle)s, never by pointers.

use super::service_registry::ServiceRegistry;
use crate::config::{
    RouDiConfig, MAX_INTERFACE_NUMBER, MAX_NODE_NUMBER, MAX_NUMBER_OF_CONDITION_VARIABLES,
    MAX_NUMBER_OF_EVENT_VARIABLES, MAX_PROCESS_NUMBER, MAX_PUBLISHERS, MAX_SUBSCRIBERS,
};
use crate::pool::FixedPool;
use crate::ports::{
    ApplicationPortData, InterfacePortData, NodeData, PublisherPortData, SubscriberPortData,
};
use crate::sync::{ConditionVariableData, EventVariableData};
use std::fmt;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

/// All registry pools plus the service registry and its change counter.
pub struct PortPool {
    pub(crate) publishers: FixedPool<PublisherPortData, MAX_PUBLISHERS>,
    pub(crate) subscribers: FixedPool<SubscriberPortData, MAX_SUBSCRIBERS>,
    pub(crate) interfaces: FixedPool<InterfacePortData, MAX_INTERFACE_NUMBER>,
    pub(crate) applications: FixedPool<ApplicationPortData, MAX_PROCESS_NUMBER>,
    pub(crate) nodes: FixedPool<NodeData, MAX_NODE_NUMBER>,
    pub(crate) condition_variables: FixedPool<ConditionVariableData, MAX_NUMBER_OF_CONDITION_VARIABLES>,
    pub(crate) event_variables: FixedPool<EventVariableData, MAX_NUMBER_OF_EVENT_VARIABLES>,
    pub(crate) service_registry: ServiceRegistry,
    change_counter: AtomicU64,
    next_unique_id: AtomicU64,
    max_chunks_held_per_subscriber: AtomicU32,
}

impl PortPool {
    /// Reserve every pool at full capacity.
    #[must_use]
    pub fn new(config: &RouDiConfig) -> Self {
        Self {
            publishers: FixedPool::new(),
            subscribers: FixedPool::new(),
            interfaces: FixedPool::new(),
            applications: FixedPool::new(),
            nodes: FixedPool::new(),
            condition_variables: FixedPool::new(),
            event_variables: FixedPool::new(),
            service_registry: ServiceRegistry::default(),
            change_counter: AtomicU64::new(0),
            next_unique_id: AtomicU64::new(1),
            max_chunks_held_per_subscriber: AtomicU32::new(
                config.max_chunks_held_per_subscriber(),
            ),
        }
    }

    pub(crate) fn next_unique_id(&self) -> u64 {
        self.next_unique_id.fetch_add(1, Ordering::Relaxed)
    }

    #[must_use]
    pub fn max_chunks_held_per_subscriber(&self) -> u32 {
        self.max_chunks_held_per_subscriber.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn service_registry(&self) -> &ServiceRegistry {
        &self.service_registry
    }

    #[must_use]
    pub fn service_registry_change_counter(&self) -> u64 {
        self.change_counter.load(Ordering::Acquire)
    }

    pub(crate) fn bump_change_counter(&self) {
        self.change_counter.fetch_add(1, Ordering::AcqRel);
    }

    #[must_use]
    pub fn publishers(&self) -> &FixedPool<PublisherPortData, MAX_PUBLISHERS> {
        &self.publishers
    }

    #[must_use]
    pub fn subscribers(&self) -> &FixedPool<SubscriberPortData, MAX_SUBSCRIBERS> {
        &self.subscribers
    }

    #[must_use]
    pub fn interfaces(&self) -> &FixedPool<InterfacePortData, MAX_INTERFACE_NUMBER> {
        &self.interfaces
    }

    #[must_use]
    pub fn applications(&self) -> &FixedPool<ApplicationPortData, MAX_PROCESS_NUMBER> {
        &self.applications
    }

    #[must_use]
    pub fn nodes(&self) -> &FixedPool<NodeData, MAX_NODE_NUMBER> {
        &self.nodes
    }

    #[must_use]
    pub fn condition_variables(
        &self,
    ) -> &FixedPool<ConditionVariableData, MAX_NUMBER_OF_CONDITION_VARIABLES> {
        &self.condition_variables
    }

    #[must_use]
    pub fn event_variables(&self) -> &FixedPool<EventVariableData, MAX_NUMBER_OF_EVENT_VARIABLES> {
        &self.event_variables
    }
}

impl fmt::Debug for PortPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PortPool")
            .field("publishers", &self.publishers.len())
            .field("subscribers", &self.subscribers.len())
            .field("interfaces", &self.interfaces.len())
            .field("applications", &self.applications.len())
            .field("nodes", &self.nodes.len())
            .field("condition_variables", &self.condition_variables.len())
            .field("event_variables", &self.event_variables.len())
            .field("change_counter", &self.service_registry_change_counter())
            .finish()
    }
}
