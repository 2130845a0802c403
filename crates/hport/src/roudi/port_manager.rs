// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Port Manager - owns the registry, hands out entries, runs discovery.
//!
//! Acquisition never blocks: the first free slot is claimed or the kind's
//! exhaustion error is reported to the [`ErrorHandler`] (as
//! [`Severity::Fatal`]) and then returned. Deletion only flags entries; the
//! next [`PortManager::do_discovery`] purges them and frees their capacity.

use super::discovery::Discovery;
use super::port_pool::PortPool;
use crate::capro::{CaproMessage, ServiceDescription};
use crate::config::{ConfigError, PortConfigInfo, RouDiConfig};
use crate::error::{ErrorHandler, ErrorKind, PortPoolError, Severity};
use crate::mepoo::ChunkPool;
use crate::pool::{FixedPool, Handle};
use crate::ports::{
    ApplicationPortData, InterfacePortData, Interfaces, NodeData, Ownership, PublisherOptions,
    PublisherPortData, RegistryContext, SubscriberOptions, SubscriberPortData,
};
use crate::sync::{ConditionVariableData, EventVariableData};
use parking_lot::Mutex;
use std::sync::Arc;

/// Central registry owner.
///
/// One instance per daemon; processes share its [`PortPool`] through
/// [`PortManager::context`].
pub struct PortManager {
    pool: Arc<PortPool>,
    errors: Arc<ErrorHandler>,
    config: RouDiConfig,
    discovery_lock: Mutex<()>,
}

impl PortManager {
    /// Validate `config` and reserve every registry pool.
    pub fn new(config: RouDiConfig) -> Result<Self, ConfigError> {
        Self::with_error_handler(config, Arc::new(ErrorHandler::new()))
    }

    /// Like [`PortManager::new`] with a caller-provided error handler.
    pub fn with_error_handler(
        config: RouDiConfig,
        errors: Arc<ErrorHandler>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        log::debug!(
            "[roudi] port manager created (policy={}, max_chunks_held={})",
            config.connection_policy(),
            config.max_chunks_held_per_subscriber()
        );
        Ok(Self {
            pool: Arc::new(PortPool::new(&config)),
            errors,
            config,
            discovery_lock: Mutex::new(()),
        })
    }

    #[must_use]
    pub fn config(&self) -> &RouDiConfig {
        &self.config
    }

    #[must_use]
    pub fn port_pool(&self) -> &Arc<PortPool> {
        &self.pool
    }

    #[must_use]
    pub fn error_handler(&self) -> &Arc<ErrorHandler> {
        &self.errors
    }

    /// Context from which facades resolve their entries.
    #[must_use]
    pub fn context(&self) -> RegistryContext {
        RegistryContext::new(Arc::clone(&self.pool), Arc::clone(&self.errors))
    }

    // ------------------------------------------------------------------
    // Acquisition
    // ------------------------------------------------------------------

    /// Register a publisher. With `offer_on_create` it is offered and matched
    /// before this call returns.
    pub fn acquire_publisher_port_data(
        &self,
        service: ServiceDescription,
        options: &PublisherOptions,
        process_name: &str,
        payload_pool: Arc<dyn ChunkPool>,
        port_config_info: PortConfigInfo,
    ) -> Result<Handle<PublisherPortData>, PortPoolError> {
        let unique_id = self.pool.next_unique_id();
        let handle = self.acquire(
            &self.pool.publishers,
            PortPoolError::PublisherPortListFull,
            |data| {
                data.reset(
                    process_name,
                    service,
                    options,
                    unique_id,
                    payload_pool,
                    port_config_info,
                );
                if options.offer_on_create {
                    data.request_offer(true);
                }
            },
        )?;
        log::debug!(
            "[roudi] publisher {:?} acquired by '{}' for {}",
            handle,
            process_name,
            service
        );

        if options.offer_on_create {
            let _guard = self.discovery_lock.lock();
            Discovery::new(&self.pool, self.config.connection_policy()).run_for_publisher(handle);
        }
        Ok(handle)
    }

    /// Register a subscriber. With `subscribe_on_create` it is subscribed and
    /// matched before this call returns.
    pub fn acquire_subscriber_port_data(
        &self,
        service: ServiceDescription,
        options: &SubscriberOptions,
        process_name: &str,
        port_config_info: PortConfigInfo,
    ) -> Result<Handle<SubscriberPortData>, PortPoolError> {
        let unique_id = self.pool.next_unique_id();
        let handle = self.acquire(
            &self.pool.subscribers,
            PortPoolError::SubscriberPortListFull,
            |data| {
                data.reset(process_name, service, options, unique_id, port_config_info);
                if options.subscribe_on_create {
                    data.request_subscribe();
                }
            },
        )?;
        log::debug!(
            "[roudi] subscriber {:?} acquired by '{}' for {}",
            handle,
            process_name,
            service
        );

        if options.subscribe_on_create {
            let _guard = self.discovery_lock.lock();
            Discovery::new(&self.pool, self.config.connection_policy())
                .run_for_subscriber(handle);
        }
        Ok(handle)
    }

    /// Register an interface port. Every service offered at this point is
    /// queued for it right away; later offers arrive through discovery.
    pub fn acquire_interface_port_data(
        &self,
        interface: Interfaces,
        process_name: &str,
        node_name: &str,
    ) -> Result<Handle<InterfacePortData>, PortPoolError> {
        // Held across publication so no pass forwards to the slot before the
        // initial snapshot is queued
        let _guard = self.discovery_lock.lock();
        let handle = self.acquire(
            &self.pool.interfaces,
            PortPoolError::InterfacePortListFull,
            |data| data.reset(interface, process_name, node_name),
        )?;

        if let Some(data) = self.pool.interfaces.get(handle) {
            if data.take_initial_offer_forward() {
                for (_, publisher) in self.pool.publishers.iter() {
                    if publisher.is_offered() {
                        data.push_capro(CaproMessage::offer(publisher.header().service()));
                    }
                }
            }
        }
        log::debug!(
            "[roudi] interface {} port acquired by '{}'",
            interface,
            process_name
        );
        Ok(handle)
    }

    pub fn acquire_application_port_data(
        &self,
        process_name: &str,
    ) -> Result<Handle<ApplicationPortData>, PortPoolError> {
        self.acquire(
            &self.pool.applications,
            PortPoolError::ApplicationPortListFull,
            |data| data.reset(process_name),
        )
    }

    pub fn acquire_node_data(
        &self,
        process_name: &str,
        node_name: &str,
        node_device_identifier: u64,
    ) -> Result<Handle<NodeData>, PortPoolError> {
        self.acquire(&self.pool.nodes, PortPoolError::NodeDataListFull, |data| {
            data.reset(process_name, node_name, node_device_identifier);
        })
    }

    pub fn acquire_condition_variable_data(
        &self,
        process_name: &str,
    ) -> Result<Handle<ConditionVariableData>, PortPoolError> {
        self.acquire(
            &self.pool.condition_variables,
            PortPoolError::ConditionVariableListFull,
            |data| data.reset(process_name),
        )
    }

    pub fn acquire_event_variable_data(
        &self,
        process_name: &str,
    ) -> Result<Handle<EventVariableData>, PortPoolError> {
        self.acquire(
            &self.pool.event_variables,
            PortPoolError::EventVariableListFull,
            |data| data.reset(process_name),
        )
    }

    fn acquire<T, const N: usize>(
        &self,
        pool: &FixedPool<T, N>,
        exhausted: PortPoolError,
        init: impl FnOnce(&T),
    ) -> Result<Handle<T>, PortPoolError> {
        match pool.acquire(init) {
            Some(handle) => Ok(handle),
            None => {
                self.errors
                    .report(ErrorKind::PortPool(exhausted), None, Severity::Fatal);
                Err(exhausted)
            }
        }
    }

    // ------------------------------------------------------------------
    // Deletion and discovery
    // ------------------------------------------------------------------

    /// Flag every entry owned by `process_name` for destruction.
    ///
    /// Idempotent. Capacity is freed by the next discovery pass.
    pub fn delete_ports_of_process(&self, process_name: &str) {
        let pool = &self.pool;
        let flagged = flag_owned(pool.publishers.iter().map(|(_, d)| &d.header().owner), process_name)
            + flag_owned(pool.subscribers.iter().map(|(_, d)| &d.header().owner), process_name)
            + flag_owned(pool.interfaces.iter().map(|(_, d)| d.owner()), process_name)
            + flag_owned(pool.applications.iter().map(|(_, d)| d.owner()), process_name)
            + flag_owned(pool.nodes.iter().map(|(_, d)| d.owner()), process_name)
            + flag_owned(pool.condition_variables.iter().map(|(_, d)| d.owner()), process_name)
            + flag_owned(pool.event_variables.iter().map(|(_, d)| d.owner()), process_name);

        log::info!(
            "[roudi] flagged {} entries of process '{}' for destruction",
            flagged,
            process_name
        );
    }

    /// Run a full discovery pass. Serialised with every other pass.
    pub fn do_discovery(&self) {
        let _guard = self.discovery_lock.lock();
        Discovery::new(&self.pool, self.config.connection_policy()).run();
    }

    /// Incremented once per pass that changed the set of offered services.
    #[must_use]
    pub fn service_registry_change_counter(&self) -> u64 {
        self.pool.service_registry_change_counter()
    }

    /// Offered services matching a (possibly wildcard) description.
    #[must_use]
    pub fn find_service(&self, service: &ServiceDescription) -> Vec<ServiceDescription> {
        self.pool.service_registry.find(service)
    }
}

impl std::fmt::Debug for PortManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortManager")
            .field("config", &self.config)
            .field("pool", &self.pool)
            .finish_non_exhaustive()
    }
}

fn flag_owned<'a>(owners: impl Iterator<Item = &'a Ownership>, process_name: &str) -> usize {
    let mut flagged = 0;
    for owner in owners {
        if owner.belongs_to(process_name) {
            owner.mark_to_be_destroyed();
            flagged += 1;
        }
    }
    flagged
}
