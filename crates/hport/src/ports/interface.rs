// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Interface (gateway) port: receives every offer / stop-offer of the registry.

use super::base::{Ownership, RegistryContext};
use crate::capro::CaproMessage;
use crate::config::MAX_INTERFACE_CAPRO_FIFO_SIZE;
use crate::error::ErrorKind;
use crate::names::{truncated, NodeName};
use crate::pool::Handle;
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

/// Kind of gateway behind an interface port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Interfaces {
    #[default]
    Internal,
    Dds,
    SomeIp,
    Mqtt,
    Ros1,
    Custom,
}

impl fmt::Display for Interfaces {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Internal => "internal",
            Self::Dds => "dds",
            Self::SomeIp => "someip",
            Self::Mqtt => "mqtt",
            Self::Ros1 => "ros1",
            Self::Custom => "custom",
        };
        f.write_str(name)
    }
}

/// Registry record of an interface port.
#[derive(Debug, Default)]
pub struct InterfacePortData {
    pub(crate) owner: Ownership,
    interface: RwLock<Interfaces>,
    node_name: RwLock<NodeName>,
    do_initial_offer_forward: AtomicBool,
    capro_queue: Mutex<heapless::Deque<CaproMessage, MAX_INTERFACE_CAPRO_FIFO_SIZE>>,
}

impl InterfacePortData {
    pub(crate) fn reset(&self, interface: Interfaces, process_name: &str, node_name: &str) {
        self.owner.reset(process_name);
        *self.interface.write() = interface;
        *self.node_name.write() = truncated(node_name);
        self.do_initial_offer_forward.store(true, Ordering::Release);
        self.capro_queue.lock().clear();
    }

    #[must_use]
    pub fn owner(&self) -> &Ownership {
        &self.owner
    }

    #[must_use]
    pub fn interface(&self) -> Interfaces {
        *self.interface.read()
    }

    #[must_use]
    pub fn node_name(&self) -> NodeName {
        self.node_name.read().clone()
    }

    /// Consume the initial-forward request. Returns `true` exactly once.
    pub(crate) fn take_initial_offer_forward(&self) -> bool {
        self.do_initial_offer_forward.swap(false, Ordering::AcqRel)
    }

    /// Queue a message; a full queue drops its oldest entry.
    pub(crate) fn push_capro(&self, message: CaproMessage) {
        let mut queue = self.capro_queue.lock();
        if queue.is_full() {
            if let Some(dropped) = queue.pop_front() {
                log::warn!(
                    "[roudi] interface {} capro queue full, dropping {}",
                    self.interface(),
                    dropped
                );
            }
        }
        let _ = queue.push_back(message);
    }

    pub(crate) fn pop_capro(&self) -> Option<CaproMessage> {
        self.capro_queue.lock().pop_front()
    }

    pub(crate) fn release_resources(&self) {
        self.capro_queue.lock().clear();
    }
}

/// Owner-side facade of an interface port.
#[derive(Debug)]
pub struct InterfacePortUser {
    context: RegistryContext,
    handle: Handle<InterfacePortData>,
}

impl InterfacePortUser {
    #[must_use]
    pub fn new(context: RegistryContext, handle: Handle<InterfacePortData>) -> Self {
        Self { context, handle }
    }

    /// Next pending offer / stop-offer message.
    pub fn try_get_capro_message(&self) -> Option<CaproMessage> {
        self.data()?.pop_capro()
    }

    pub fn destroy(&self) {
        if let Some(data) = self.context.pool.interfaces.get(self.handle) {
            data.owner.mark_to_be_destroyed();
        }
    }

    fn data(&self) -> Option<&InterfacePortData> {
        self.context.resolve(
            &self.context.pool.interfaces,
            self.handle,
            ErrorKind::PortUsedAfterDestruction("interface port"),
        )
    }
}
