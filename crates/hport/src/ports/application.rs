// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Application port and node records.

use super::base::Ownership;
use crate::names::{truncated, NodeName};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

/// Registry record of an application port, one per registered process.
#[derive(Debug, Default)]
pub struct ApplicationPortData {
    pub(crate) owner: Ownership,
}

impl ApplicationPortData {
    pub(crate) fn reset(&self, process_name: &str) {
        self.owner.reset(process_name);
    }

    #[must_use]
    pub fn owner(&self) -> &Ownership {
        &self.owner
    }
}

/// Registry record of a node.
#[derive(Debug, Default)]
pub struct NodeData {
    pub(crate) owner: Ownership,
    node_name: RwLock<NodeName>,
    device_identifier: AtomicU64,
}

impl NodeData {
    pub(crate) fn reset(&self, process_name: &str, node_name: &str, device_identifier: u64) {
        self.owner.reset(process_name);
        *self.node_name.write() = truncated(node_name);
        self.device_identifier
            .store(device_identifier, Ordering::Release);
    }

    #[must_use]
    pub fn owner(&self) -> &Ownership {
        &self.owner
    }

    #[must_use]
    pub fn node_name(&self) -> NodeName {
        self.node_name.read().clone()
    }

    #[must_use]
    pub fn device_identifier(&self) -> u64 {
        self.device_identifier.load(Ordering::Acquire)
    }
}
