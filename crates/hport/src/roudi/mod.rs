// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! RouDi - the routing and discovery daemon core.
//!
//! [`PortManager`] owns the [`PortPool`] registry, hands out entries to
//! processes and runs the discovery pass that connects publishers to
//! subscribers.

mod discovery;
mod port_manager;
mod port_pool;
mod service_registry;

#[cfg(test)]
mod tests;

pub use port_manager::PortManager;
pub use port_pool::PortPool;
pub use service_registry::ServiceRegistry;
