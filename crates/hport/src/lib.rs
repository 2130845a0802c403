// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # HPORT - Host-local shared-memory port registry
//!
//! The registry and discovery core of a zero-copy publish/subscribe middleware
//! for processes on a single host. Independent processes register publisher
//! and subscriber ports in fixed-capacity, shared registries; a discovery pass
//! connects them by topic, and payloads move as reference-counted chunks.
//!
//! ## Quick Start
//!
//! ```rust
//! use hport::capro::ServiceDescription;
//! use hport::config::{PortConfigInfo, RouDiConfig};
//! use hport::mepoo::SlabChunkPool;
//! use hport::popo::{BaseSubscriber, SubscriberEvent, WaitSet};
//! use hport::ports::{PublisherOptions, PublisherPortUser, SubscriberOptions, SubscriberPortUser};
//! use hport::roudi::PortManager;
//! use std::sync::Arc;
//!
//! let manager = PortManager::new(RouDiConfig::default()).expect("valid config");
//! let radar = ServiceDescription::new(1, 1, 1);
//!
//! let publisher = manager
//!     .acquire_publisher_port_data(
//!         radar,
//!         &PublisherOptions::default(),
//!         "sensor",
//!         Arc::new(SlabChunkPool::new()),
//!         PortConfigInfo::default(),
//!     )
//!     .expect("publisher slot");
//! let publisher = PublisherPortUser::new(manager.context(), publisher);
//!
//! let subscriber = manager
//!     .acquire_subscriber_port_data(radar, &SubscriberOptions::default(), "viewer", PortConfigInfo::default())
//!     .expect("subscriber slot");
//! let subscriber = BaseSubscriber::new(SubscriberPortUser::new(manager.context(), subscriber));
//!
//! let waitset = WaitSet::new(&manager, "viewer").expect("condition variable slot");
//! waitset.attach_event(&subscriber, SubscriberEvent::HasData).expect("attach");
//!
//! publisher.send_copy(b"ping").expect("chunk available");
//! assert_eq!(waitset.try_wait().len(), 1);
//!
//! let chunk = subscriber.take_chunk().expect("chunk delivered");
//! assert_eq!(chunk.to_vec(), b"ping");
//! subscriber.release_chunk(chunk);
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------------+
//! |                          User API (popo)                            |
//! |   BaseSubscriber -> WaitSet | PublisherPortUser | SubscriberPortUser|
//! +---------------------------------------------------------------------+
//! |                       RouDi (roudi)                                 |
//! |   PortManager: acquire / delete / do_discovery | ServiceRegistry    |
//! +---------------------------------------------------------------------+
//! |                     Registry (PortPool)                             |
//! |   FixedPool<Publisher|Subscriber|Interface|Node|CondVar|EventVar>   |
//! +---------------------------------------------------------------------+
//! |                     Payload memory (mepoo)                          |
//! |   ChunkPool trait | SlabChunkPool                                   |
//! +---------------------------------------------------------------------+
//! ```
//!
//! ## Modules Overview
//!
//! - [`roudi`] - Port manager and discovery (start here)
//! - [`ports`] - Registry records and owner-side facades
//! - [`popo`] - Subscriber facade and wait-set attachment
//! - [`pool`] - Fixed-capacity pools and generation-checked handles
//! - [`capro`] - Service descriptions and offer messages
//! - [`mepoo`] - Chunk pools
//! - [`sync`] - Condition and event variables
//! - [`config`] - Capacities and runtime configuration
//! - [`error`] - Error types and the replaceable error handler

pub mod capro;
pub mod config;
pub mod error;
pub mod mepoo;
pub mod names;
pub mod pool;
pub mod popo;
pub mod ports;
pub mod roudi;
pub mod sync;

pub use capro::ServiceDescription;
pub use config::{ConnectionPolicy, RouDiConfig};
pub use error::{ErrorHandler, ErrorKind, PortPoolError, Severity};
pub use pool::Handle;
pub use popo::{BaseSubscriber, SubscriberEvent, SubscriberPort, WaitSet};
pub use roudi::PortManager;
