// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Port records living in the registry and the facades owners use on them.

mod application;
mod base;
mod interface;
mod publisher;
mod publisher_user;
mod subscriber;
mod subscriber_user;

pub use application::{ApplicationPortData, NodeData};
pub use base::{Ownership, PortHeader, RegistryContext};
pub use interface::{InterfacePortData, InterfacePortUser, Interfaces};
pub use publisher::{PublisherOptions, PublisherPortData};
pub use publisher_user::PublisherPortUser;
pub use subscriber::{SubscribeState, SubscriberOptions, SubscriberPortData};
pub use subscriber_user::SubscriberPortUser;
