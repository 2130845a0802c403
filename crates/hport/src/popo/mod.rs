// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Publish/subscribe user API: subscriber facade and wait-set attachment.
//!
//! A [`BaseSubscriber`] is attached to at most one [`WaitSet`] at a time.
//! Attaching to another wait-set moves it; the port's condition variable
//! reference is replaced in one atomic store, so a publisher never notifies
//! a half-attached subscriber.

mod base_subscriber;
mod subscriber_port;
mod wait_set;


pub use base_subscriber::BaseSubscriber;
pub use subscriber_port::SubscriberPort;
pub use wait_set::{SubscriberEvent, TriggerId, TriggerInfo, WaitSet};
