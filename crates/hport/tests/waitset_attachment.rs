// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! WaitSet attachment integration tests
//!
//! Real subscriber ports attached to wait-sets backed by registry condition
//! variables.

use hport::capro::ServiceDescription;
use hport::config::{PortConfigInfo, RouDiConfig};
use hport::error::{ErrorHandler, WaitSetError};
use hport::mepoo::SlabChunkPool;
use hport::popo::{BaseSubscriber, SubscriberEvent, TriggerInfo, WaitSet};
use hport::ports::{PublisherOptions, PublisherPortUser, SubscriberOptions, SubscriberPortUser};
use hport::roudi::PortManager;
use hport::sync::ConditionNotifier;
use std::sync::Arc;

const SERVICE: ServiceDescription = ServiceDescription::new(10, 20, 30);

fn setup() -> (PortManager, PublisherPortUser) {
    // Observe instead of aborting so a broken invariant fails the test
    let errors = Arc::new(ErrorHandler::with_handler(|kind, _, severity| {
        panic!("unexpected {severity:?} error: {kind}");
    }));
    let manager =
        PortManager::with_error_handler(RouDiConfig::default(), errors).expect("valid config");
    let handle = manager
        .acquire_publisher_port_data(
            SERVICE,
            &PublisherOptions::default(),
            "producer",
            Arc::new(SlabChunkPool::new()),
            PortConfigInfo::default(),
        )
        .expect("publisher slot available");
    let publisher = PublisherPortUser::new(manager.context(), handle);
    (manager, publisher)
}

fn subscriber(manager: &PortManager, process: &str) -> BaseSubscriber<SubscriberPortUser> {
    let handle = manager
        .acquire_subscriber_port_data(
            SERVICE,
            &SubscriberOptions::default(),
            process,
            PortConfigInfo::default(),
        )
        .expect("subscriber slot available");
    BaseSubscriber::new(SubscriberPortUser::new(manager.context(), handle))
}

#[test]
fn test_delivery_notifies_attached_waitset() {
    let (manager, publisher) = setup();
    let subscriber = subscriber(&manager, "consumer");
    let waitset = WaitSet::new(&manager, "consumer").expect("condition variable slot");

    let id = waitset
        .attach_event(&subscriber, SubscriberEvent::HasData)
        .expect("attach");
    assert_eq!(
        subscriber.port().condition_variable(),
        Some(waitset.condition_variable())
    );
    assert!(!waitset.was_notified());
    assert!(waitset.try_wait().is_empty());

    publisher.send_copy(b"hello").expect("chunk available");
    assert!(waitset.was_notified());
    assert_eq!(
        waitset.try_wait(),
        vec![TriggerInfo {
            id,
            event: SubscriberEvent::HasData
        }]
    );
    assert!(!waitset.was_notified());

    let chunk = subscriber.take_chunk().expect("chunk delivered");
    assert_eq!(chunk.to_vec(), b"hello");
    subscriber.release_chunk(chunk);
    assert!(waitset.try_wait().is_empty());
}

#[test]
fn test_reattach_moves_subscriber_to_new_waitset() {
    let (manager, publisher) = setup();
    let subscriber = subscriber(&manager, "consumer");
    let first = WaitSet::new(&manager, "consumer").expect("condition variable slot");
    let second = WaitSet::new(&manager, "consumer").expect("condition variable slot");

    first
        .attach_event(&subscriber, SubscriberEvent::HasData)
        .expect("attach to first");
    second
        .attach_event(&subscriber, SubscriberEvent::HasData)
        .expect("attach to second");

    assert_eq!(first.size(), 0);
    assert_eq!(second.size(), 1);
    assert_eq!(
        subscriber.port().condition_variable(),
        Some(second.condition_variable())
    );

    publisher.send_copy(b"moved").expect("chunk available");
    assert!(!first.was_notified());
    assert!(second.was_notified());

    assert_eq!(
        second.attach_event(&subscriber, SubscriberEvent::HasData),
        Err(WaitSetError::AlreadyAttached)
    );
}

#[test]
fn test_detach_from_other_waitset_is_ignored() {
    let (manager, _publisher) = setup();
    let subscriber = subscriber(&manager, "consumer");
    let attached = WaitSet::new(&manager, "consumer").expect("condition variable slot");
    let other = WaitSet::new(&manager, "consumer").expect("condition variable slot");

    attached
        .attach_event(&subscriber, SubscriberEvent::HasData)
        .expect("attach");
    other.detach_event(&subscriber, SubscriberEvent::HasData);
    assert!(subscriber.is_attached());
    assert_eq!(attached.size(), 1);

    attached.detach_event(&subscriber, SubscriberEvent::HasData);
    assert!(!subscriber.is_attached());
    assert_eq!(attached.size(), 0);
    assert_eq!(subscriber.port().condition_variable(), None);
}

#[test]
fn test_waitset_drop_clears_port_reference() {
    let (manager, publisher) = setup();
    let subscriber = subscriber(&manager, "consumer");
    let waitset = WaitSet::new(&manager, "consumer").expect("condition variable slot");
    waitset
        .attach_event(&subscriber, SubscriberEvent::HasData)
        .expect("attach");

    drop(waitset);
    assert_eq!(subscriber.port().condition_variable(), None);
    assert!(!subscriber.is_attached());

    manager.do_discovery();
    assert!(manager.port_pool().condition_variables().is_empty());

    // Delivery without a wait-set still queues data
    publisher.send_copy(b"orphan").expect("chunk available");
    assert!(subscriber.has_data());
}

#[test]
fn test_subscriber_drop_leaves_waitset_and_frees_port() {
    let (manager, _publisher) = setup();
    let waitset = WaitSet::new(&manager, "consumer").expect("condition variable slot");
    {
        let subscriber = subscriber(&manager, "consumer");
        waitset
            .attach_event(&subscriber, SubscriberEvent::HasData)
            .expect("attach");
        assert_eq!(waitset.size(), 1);
    }

    assert_eq!(waitset.size(), 0);
    manager.do_discovery();
    assert!(manager.port_pool().subscribers().is_empty());
}

#[test]
fn test_attach_to_purged_condition_variable_is_rejected() {
    let (manager, _publisher) = setup();
    let subscriber = subscriber(&manager, "consumer");
    let waitset = WaitSet::new(&manager, "waiter").expect("condition variable slot");

    manager.delete_ports_of_process("waiter");
    manager.do_discovery();

    assert_eq!(
        waitset.attach_event(&subscriber, SubscriberEvent::HasData),
        Err(WaitSetError::ConditionVariableDestroyed)
    );
    assert!(!subscriber.is_attached());
    assert_eq!(subscriber.port().condition_variable(), None);
}

#[test]
fn test_condition_notifier_wakes_waitset_without_triggers() {
    let (manager, _publisher) = setup();
    let waitset = WaitSet::new(&manager, "consumer").expect("condition variable slot");
    let notifier = ConditionNotifier::new(manager.context(), waitset.condition_variable());

    notifier.notify();
    assert!(waitset.was_notified());
    // Nothing attached, so nothing holds
    assert!(waitset.try_wait().is_empty());
    assert!(!waitset.was_notified());
}
