// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use super::*;
use crate::capro::{CaproMessageType, ServiceDescription, WILDCARD};
use crate::config::{ConnectionPolicy, PortConfigInfo, RouDiConfig, MAX_INTERFACE_NUMBER};
use crate::error::{ErrorHandler, ErrorKind, Severity};
use crate::mepoo::{ChunkPool, SlabChunkPool};
use crate::ports::{
    InterfacePortUser, Interfaces, PublisherOptions, PublisherPortUser, SubscribeState,
    SubscriberOptions, SubscriberPortUser,
};
use crate::popo::SubscriberPort;
use crate::sync::{ConditionListener, ConditionNotifier};
use parking_lot::Mutex;
use std::sync::Arc;

type Reports = Arc<Mutex<Vec<(ErrorKind, Severity)>>>;

fn manager(policy: ConnectionPolicy) -> (PortManager, Reports) {
    let reports: Reports = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&reports);
    let errors = Arc::new(ErrorHandler::with_handler(move |kind, _, severity| {
        sink.lock().push((kind, severity));
    }));
    let config = RouDiConfig::builder()
        .connection_policy(policy)
        .build()
        .expect("valid config");
    let manager = PortManager::with_error_handler(config, errors).expect("valid config");
    (manager, reports)
}

fn chunk_pool() -> Arc<dyn ChunkPool> {
    Arc::new(SlabChunkPool::new())
}

fn publisher(
    manager: &PortManager,
    service: ServiceDescription,
    process: &str,
    offer_on_create: bool,
) -> PublisherPortUser {
    let options = PublisherOptions {
        offer_on_create,
        ..PublisherOptions::default()
    };
    let handle = manager
        .acquire_publisher_port_data(service, &options, process, chunk_pool(), PortConfigInfo::default())
        .expect("publisher slot available");
    PublisherPortUser::new(manager.context(), handle)
}

fn subscriber(
    manager: &PortManager,
    service: ServiceDescription,
    process: &str,
    subscribe_on_create: bool,
) -> SubscriberPortUser {
    let options = SubscriberOptions {
        subscribe_on_create,
        ..SubscriberOptions::default()
    };
    let handle = manager
        .acquire_subscriber_port_data(service, &options, process, PortConfigInfo::default())
        .expect("subscriber slot available");
    SubscriberPortUser::new(manager.context(), handle)
}

#[test]
fn test_single_policy_lowest_slot_index_wins() {
    let (manager, _) = manager(ConnectionPolicy::SinglePublisher);
    let service = ServiceDescription::new(1, 1, 1);
    let first = publisher(&manager, service, "a", true);
    let second = publisher(&manager, service, "b", true);

    let sub = subscriber(&manager, service, "c", true);
    assert_eq!(sub.subscription_state(), SubscribeState::Subscribed);

    let data = manager
        .port_pool()
        .subscribers()
        .get(sub.handle())
        .expect("live subscriber");
    assert_eq!(data.connected_publishers().as_slice(), &[first.handle()]);
    assert!(first.has_subscribers());
    assert!(!second.has_subscribers());
}

#[test]
fn test_multi_policy_connects_every_matching_publisher() {
    let (manager, _) = manager(ConnectionPolicy::MultiPublisher);
    let service = ServiceDescription::new(1, 1, 1);
    let first = publisher(&manager, service, "a", true);
    let sub = subscriber(&manager, service, "c", true);

    // Late publisher joins an already subscribed subscriber
    let second = publisher(&manager, service, "b", true);
    manager.do_discovery();

    assert_eq!(sub.subscription_state(), SubscribeState::Subscribed);
    assert!(first.has_subscribers());
    assert!(second.has_subscribers());
}

#[test]
fn test_single_policy_fails_over_to_remaining_publisher() {
    let (manager, _) = manager(ConnectionPolicy::SinglePublisher);
    let service = ServiceDescription::new(1, 1, 1);
    let first = publisher(&manager, service, "a", true);
    let second = publisher(&manager, service, "b", true);
    let sub = subscriber(&manager, service, "c", true);

    first.destroy();
    manager.do_discovery();

    assert_eq!(sub.subscription_state(), SubscribeState::Subscribed);
    assert!(second.has_subscribers());
}

#[test]
fn test_wildcard_subscriber_matches_offered_publisher() {
    let (manager, _) = manager(ConnectionPolicy::SinglePublisher);
    let _publisher = publisher(&manager, ServiceDescription::new(4, 2, 9), "a", true);
    let sub = subscriber(&manager, ServiceDescription::new(4, WILDCARD, WILDCARD), "b", true);
    assert_eq!(sub.subscription_state(), SubscribeState::Subscribed);
}

#[test]
fn test_stop_offer_moves_subscriber_to_wait_for_offer() {
    let (manager, _) = manager(ConnectionPolicy::SinglePublisher);
    let service = ServiceDescription::new(1, 2, 3);
    let publisher = publisher(&manager, service, "a", true);
    let sub = subscriber(&manager, service, "b", true);

    publisher.stop_offer();
    manager.do_discovery();
    assert!(!publisher.is_offered());
    assert_eq!(sub.subscription_state(), SubscribeState::WaitForOffer);
    assert!(manager.find_service(&service).is_empty());

    publisher.offer();
    manager.do_discovery();
    assert_eq!(sub.subscription_state(), SubscribeState::Subscribed);
}

#[test]
fn test_unsubscribe_disconnects_both_sides() {
    let (manager, _) = manager(ConnectionPolicy::SinglePublisher);
    let service = ServiceDescription::new(1, 2, 3);
    let publisher = publisher(&manager, service, "a", true);
    let sub = subscriber(&manager, service, "b", true);

    sub.unsubscribe();
    assert_eq!(sub.subscription_state(), SubscribeState::UnsubscribeRequested);
    manager.do_discovery();

    assert_eq!(sub.subscription_state(), SubscribeState::NotSubscribed);
    assert!(!publisher.has_subscribers());

    // Settled registry: another pass changes nothing
    manager.do_discovery();
    assert_eq!(sub.subscription_state(), SubscribeState::NotSubscribed);
}

#[test]
fn test_interface_receives_offer_and_stop_offer() {
    let (manager, _) = manager(ConnectionPolicy::SinglePublisher);
    let early = ServiceDescription::new(1, 1, 1);
    let late = ServiceDescription::new(2, 2, 2);
    let _early_publisher = publisher(&manager, early, "a", true);

    let handle = manager
        .acquire_interface_port_data(Interfaces::Dds, "gateway", "bridge")
        .expect("interface slot available");
    let interface = InterfacePortUser::new(manager.context(), handle);

    // Initial forward of what is already offered
    let initial = interface.try_get_capro_message().expect("initial offer");
    assert_eq!(initial.message_type, CaproMessageType::Offer);
    assert_eq!(initial.service, early);
    assert!(interface.try_get_capro_message().is_none());

    let late_publisher = publisher(&manager, late, "b", true);
    let offer = interface.try_get_capro_message().expect("offer forwarded");
    assert_eq!(offer.message_type, CaproMessageType::Offer);
    assert_eq!(offer.service, late);

    late_publisher.stop_offer();
    manager.do_discovery();
    let stop = interface.try_get_capro_message().expect("stop offer forwarded");
    assert_eq!(stop.message_type, CaproMessageType::StopOffer);
    assert_eq!(stop.service, late);
}

#[test]
fn test_interface_acquired_during_discovery_sees_each_offer_once() {
    let (manager, _) = manager(ConnectionPolicy::SinglePublisher);
    let service = ServiceDescription::new(3, 3, 3);
    let toggled = publisher(&manager, service, "a", true);

    let interfaces = std::thread::scope(|scope| {
        scope.spawn(|| {
            for _ in 0..30 {
                toggled.stop_offer();
                manager.do_discovery();
                toggled.offer();
                manager.do_discovery();
            }
        });
        (0..MAX_INTERFACE_NUMBER)
            .map(|_| {
                std::thread::yield_now();
                let handle = manager
                    .acquire_interface_port_data(Interfaces::Mqtt, "gateway", "")
                    .expect("interface slot available");
                InterfacePortUser::new(manager.context(), handle)
            })
            .collect::<Vec<_>>()
    });

    for interface in &interfaces {
        let mut expected = CaproMessageType::Offer;
        let mut last = None;
        while let Some(message) = interface.try_get_capro_message() {
            assert_eq!(message.service, service);
            // Offers and stop-offers alternate; a duplicate breaks the pattern
            assert_eq!(message.message_type, expected);
            expected = match expected {
                CaproMessageType::Offer => CaproMessageType::StopOffer,
                CaproMessageType::StopOffer => CaproMessageType::Offer,
            };
            last = Some(message);
        }
        assert_eq!(
            last.map(|m| m.message_type),
            Some(CaproMessageType::Offer),
            "final state is offered"
        );
    }
}

#[test]
fn test_stale_condition_variable_reports_use_after_destruction() {
    let (manager, reports) = manager(ConnectionPolicy::SinglePublisher);
    let cv = manager
        .acquire_condition_variable_data("a")
        .expect("condition variable slot available");
    let listener = ConditionListener::new(manager.context(), cv);
    let notifier = ConditionNotifier::new(manager.context(), cv);

    listener.destroy();
    manager.do_discovery();
    assert!(!listener.is_live());

    notifier.notify();
    assert!(!listener.was_notified());
    assert_eq!(
        reports.lock().as_slice(),
        &[
            (ErrorKind::ConditionVariableUsedAfterDestruction, Severity::Fatal),
            (ErrorKind::ConditionVariableUsedAfterDestruction, Severity::Fatal),
        ]
    );
}

#[test]
fn test_purged_condition_variable_is_cleared_from_subscriber() {
    let (manager, _) = manager(ConnectionPolicy::SinglePublisher);
    let sub = subscriber(&manager, ServiceDescription::new(1, 1, 1), "a", false);
    let cv = manager
        .acquire_condition_variable_data("a")
        .expect("condition variable slot available");

    sub.set_condition_variable(cv);
    assert_eq!(sub.condition_variable(), Some(cv));

    manager
        .port_pool()
        .condition_variables()
        .get(cv)
        .expect("live condition variable")
        .owner()
        .mark_to_be_destroyed();
    manager.do_discovery();

    assert_eq!(sub.condition_variable(), None);
    assert!(!manager.port_pool().condition_variables().is_live(cv));
}

#[test]
fn test_stale_facade_reports_use_after_destruction() {
    let (manager, reports) = manager(ConnectionPolicy::SinglePublisher);
    let sub = subscriber(&manager, ServiceDescription::new(1, 1, 1), "a", true);

    manager.delete_ports_of_process("a");
    manager.do_discovery();

    assert_eq!(sub.subscription_state(), SubscribeState::NotSubscribed);
    assert_eq!(
        reports.lock().as_slice(),
        &[(
            ErrorKind::PortUsedAfterDestruction("subscriber port"),
            Severity::Fatal
        )]
    );
}

#[test]
fn test_publisher_purge_releases_retained_chunks() {
    let (manager, _) = manager(ConnectionPolicy::SinglePublisher);
    let payload = chunk_pool();
    let handle = manager
        .acquire_publisher_port_data(
            ServiceDescription::new(1, 1, 1),
            &PublisherOptions::with_history(4),
            "a",
            Arc::clone(&payload),
            PortConfigInfo::default(),
        )
        .expect("publisher slot available");
    let publisher = PublisherPortUser::new(manager.context(), handle);

    publisher.send_copy(b"one").expect("chunk available");
    publisher.send_copy(b"two").expect("chunk available");
    assert_eq!(payload.used_chunks(), 2);

    publisher.destroy();
    manager.do_discovery();
    assert_eq!(payload.used_chunks(), 0);
}
