// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Discovery Pass Benchmark
//!
//! Measures the cost of the port manager's discovery pass:
//! - A settled pass over a populated registry (nothing to do)
//! - Subscriber churn (acquire, match, destroy, purge)
//! - Delivery of one sample to several connected subscribers
//!
//! Discovery runs on every registration, so it bounds how fast processes join.

#![allow(clippy::uninlined_format_args)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use hport::capro::ServiceDescription;
use hport::config::{ConnectionPolicy, PortConfigInfo, RouDiConfig};
use hport::mepoo::{ChunkPool, SlabChunkPool};
use hport::popo::SubscriberPort;
use hport::ports::{PublisherOptions, PublisherPortUser, SubscriberOptions, SubscriberPortUser};
use hport::roudi::PortManager;
use std::sync::Arc;

const TOPICS: u16 = 32;

fn populated_manager(policy: ConnectionPolicy) -> PortManager {
    let config = RouDiConfig::builder()
        .connection_policy(policy)
        .build()
        .expect("valid config");
    let manager = PortManager::new(config).expect("port manager");
    let payload: Arc<dyn ChunkPool> = Arc::new(SlabChunkPool::new());

    for topic in 1..=TOPICS {
        let service = ServiceDescription::new(topic, 1, 1);
        manager
            .acquire_publisher_port_data(
                service,
                &PublisherOptions::default(),
                "bench_pub",
                Arc::clone(&payload),
                PortConfigInfo::default(),
            )
            .expect("publisher");
        for _ in 0..4 {
            manager
                .acquire_subscriber_port_data(
                    service,
                    &SubscriberOptions::default(),
                    "bench_sub",
                    PortConfigInfo::default(),
                )
                .expect("subscriber");
        }
    }
    manager
}

/// Benchmark: full pass over a registry where every port is already matched
fn bench_settled_pass(c: &mut Criterion) {
    let manager = populated_manager(ConnectionPolicy::MultiPublisher);

    c.bench_function("discovery_settled_pass", |b| {
        b.iter(|| {
            manager.do_discovery();
            black_box(manager.service_registry_change_counter())
        });
    });
}

/// Benchmark: one subscriber joins, is matched, leaves and is purged
fn bench_subscriber_churn(c: &mut Criterion) {
    let manager = populated_manager(ConnectionPolicy::SinglePublisher);
    let service = ServiceDescription::new(TOPICS / 2, 1, 1);

    c.bench_function("discovery_subscriber_churn", |b| {
        b.iter(|| {
            let handle = manager
                .acquire_subscriber_port_data(
                    black_box(service),
                    &SubscriberOptions::default(),
                    "churn",
                    PortConfigInfo::default(),
                )
                .expect("subscriber");
            let subscriber = SubscriberPortUser::new(manager.context(), handle);
            subscriber.destroy();
            manager.do_discovery();
        });
    });
}

/// Benchmark: send one sample to four subscribers and drain them
fn bench_fan_out(c: &mut Criterion) {
    let manager = PortManager::new(RouDiConfig::default()).expect("port manager");
    let service = ServiceDescription::new(1, 1, 1);
    let handle = manager
        .acquire_publisher_port_data(
            service,
            &PublisherOptions::default(),
            "fan_pub",
            Arc::new(SlabChunkPool::new()),
            PortConfigInfo::default(),
        )
        .expect("publisher");
    let publisher = PublisherPortUser::new(manager.context(), handle);
    let subscribers: Vec<_> = (0..4)
        .map(|_| {
            let handle = manager
                .acquire_subscriber_port_data(
                    service,
                    &SubscriberOptions::default(),
                    "fan_sub",
                    PortConfigInfo::default(),
                )
                .expect("subscriber");
            SubscriberPortUser::new(manager.context(), handle)
        })
        .collect();

    let payload = [0xA5u8; 256];
    c.bench_function("delivery_fan_out_4", |b| {
        b.iter(|| {
            publisher.send_copy(black_box(&payload)).expect("chunk");
            for subscriber in &subscribers {
                if let Ok(chunk) = subscriber.try_get_chunk() {
                    subscriber.release_chunk(chunk);
                }
            }
        });
    });
}

criterion_group!(
    benches,
    bench_settled_pass,
    bench_subscriber_churn,
    bench_fan_out
);
criterion_main!(benches);
