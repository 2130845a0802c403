// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::uninlined_format_args)] // Example readability over pedantic
#![allow(clippy::missing_panics_doc)] // Examples panic on failure

//! WaitSet Demo - Event-Driven Chunk Reception
//!
//! Registers a publisher and a subscriber in one port manager, attaches the
//! subscriber to a WaitSet and polls it while a producer thread sends.
//!
//! Run with: RUST_LOG=debug cargo run --package hport --example waitset_demo

use hport::capro::ServiceDescription;
use hport::config::{PortConfigInfo, RouDiConfig};
use hport::mepoo::SlabChunkPool;
use hport::popo::{BaseSubscriber, SubscriberEvent, WaitSet};
use hport::ports::{PublisherOptions, PublisherPortUser, SubscriberOptions, SubscriberPortUser};
use hport::roudi::PortManager;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const SAMPLES: u32 = 5;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    println!("=== HPORT WaitSet Demo ===\n");

    let manager = PortManager::new(RouDiConfig::from_env()?)?;
    let service = ServiceDescription::new(1, 2, 3);

    let publisher = manager.acquire_publisher_port_data(
        service,
        &PublisherOptions::with_history(1),
        "producer",
        Arc::new(SlabChunkPool::new()),
        PortConfigInfo::default(),
    )?;
    let publisher = PublisherPortUser::new(manager.context(), publisher);

    let subscriber = manager.acquire_subscriber_port_data(
        service,
        &SubscriberOptions::default(),
        "consumer",
        PortConfigInfo::default(),
    )?;
    let subscriber = BaseSubscriber::new(SubscriberPortUser::new(manager.context(), subscriber));
    println!(
        "[OK] {} subscription state: {}",
        subscriber.service_description(),
        subscriber.subscription_state()
    );

    let waitset = WaitSet::new(&manager, "consumer")?;
    let trigger = waitset.attach_event(&subscriber, SubscriberEvent::HasData)?;
    println!("[OK] attached as {}\n", trigger);

    let producer = thread::spawn(move || {
        for seq in 0..SAMPLES {
            let message = format!("sample #{seq}");
            if let Err(e) = publisher.send_copy(message.as_bytes()) {
                eprintln!("[producer] send failed: {}", e);
            }
            thread::sleep(Duration::from_millis(50));
        }
        publisher
    });

    let mut received = 0;
    while received < SAMPLES {
        for info in waitset.try_wait() {
            println!("[waitset] {} fired ({:?})", info.id, info.event);
            while let Ok(chunk) = subscriber.take_chunk() {
                println!("  <- {}", String::from_utf8_lossy(&chunk.to_vec()));
                subscriber.release_chunk(chunk);
                received += 1;
            }
        }
        thread::sleep(Duration::from_millis(10));
    }

    let publisher = producer
        .join()
        .map_err(|_| "producer thread panicked")?;
    publisher.destroy();
    drop(waitset);
    drop(subscriber);

    manager.do_discovery();
    println!(
        "\n[OK] {} samples received, {} publisher(s) left in the registry",
        received,
        manager.port_pool().publishers().len()
    );
    Ok(())
}
