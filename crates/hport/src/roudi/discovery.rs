// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Discovery pass over the registry.
//!
//! A pass runs in fixed order:
//!
//! 1. purge entries flagged for destruction
//! 2. apply publisher offer / stop-offer intents, forward CaPro messages
//! 3. disconnect subscribers that asked to unsubscribe
//! 4. unmatch subscribers whose publisher is gone or stopped offering
//! 5. match subscribers that want a connection to offered publishers
//! 6. bump the change counter once if the offered set changed
//!
//! Unmatch runs before match so a subscriber losing its publisher can be
//! reconnected to another one within the same pass. A second pass over a
//! settled registry changes nothing.
//!
//! Only the thread holding the port manager's discovery lock runs a pass; it
//! is the sole writer of connection lists and of match outcomes.

use super::port_pool::PortPool;
use crate::capro::CaproMessage;
use crate::config::ConnectionPolicy;
use crate::pool::Handle;
use crate::ports::{PublisherPortData, SubscribeState, SubscriberPortData};

pub(crate) struct Discovery<'a> {
    pool: &'a PortPool,
    policy: ConnectionPolicy,
    offered_set_changed: bool,
}

impl<'a> Discovery<'a> {
    pub(crate) fn new(pool: &'a PortPool, policy: ConnectionPolicy) -> Self {
        Self {
            pool,
            policy,
            offered_set_changed: false,
        }
    }

    /// Full pass.
    pub(crate) fn run(mut self) {
        self.purge();
        self.apply_offer_intents();
        self.apply_unsubscribe_intents();
        self.unmatch();
        self.match_all();
        self.finish();
    }

    /// Offer a freshly created publisher and connect waiting subscribers to it.
    pub(crate) fn run_for_publisher(mut self, publisher: Handle<PublisherPortData>) {
        if let Some(data) = self.pool.publishers.get(publisher) {
            self.apply_offer_intent(data);
        }
        self.match_all();
        self.finish();
    }

    /// Connect a freshly created subscriber.
    pub(crate) fn run_for_subscriber(mut self, subscriber: Handle<SubscriberPortData>) {
        self.match_subscriber(subscriber);
        self.finish();
    }

    /// Bump the change counter once if the offered set changed.
    pub(crate) fn finish(self) {
        if self.offered_set_changed {
            self.pool.bump_change_counter();
        }
    }

    // ------------------------------------------------------------------
    // Step 1: purge
    // ------------------------------------------------------------------

    fn purge(&mut self) {
        let pool = self.pool;

        for (handle, subscriber) in pool.subscribers.iter() {
            if !subscriber.header.owner.is_to_be_destroyed() {
                continue;
            }
            for publisher in subscriber.connected_publishers() {
                if let Some(data) = pool.publishers.get(publisher) {
                    remove_handle(&mut data.subscribers.lock(), handle);
                }
            }
            subscriber.release_resources();
            pool.subscribers.release(handle);
            log::debug!("[roudi] purged subscriber {:?}", handle);
        }

        for (handle, publisher) in pool.publishers.iter() {
            if !publisher.header.owner.is_to_be_destroyed() {
                continue;
            }
            self.withdraw_offer(publisher);
            for subscriber in publisher.connected_subscribers() {
                if let Some(data) = pool.subscribers.get(subscriber) {
                    disconnect_subscriber_side(data, handle);
                }
            }
            publisher.release_resources();
            pool.publishers.release(handle);
            log::debug!("[roudi] purged publisher {:?}", handle);
        }

        for (handle, cv) in pool.condition_variables.iter() {
            if !cv.owner.is_to_be_destroyed() {
                continue;
            }
            for (_, subscriber) in pool.subscribers.iter() {
                subscriber.condition_variable.clear_if(handle);
            }
            pool.condition_variables.release(handle);
        }

        for (handle, interface) in pool.interfaces.iter() {
            if interface.owner.is_to_be_destroyed() {
                interface.release_resources();
                pool.interfaces.release(handle);
            }
        }
        for (handle, application) in pool.applications.iter() {
            if application.owner.is_to_be_destroyed() {
                pool.applications.release(handle);
            }
        }
        for (handle, node) in pool.nodes.iter() {
            if node.owner.is_to_be_destroyed() {
                pool.nodes.release(handle);
            }
        }
        for (handle, event_variable) in pool.event_variables.iter() {
            if event_variable.owner.is_to_be_destroyed() {
                pool.event_variables.release(handle);
            }
        }
    }

    // ------------------------------------------------------------------
    // Step 2: offer intents
    // ------------------------------------------------------------------

    fn apply_offer_intents(&mut self) {
        for (_, publisher) in self.pool.publishers.iter() {
            if !publisher.header.owner.is_to_be_destroyed() {
                self.apply_offer_intent(publisher);
            }
        }
    }

    fn apply_offer_intent(&mut self, publisher: &PublisherPortData) {
        let requested = publisher.is_offer_requested();
        if requested == publisher.is_offered() {
            return;
        }

        let service = publisher.header.service();
        publisher.set_offered(requested);
        if requested {
            self.pool.service_registry.add(service);
            self.forward(CaproMessage::offer(service));
            log::debug!("[roudi] offer {}", service);
        } else {
            self.pool.service_registry.remove(service);
            self.forward(CaproMessage::stop_offer(service));
            log::debug!("[roudi] stop offer {}", service);
        }
        self.offered_set_changed = true;
    }

    fn withdraw_offer(&mut self, publisher: &PublisherPortData) {
        if !publisher.is_offered() {
            return;
        }
        let service = publisher.header.service();
        publisher.set_offered(false);
        self.pool.service_registry.remove(service);
        self.forward(CaproMessage::stop_offer(service));
        self.offered_set_changed = true;
    }

    fn forward(&self, message: CaproMessage) {
        for (_, interface) in self.pool.interfaces.iter() {
            if !interface.owner.is_to_be_destroyed() {
                interface.push_capro(message);
            }
        }
    }

    // ------------------------------------------------------------------
    // Step 3: unsubscribe intents
    // ------------------------------------------------------------------

    fn apply_unsubscribe_intents(&mut self) {
        let pool = self.pool;
        for (handle, subscriber) in pool.subscribers.iter() {
            let state = subscriber.state();
            let withdrawn = match state {
                SubscribeState::UnsubscribeRequested => true,
                // Intent dropped while a previous pass was connecting
                SubscribeState::Subscribed | SubscribeState::WaitForOffer => {
                    !subscriber.is_subscribe_requested()
                }
                SubscribeState::NotSubscribed | SubscribeState::SubscribeRequested => false,
            };
            if !withdrawn || !subscriber.transition(state, SubscribeState::NotSubscribed) {
                continue;
            }
            let publishers = std::mem::take(&mut *subscriber.publishers.lock());
            for publisher in publishers {
                if let Some(data) = pool.publishers.get(publisher) {
                    remove_handle(&mut data.subscribers.lock(), handle);
                }
            }
            log::debug!("[roudi] subscriber {:?} unsubscribed", handle);
        }
    }

    // ------------------------------------------------------------------
    // Step 4: unmatch
    // ------------------------------------------------------------------

    fn unmatch(&mut self) {
        let pool = self.pool;
        for (handle, subscriber) in pool.subscribers.iter() {
            for publisher in subscriber.connected_publishers() {
                let still_offered = pool
                    .publishers
                    .get(publisher)
                    .is_some_and(PublisherPortData::is_offered);
                if still_offered {
                    continue;
                }
                if let Some(data) = pool.publishers.get(publisher) {
                    remove_handle(&mut data.subscribers.lock(), handle);
                }
                disconnect_subscriber_side(subscriber, publisher);
            }
        }
    }

    // ------------------------------------------------------------------
    // Step 5: match
    // ------------------------------------------------------------------

    fn match_all(&mut self) {
        for handle in self.pool.subscribers.handles() {
            self.match_subscriber(handle);
        }
    }

    fn match_subscriber(&mut self, handle: Handle<SubscriberPortData>) {
        let pool = self.pool;
        let Some(subscriber) = pool.subscribers.get(handle) else {
            return;
        };
        if subscriber.header.owner.is_to_be_destroyed() || !subscriber.is_subscribe_requested() {
            return;
        }

        let state = subscriber.state();
        let wants_connection = match state {
            SubscribeState::NotSubscribed
            | SubscribeState::SubscribeRequested
            | SubscribeState::WaitForOffer => true,
            SubscribeState::Subscribed => self.policy == ConnectionPolicy::MultiPublisher,
            SubscribeState::UnsubscribeRequested => false,
        };
        if !wants_connection {
            return;
        }

        let service = subscriber.header.service();
        let capacity = self.policy.max_publishers_per_subscriber();

        // Slot order: under the single-publisher policy the lowest index wins
        let mut observed = state;
        for (publisher_handle, publisher) in pool.publishers.iter() {
            if subscriber.publishers.lock().len() >= capacity {
                break;
            }
            if publisher.header.owner.is_to_be_destroyed()
                || !publisher.is_offered()
                || !service.matches(&publisher.header.service())
                || subscriber.publishers.lock().contains(&publisher_handle)
            {
                continue;
            }
            match connect(publisher_handle, publisher, handle, subscriber, observed) {
                Connection::Established => observed = SubscribeState::Subscribed,
                Connection::Skipped => {}
                // The owner changed its mind; the next pass sees the new intent
                Connection::StateChanged => return,
            }
        }

        if subscriber.publishers.lock().is_empty()
            && observed != SubscribeState::WaitForOffer
            && subscriber.transition(observed, SubscribeState::WaitForOffer)
        {
            log::debug!("[roudi] subscriber {:?} waiting for offer of {}", handle, service);
        }
    }
}

enum Connection {
    Established,
    /// A connection list was full.
    Skipped,
    /// The subscriber left `observed` before the connection was committed.
    StateChanged,
}

/// Connect both sides, then commit `observed -> Subscribed`. A failed commit
/// rolls back both connection lists.
fn connect(
    publisher_handle: Handle<PublisherPortData>,
    publisher: &PublisherPortData,
    subscriber_handle: Handle<SubscriberPortData>,
    subscriber: &SubscriberPortData,
    observed: SubscribeState,
) -> Connection {
    if publisher.subscribers.lock().push(subscriber_handle).is_err() {
        log::warn!(
            "[roudi] publisher {:?} connection list full, subscriber {:?} not connected",
            publisher_handle,
            subscriber_handle
        );
        return Connection::Skipped;
    }
    if subscriber.publishers.lock().push(publisher_handle).is_err() {
        remove_handle(&mut publisher.subscribers.lock(), subscriber_handle);
        return Connection::Skipped;
    }
    if !subscriber.transition(observed, SubscribeState::Subscribed) {
        remove_handle(&mut publisher.subscribers.lock(), subscriber_handle);
        remove_handle(&mut subscriber.publishers.lock(), publisher_handle);
        log::debug!(
            "[roudi] subscriber {:?} changed state while connecting, rolled back",
            subscriber_handle
        );
        return Connection::StateChanged;
    }

    let requested = subscriber
        .history_request()
        .min(subscriber.queue_capacity());
    for chunk in publisher.recent_history(requested) {
        subscriber.deliver(chunk);
    }

    log::debug!(
        "[roudi] connected publisher {:?} -> subscriber {:?} ({})",
        publisher_handle,
        subscriber_handle,
        publisher.header.service()
    );
    Connection::Established
}

fn disconnect_subscriber_side(
    subscriber: &SubscriberPortData,
    publisher: Handle<PublisherPortData>,
) {
    let mut publishers = subscriber.publishers.lock();
    remove_handle(&mut publishers, publisher);
    if publishers.is_empty()
        && subscriber.transition(SubscribeState::Subscribed, SubscribeState::WaitForOffer)
    {
        log::warn!(
            "[roudi] subscriber {} lost its last publisher",
            subscriber.header.service()
        );
    }
}

fn remove_handle<T, const N: usize>(list: &mut heapless::Vec<Handle<T>, N>, handle: Handle<T>) {
    list.retain(|h| *h != handle);
}
