//!
//! The Dispatcher
//!
//! The dispatcher is the registry of every publisher and subscriber in the
//! system and the pump that moves notifiers between them.  Each sweep takes
//! at most one notifier from every registered publisher and delivers a new
//! reference to it into every subscriber whose id mask contains the
//! notifier's id.
//!
//! Both tables have a fixed number of slots chosen at construction.  Each
//! table has its own lock, and a lock is only ever held while reading or
//! writing a single slot.  Queue operations always happen with both locks
//! released, so a busy subscriber can never hold up registration or the
//! delivery to another subscriber.
//!

use std::ops::AddAssign;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, trace, warn};

use notifier_core::{Handle, IdMask};

use crate::error::RegistrationError;
use crate::publisher::QueuePublisher;
use crate::subscriber::QueueSubscriber;

/// Dispatcher table sizes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatcherConfig {
    /// The number of publisher slots
    #[serde(default = "default_max_publishers")]
    pub max_publishers: usize,
    /// The number of subscriber slots
    #[serde(default = "default_max_subscribers")]
    pub max_subscribers: usize,
}

fn default_max_publishers() -> usize {
    16
}

fn default_max_subscribers() -> usize {
    32
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            max_publishers: default_max_publishers(),
            max_subscribers: default_max_subscribers(),
        }
    }
}

/// What a dispatch moved
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    /// Notifiers taken from publisher queues
    pub notifiers: usize,
    /// References delivered into subscriber queues
    pub delivered: usize,
    /// Deliveries dropped because a subscriber queue was full
    pub dropped: usize,
}

impl DispatchSummary {
    /// Whether nothing was moved
    pub fn is_idle(&self) -> bool {
        self.notifiers == 0
    }
}

impl AddAssign for DispatchSummary {
    fn add_assign(&mut self, rhs: Self) {
        self.notifiers += rhs.notifiers;
        self.delivered += rhs.delivered;
        self.dropped += rhs.dropped;
    }
}

/// A snapshot of the dispatcher's tables
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DispatcherStats {
    /// Occupied publisher slots
    pub publishers: usize,
    /// Occupied subscriber slots
    pub subscribers: usize,
    /// Total delivery errors
    pub errors: u32,
    /// The table sizes
    pub config: DispatcherConfig,
}

/// An occupied subscriber slot
#[derive(Debug)]
struct SubscriberEntry {
    /// The registered subscriber
    subscriber: Arc<QueueSubscriber>,
    /// The ids the subscriber receives
    mask: IdMask,
    /// Deliveries dropped because the subscriber's queue was full
    errors: u32,
}

/// The publisher/subscriber registry and fan-out pump
#[derive(Debug)]
pub struct Dispatcher {
    /// Publisher slots
    publishers: Mutex<Box<[Option<Arc<QueuePublisher>>]>>,
    /// Subscriber slots
    subscribers: Mutex<Box<[Option<SubscriberEntry>]>>,
    /// Delivery errors across every subscriber
    errors: AtomicU32,
    /// The table sizes
    config: DispatcherConfig,
}

impl Dispatcher {
    /// Create a new dispatcher with empty tables
    pub fn new(config: DispatcherConfig) -> Self {
        info!(
            max_publishers = config.max_publishers,
            max_subscribers = config.max_subscribers,
            "Creating dispatcher"
        );
        Self {
            publishers: Mutex::new((0..config.max_publishers).map(|_| None).collect()),
            subscribers: Mutex::new((0..config.max_subscribers).map(|_| None).collect()),
            errors: AtomicU32::new(0),
            config,
        }
    }

    /// Create a new dispatcher with the given table sizes
    pub fn with_capacity(max_publishers: usize, max_subscribers: usize) -> Self {
        Self::new(DispatcherConfig {
            max_publishers,
            max_subscribers,
        })
    }

    /// The table sizes of the dispatcher
    pub fn config(&self) -> DispatcherConfig {
        self.config
    }

    /// Register a publisher so its queue is swept by `dispatch`.
    ///
    /// Registering a publisher that is already registered does nothing.
    ///
    /// # Panics
    ///
    /// Panics if every publisher slot is in use.  The dispatcher was sized
    /// too small for the system and that must be fixed in its configuration.
    pub fn register_publisher(&self, publisher: &Arc<QueuePublisher>) {
        if let Err(err) = self.try_register_publisher(publisher) {
            error!(reason = err.as_label(), "Fatal dispatcher configuration error");
            panic!("{}", err);
        }
    }

    /// Register a publisher, returning an error instead of panicking when
    /// the table is full
    pub fn try_register_publisher(
        &self,
        publisher: &Arc<QueuePublisher>,
    ) -> Result<(), RegistrationError> {
        let mut table = self.publishers.lock();
        if table
            .iter()
            .flatten()
            .any(|registered| Arc::ptr_eq(registered, publisher))
        {
            return Ok(());
        }

        let capacity = table.len();
        let Some((slot, free)) = table.iter_mut().enumerate().find(|(_, slot)| slot.is_none())
        else {
            return Err(RegistrationError::PublisherTableFull { capacity });
        };

        *free = Some(publisher.clone());
        debug!(slot, "Registered publisher");
        Ok(())
    }

    /// Remove a publisher from the sweep.
    ///
    /// Returns whether the publisher was registered.
    pub fn unregister_publisher(&self, publisher: &Arc<QueuePublisher>) -> bool {
        let mut table = self.publishers.lock();
        let Some((slot, entry)) = table.iter_mut().enumerate().find(|(_, entry)| {
            entry
                .as_ref()
                .is_some_and(|registered| Arc::ptr_eq(registered, publisher))
        }) else {
            return false;
        };

        *entry = None;
        debug!(slot, "Unregistered publisher");
        true
    }

    /// Subscribe a subscriber to the ids in `mask`.
    ///
    /// If the subscriber is already registered the mask is added to the ids
    /// it already receives.
    ///
    /// # Panics
    ///
    /// Panics if the subscriber is new and every subscriber slot is in use.
    pub fn register_subscriber(&self, subscriber: &Arc<QueueSubscriber>, mask: IdMask) {
        if let Err(err) = self.try_register_subscriber(subscriber, mask) {
            error!(reason = err.as_label(), "Fatal dispatcher configuration error");
            panic!("{}", err);
        }
    }

    /// Subscribe a subscriber, returning an error instead of panicking when
    /// the table is full
    pub fn try_register_subscriber(
        &self,
        subscriber: &Arc<QueueSubscriber>,
        mask: IdMask,
    ) -> Result<(), RegistrationError> {
        let mut table = self.subscribers.lock();
        if let Some((slot, entry)) = Self::find_subscriber(&mut table, subscriber) {
            entry.mask |= mask;
            debug!(slot, mask = ?entry.mask, "Extended subscription");
            return Ok(());
        }

        let capacity = table.len();
        let Some((slot, free)) = table.iter_mut().enumerate().find(|(_, slot)| slot.is_none())
        else {
            return Err(RegistrationError::SubscriberTableFull { capacity });
        };

        *free = Some(SubscriberEntry {
            subscriber: subscriber.clone(),
            mask,
            errors: 0,
        });
        debug!(slot, mask = ?mask, "Registered subscriber");
        Ok(())
    }

    /// Unsubscribe a subscriber from the ids in `mask`.
    ///
    /// Passing [`IdMask::NONE`] removes the subscriber entirely (its filter
    /// and error counter included).  Any other mask only clears those ids
    /// from the subscriber's filter.  Returns whether the subscriber was
    /// registered.
    pub fn unregister_subscriber(&self, subscriber: &Arc<QueueSubscriber>, mask: IdMask) -> bool {
        let mut table = self.subscribers.lock();
        let Some((slot, entry)) = table.iter_mut().enumerate().find(|(_, entry)| {
            entry
                .as_ref()
                .is_some_and(|registered| Arc::ptr_eq(&registered.subscriber, subscriber))
        }) else {
            return false;
        };

        if mask.is_none() {
            *entry = None;
            debug!(slot, "Unregistered subscriber");
        } else if let Some(registered) = entry.as_mut() {
            registered.mask = registered.mask - mask;
            debug!(slot, mask = ?registered.mask, "Narrowed subscription");
        }
        true
    }

    /// Deliver a new reference to the notifier into every subscriber whose
    /// mask contains the notifier's id.
    ///
    /// A full subscriber queue drops that one delivery and counts it against
    /// the subscriber and the dispatcher, delivery to the remaining
    /// subscribers carries on.  Returns the number of successful
    /// deliveries.
    pub fn dispatch_notifier(&self, handle: &Handle) -> usize {
        self.fan_out(handle).delivered
    }

    fn fan_out(&self, handle: &Handle) -> DispatchSummary {
        let mut summary = DispatchSummary::default();
        let Some(notifier) = handle.get() else {
            return summary;
        };
        let id = notifier.id();
        summary.notifiers = 1;

        for slot in 0..self.config.max_subscribers {
            let target = {
                let table = self.subscribers.lock();
                match &table[slot] {
                    Some(entry) if entry.mask.contains(id) => entry.subscriber.clone(),
                    _ => continue,
                }
            };

            match target.deliver(handle.clone()) {
                Ok(()) => {
                    summary.delivered += 1;
                    trace!(id = ?id, slot, "Delivered notifier");
                }
                Err(rejected) => {
                    drop(rejected);
                    summary.dropped += 1;
                    let total = self.errors.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
                    let errors = self.count_subscriber_error(slot, &target);
                    warn!(
                        id = ?id,
                        slot,
                        errors,
                        total,
                        "Subscriber queue full, dropped notifier"
                    );
                }
            }
        }

        summary
    }

    /// Sweep every registered publisher once, fanning out at most one
    /// notifier from each.
    ///
    /// This never blocks.  Publishers are visited in slot order.
    pub fn dispatch(&self) -> DispatchSummary {
        let mut summary = DispatchSummary::default();

        for slot in 0..self.config.max_publishers {
            let publisher = {
                let table = self.publishers.lock();
                match &table[slot] {
                    Some(publisher) => publisher.clone(),
                    None => continue,
                }
            };

            if let Some(handle) = publisher.accept() {
                summary += self.fan_out(&handle);
                // The reference taken by the publisher is given back here
                drop(handle);
            }
        }

        summary
    }

    /// The ids a subscriber currently receives, if registered
    pub fn subscriber_mask(&self, subscriber: &Arc<QueueSubscriber>) -> Option<IdMask> {
        let mut table = self.subscribers.lock();
        Self::find_subscriber(&mut table, subscriber).map(|(_, entry)| entry.mask)
    }

    /// The deliveries dropped for a subscriber, if registered
    pub fn subscriber_errors(&self, subscriber: &Arc<QueueSubscriber>) -> Option<u32> {
        let mut table = self.subscribers.lock();
        Self::find_subscriber(&mut table, subscriber).map(|(_, entry)| entry.errors)
    }

    /// The deliveries dropped across every subscriber
    pub fn error_count(&self) -> u32 {
        self.errors.load(Ordering::Relaxed)
    }

    /// The number of registered publishers
    pub fn publisher_count(&self) -> usize {
        self.publishers.lock().iter().flatten().count()
    }

    /// The number of registered subscribers
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().iter().flatten().count()
    }

    /// A snapshot of the dispatcher's tables
    pub fn stats(&self) -> DispatcherStats {
        DispatcherStats {
            publishers: self.publisher_count(),
            subscribers: self.subscriber_count(),
            errors: self.error_count(),
            config: self.config,
        }
    }

    /// Bump the error counter of the subscriber in `slot`, provided it was
    /// not replaced while the delivery was attempted
    fn count_subscriber_error(&self, slot: usize, target: &Arc<QueueSubscriber>) -> u32 {
        let mut table = self.subscribers.lock();
        match table[slot].as_mut() {
            Some(entry) if Arc::ptr_eq(&entry.subscriber, target) => {
                entry.errors = entry.errors.wrapping_add(1);
                entry.errors
            }
            _ => 0,
        }
    }

    fn find_subscriber<'a>(
        table: &'a mut [Option<SubscriberEntry>],
        subscriber: &Arc<QueueSubscriber>,
    ) -> Option<(usize, &'a mut SubscriberEntry)> {
        table
            .iter_mut()
            .enumerate()
            .find_map(|(slot, entry)| match entry {
                Some(entry) if Arc::ptr_eq(&entry.subscriber, subscriber) => Some((slot, entry)),
                _ => None,
            })
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(DispatcherConfig::default())
    }
}
