//!
//! The Queue Subscriber
//!
//! A subscriber owns a single incoming queue that only the dispatcher
//! fills.  Which notifiers end up in it is decided by the id mask the
//! subscriber was registered with, not by the subscriber itself.
//!

use std::time::Duration;

use notifier_core::{Handle, Subscriber};

use crate::queue::{BoundedQueue, QueueFull};

/// The subscriber role of a manager
#[derive(Debug)]
pub struct QueueSubscriber {
    /// Handles delivered by the dispatcher
    queue: BoundedQueue<Handle>,
}

impl QueueSubscriber {
    /// Create a new subscriber whose incoming queue holds `capacity` handles
    ///
    /// # Panics
    ///
    /// Panics if the capacity is 0.
    pub fn new(capacity: usize) -> Self {
        Self {
            queue: BoundedQueue::new(capacity),
        }
    }

    /// Queue a delivered handle, at the front for priority notifiers
    pub(crate) fn deliver(&self, handle: Handle) -> Result<(), QueueFull<Handle>> {
        if handle.get().is_some_and(|notifier| notifier.is_priority()) {
            self.queue.send_front(handle)
        } else {
            self.queue.send(handle)
        }
    }

    /// Take the oldest delivered handle without waiting, or an empty handle
    pub fn try_receive(&self) -> Handle {
        self.queue.try_receive().unwrap_or_default()
    }

    /// The number of delivered handles not yet received
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Discard every delivered handle not yet received
    pub fn flush(&self) -> usize {
        self.queue.flush()
    }

    /// The capacity of the incoming queue
    pub fn capacity(&self) -> usize {
        self.queue.capacity()
    }
}

impl Subscriber for QueueSubscriber {
    type Target = Handle;

    /// Wait for the next delivered handle.
    ///
    /// Returns an empty handle if nothing arrived before the timeout.  The
    /// reference the dispatcher took on delivery moves to the caller.
    fn receive(&self, timeout: Option<Duration>) -> Handle {
        self.queue.receive(timeout).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;
    use std::thread;

    use notifier_core::{Handling, Notifier, NotifierId, ProducerId};

    #[test]
    fn test_receive_times_out_with_empty_handle() {
        let subscriber = QueueSubscriber::new(1);

        let handle = subscriber.receive(Some(Duration::from_millis(5)));
        assert!(handle.is_empty());
        assert!(subscriber.try_receive().is_empty());
    }

    #[test]
    #[should_panic(expected = "at least one item")]
    fn test_zero_capacity_subscriber_is_rejected() {
        QueueSubscriber::new(0);
    }

    #[test]
    fn test_receive_moves_the_delivered_reference() {
        let subscriber = QueueSubscriber::new(2);
        let original = Handle::new(Notifier::signal(NotifierId::VoiceCommand, ProducerId(4)));

        subscriber.deliver(original.clone()).unwrap();
        assert_eq!(original.ref_count(), 2);

        let received = subscriber.receive(None);
        assert!(received.ptr_eq(&original));
        assert_eq!(original.ref_count(), 2);

        drop(received);
        assert_eq!(original.ref_count(), 1);
    }

    #[test]
    fn test_priority_delivery_is_received_first() {
        let subscriber = QueueSubscriber::new(4);
        for _ in 0..2 {
            let odometry = Notifier::signal(NotifierId::Odometry, ProducerId(0));
            subscriber.deliver(Handle::new(odometry)).unwrap();
        }
        subscriber
            .deliver(Handle::new(Notifier::new(
                NotifierId::Shutdown,
                ProducerId(0),
                Handling::Priority,
                Default::default(),
            )))
            .unwrap();

        assert_eq!(subscriber.try_receive().id(), Some(NotifierId::Shutdown));
        assert_eq!(subscriber.try_receive().id(), Some(NotifierId::Odometry));
        assert_eq!(subscriber.try_receive().id(), Some(NotifierId::Odometry));
    }

    #[test]
    fn test_blocked_receiver_wakes_on_delivery() {
        let subscriber = Arc::new(QueueSubscriber::new(1));
        let receiver = subscriber.clone();

        let join = thread::spawn(move || receiver.receive(Some(Duration::from_secs(5))));

        thread::sleep(Duration::from_millis(10));
        let alarm = Notifier::signal(NotifierId::RtcAlarm, ProducerId(2));
        subscriber.deliver(Handle::new(alarm)).unwrap();

        let handle = join.join().unwrap();
        assert_eq!(handle.id(), Some(NotifierId::RtcAlarm));
    }
}
