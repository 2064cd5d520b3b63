//!
//! The Queue Publisher
//!
//! A publisher owns a single outgoing queue.  Posting takes a new reference
//! to the notifier and places it in that queue where it waits for the
//! dispatcher's next sweep.
//!

use tracing::trace;

use notifier_core::{Handle, Publisher};

use crate::error::PostError;
use crate::queue::BoundedQueue;

/// The publisher role of a manager
#[derive(Debug)]
pub struct QueuePublisher {
    /// Handles waiting to be fanned out by the dispatcher
    queue: BoundedQueue<Handle>,
}

impl QueuePublisher {
    /// Create a new publisher whose outgoing queue holds `capacity` handles
    ///
    /// # Panics
    ///
    /// Panics if the capacity is 0.
    pub fn new(capacity: usize) -> Self {
        Self {
            queue: BoundedQueue::new(capacity),
        }
    }

    /// Take the oldest posted handle without waiting.
    ///
    /// The reference taken by `post` moves to the caller.
    pub fn accept(&self) -> Option<Handle> {
        self.queue.try_receive()
    }

    /// The number of handles waiting for the dispatcher
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Discard every handle still waiting for the dispatcher
    pub fn flush(&self) -> usize {
        self.queue.flush()
    }

    /// The capacity of the outgoing queue
    pub fn capacity(&self) -> usize {
        self.queue.capacity()
    }
}

impl Publisher for QueuePublisher {
    type Data = Handle;
    type Error = PostError;

    /// Post a handle for the dispatcher to fan out.
    ///
    /// Priority notifiers are inserted at the front of the outgoing queue.
    /// When the queue is full the reference taken for the queue is given
    /// back before returning the error.
    fn post(&self, handle: &Handle) -> Result<(), PostError> {
        let Some(notifier) = handle.get() else {
            return Err(PostError::EmptyHandle);
        };
        let id = notifier.id();

        let reference = handle.clone();
        let sent = if notifier.is_priority() {
            self.queue.send_front(reference)
        } else {
            self.queue.send(reference)
        };

        match sent {
            Ok(()) => {
                trace!(id = ?id, pending = self.queue.len(), "Posted notifier");
                Ok(())
            }
            Err(_rejected) => Err(PostError::QueueFull { id }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use notifier_core::{Handling, Notifier, NotifierId, ProducerId};

    fn handle(id: NotifierId, handling: Handling) -> Handle {
        Handle::new(Notifier::with_value(id, ProducerId(1), handling, 0u8))
    }

    #[test]
    fn test_post_takes_a_reference() {
        let publisher = QueuePublisher::new(2);
        let handle = handle(NotifierId::Keypad, Handling::Normal);

        publisher.post(&handle).unwrap();
        assert_eq!(handle.ref_count(), 2);
        assert_eq!(publisher.pending(), 1);

        let accepted = publisher.accept().unwrap();
        assert!(accepted.ptr_eq(&handle));
        drop(accepted);
        assert_eq!(handle.ref_count(), 1);
    }

    #[test]
    #[should_panic(expected = "at least one item")]
    fn test_zero_capacity_publisher_is_rejected() {
        QueuePublisher::new(0);
    }

    #[test]
    fn test_post_empty_handle_has_no_effect() {
        let publisher = QueuePublisher::new(2);

        assert_eq!(
            publisher.post(&Handle::empty()),
            Err(PostError::EmptyHandle)
        );
        assert_eq!(publisher.pending(), 0);
    }

    #[test]
    fn test_post_to_full_queue_gives_reference_back() {
        let publisher = QueuePublisher::new(1);
        let first = handle(NotifierId::RtcTick, Handling::Normal);
        let second = handle(NotifierId::RtcAlarm, Handling::Priority);

        publisher.post(&first).unwrap();
        assert_eq!(
            publisher.post(&second),
            Err(PostError::QueueFull {
                id: NotifierId::RtcAlarm
            })
        );
        assert_eq!(second.ref_count(), 1);
        assert_eq!(publisher.pending(), 1);
    }

    #[test]
    fn test_priority_post_is_accepted_first() {
        let publisher = QueuePublisher::new(4);
        let normal = handle(NotifierId::MotionState, Handling::Normal);
        let urgent = handle(NotifierId::Obstacle, Handling::Priority);

        publisher.post(&normal).unwrap();
        publisher.post(&urgent).unwrap();

        assert_eq!(publisher.accept().unwrap().id(), Some(NotifierId::Obstacle));
        assert_eq!(
            publisher.accept().unwrap().id(),
            Some(NotifierId::MotionState)
        );
        assert!(publisher.accept().is_none());
    }

    #[test]
    fn test_flush_releases_posted_references() {
        let publisher = QueuePublisher::new(4);
        let handle = handle(NotifierId::Led, Handling::Normal);

        publisher.post(&handle).unwrap();
        publisher.post(&handle).unwrap();
        assert_eq!(handle.ref_count(), 3);

        assert_eq!(publisher.flush(), 2);
        assert_eq!(handle.ref_count(), 1);
    }
}
