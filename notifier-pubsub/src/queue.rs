//!
//! The Bounded Mailbox
//!
//! Every publisher and subscriber owns exactly one [`BoundedQueue`].  The
//! queue has a fixed capacity, insertion never blocks (a full queue hands
//! the item straight back) and removal can wait for an item with an
//! optional timeout.  Items can be inserted at the back for normal
//! delivery or at the front for priority delivery.
//!

use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use thiserror::Error;

/// The item that could not be inserted because the queue was full
#[derive(Clone, Copy, PartialEq, Eq, Error)]
#[error("sending on a full queue")]
pub struct QueueFull<T>(pub T);

impl<T> QueueFull<T> {
    /// Take back the rejected item
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Debug for QueueFull<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("QueueFull(..)")
    }
}

/// A fixed-capacity blocking queue with front and back insertion
pub struct BoundedQueue<T> {
    /// The queued items, front first
    items: Mutex<VecDeque<T>>,
    /// Signalled whenever an item is inserted
    available: Condvar,
    /// The maximum number of queued items
    capacity: usize,
}

impl<T> BoundedQueue<T> {
    /// Create a new empty queue holding at most `capacity` items
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "A queue must be able to hold at least one item");
        Self {
            items: Mutex::new(VecDeque::with_capacity(capacity)),
            available: Condvar::new(),
            capacity,
        }
    }

    /// Append an item behind everything already queued
    pub fn send(&self, item: T) -> Result<(), QueueFull<T>> {
        self.insert(item, false)
    }

    /// Insert an item ahead of everything already queued
    pub fn send_front(&self, item: T) -> Result<(), QueueFull<T>> {
        self.insert(item, true)
    }

    fn insert(&self, item: T, front: bool) -> Result<(), QueueFull<T>> {
        let mut items = self.items.lock();
        if items.len() >= self.capacity {
            return Err(QueueFull(item));
        }

        if front {
            items.push_front(item);
        } else {
            items.push_back(item);
        }
        drop(items);

        self.available.notify_one();
        Ok(())
    }

    /// Take the front item without waiting
    pub fn try_receive(&self) -> Option<T> {
        self.items.lock().pop_front()
    }

    /// Take the front item, waiting up to `timeout` for one to arrive.
    ///
    /// A `None` timeout waits forever.
    pub fn receive(&self, timeout: Option<Duration>) -> Option<T> {
        let deadline = timeout.and_then(|timeout| Instant::now().checked_add(timeout));
        let mut items = self.items.lock();

        loop {
            if let Some(item) = items.pop_front() {
                return Some(item);
            }

            match deadline {
                Some(deadline) => {
                    if self.available.wait_until(&mut items, deadline).timed_out() {
                        return items.pop_front();
                    }
                }
                // No timeout, or one too long to fit in an Instant
                None => self.available.wait(&mut items),
            }
        }
    }

    /// Discard every queued item, returning how many were discarded
    pub fn flush(&self) -> usize {
        let drained = std::mem::take(&mut *self.items.lock());
        drained.len()
    }

    /// The number of queued items
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    /// Whether nothing is queued
    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    /// Whether another insertion would fail
    pub fn is_full(&self) -> bool {
        self.items.lock().len() >= self.capacity
    }

    /// The maximum number of queued items
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<T> fmt::Debug for BoundedQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedQueue")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_fifo_order() {
        let queue = BoundedQueue::new(4);
        for i in 0..4 {
            queue.send(i).unwrap();
        }

        assert_eq!(queue.len(), 4);
        for i in 0..4 {
            assert_eq!(queue.try_receive(), Some(i));
        }
        assert_eq!(queue.try_receive(), None);
    }

    #[test]
    #[should_panic(expected = "at least one item")]
    fn test_zero_capacity_is_rejected() {
        let _queue: BoundedQueue<u8> = BoundedQueue::new(0);
    }

    #[test]
    fn test_full_error_describes_itself() {
        let queue = BoundedQueue::new(1);
        queue.send(1u8).unwrap();

        let err = queue.send(2).unwrap_err();
        assert_eq!(err.to_string(), "sending on a full queue");
        assert_eq!(format!("{:?}", err), "QueueFull(..)");
    }

    #[test]
    fn test_send_front_jumps_the_queue() {
        let queue = BoundedQueue::new(4);
        queue.send(1).unwrap();
        queue.send(2).unwrap();
        queue.send_front(0).unwrap();

        assert_eq!(queue.try_receive(), Some(0));
        assert_eq!(queue.try_receive(), Some(1));
        assert_eq!(queue.try_receive(), Some(2));
    }

    #[test]
    fn test_full_queue_rejects_without_blocking() {
        let queue = BoundedQueue::new(2);
        queue.send("a").unwrap();
        queue.send("b").unwrap();

        assert!(queue.is_full());
        assert_eq!(queue.send("c").unwrap_err().into_inner(), "c");
        assert_eq!(queue.send_front("d").unwrap_err().into_inner(), "d");
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_receive_times_out() {
        let queue: BoundedQueue<u8> = BoundedQueue::new(1);

        let start = Instant::now();
        assert_eq!(queue.receive(Some(Duration::from_millis(20))), None);
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_receive_wakes_on_send() {
        let queue = Arc::new(BoundedQueue::new(1));
        let sender = queue.clone();

        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            sender.send(7u32).unwrap();
        });

        assert_eq!(queue.receive(None), Some(7));
        handle.join().unwrap();
    }

    #[test]
    fn test_flush_discards_everything() {
        let queue = BoundedQueue::new(3);
        queue.send(1).unwrap();
        queue.send(2).unwrap();

        assert_eq!(queue.flush(), 2);
        assert!(queue.is_empty());
        assert_eq!(queue.flush(), 0);
        queue.send(3).unwrap();
        assert_eq!(queue.try_receive(), Some(3));
    }
}
