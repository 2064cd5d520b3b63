//!
//! Notifier-Executors provides the executors (kind of like schedulers) that
//! run managers.
//!
//! The [`SimpleExecutor`] runs every manager cooperatively on the calling
//! thread, which is handy for tests and small tools.  The
//! [`ThreadedExecutor`] gives every manager its own named thread, the way
//! the robot firmware runs one task per manager.
//!

#![deny(missing_docs)]

pub mod simple_executor;
pub use simple_executor::SimpleExecutor;

pub mod threaded_executor;
pub use threaded_executor::ThreadedExecutor;

use std::cmp::{Ord, Ordering};

use notifier_core::{Manager, Priority};

/// The ManagerWrapper wraps managers giving them a place in the schedule
/// based on the timestamp of their next update.
///
/// This ensures that managers are updated at the correct time and that the
/// more urgent of two managers due at the same instant goes first.
pub(crate) struct ManagerWrapper {
    /// The timestamp of the manager's next update (in us since start)
    pub next_update: u128,
    /// The manager's static priority
    pub priority: Priority,
    /// The manager this ManagerWrapper is wrapping around
    pub manager: Box<dyn Manager>,
}

impl ManagerWrapper {
    pub fn new(manager: Box<dyn Manager>, next_update: u128) -> Self {
        Self {
            next_update,
            priority: manager.priority(),
            manager,
        }
    }
}

impl Ord for ManagerWrapper {
    fn cmp(&self, other: &Self) -> Ordering {
        self.next_update
            .cmp(&other.next_update)
            .reverse()
            .then(self.priority.cmp(&other.priority))
    }
}

impl PartialOrd for ManagerWrapper {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ManagerWrapper {
    fn eq(&self, other: &Self) -> bool {
        self.next_update == other.next_update && self.priority == other.priority
    }
}

impl Eq for ManagerWrapper {}

/// Binary search insertion into the sorted vector `vec`.
///
/// The most urgent manager is always at the back of the vector.
#[inline(always)]
pub(crate) fn insert_into(vec: &mut Vec<ManagerWrapper>, wrapper: ManagerWrapper) {
    // If another manager is found with the same schedule, insert the manager
    // after it.  Otherwise, insert the manager into the position it should be
    // in in the sorted vector
    match vec.binary_search(&wrapper) {
        Ok(idx) => vec.insert(idx + 1, wrapper),
        Err(idx) => vec.insert(idx, wrapper),
    }
}
