//!
//! Manager Scheduling
//!
//! An executor owns a set of managers, starts them, calls their `update`
//! whenever their period has elapsed and shuts them down once it is
//! interrupted.  notifier-executors provides a cooperative single-thread
//! executor and a thread-per-manager executor.
//!

use crate::manager::Manager;

/// Where an executor is in its start -> run -> stop cycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecutorState {
    /// No manager has been started (or every manager was shut down)
    Stopped,
    /// Every manager has been started but none is being updated yet
    Started,
    /// Managers are being updated
    Running,
}

/// Schedules a set of managers
pub trait Executor {
    /// Start every manager, highest priority first
    fn start(&mut self);

    /// Update the managers for `ms` milliseconds, then shut them down
    fn update_for_ms(&mut self, ms: u128);

    /// Update the managers until the interrupt fires, then shut them down
    fn update_loop(&mut self);

    /// Whether the executor has been interrupted
    fn check_interrupt(&mut self) -> bool;

    /// Add a manager to the executor
    fn add_manager(&mut self, manager: Box<dyn Manager>);

    /// The current state of the executor
    fn state(&self) -> ExecutorState;
}
