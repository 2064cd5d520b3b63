//!
//! A Singular Scheduled Unit of Work.
//!
//! Every motion, display, clock, voice, battery or keypad service in the
//! robot is a Manager.  A Manager is run on its own thread by an executor
//! and is called every `get_update_delay_us` microseconds.  Between those
//! calls it typically blocks on its subscriber role (with a bounded timeout)
//! and/or posts notifiers through its publisher role.
//!

use core::fmt;

/// The default stack size given to a manager's thread
pub const DEFAULT_STACK_SIZE: usize = 64 * 1024;

/// The static scheduling priority of a manager.
///
/// Larger values are more urgent.  Executors start managers in descending
/// priority order and, when two managers are due at the same instant, update
/// the more urgent one first.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Priority(pub u8);

impl Priority {
    /// Background work
    pub const IDLE: Priority = Priority(0);
    /// Slow housekeeping managers
    pub const LOW: Priority = Priority(64);
    /// Most managers
    pub const NORMAL: Priority = Priority(128);
    /// Managers that react to user input or hardware events
    pub const HIGH: Priority = Priority(192);
    /// Reserved for the dispatcher pump
    pub const DISPATCH: Priority = Priority(u8::MAX);
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A Manager represents a singular scheduled service with some singular
/// purpose
pub trait Manager: Send {
    /// The name of the manager, also used as its thread name
    fn name(&self) -> &str;

    /// The static priority of the manager
    fn priority(&self) -> Priority {
        Priority::NORMAL
    }

    /// The stack size requested for the manager's thread
    fn stack_size(&self) -> usize {
        DEFAULT_STACK_SIZE
    }

    /// Return the manager's update period (in us)
    fn get_update_delay_us(&self) -> u128;

    /// Complete the necessary setup for the manager (usually registering
    /// its roles with the dispatcher).
    ///
    /// Note: this method is called by the executor before the first update.
    fn start(&mut self) {}

    /// Update is called by the executor every get_update_delay_us microseconds.
    ///
    /// This is the body of the manager's loop and may block on a bounded
    /// receive.
    fn update(&mut self);

    /// Called when the executor stops.  Managers should detach their roles
    /// from the dispatcher here.
    fn shutdown(&mut self) {}
}
