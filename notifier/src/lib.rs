//!
//! # Notifier
//!
//! Notifier is a publish/subscribe middleware for robots whose firmware is
//! split into long running managers (motion, display, clock, voice,
//! battery, keypad, ...), each on its own thread.
//!
//! ## Technical Overview
//!
//! Managers never talk to each other directly.  A manager builds a
//! [`Notifier`](core::Notifier) (an id from the shared
//! [`NotifierId`](core::NotifierId) catalogue, a priority flag, the id of
//! its producer and a small payload), wraps it in a
//! [`Handle`](core::Handle) and posts it through its publisher role.  The
//! [`Dispatcher`](pubsub::Dispatcher) sweeps every publisher queue and
//! hands a new reference to the notifier to every subscriber whose
//! [`IdMask`](core::IdMask) contains the notifier's id.  The notifier is
//! freed when the last handle to it is dropped.
//!
//! ```text
//!  keypad --post--> [publisher queue] --dispatch()--> [subscriber queue] --receive--> display
//!                                           \--> [subscriber queue] --receive--> voice
//! ```
//!
//! ### Managers
//!
//! A manager implements [`Manager`](core::Manager): a name, a priority,
//! a stack size and an update period, plus the `start`, `update` and
//! `shutdown` states.  `start` is where a manager attaches its
//! [`Roles`](pubsub::Roles) to the dispatcher and `shutdown` is where it
//! detaches them.  `update` is called every update period and usually
//! blocks on a bounded `receive` and/or posts notifiers.
//!
//! ### Executors
//!
//! The [`ThreadedExecutor`](executors::ThreadedExecutor) gives every
//! manager its own named thread.  The
//! [`SimpleExecutor`](executors::SimpleExecutor) runs them all
//! cooperatively on a single thread.  Both stop when a `true` is sent over
//! their interrupt channel.
//!
//! ### The Pump
//!
//! Nothing moves until someone calls `dispatch`.  The
//! [`DispatchPump`](managers::DispatchPump) manager does that at the
//! highest priority, and the [`ErrorReporter`](managers::ErrorReporter)
//! logs subscribers whose queues overflow.
//!

pub mod prelude;

/// Notifier Core Types and Traits
pub use notifier_core as core;
/// Notifier Executors
pub use notifier_executors as executors;
/// Common Notifier Managers
pub use notifier_managers as managers;
/// Notifier Publishers, Subscribers and Dispatcher
pub use notifier_pubsub as pubsub;
/// Notifier Utility State Machines
pub use notifier_utils as utils;
