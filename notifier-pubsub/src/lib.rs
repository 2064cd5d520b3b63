//!
//! Notifier Publishers, Subscribers and Dispatcher
//!
//! This crate contains the queue-backed publisher and subscriber roles a
//! manager is built from and the [`Dispatcher`] that fans notifiers out
//! from every registered publisher to every subscriber whose filter
//! matches.
//!
//! ```text
//!  manager --post--> QueuePublisher --dispatch()--> QueueSubscriber --receive--> manager
//!                          \_________ Dispatcher _________/
//! ```
//!

#![deny(missing_docs)]

pub mod queue;
pub use queue::{BoundedQueue, QueueFull};

pub mod error;
pub use error::{PostError, RegistrationError};

pub mod publisher;
pub use publisher::QueuePublisher;

pub mod subscriber;
pub use subscriber::QueueSubscriber;

pub mod dispatcher;
pub use dispatcher::{DispatchSummary, Dispatcher, DispatcherConfig, DispatcherStats};

pub mod roles;
pub use roles::Roles;
