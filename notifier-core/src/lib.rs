//!
//! Notifier-Core is a collection of the types and traits that layout the
//! core of the notifier middleware.
//!
//! Every manager in the system agrees on the catalogue of [`NotifierId`]s
//! defined here, builds [`Notifier`]s carrying one of them and shares
//! those notifiers through counted [`Handle`]s.
//!

#![deny(unsafe_code)]
#![deny(missing_docs)]

pub mod id;
pub use id::{IdMask, NotifierId};

pub mod notifier;
pub use notifier::{Handling, Notifier, Payload, PayloadError, ProducerId, PAYLOAD_CAPACITY};

pub mod handle;
pub use handle::Handle;

pub mod manager;
pub use manager::{Manager, Priority, DEFAULT_STACK_SIZE};

pub mod executor;
pub use executor::{Executor, ExecutorState};

pub mod publisher_subscriber;
pub use publisher_subscriber::{Publisher, Subscriber};
