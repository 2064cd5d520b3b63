//!
//! The things almost every manager needs.
//!
//! ```rust
//! use notifier::prelude::*;
//! ```
//!

pub use notifier_core::{
    Executor, Handle, Handling, IdMask, Manager, Notifier, NotifierId, Payload, Priority,
    ProducerId, Publisher, Subscriber,
};
pub use notifier_executors::{SimpleExecutor, ThreadedExecutor};
pub use notifier_managers::{DispatchPump, ErrorReporter};
pub use notifier_pubsub::{Dispatcher, DispatcherConfig, PostError, Roles};
