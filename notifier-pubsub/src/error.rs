//!
//! Errors returned by the publisher role and the dispatcher.
//!
//! Delivery failures inside the dispatcher are not errors at all from the
//! caller's point of view: they are absorbed and counted (see
//! [`Dispatcher::subscriber_errors`](crate::Dispatcher::subscriber_errors)).
//!

use thiserror::Error;

use notifier_core::NotifierId;

/// An error from posting a handle through a publisher
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum PostError {
    /// The handle refers to no notifier
    #[error("cannot post an empty handle")]
    EmptyHandle,
    /// The manager was built without a publisher role
    #[error("manager has no publisher role")]
    NoPublisher,
    /// The publisher's outgoing queue is full
    #[error("publisher queue is full, {id} notifier was not posted")]
    QueueFull {
        /// The id of the notifier that was not posted
        id: NotifierId,
    },
}

/// An error from registering a role with the dispatcher.
///
/// Running out of table slots means the dispatcher was sized too small for
/// the managers in the system, so the panicking registration functions
/// treat it as fatal.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum RegistrationError {
    /// Every publisher slot is in use
    #[error("publisher table is full ({capacity} slots)")]
    PublisherTableFull {
        /// The capacity of the table
        capacity: usize,
    },
    /// Every subscriber slot is in use
    #[error("subscriber table is full ({capacity} slots)")]
    SubscriberTableFull {
        /// The capacity of the table
        capacity: usize,
    },
}

impl RegistrationError {
    /// Returns a short stable label for use in logs
    pub fn as_label(&self) -> &'static str {
        match self {
            RegistrationError::PublisherTableFull { .. } => "publisher_table_full",
            RegistrationError::SubscriberTableFull { .. } => "subscriber_table_full",
        }
    }
}
