//!
//! Publisher -> Subscriber Communication
//!
//! Publishers push handles into their outgoing queue for the dispatcher
//! to fan out, subscribers pull the handles the dispatcher delivered to
//! them.  Neither side ever learns who is on the other end.
//!

use core::time::Duration;

/// The publisher role of a manager.
pub trait Publisher {
    /// The data posted by the publisher
    type Data;
    /// The error type from attempting to post data
    type Error;

    /// Post a piece of data for the dispatcher to fan out.
    ///
    /// This never blocks.
    fn post(&self, data: &Self::Data) -> Result<(), Self::Error>;
}

/// The subscriber role of a manager.
pub trait Subscriber {
    /// The type of data received by the subscriber
    type Target;

    /// Wait up to `timeout` (forever when `None`) for the next piece of
    /// data delivered to this subscriber.
    fn receive(&self, timeout: Option<Duration>) -> Self::Target;
}
