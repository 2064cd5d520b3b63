//!
//! Manager Roles
//!
//! A manager is a publisher, a subscriber or both.  [`Roles`] holds whichever
//! of the two a manager was built with and registers or unregisters them
//! with a dispatcher in one call.
//!

use std::sync::Arc;
use std::time::Duration;

use notifier_core::{Handle, IdMask, Publisher, Subscriber};

use crate::dispatcher::Dispatcher;
use crate::error::PostError;
use crate::publisher::QueuePublisher;
use crate::subscriber::QueueSubscriber;

/// The publisher and/or subscriber roles of a manager
#[derive(Clone, Debug)]
pub struct Roles {
    /// The outgoing role, if the manager publishes
    publisher: Option<Arc<QueuePublisher>>,
    /// The incoming role, if the manager subscribes
    subscriber: Option<Arc<QueueSubscriber>>,
}

impl Roles {
    /// Roles for a manager that only publishes
    ///
    /// # Panics
    ///
    /// Panics if a queue capacity is 0.
    pub fn publisher_only(outgoing: usize) -> Self {
        Self {
            publisher: Some(Arc::new(QueuePublisher::new(outgoing))),
            subscriber: None,
        }
    }

    /// Roles for a manager that only subscribes
    ///
    /// # Panics
    ///
    /// Panics if a queue capacity is 0.
    pub fn subscriber_only(incoming: usize) -> Self {
        Self {
            publisher: None,
            subscriber: Some(Arc::new(QueueSubscriber::new(incoming))),
        }
    }

    /// Roles for a manager that both publishes and subscribes
    ///
    /// # Panics
    ///
    /// Panics if a queue capacity is 0.
    pub fn both(outgoing: usize, incoming: usize) -> Self {
        Self {
            publisher: Some(Arc::new(QueuePublisher::new(outgoing))),
            subscriber: Some(Arc::new(QueueSubscriber::new(incoming))),
        }
    }

    /// Register every role with the dispatcher.  The subscriber role is
    /// subscribed to the ids in `mask`.
    ///
    /// # Panics
    ///
    /// Panics if the dispatcher has no free slot for a role.
    pub fn attach(&self, dispatcher: &Dispatcher, mask: IdMask) {
        if let Some(publisher) = self.publisher.as_ref() {
            dispatcher.register_publisher(publisher);
        }
        if let Some(subscriber) = self.subscriber.as_ref() {
            dispatcher.register_subscriber(subscriber, mask);
        }
    }

    /// Unregister every role from the dispatcher
    pub fn detach(&self, dispatcher: &Dispatcher) {
        if let Some(publisher) = self.publisher.as_ref() {
            dispatcher.unregister_publisher(publisher);
        }
        if let Some(subscriber) = self.subscriber.as_ref() {
            dispatcher.unregister_subscriber(subscriber, IdMask::NONE);
        }
    }

    /// The publisher role
    pub fn publisher(&self) -> Option<&Arc<QueuePublisher>> {
        self.publisher.as_ref()
    }

    /// The subscriber role
    pub fn subscriber(&self) -> Option<&Arc<QueueSubscriber>> {
        self.subscriber.as_ref()
    }

    /// Post through the publisher role
    pub fn post(&self, handle: &Handle) -> Result<(), PostError> {
        match self.publisher.as_ref() {
            Some(publisher) => publisher.post(handle),
            None => Err(PostError::NoPublisher),
        }
    }

    /// Receive through the subscriber role.
    ///
    /// Roles without a subscriber always return an empty handle.
    pub fn receive(&self, timeout: Option<Duration>) -> Handle {
        match self.subscriber.as_ref() {
            Some(subscriber) => subscriber.receive(timeout),
            None => Handle::empty(),
        }
    }
}
