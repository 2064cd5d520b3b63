//!
//! The Notifier Message
//!
//! A notifier is the short, typed event managers exchange with one another.
//! Notifiers are never freed explicitly.  They are wrapped in a
//! [`Handle`](crate::Handle) as soon as they are built and live for as long as
//! any handle (held by the producer, a publisher queue or a subscriber queue)
//! still refers to them.
//!

use core::any::Any;
use core::fmt;

use thiserror::Error;

use crate::id::NotifierId;

/// The number of bytes an inline byte payload can hold
pub const PAYLOAD_CAPACITY: usize = 16;

/// The identity of the manager that produced a notifier.
///
/// This is purely informational, the dispatcher never routes on it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProducerId(pub u8);

impl fmt::Display for ProducerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "producer#{}", self.0)
    }
}

/// How a notifier should be placed in the queues it travels through
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Handling {
    /// Appended behind everything already queued
    #[default]
    Normal,
    /// Inserted at the front of the queue, ahead of everything already queued
    Priority,
}

/// An error from building a payload
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum PayloadError {
    /// The bytes given do not fit in an inline payload
    #[error(
        "payload of {len} bytes exceeds the inline capacity of {} bytes",
        PAYLOAD_CAPACITY
    )]
    TooLarge {
        /// The number of bytes that were offered
        len: usize,
    },
}

/// The data carried by a notifier.
///
/// Both shapes are only storage strategies, identity and lifetime of the
/// notifier are the same whichever one is used.
#[derive(Default)]
pub enum Payload {
    /// No data beyond the id itself
    #[default]
    Empty,
    /// A fixed-size inline byte block
    Bytes {
        /// The backing storage
        data: [u8; PAYLOAD_CAPACITY],
        /// The number of bytes of `data` in use
        len: u8,
    },
    /// A single typed value
    Value(Box<dyn Any + Send + Sync>),
}

impl Payload {
    /// Copy the given bytes into an inline payload
    pub fn bytes(bytes: &[u8]) -> Result<Self, PayloadError> {
        if bytes.len() > PAYLOAD_CAPACITY {
            return Err(PayloadError::TooLarge { len: bytes.len() });
        }

        let mut data = [0u8; PAYLOAD_CAPACITY];
        data[..bytes.len()].copy_from_slice(bytes);
        Ok(Payload::Bytes {
            data,
            len: bytes.len() as u8,
        })
    }

    /// Store a single typed value
    pub fn value<T: Any + Send + Sync>(value: T) -> Self {
        Payload::Value(Box::new(value))
    }

    /// The inline bytes, if this is a byte payload
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Payload::Bytes { data, len } => Some(&data[..*len as usize]),
            _ => None,
        }
    }

    /// The typed value, if this payload holds a value of type `T`
    pub fn as_value<T: Any>(&self) -> Option<&T> {
        match self {
            Payload::Value(value) => value.downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Whether the payload carries nothing
    pub fn is_empty(&self) -> bool {
        matches!(self, Payload::Empty)
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Empty => f.write_str("Empty"),
            Payload::Bytes { data, len } => f
                .debug_tuple("Bytes")
                .field(&&data[..*len as usize])
                .finish(),
            Payload::Value(_) => f.write_str("Value(..)"),
        }
    }
}

/// A typed message exchanged between managers.
#[derive(Debug)]
pub struct Notifier {
    /// The id the dispatcher routes on
    id: NotifierId,
    /// Where the notifier is placed in queues
    handling: Handling,
    /// The manager that built the notifier
    producer: ProducerId,
    /// The data carried by the notifier
    payload: Payload,
}

impl Notifier {
    /// Create a new notifier
    pub fn new(id: NotifierId, producer: ProducerId, handling: Handling, payload: Payload) -> Self {
        Self {
            id,
            handling,
            producer,
            payload,
        }
    }

    /// Create a notifier that carries nothing but its id
    pub fn signal(id: NotifierId, producer: ProducerId) -> Self {
        Self::new(id, producer, Handling::Normal, Payload::Empty)
    }

    /// Create a notifier carrying a copy of `bytes` inline
    pub fn with_bytes(
        id: NotifierId,
        producer: ProducerId,
        handling: Handling,
        bytes: &[u8],
    ) -> Result<Self, PayloadError> {
        Ok(Self::new(id, producer, handling, Payload::bytes(bytes)?))
    }

    /// Create a notifier carrying a single typed value
    pub fn with_value<T: Any + Send + Sync>(
        id: NotifierId,
        producer: ProducerId,
        handling: Handling,
        value: T,
    ) -> Self {
        Self::new(id, producer, handling, Payload::value(value))
    }

    /// The id of the notifier
    pub fn id(&self) -> NotifierId {
        self.id
    }

    /// How the notifier is placed in queues
    pub fn handling(&self) -> Handling {
        self.handling
    }

    /// Whether the notifier jumps to the front of queues
    pub fn is_priority(&self) -> bool {
        self.handling == Handling::Priority
    }

    /// The manager that produced the notifier
    pub fn producer_id(&self) -> ProducerId {
        self.producer
    }

    /// The data carried by the notifier
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Replace the payload with a single typed value
    pub fn set_value<T: Any + Send + Sync>(&mut self, value: T) {
        self.payload = Payload::value(value);
    }

    /// The typed value carried by the notifier, if it is a `T`
    pub fn value<T: Any>(&self) -> Option<&T> {
        self.payload.as_value()
    }

    /// The inline bytes carried by the notifier
    pub fn bytes(&self) -> Option<&[u8]> {
        self.payload.as_bytes()
    }
}
