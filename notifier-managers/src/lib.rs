//!
//! Commonly used managers that every robot built on the dispatcher needs.
//!

#![deny(missing_docs)]

pub mod dispatch_pump;
pub use dispatch_pump::DispatchPump;

pub mod error_reporter;
pub use error_reporter::{ErrorReport, ErrorReporter};
