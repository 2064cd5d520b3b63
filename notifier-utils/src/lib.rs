//!
//! Utilities for Notifier Managers
//!
//! The main usage of this crate is for the small state machines that show
//! up over and over again in manager domain logic.  They are written once
//! here, parameterized by their thresholds, instead of being copied into
//! every manager that needs them.
//!

#![no_std]
#![deny(missing_docs)]

pub mod debounce;
pub use debounce::{DebounceState, Debouncer, Edge};

pub mod hysteresis;
pub use hysteresis::{Level, LevelMonitor, MonitorState, Thresholds};
