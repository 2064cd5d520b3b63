//!
//! The Dispatch Pump
//!
//! The pump is the manager that keeps notifiers moving.  It runs at the
//! highest priority and every update sweeps the dispatcher until the
//! publisher queues are drained (or a sweep limit is reached so a flood
//! from one publisher cannot monopolize the pump).
//!

use std::sync::Arc;

use tracing::{info, trace};

use notifier_core::{Manager, Priority};
use notifier_pubsub::{DispatchSummary, Dispatcher};

/// The default number of sweeps a single pump update may perform
pub const DEFAULT_MAX_SWEEPS: usize = 64;

/// A manager that periodically runs the dispatcher
pub struct DispatchPump {
    /// The dispatcher being pumped
    dispatcher: Arc<Dispatcher>,
    /// The pump period (in us)
    update_delay_us: u128,
    /// The most sweeps a single update may perform
    max_sweeps: usize,
    /// Everything moved since the pump was created
    totals: DispatchSummary,
}

impl DispatchPump {
    /// Create a pump that sweeps `dispatcher` every `update_delay_us`
    /// microseconds
    pub fn new(dispatcher: Arc<Dispatcher>, update_delay_us: u128) -> Self {
        Self {
            dispatcher,
            update_delay_us,
            max_sweeps: DEFAULT_MAX_SWEEPS,
            totals: DispatchSummary::default(),
        }
    }

    /// Limit the number of sweeps a single update may perform
    pub fn with_max_sweeps(mut self, max_sweeps: usize) -> Self {
        self.max_sweeps = max_sweeps.max(1);
        self
    }

    /// Everything the pump has moved so far
    pub fn totals(&self) -> DispatchSummary {
        self.totals
    }

    /// Sweep until the publishers are idle or the sweep limit is hit
    pub fn pump(&mut self) -> DispatchSummary {
        let mut moved = DispatchSummary::default();
        for _ in 0..self.max_sweeps {
            let sweep = self.dispatcher.dispatch();
            if sweep.is_idle() {
                break;
            }
            moved += sweep;
        }

        if !moved.is_idle() {
            trace!(
                notifiers = moved.notifiers,
                delivered = moved.delivered,
                dropped = moved.dropped,
                "Pumped notifiers"
            );
        }
        self.totals += moved;
        moved
    }
}

impl Manager for DispatchPump {
    fn name(&self) -> &str {
        "dispatch-pump"
    }

    fn priority(&self) -> Priority {
        Priority::DISPATCH
    }

    fn get_update_delay_us(&self) -> u128 {
        self.update_delay_us
    }

    fn update(&mut self) {
        self.pump();
    }

    fn shutdown(&mut self) {
        // Anything still posted is delivered before the pump goes away
        self.pump();
        info!(
            notifiers = self.totals.notifiers,
            delivered = self.totals.delivered,
            dropped = self.totals.dropped,
            "Dispatch pump stopped"
        );
    }
}
