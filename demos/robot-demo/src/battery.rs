//!
//! The battery manager samples the cell voltage, runs it through a level
//! monitor and posts a `BatteryState` notifier whenever the settled level
//! changes.  Going low is urgent, so that notifier jumps the queues.  The
//! raw reading is also posted as a `BatteryLevel` notifier every few
//! samples.
//!

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::Rng;
use tracing::{info, warn};

use notifier_core::{Handle, Handling, IdMask, Manager, Notifier, NotifierId, ProducerId};
use notifier_pubsub::{Dispatcher, Roles};
use notifier_utils::{Level, LevelMonitor, Thresholds};

use crate::config::BatteryConfig;

/// The producer id of the battery manager
pub const BATTERY: ProducerId = ProducerId(2);

/// Something that measures the cell voltage
pub trait CellSource: Send {
    /// The cell voltage in millivolts
    fn read_mv(&mut self) -> u16;
}

/// A cell that drains steadily and reads with some noise
pub struct SimulatedCell {
    rng: StdRng,
    millivolts: u16,
    drain_mv: u16,
    noise_mv: u16,
}

impl SimulatedCell {
    /// Create a simulated cell from the battery configuration
    pub fn new(rng: StdRng, config: &BatteryConfig) -> Self {
        Self {
            rng,
            millivolts: config.start_mv,
            drain_mv: config.drain_mv,
            noise_mv: config.noise_mv,
        }
    }
}

impl CellSource for SimulatedCell {
    fn read_mv(&mut self) -> u16 {
        self.millivolts = self.millivolts.saturating_sub(self.drain_mv);
        let noise = i32::from(self.noise_mv);
        let reading = i32::from(self.millivolts) + self.rng.gen_range(-noise..=noise);
        reading.clamp(0, i32::from(u16::MAX)) as u16
    }
}

/// Monitors the cell and publishes its level
pub struct BatteryManager {
    roles: Roles,
    dispatcher: Arc<Dispatcher>,
    source: Box<dyn CellSource>,
    monitor: LevelMonitor<u16>,
    period_us: u64,
    report_every: u32,
    /// Samples since the last raw level report
    since_report: u32,
}

impl BatteryManager {
    /// Create a new battery manager reading from `source`
    pub fn new(
        config: &BatteryConfig,
        dispatcher: Arc<Dispatcher>,
        source: Box<dyn CellSource>,
    ) -> Self {
        let thresholds = Thresholds {
            normal: config.normal_mv,
            warn: config.warn_mv,
            low: config.low_mv,
        };
        Self {
            roles: Roles::publisher_only(config.queue),
            dispatcher,
            source,
            monitor: LevelMonitor::new(thresholds, config.samples),
            period_us: config.period_us,
            report_every: config.report_every.max(1),
            since_report: 0,
        }
    }

    /// The current settled level
    pub fn level(&self) -> Level {
        self.monitor.level()
    }

    fn post(&self, notifier: Notifier) {
        let id = notifier.id();
        if let Err(err) = self.roles.post(&Handle::new(notifier)) {
            warn!(id = ?id, error = %err, "Battery notifier lost");
        }
    }
}

impl Manager for BatteryManager {
    fn name(&self) -> &str {
        "battery"
    }

    fn get_update_delay_us(&self) -> u128 {
        u128::from(self.period_us)
    }

    fn start(&mut self) {
        self.roles.attach(&self.dispatcher, IdMask::NONE);
        // Report the first reading straight away
        self.since_report = self.report_every - 1;
    }

    fn update(&mut self) {
        let millivolts = self.source.read_mv();

        if let Some(level) = self.monitor.update(millivolts) {
            info!(level = ?level, millivolts, "Battery level changed");
            let handling = if level == Level::Low {
                Handling::Priority
            } else {
                Handling::Normal
            };
            self.post(Notifier::with_value(
                NotifierId::BatteryState,
                BATTERY,
                handling,
                level,
            ));
        }

        self.since_report += 1;
        if self.since_report >= self.report_every {
            self.since_report = 0;
            match Notifier::with_bytes(
                NotifierId::BatteryLevel,
                BATTERY,
                Handling::Normal,
                &millivolts.to_le_bytes(),
            ) {
                Ok(notifier) => self.post(notifier),
                Err(err) => warn!(error = %err, "Unable to build battery level"),
            }
        }
    }

    fn shutdown(&mut self) {
        self.roles.detach(&self.dispatcher);
    }
}
