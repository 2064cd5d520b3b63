//!
//! The keypad manager scans a (simulated) key, debounces it and posts a
//! `Keypad` notifier for every settled edge plus a priority
//! `KeypadLongPress` notifier when the key is held.
//!

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::Rng;
use tracing::{debug, warn};

use notifier_core::{Handle, Handling, IdMask, Manager, Notifier, NotifierId, Priority, ProducerId};
use notifier_pubsub::{Dispatcher, Roles};
use notifier_utils::{Debouncer, Edge};

use crate::config::KeypadConfig;

/// The producer id of the keypad manager
pub const KEYPAD: ProducerId = ProducerId(1);

/// Something that reads the raw level of a key
pub trait KeySource: Send {
    /// Whether the key reads pressed right now
    fn sample(&mut self) -> bool;
}

/// A finger pressing the key at random with contact bounce on every scan
pub struct SimulatedKey {
    rng: StdRng,
    pressed: bool,
    remaining: u32,
    bounce: f64,
    longest_hold: u32,
}

impl SimulatedKey {
    /// Create a simulated key that sometimes holds for up to `longest_hold`
    /// scans
    pub fn new(rng: StdRng, bounce: f64, longest_hold: u32) -> Self {
        Self {
            rng,
            pressed: false,
            remaining: 0,
            bounce,
            longest_hold: longest_hold.max(11),
        }
    }
}

impl KeySource for SimulatedKey {
    fn sample(&mut self) -> bool {
        if self.remaining == 0 {
            self.pressed = !self.pressed;
            self.remaining = if self.pressed {
                self.rng.gen_range(10..self.longest_hold)
            } else {
                self.rng.gen_range(20..200)
            };
        }
        self.remaining -= 1;

        if self.rng.gen_bool(self.bounce) {
            !self.pressed
        } else {
            self.pressed
        }
    }
}

/// Debounces the key and publishes its edges
pub struct KeypadManager {
    roles: Roles,
    dispatcher: Arc<Dispatcher>,
    source: Box<dyn KeySource>,
    debouncer: Debouncer,
    period_us: u64,
    long_press_scans: u32,
    /// Scans since the key settled pressed
    held: u32,
}

impl KeypadManager {
    /// Create a new keypad manager reading from `source`
    pub fn new(
        config: &KeypadConfig,
        dispatcher: Arc<Dispatcher>,
        source: Box<dyn KeySource>,
    ) -> Self {
        Self {
            roles: Roles::publisher_only(config.queue),
            dispatcher,
            source,
            debouncer: Debouncer::new(config.debounce_samples),
            period_us: config.period_us,
            long_press_scans: config.long_press_scans,
            held: 0,
        }
    }

    fn post(&self, notifier: Notifier) {
        let id = notifier.id();
        if let Err(err) = self.roles.post(&Handle::new(notifier)) {
            warn!(id = ?id, error = %err, "Keypad notifier lost");
        }
    }
}

impl Manager for KeypadManager {
    fn name(&self) -> &str {
        "keypad"
    }

    fn priority(&self) -> Priority {
        Priority::HIGH
    }

    fn get_update_delay_us(&self) -> u128 {
        u128::from(self.period_us)
    }

    fn start(&mut self) {
        self.roles.attach(&self.dispatcher, IdMask::NONE);
        self.debouncer.reset();
        self.held = 0;
    }

    fn update(&mut self) {
        let raw = self.source.sample();
        match self.debouncer.update(raw) {
            Some(edge) => {
                debug!(edge = ?edge, "Key edge");
                self.held = 0;
                self.post(Notifier::with_value(
                    NotifierId::Keypad,
                    KEYPAD,
                    Handling::Normal,
                    edge,
                ));
            }
            None if self.debouncer.is_pressed() => {
                self.held = self.held.saturating_add(1);
                if self.held == self.long_press_scans {
                    self.post(Notifier::with_value(
                        NotifierId::KeypadLongPress,
                        KEYPAD,
                        Handling::Priority,
                        Edge::Pressed,
                    ));
                }
            }
            None => {}
        }
    }

    fn shutdown(&mut self) {
        self.roles.detach(&self.dispatcher);
    }
}
