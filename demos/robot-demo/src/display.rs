//!
//! The display manager only subscribes.  It keeps what it was told about
//! the keypad and the battery and logs the screen whenever that changes.
//!

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use notifier_core::{Handle, IdMask, Manager, Notifier, NotifierId};
use notifier_pubsub::{Dispatcher, QueueSubscriber, Roles};
use notifier_utils::{Edge, Level};

use crate::config::DisplayConfig;

/// The ids the display shows
pub fn display_mask() -> IdMask {
    NotifierId::Keypad
        | NotifierId::KeypadLongPress
        | NotifierId::BatteryLevel
        | NotifierId::BatteryState
}

/// What the display currently shows
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Screen {
    /// Whether the key is held down
    pub key_down: bool,
    /// Key presses seen
    pub presses: u32,
    /// Long presses seen
    pub long_presses: u32,
    /// The last raw battery reading
    pub millivolts: Option<u16>,
    /// The last settled battery level
    pub battery: Option<Level>,
}

impl Screen {
    /// Apply one notifier, returning whether anything visible changed
    pub fn apply(&mut self, notifier: &Notifier) -> bool {
        let before = *self;
        match notifier.id() {
            NotifierId::Keypad => match notifier.value::<Edge>() {
                Some(Edge::Pressed) => {
                    self.key_down = true;
                    self.presses = self.presses.wrapping_add(1);
                }
                Some(Edge::Released) => self.key_down = false,
                None => {}
            },
            NotifierId::KeypadLongPress => self.long_presses = self.long_presses.wrapping_add(1),
            NotifierId::BatteryLevel => {
                if let Some(&[low, high]) = notifier.bytes() {
                    self.millivolts = Some(u16::from_le_bytes([low, high]));
                }
            }
            NotifierId::BatteryState => {
                if let Some(level) = notifier.value::<Level>() {
                    self.battery = Some(*level);
                }
            }
            other => debug!(id = ?other, "Ignoring notifier"),
        }
        *self != before
    }
}

/// Shows the keypad and battery state
pub struct DisplayManager {
    roles: Roles,
    dispatcher: Arc<Dispatcher>,
    period_us: u64,
    receive_timeout: Duration,
    screen: Screen,
}

impl DisplayManager {
    /// Create a new display manager
    pub fn new(config: &DisplayConfig, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            roles: Roles::subscriber_only(config.queue),
            dispatcher,
            period_us: config.period_us,
            receive_timeout: Duration::from_millis(config.receive_timeout_ms),
            screen: Screen::default(),
        }
    }

    /// What the display currently shows
    pub fn screen(&self) -> Screen {
        self.screen
    }

    /// The display's incoming queue
    pub fn subscriber(&self) -> Option<&Arc<QueueSubscriber>> {
        self.roles.subscriber()
    }

    fn show(&mut self, handle: Handle) -> bool {
        match handle.get() {
            Some(notifier) => self.screen.apply(notifier),
            None => false,
        }
    }
}

impl Manager for DisplayManager {
    fn name(&self) -> &str {
        "display"
    }

    fn get_update_delay_us(&self) -> u128 {
        u128::from(self.period_us)
    }

    fn start(&mut self) {
        self.roles.attach(&self.dispatcher, display_mask());
    }

    fn update(&mut self) {
        // Wait for the first notifier, then take whatever else is queued
        let first = self.roles.receive(Some(self.receive_timeout));
        let mut changed = self.show(first);
        if let Some(subscriber) = self.roles.subscriber().cloned() {
            loop {
                let handle = subscriber.try_receive();
                if handle.is_empty() {
                    break;
                }
                changed |= self.show(handle);
            }
        }

        if changed {
            let screen = self.screen;
            info!(
                key_down = screen.key_down,
                presses = screen.presses,
                long_presses = screen.long_presses,
                millivolts = ?screen.millivolts,
                battery = ?screen.battery,
                "Display refreshed"
            );
        }
    }

    fn shutdown(&mut self) {
        self.roles.detach(&self.dispatcher);
    }
}
