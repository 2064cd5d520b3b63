//!
//! The Notifier Id Catalogue
//!
//! Every notifier carries exactly one [`NotifierId`].  Subscribers select the
//! notifiers they are interested in with an [`IdMask`], a bitset over the
//! catalogue.  The two are kept as separate types so a single id can never be
//! mistaken for a filter (or the other way around); they only meet in
//! [`IdMask::contains`].
//!

use core::fmt;
use core::ops::{BitAnd, BitOr, BitOrAssign, Not, Sub};

/// The catalogue of notifier ids shared by every manager.
///
/// Each id occupies a fixed bit position in an [`IdMask`].  Bit 31 is reserved
/// for [`NotifierId::Request`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum NotifierId {
    /// A debounced key press or release
    Keypad = 0,
    /// A key held past the long-press time
    KeypadLongPress = 1,
    /// Periodic battery level sample
    BatteryLevel = 2,
    /// Settled battery state change (normal, warn, low)
    BatteryState = 3,
    /// Charger connected or disconnected
    ChargerState = 4,
    /// Real time clock tick
    RtcTick = 5,
    /// Real time clock alarm fired
    RtcAlarm = 6,
    /// Request to set the real time clock
    RtcSetTime = 7,
    /// A recognized voice command
    VoiceCommand = 8,
    /// Voice recognizer state change
    VoiceState = 9,
    /// Motion command for the drive train
    MotionCommand = 10,
    /// Motion state report from the drive train
    MotionState = 11,
    /// Obstacle detected by the range sensors
    Obstacle = 12,
    /// Request to redraw part of the display
    DisplayUpdate = 13,
    /// Display backlight level
    DisplayBacklight = 14,
    /// Menu navigation on the display
    DisplayMenu = 15,
    /// Sound or tone to play
    Sound = 16,
    /// Status LED pattern
    Led = 17,
    /// Watchdog kick or warning
    Watchdog = 18,
    /// Reason for the last reset
    ResetReason = 19,
    /// Diagnostic report
    Diagnostics = 20,
    /// Power mode change
    PowerMode = 21,
    /// System shutdown requested
    Shutdown = 22,
    /// Temperature sample
    Temperature = 23,
    /// Ambient light sample
    LightLevel = 24,
    /// Odometry update
    Odometry = 25,
    /// Heading update
    Heading = 26,
    /// A persisted setting changed
    Settings = 27,
    /// A manager reported an error
    Error = 28,
    /// Free for application use
    User0 = 29,
    /// Free for application use
    User1 = 30,
    /// Reserved request id
    Request = 31,
}

impl NotifierId {
    /// Every id in the catalogue, ordered by bit position
    pub const ALL: [NotifierId; 32] = [
        NotifierId::Keypad,
        NotifierId::KeypadLongPress,
        NotifierId::BatteryLevel,
        NotifierId::BatteryState,
        NotifierId::ChargerState,
        NotifierId::RtcTick,
        NotifierId::RtcAlarm,
        NotifierId::RtcSetTime,
        NotifierId::VoiceCommand,
        NotifierId::VoiceState,
        NotifierId::MotionCommand,
        NotifierId::MotionState,
        NotifierId::Obstacle,
        NotifierId::DisplayUpdate,
        NotifierId::DisplayBacklight,
        NotifierId::DisplayMenu,
        NotifierId::Sound,
        NotifierId::Led,
        NotifierId::Watchdog,
        NotifierId::ResetReason,
        NotifierId::Diagnostics,
        NotifierId::PowerMode,
        NotifierId::Shutdown,
        NotifierId::Temperature,
        NotifierId::LightLevel,
        NotifierId::Odometry,
        NotifierId::Heading,
        NotifierId::Settings,
        NotifierId::Error,
        NotifierId::User0,
        NotifierId::User1,
        NotifierId::Request,
    ];

    /// The bit position of this id
    pub const fn bit(self) -> u8 {
        self as u8
    }

    /// Look up the id occupying a given bit position
    pub fn from_bit(bit: u8) -> Option<Self> {
        Self::ALL.get(bit as usize).copied()
    }

    /// A mask selecting only this id
    pub const fn mask(self) -> IdMask {
        IdMask(1 << self as u32)
    }
}

impl fmt::Display for NotifierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// A subscription filter over the [`NotifierId`] catalogue.
///
/// [`IdMask::NONE`] doubles as the sentinel that removes a subscriber
/// entirely when passed to the dispatcher's unregister call.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct IdMask(u32);

impl IdMask {
    /// Selects nothing
    pub const NONE: IdMask = IdMask(0);
    /// Selects every id
    pub const ALL: IdMask = IdMask(u32::MAX);

    /// Build a mask from its raw bits
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// The raw bits of the mask
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Whether the mask selects nothing
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    /// Whether a notifier with the given id passes this filter
    pub const fn contains(self, id: NotifierId) -> bool {
        self.0 & id.mask().0 != 0
    }

    /// Whether the two masks share any id
    pub const fn intersects(self, other: IdMask) -> bool {
        self.0 & other.0 != 0
    }

    /// Add an id to the mask
    pub fn insert(&mut self, id: NotifierId) {
        self.0 |= id.mask().0;
    }

    /// Remove an id from the mask
    pub fn remove(&mut self, id: NotifierId) {
        self.0 &= !id.mask().0;
    }

    /// Iterate over the ids selected by this mask in bit order
    pub fn ids(self) -> impl Iterator<Item = NotifierId> {
        NotifierId::ALL
            .into_iter()
            .filter(move |id| self.contains(*id))
    }
}

impl fmt::Debug for IdMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.ids()).finish()
    }
}

impl From<NotifierId> for IdMask {
    fn from(id: NotifierId) -> Self {
        id.mask()
    }
}

impl FromIterator<NotifierId> for IdMask {
    fn from_iter<I: IntoIterator<Item = NotifierId>>(iter: I) -> Self {
        iter.into_iter().fold(IdMask::NONE, |mask, id| mask | id)
    }
}

impl BitOr for IdMask {
    type Output = IdMask;

    fn bitor(self, rhs: IdMask) -> IdMask {
        IdMask(self.0 | rhs.0)
    }
}

impl BitOr<NotifierId> for IdMask {
    type Output = IdMask;

    fn bitor(self, rhs: NotifierId) -> IdMask {
        self | rhs.mask()
    }
}

impl BitOr for NotifierId {
    type Output = IdMask;

    fn bitor(self, rhs: NotifierId) -> IdMask {
        self.mask() | rhs.mask()
    }
}

impl BitOrAssign for IdMask {
    fn bitor_assign(&mut self, rhs: IdMask) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for IdMask {
    type Output = IdMask;

    fn bitand(self, rhs: IdMask) -> IdMask {
        IdMask(self.0 & rhs.0)
    }
}

impl Sub for IdMask {
    type Output = IdMask;

    fn sub(self, rhs: IdMask) -> IdMask {
        IdMask(self.0 & !rhs.0)
    }
}

impl Not for IdMask {
    type Output = IdMask;

    fn not(self) -> IdMask {
        IdMask(!self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalogue_bit_positions() {
        for (bit, id) in NotifierId::ALL.iter().enumerate() {
            assert_eq!(id.bit() as usize, bit);
            assert_eq!(NotifierId::from_bit(bit as u8), Some(*id));
            assert_eq!(id.mask().bits().count_ones(), 1);
        }
        assert_eq!(NotifierId::from_bit(32), None);
        assert_eq!(NotifierId::Request.mask().bits(), 1 << 31);
    }

    #[test]
    fn test_mask_contains_only_selected_ids() {
        let mask = NotifierId::BatteryLevel | NotifierId::RtcTick;

        assert!(mask.contains(NotifierId::BatteryLevel));
        assert!(mask.contains(NotifierId::RtcTick));
        assert!(!mask.contains(NotifierId::Keypad));
        assert!(!IdMask::NONE.contains(NotifierId::Keypad));
        assert!(IdMask::ALL.contains(NotifierId::Request));
        assert_eq!(mask.bits(), 0b100100);
    }

    #[test]
    fn test_mask_insert_remove_and_subtract() {
        let mut mask = IdMask::NONE;
        mask.insert(NotifierId::Sound);
        mask.insert(NotifierId::Led);
        mask.remove(NotifierId::Sound);
        assert_eq!(mask, NotifierId::Led.mask());

        let both = NotifierId::Sound | NotifierId::Led;
        assert_eq!(both - NotifierId::Led.mask(), NotifierId::Sound.mask());
        assert!((both - both).is_none());
        assert!(both.intersects(mask));
    }

    #[test]
    fn test_mask_ids_iterates_in_bit_order() {
        let mask: IdMask = [NotifierId::Request, NotifierId::Keypad, NotifierId::Heading]
            .into_iter()
            .collect();

        let ids: Vec<NotifierId> = mask.ids().collect();
        assert_eq!(
            ids,
            vec![NotifierId::Keypad, NotifierId::Heading, NotifierId::Request]
        );
    }
}
