//!
//! Threshold Hysteresis for Noisy Levels
//!
//! Battery voltage, temperature and light sensors are all noisy analog
//! levels compared against a `normal > warn > low` set of thresholds.  The
//! [`LevelMonitor`] is a seven state machine that only reports a new
//! [`Level`] once the reading has stayed on the other side of a threshold
//! for a number of consecutive samples.  Leaving `Warn` upwards requires
//! climbing back over the (higher) `normal` threshold, which keeps a reading
//! sitting right at `warn` from chattering.
//!

/// The settled level of a monitored reading
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Level {
    /// The reading is healthy
    Normal,
    /// The reading dropped below the warn threshold
    Warn,
    /// The reading dropped below the low threshold
    Low,
}

/// The seven states of the monitor
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MonitorState {
    /// Settled normal
    Normal,
    /// Normal, but the reading is below warn
    NormalToWarn,
    /// Settled warn
    Warn,
    /// Warn, but the reading is below low
    WarnToLow,
    /// Settled low
    Low,
    /// Low, but the reading is back above warn
    LowToWarn,
    /// Warn, but the reading is back above normal
    WarnToNormal,
}

impl MonitorState {
    /// The settled level this state belongs to
    pub fn level(self) -> Level {
        match self {
            MonitorState::Normal | MonitorState::NormalToWarn => Level::Normal,
            MonitorState::Warn | MonitorState::WarnToLow | MonitorState::WarnToNormal => {
                Level::Warn
            }
            MonitorState::Low | MonitorState::LowToWarn => Level::Low,
        }
    }

    fn settled(level: Level) -> Self {
        match level {
            Level::Normal => MonitorState::Normal,
            Level::Warn => MonitorState::Warn,
            Level::Low => MonitorState::Low,
        }
    }
}

/// The thresholds a reading is compared against.
///
/// They are expected to satisfy `normal > warn > low`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Thresholds<T> {
    /// A warn reading at or above this settles back to normal
    pub normal: T,
    /// A normal reading below this settles to warn, a low reading at or
    /// above this settles back to warn
    pub warn: T,
    /// A warn reading below this settles to low
    pub low: T,
}

/// Monitors a noisy reading against a set of [`Thresholds`]
#[derive(Clone, Debug)]
pub struct LevelMonitor<T> {
    /// The thresholds readings are compared against
    thresholds: Thresholds<T>,
    /// Consecutive samples required to settle a new level
    samples: u16,
    /// The current state of the machine
    state: MonitorState,
    /// Consecutive samples seen in the current waiting state
    count: u16,
}

impl<T: PartialOrd + Copy> LevelMonitor<T> {
    /// Create a monitor that starts settled at [`Level::Normal`]
    pub fn new(thresholds: Thresholds<T>, samples: u16) -> Self {
        Self::with_level(thresholds, samples, Level::Normal)
    }

    /// Create a monitor that starts settled at the given level
    pub fn with_level(thresholds: Thresholds<T>, samples: u16, level: Level) -> Self {
        Self {
            thresholds,
            samples: samples.max(1),
            state: MonitorState::settled(level),
            count: 0,
        }
    }

    /// The current state of the machine
    pub fn state(&self) -> MonitorState {
        self.state
    }

    /// The current settled level
    pub fn level(&self) -> Level {
        self.state.level()
    }

    /// The thresholds in use
    pub fn thresholds(&self) -> &Thresholds<T> {
        &self.thresholds
    }

    /// Feed one reading, returning the newly settled level (if any)
    pub fn update(&mut self, reading: T) -> Option<Level> {
        let thresholds = self.thresholds;
        match self.state {
            MonitorState::Normal if reading < thresholds.warn => {
                self.wait(MonitorState::NormalToWarn, Level::Warn)
            }
            MonitorState::NormalToWarn if reading < thresholds.warn => {
                self.count_toward(Level::Warn)
            }
            MonitorState::NormalToWarn => self.fall_back(MonitorState::Normal),
            MonitorState::Warn if reading < thresholds.low => {
                self.wait(MonitorState::WarnToLow, Level::Low)
            }
            MonitorState::Warn if reading >= thresholds.normal => {
                self.wait(MonitorState::WarnToNormal, Level::Normal)
            }
            MonitorState::WarnToLow if reading < thresholds.low => self.count_toward(Level::Low),
            MonitorState::WarnToLow => self.fall_back(MonitorState::Warn),
            MonitorState::WarnToNormal if reading >= thresholds.normal => {
                self.count_toward(Level::Normal)
            }
            MonitorState::WarnToNormal => self.fall_back(MonitorState::Warn),
            MonitorState::Low if reading >= thresholds.warn => {
                self.wait(MonitorState::LowToWarn, Level::Warn)
            }
            MonitorState::LowToWarn if reading >= thresholds.warn => self.count_toward(Level::Warn),
            MonitorState::LowToWarn => self.fall_back(MonitorState::Low),
            MonitorState::Normal | MonitorState::Warn | MonitorState::Low => None,
        }
    }

    /// Enter a waiting state with the first out-of-band sample counted
    fn wait(&mut self, waiting: MonitorState, target: Level) -> Option<Level> {
        self.state = waiting;
        self.count = 0;
        self.count_toward(target)
    }

    /// Count one more out-of-band sample, settling once enough were seen
    fn count_toward(&mut self, target: Level) -> Option<Level> {
        self.count = self.count.saturating_add(1);
        if self.count < self.samples {
            return None;
        }

        self.state = MonitorState::settled(target);
        self.count = 0;
        Some(target)
    }

    /// The reading returned in band before settling
    fn fall_back(&mut self, settled: MonitorState) -> Option<Level> {
        self.state = settled;
        self.count = 0;
        None
    }
}
