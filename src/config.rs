/*
 * Static configuration of one controller.
 *
 * Durations are given in milliseconds and turned into whole ticks of the
 * scheduler once, at construction. A duration that is not a multiple of the
 * tick period is rounded up, so no phase is ever shorter than asked for.
 */

use core::fmt;

use crate::handshake::{LinkPolarity, LinkRole};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    pub tick_ms: u32,
    pub green_ms: u32,
    pub yellow_ms: u32,
    pub red_ms: u32,
    pub pedestrian_hold_ms: u32,
    pub blink_half_period_ms: u32,
    pub pulse_width_ms: u32,
}

impl Timings {
    pub const DEFAULT: Timings = Timings {
        tick_ms: 10,
        green_ms: 3000,
        yellow_ms: 1000,
        red_ms: 4000,
        pedestrian_hold_ms: 6000,
        blink_half_period_ms: 500,
        pulse_width_ms: 150,
    };
}

impl Default for Timings {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerConfig {
    pub timings: Timings,
    pub night_mode: bool,
    pub pedestrian_priority: bool,
    pub link_role: LinkRole,
    pub link_polarity: LinkPolarity,
}

impl ControllerConfig {
    pub const DEFAULT: ControllerConfig = ControllerConfig {
        timings: Timings::DEFAULT,
        night_mode: true,
        pedestrian_priority: true,
        link_role: LinkRole::Standalone,
        link_polarity: LinkPolarity::ActiveLow,
    };

    pub fn validate(&self) -> Result<TickTimings, ConfigError> {
        TickTimings::from_millis(&self.timings)
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// The timings the traffic light actually runs on, counted in ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickTimings {
    pub tick_ms: u32,
    pub green: u32,
    pub yellow: u32,
    pub red: u32,
    pub pedestrian_hold: u32,
    pub blink_half_period: u32,
    pub pulse_width: u32,
}

impl TickTimings {
    fn from_millis(timings: &Timings) -> Result<Self, ConfigError> {
        if timings.tick_ms == 0 {
            return Err(ConfigError::ZeroTickPeriod);
        }

        let ticks = |field: TimingField, ms: u32| -> Result<u32, ConfigError> {
            if ms == 0 {
                Err(ConfigError::ZeroDuration(field))
            } else {
                Ok(ms.div_ceil(timings.tick_ms))
            }
        };

        let tick_timings = TickTimings {
            tick_ms: timings.tick_ms,
            green: ticks(TimingField::Green, timings.green_ms)?,
            yellow: ticks(TimingField::Yellow, timings.yellow_ms)?,
            red: ticks(TimingField::Red, timings.red_ms)?,
            pedestrian_hold: ticks(TimingField::PedestrianHold, timings.pedestrian_hold_ms)?,
            blink_half_period: ticks(TimingField::BlinkHalfPeriod, timings.blink_half_period_ms)?,
            pulse_width: ticks(TimingField::PulseWidth, timings.pulse_width_ms)?,
        };
        // A hold served for the peer runs one pulse width longer.
        if tick_timings.peer_hold().is_none() {
            return Err(ConfigError::DurationTooLong(TimingField::PedestrianHold));
        }
        Ok(tick_timings)
    }

    /// Length of the hold a responder runs for its peer, if it fits in a `u32`.
    pub fn peer_hold(&self) -> Option<u32> {
        self.pedestrian_hold.checked_add(self.pulse_width)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimingField {
    Green,
    Yellow,
    Red,
    PedestrianHold,
    BlinkHalfPeriod,
    PulseWidth,
}

impl TimingField {
    fn name(&self) -> &'static str {
        match self {
            TimingField::Green => "green",
            TimingField::Yellow => "yellow",
            TimingField::Red => "red",
            TimingField::PedestrianHold => "pedestrian hold",
            TimingField::BlinkHalfPeriod => "blink half period",
            TimingField::PulseWidth => "pulse width",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    ZeroTickPeriod,
    ZeroDuration(TimingField),
    DurationTooLong(TimingField),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroTickPeriod => write!(f, "tick period must be at least 1 ms"),
            ConfigError::ZeroDuration(field) => {
                write!(f, "{} duration must be at least 1 ms", field.name())
            }
            ConfigError::DurationTooLong(field) => {
                write!(f, "{} duration does not fit the tick counter", field.name())
            }
        }
    }
}
