/*
 * Drives the traffic light at a fixed cadence.
 *
 * The scheduler itself does not know about time; whoever owns it calls
 * `tick()` once per tick period (on the board: an embassy `Ticker`, in tests:
 * a plain loop). The tick period bounds how long a latched event waits before
 * the traffic light sees it and means nothing else.
 */

use enum_ordinalize::Ordinalize;

use crate::config::{ConfigError, ControllerConfig};
use crate::events::Events;
use crate::signal::{Lamp, LampLevels};
use crate::trafficlight::TrafficLight;

/// What the outputs should show after a tick, applied as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub lamps: LampLevels,
    pub link_active: bool,
}

impl Frame {
    pub fn lamp(&self, lamp: Lamp) -> bool {
        self.lamps[lamp.ordinal()]
    }
}

#[derive(Debug)]
pub struct Scheduler<'a> {
    light: TrafficLight,
    events: &'a Events,
    ticks: u64,
}

impl<'a> Scheduler<'a> {
    pub fn new(config: ControllerConfig, events: &'a Events) -> Result<Self, ConfigError> {
        Ok(Scheduler {
            light: TrafficLight::new(config)?,
            events,
            ticks: 0,
        })
    }

    pub fn tick(&mut self) -> Frame {
        self.ticks += 1;
        self.light.tick(self.events);
        self.light.sample_outputs()
    }

    pub fn request_pedestrian_crossing(&mut self) -> bool {
        self.light.request_pedestrian_crossing()
    }

    pub fn light(&self) -> &TrafficLight {
        &self.light
    }

    pub fn tick_ms(&self) -> u32 {
        self.light.tick_ms()
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.ticks * self.tick_ms() as u64
    }
}
