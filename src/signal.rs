/*
 * The lamps of the crossing.
 *
 * The traffic light does not drive lamps directly. Instead it describes what
 * each lamp should do: on, off, or on but subject to the blink timer. The bank
 * turns those descriptors into actual on/off values once per tick. This way
 * the control logic can ask for "blink amber" once, when night mode starts,
 * and never has to wait around toggling lamps itself. It also means all
 * blinking lamps change state on exactly the same tick.
 *
 * Whether a lamp is wired active-high or active-low is none of our business;
 * the board I/O deals with that.
 */

use enum_ordinalize::Ordinalize;

#[derive(Ordinalize, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(usize)]
pub enum Lamp {
    VehicleRed,
    VehicleGreen,
    PedestrianRed,
    PedestrianGreen,
}

impl Lamp {
    pub fn role(&self) -> &'static str {
        match self {
            Lamp::VehicleRed => "vehicle-red",
            Lamp::VehicleGreen => "vehicle-green",
            Lamp::PedestrianRed => "pedestrian-red",
            Lamp::PedestrianGreen => "pedestrian-green",
        }
    }
}

pub type LampLevels = [bool; Lamp::VARIANT_COUNT];

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct LampDescriptor {
    on: bool,
    subject_to_blink: bool,
}

impl LampDescriptor {
    const fn off() -> Self {
        LampDescriptor {
            on: false,
            subject_to_blink: false,
        }
    }
}

#[derive(Debug)]
pub struct SignalBank {
    descriptors: [LampDescriptor; Lamp::VARIANT_COUNT],
    blink_half_period_ticks: u32,
    // Ticks spent in the current half of the blink period.
    tick_count: u32,
    blink_lit: bool,
}

impl SignalBank {
    pub const fn new(blink_half_period_ticks: u32) -> Self {
        SignalBank {
            descriptors: [LampDescriptor::off(); Lamp::VARIANT_COUNT],
            // A zero half period would make every blinking lamp steady on.
            blink_half_period_ticks: if blink_half_period_ticks == 0 {
                1
            } else {
                blink_half_period_ticks
            },
            tick_count: 0,
            blink_lit: false,
        }
    }

    /// Setting a lamp to the state it already has changes nothing.
    pub fn set(&mut self, lamp: Lamp, on: bool) {
        self.descriptors[lamp.ordinal()] = LampDescriptor {
            on,
            subject_to_blink: false,
        };
    }

    pub fn set_blinking(&mut self, lamp: Lamp) {
        self.descriptors[lamp.ordinal()] = LampDescriptor {
            on: true,
            subject_to_blink: true,
        };
    }

    pub fn all_off(&mut self) {
        self.descriptors = [LampDescriptor::off(); Lamp::VARIANT_COUNT];
    }

    /*
     * Start the blink cycle over, so that blinking starts with a full "off"
     * half of the period no matter when it was asked for.
     */
    pub fn restart_blink(&mut self) {
        self.tick_count = 0;
        self.blink_lit = false;
    }

    /// Whether the lamp is commanded on, ignoring the blink timer.
    pub fn lit(&self, lamp: Lamp) -> bool {
        self.descriptors[lamp.ordinal()].on
    }

    pub fn is_blinking(&self, lamp: Lamp) -> bool {
        self.descriptors[lamp.ordinal()].subject_to_blink
    }

    /*
     * In order to keep this module testable we keep all time functions
     * outside of it. The scheduler calls this exactly once per tick.
     */
    pub fn call_every_tick(&mut self) -> LampLevels {
        let blink_on = self.blink_lit;
        self.tick_count += 1;
        if self.tick_count == self.blink_half_period_ticks {
            self.tick_count = 0;
            self.blink_lit = !self.blink_lit;
        }

        let mut levels = [false; Lamp::VARIANT_COUNT];
        for (level, descriptor) in levels.iter_mut().zip(self.descriptors.iter()) {
            *level = descriptor.on && (!descriptor.subject_to_blink || blink_on);
        }
        levels
    }
}
