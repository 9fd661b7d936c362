/*
 * The phases of the crossing and the lamps each of them lights.
 *
 * The phase graph is closed and static: nothing is created or destroyed at
 * runtime, and every phase states exactly which lamps are on.
 */

use enum_ordinalize::Ordinalize;

use crate::config::TickTimings;
use crate::signal::Lamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    Green,
    Yellow,
    Red,
    AwaitAcknowledge,
    PedestrianHold,
    NightBlink,
}

pub const LAMPS_PER_PHASE: usize = Lamp::VARIANT_COUNT;

impl Phase {
    /*
     * The ordered (lamp, on) assignments. Yellow is shown as vehicle red and
     * green together; that is the only phase where both vehicle lamps light.
     * Night blink lists the lamps that blink.
     */
    pub fn assignments(&self) -> [(Lamp, bool); LAMPS_PER_PHASE] {
        let (vehicle_red, vehicle_green, pedestrian_red, pedestrian_green) = match self {
            Phase::Green => (false, true, true, false),
            Phase::Yellow => (true, true, true, false),
            Phase::Red => (true, false, false, true),
            Phase::AwaitAcknowledge => (true, false, true, false),
            Phase::PedestrianHold => (true, false, false, true),
            Phase::NightBlink => (true, true, false, false),
        };
        [
            (Lamp::VehicleRed, vehicle_red),
            (Lamp::VehicleGreen, vehicle_green),
            (Lamp::PedestrianRed, pedestrian_red),
            (Lamp::PedestrianGreen, pedestrian_green),
        ]
    }

    pub fn blinks(&self) -> bool {
        match self {
            Phase::NightBlink => true,
            Phase::Green
            | Phase::Yellow
            | Phase::Red
            | Phase::AwaitAcknowledge
            | Phase::PedestrianHold => false,
        }
    }

    /// `None` for phases that only end on an event.
    pub fn duration(&self, timings: &TickTimings) -> Option<u32> {
        match self {
            Phase::Green => Some(timings.green),
            Phase::Yellow => Some(timings.yellow),
            Phase::Red => Some(timings.red),
            Phase::PedestrianHold => Some(timings.pedestrian_hold),
            Phase::AwaitAcknowledge | Phase::NightBlink => None,
        }
    }

    /// Vehicles are held. Pedestrian requests are refused in these phases.
    pub fn is_red(&self) -> bool {
        match self {
            Phase::Red | Phase::AwaitAcknowledge | Phase::PedestrianHold => true,
            Phase::Green | Phase::Yellow | Phase::NightBlink => false,
        }
    }
}
