/*
 * The link between two boards.
 *
 * Each board drives one line and watches the line of its neighbour. There is
 * no shared memory and no common clock, so everything is said with pulses: the
 * initiator holds its line active for a fixed width to ask the responder to
 * stop its traffic, and the responder, once it has done so, answers with a
 * pulse of the same width.
 *
 * Watching the peer's line is done by `Events::remote_edge`, which turns a
 * rising edge into a single latched event. This module only owns the local
 * output side.
 *
 * Both boards must agree on what "idle" and "active" look like on the wire.
 * That is fixed at build time, it is never negotiated.
 */

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkRole {
    /// No neighbour; edges on the link input are ignored.
    Standalone,
    /// Asks the neighbour to stop before serving pedestrians.
    Initiator,
    /// Stops when asked and acknowledges.
    Responder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkPolarity {
    /// Idle low, pull-down.
    ActiveHigh,
    /// Idle high, pull-up.
    ActiveLow,
}

impl LinkPolarity {
    pub fn is_active(&self, pin_high: bool) -> bool {
        match self {
            LinkPolarity::ActiveHigh => pin_high,
            LinkPolarity::ActiveLow => !pin_high,
        }
    }

    pub fn pin_high(&self, active: bool) -> bool {
        match self {
            LinkPolarity::ActiveHigh => active,
            LinkPolarity::ActiveLow => !active,
        }
    }
}

/// Holds a line active for a fixed number of ticks.
#[derive(Debug)]
pub struct PulseGenerator {
    width: u32,
    remaining: u32,
}

impl PulseGenerator {
    pub const fn new(width: u32) -> Self {
        PulseGenerator {
            width,
            remaining: 0,
        }
    }

    /// Restarts the pulse if one is already in flight.
    pub fn emit(&mut self) {
        self.remaining = self.width;
    }

    pub fn cancel(&mut self) {
        self.remaining = 0;
    }

    pub fn tick(&mut self) {
        self.remaining = self.remaining.saturating_sub(1);
    }

    pub fn is_active(&self) -> bool {
        self.remaining > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pulse {
    Request,
    Acknowledge,
}

#[derive(Debug)]
pub struct HandshakeLink {
    role: LinkRole,
    output: PulseGenerator,
    requests_sent: u32,
    acknowledges_sent: u32,
}

impl HandshakeLink {
    pub const fn new(role: LinkRole, pulse_width: u32) -> Self {
        HandshakeLink {
            role,
            output: PulseGenerator::new(pulse_width),
            requests_sent: 0,
            acknowledges_sent: 0,
        }
    }

    pub fn role(&self) -> LinkRole {
        self.role
    }

    /*
     * Only the pulse that fits our role goes out. Anything else is a
     * programming error in the traffic light, not something the peer did.
     */
    pub fn emit_pulse(&mut self, pulse: Pulse) {
        match (self.role, pulse) {
            (LinkRole::Initiator, Pulse::Request) => self.requests_sent += 1,
            (LinkRole::Responder, Pulse::Acknowledge) => self.acknowledges_sent += 1,
            (role, pulse) => panic!("{:?} link cannot emit a {:?} pulse", role, pulse),
        }
        trace!("link: emitting {:?} pulse", pulse);
        self.output.emit();
    }

    pub fn cancel(&mut self) {
        if self.output.is_active() {
            debug!("link: pulse cut short");
        }
        self.output.cancel();
    }

    pub fn tick(&mut self) {
        self.output.tick();
    }

    /// Logical level of our output line, true while a pulse is in flight.
    pub fn is_active(&self) -> bool {
        self.output.is_active()
    }

    pub fn requests_sent(&self) -> u32 {
        self.requests_sent
    }

    pub fn acknowledges_sent(&self) -> u32 {
        self.acknowledges_sent
    }
}
