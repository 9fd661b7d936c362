pub mod phase;

use crate::config::{ConfigError, ControllerConfig, TickTimings};
use crate::events::Events;
use crate::handshake::{HandshakeLink, LinkRole, Pulse};
use crate::latch::EventLatch;
use crate::scheduler::Frame;
use crate::signal::SignalBank;
pub use phase::Phase;

/// Counters for things that are worth knowing about but are not errors.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Diagnostics {
    pub spurious_edges: u32,
    pub rejected_requests: u32,
    pub discarded_events: u32,
    pub abandoned_holds: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerState {
    pub phase: Phase,
    pub night_mode: bool,
    pub pedestrian_request: bool,
    pub pedestrian_active: bool,
}

#[derive(Debug)]
pub struct TrafficLight {
    config: ControllerConfig,
    timings: TickTimings,
    phase: Phase,
    remaining: Option<u32>,
    entered_this_tick: bool,
    night_mode: bool,
    pedestrian_request: EventLatch,
    pedestrian_active: bool,
    peer_request: bool,
    signals: SignalBank,
    link: HandshakeLink,
    diagnostics: Diagnostics,
}

impl TrafficLight {
    pub fn new(config: ControllerConfig) -> Result<Self, ConfigError> {
        let timings = config.validate()?;
        let mut light = TrafficLight {
            config,
            timings,
            phase: Phase::Green,
            remaining: None,
            entered_this_tick: false,
            night_mode: false,
            pedestrian_request: EventLatch::new(),
            pedestrian_active: false,
            peer_request: false,
            signals: SignalBank::new(timings.blink_half_period),
            link: HandshakeLink::new(config.link_role, timings.pulse_width),
            diagnostics: Diagnostics::default(),
        };
        light.enter(Phase::Green);
        Ok(light)
    }

    /*
     * One tick of the scheduler. The order matters:
     *
     * 1. the link output moves on, whatever else happens;
     * 2. night mode is looked at first and, while it is on, nothing else is;
     * 3. latched input is taken, so that anything posted before this tick is
     *    seen by this tick;
     * 4. the running phase counts down and, when it runs out, its successor is
     *    chosen. Accepted pedestrian requests are only looked at here, so
     *    they never cut a phase short.
     */
    pub fn tick(&mut self, events: &Events) {
        self.entered_this_tick = false;
        self.link.tick();

        if let Some(enabled) = events.take_night_mode_change() {
            self.apply_night_mode(enabled, events);
        }
        if self.night_mode {
            self.discard_while_night(events);
            return;
        }

        if events.spurious_edge.take() {
            self.diagnostics.spurious_edges += 1;
            warn!("link: edge without level change ignored");
        }
        if events.button.take() {
            self.request_pedestrian_crossing();
        }
        if events.remote.take() {
            self.on_link_event();
        }

        if self.entered_this_tick {
            return;
        }
        if let Some(remaining) = self.remaining.as_mut() {
            *remaining = remaining.saturating_sub(1);
            if *remaining == 0 {
                self.complete_phase();
            }
        }
    }

    /*
     * Accepted only while vehicles still have green or yellow, night mode is
     * off and no hold is running. An accepted request is remembered until the
     * end of yellow; asking again before then changes nothing.
     */
    pub fn request_pedestrian_crossing(&mut self) -> bool {
        let accepted = self.config.pedestrian_priority
            && !self.night_mode
            && !self.pedestrian_active
            && matches!(self.phase, Phase::Green | Phase::Yellow);

        if accepted {
            if self.pedestrian_request.peek() {
                debug!("pedestrian request already pending");
            } else {
                info!("pedestrian request accepted during {:?}", self.phase);
            }
            self.pedestrian_request.post();
        } else {
            self.diagnostics.rejected_requests += 1;
            debug!("pedestrian request rejected during {:?}", self.phase);
        }
        accepted
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn state(&self) -> ControllerState {
        ControllerState {
            phase: self.phase,
            night_mode: self.night_mode,
            pedestrian_request: self.pedestrian_request.peek(),
            pedestrian_active: self.pedestrian_active,
        }
    }

    pub fn diagnostics(&self) -> Diagnostics {
        self.diagnostics
    }

    pub fn link(&self) -> &HandshakeLink {
        &self.link
    }

    pub fn tick_ms(&self) -> u32 {
        self.timings.tick_ms
    }

    /// Ticks left in the running phase; `None` while waiting on an event.
    pub fn remaining_ticks(&self) -> Option<u32> {
        self.remaining
    }

    pub(crate) fn sample_outputs(&mut self) -> Frame {
        Frame {
            lamps: self.signals.call_every_tick(),
            link_active: self.link.is_active(),
        }
    }

    fn enter(&mut self, phase: Phase) {
        if phase != self.phase {
            info!("{:?} -> {:?}", self.phase, phase);
        }
        self.phase = phase;
        self.remaining = phase.duration(&self.timings);
        self.entered_this_tick = true;

        if phase.blinks() {
            // Everything goes dark first; the blink then starts with its dark half.
            self.signals.all_off();
            for (lamp, on) in phase.assignments() {
                if on {
                    self.signals.set_blinking(lamp);
                }
            }
            self.signals.restart_blink();
        } else {
            for (lamp, on) in phase.assignments() {
                self.signals.set(lamp, on);
            }
        }
    }

    fn complete_phase(&mut self) {
        match self.phase {
            Phase::Green => self.enter(Phase::Yellow),
            Phase::Yellow => self.leave_yellow(),
            Phase::Red => self.enter(Phase::Green),
            Phase::PedestrianHold => {
                self.pedestrian_active = false;
                self.enter(Phase::Green);
            }
            Phase::AwaitAcknowledge | Phase::NightBlink => {
                unreachable!("{:?} has no timed successor", self.phase)
            }
        }
    }

    fn leave_yellow(&mut self) {
        let pedestrians = self.pedestrian_request.take();

        if self.peer_request {
            // Our own pending pedestrians are served by the same hold.
            self.peer_request = false;
            self.hold_for_peer();
        } else if pedestrians {
            match self.link.role() {
                LinkRole::Initiator => {
                    self.link.emit_pulse(Pulse::Request);
                    self.enter(Phase::AwaitAcknowledge);
                }
                LinkRole::Standalone | LinkRole::Responder => self.start_hold(),
            }
        } else {
            self.enter(Phase::Red);
        }
    }

    fn start_hold(&mut self) {
        self.pedestrian_active = true;
        self.enter(Phase::PedestrianHold);
    }

    /*
     * The peer starts its own hold when it sees our acknowledge, which can be
     * up to a tick later than we sent it. Staying red for one extra pulse
     * width makes sure our hold ends after the peer's.
     */
    fn hold_for_peer(&mut self) {
        self.start_hold();
        // `validate` has made sure this fits.
        self.remaining = Some(
            self.timings
                .peer_hold()
                .unwrap_or(self.timings.pedestrian_hold),
        );
        self.link.emit_pulse(Pulse::Acknowledge);
    }

    fn on_link_event(&mut self) {
        match self.link.role() {
            LinkRole::Responder => self.on_peer_request(),
            LinkRole::Initiator if self.phase == Phase::AwaitAcknowledge => {
                info!("link: acknowledge received");
                self.start_hold();
            }
            LinkRole::Initiator | LinkRole::Standalone => {
                self.diagnostics.spurious_edges += 1;
                warn!(
                    "link: unexpected pulse as {:?} during {:?}",
                    self.link.role(),
                    self.phase
                );
            }
        }
    }

    /*
     * The peer asks us to stop our traffic. Green goes to yellow straight
     * away; yellow finishes first. Once we are red the peer gets its
     * acknowledge, and the hold is (re)started so that we stay red for at
     * least as long as the peer's hold.
     */
    fn on_peer_request(&mut self) {
        info!("link: request received during {:?}", self.phase);
        match self.phase {
            Phase::Green => {
                self.peer_request = true;
                self.enter(Phase::Yellow);
            }
            Phase::Yellow => self.peer_request = true,
            Phase::Red | Phase::PedestrianHold => self.hold_for_peer(),
            Phase::AwaitAcknowledge | Phase::NightBlink => {
                unreachable!("responder in {:?}", self.phase)
            }
        }
    }

    fn apply_night_mode(&mut self, enabled: bool, events: &Events) {
        if !self.config.night_mode {
            debug!("night mode not available, ignoring");
            return;
        }
        if enabled == self.night_mode {
            return;
        }

        if enabled {
            if self.pedestrian_active {
                self.diagnostics.abandoned_holds += 1;
                warn!("night mode abandons pedestrian hold");
            }
            self.pedestrian_active = false;
            self.pedestrian_request.take();
            self.peer_request = false;
            self.link.cancel();
            self.night_mode = true;
            self.enter(Phase::NightBlink);
        } else {
            self.night_mode = false;
            if events.drain() | self.pedestrian_request.take() {
                debug!("dropped events pending from night mode");
            }
            self.peer_request = false;
            self.enter(Phase::Green);
        }
    }

    fn discard_while_night(&mut self, events: &Events) {
        if events.button.take() {
            self.diagnostics.rejected_requests += 1;
            debug!("night mode: pedestrian request rejected");
        }
        if events.remote.take() {
            self.diagnostics.discarded_events += 1;
            debug!("night mode: link pulse discarded");
        }
        if events.spurious_edge.take() {
            self.diagnostics.spurious_edges += 1;
        }
    }
}
