use despi_m02_crossing::{
    ControllerConfig, Events, Frame, Lamp, LinkRole, Phase, Scheduler, Timings,
};

fn scenario_config(role: LinkRole) -> ControllerConfig {
    ControllerConfig {
        timings: Timings {
            tick_ms: 10,
            green_ms: 3000,
            yellow_ms: 1000,
            red_ms: 2000,
            pedestrian_hold_ms: 4000,
            blink_half_period_ms: 500,
            pulse_width_ms: 150,
        },
        link_role: role,
        ..ControllerConfig::DEFAULT
    }
}

fn run_until(scheduler: &mut Scheduler, elapsed_ms: u64) {
    while scheduler.elapsed_ms() < elapsed_ms {
        scheduler.tick();
    }
}

fn assert_safe(frame: &Frame, phase: Phase) {
    let walk = frame.lamp(Lamp::PedestrianGreen);
    assert!(!(walk && frame.lamp(Lamp::VehicleGreen)), "walk on green in {:?}", phase);
    assert!(!(walk && frame.lamp(Lamp::PedestrianRed)), "walk and wait in {:?}", phase);
    if frame.lamp(Lamp::VehicleRed) && frame.lamp(Lamp::VehicleGreen) {
        assert!(matches!(phase, Phase::Yellow | Phase::NightBlink), "amber in {:?}", phase);
    }
    if phase != Phase::NightBlink {
        for (lamp, on) in phase.assignments() {
            assert_eq!(frame.lamp(lamp), on, "{:?} in {:?}", lamp, phase);
        }
    }
}

#[test]
fn pedestrian_request_during_green() {
    let events = Events::new();
    let mut scheduler = Scheduler::new(scenario_config(LinkRole::Standalone), &events).unwrap();

    run_until(&mut scheduler, 500);
    assert_eq!(scheduler.light().phase(), Phase::Green);
    assert!(scheduler.request_pedestrian_crossing());

    run_until(&mut scheduler, 2990);
    assert_eq!(scheduler.light().phase(), Phase::Green);
    run_until(&mut scheduler, 3000);
    assert_eq!(scheduler.light().phase(), Phase::Yellow);

    // Asking again during yellow is accepted but does not add a second hold.
    run_until(&mut scheduler, 3500);
    assert!(scheduler.request_pedestrian_crossing());

    run_until(&mut scheduler, 3990);
    assert_eq!(scheduler.light().phase(), Phase::Yellow);
    run_until(&mut scheduler, 4000);
    let state = scheduler.light().state();
    assert_eq!(state.phase, Phase::PedestrianHold);
    assert!(state.pedestrian_active);

    run_until(&mut scheduler, 5500);
    assert!(!scheduler.request_pedestrian_crossing());

    run_until(&mut scheduler, 7990);
    assert_eq!(scheduler.light().phase(), Phase::PedestrianHold);
    run_until(&mut scheduler, 8000);
    let state = scheduler.light().state();
    assert_eq!(state.phase, Phase::Green);
    assert!(!state.pedestrian_active);
    assert!(!state.pedestrian_request);

    // The next cycle is an ordinary one.
    run_until(&mut scheduler, 12000);
    assert_eq!(scheduler.light().phase(), Phase::Red);
    run_until(&mut scheduler, 14000);
    assert_eq!(scheduler.light().phase(), Phase::Green);
}

#[test]
fn button_presses_coalesce() {
    let events = Events::new();
    let mut scheduler = Scheduler::new(scenario_config(LinkRole::Standalone), &events).unwrap();
    run_until(&mut scheduler, 100);

    for _ in 0..5 {
        events.button_pressed();
    }
    scheduler.tick();
    assert!(scheduler.light().state().pedestrian_request);
    assert_eq!(scheduler.light().diagnostics().rejected_requests, 0);

    run_until(&mut scheduler, 4000);
    assert_eq!(scheduler.light().phase(), Phase::PedestrianHold);
    run_until(&mut scheduler, 8000);
    assert_eq!(scheduler.light().phase(), Phase::Green);
}

// A small deterministic generator, enough to shake out the event ordering.
struct Lcg(u32);

impl Lcg {
    fn next(&mut self) -> u32 {
        self.0 = self.0.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        self.0 >> 16
    }
}

#[test]
fn lamps_always_match_a_single_phase() {
    let events = Events::new();
    let mut scheduler = Scheduler::new(scenario_config(LinkRole::Responder), &events).unwrap();
    let mut random = Lcg(7);
    let mut remote_level = false;

    for _ in 0..50_000 {
        match random.next() % 400 {
            0..=3 => events.button_pressed(),
            4 => events.toggle_night_mode(),
            5..=7 => {
                remote_level = !remote_level;
                events.remote_edge(remote_level);
            }
            8 => events.remote_edge(remote_level),
            _ => {}
        }
        let frame = scheduler.tick();
        let light = scheduler.light();
        assert_safe(&frame, light.phase());
        assert_eq!(
            light.state().pedestrian_active,
            light.phase() == Phase::PedestrianHold
        );
    }
    assert!(scheduler.light().diagnostics().spurious_edges > 0);
}

struct Wire {
    level: bool,
}

impl Wire {
    fn carry(&mut self, level: bool, events: &Events) {
        if level != self.level {
            self.level = level;
            events.remote_edge(level);
        }
    }
}

struct Crossing<'a> {
    initiator: Scheduler<'a>,
    responder: Scheduler<'a>,
    to_responder: Wire,
    to_initiator: Wire,
}

impl<'a> Crossing<'a> {
    fn new(initiator_events: &'a Events, responder_events: &'a Events) -> Self {
        Crossing {
            initiator: Scheduler::new(scenario_config(LinkRole::Initiator), initiator_events)
                .unwrap(),
            responder: Scheduler::new(scenario_config(LinkRole::Responder), responder_events)
                .unwrap(),
            to_responder: Wire { level: false },
            to_initiator: Wire { level: false },
        }
    }

    fn step(&mut self, initiator_events: &Events, responder_events: &Events) -> (Frame, Frame) {
        let a = self.initiator.tick();
        let b = self.responder.tick();
        self.to_responder.carry(a.link_active, responder_events);
        self.to_initiator.carry(b.link_active, initiator_events);
        (a, b)
    }
}

fn handshake_with_offset(offset_ticks: u32) {
    let a_events = Events::new();
    let b_events = Events::new();
    let mut crossing = Crossing::new(&a_events, &b_events);

    for _ in 0..offset_ticks {
        crossing.responder.tick();
    }
    assert!(crossing.initiator.request_pedestrian_crossing());

    let mut acknowledge_seen_at = None;
    let mut hold_started_at = None;
    for step in 0..2000u32 {
        let (a, b) = crossing.step(&a_events, &b_events);
        let a_phase = crossing.initiator.light().phase();
        let b_phase = crossing.responder.light().phase();

        // Only the hold is coordinated; an ordinary red is local.
        if a_phase == Phase::PedestrianHold {
            assert!(a.lamp(Lamp::PedestrianGreen));
            assert!(b_phase.is_red(), "peer in {:?} while pedestrians walk", b_phase);
            assert!(!b.lamp(Lamp::VehicleGreen));
        }
        if b.link_active && acknowledge_seen_at.is_none() {
            acknowledge_seen_at = Some(step);
        }
        if a_phase == Phase::PedestrianHold && hold_started_at.is_none() {
            hold_started_at = Some(step);
        }
    }

    let acknowledged = acknowledge_seen_at.expect("responder never acknowledged");
    let held = hold_started_at.expect("initiator never served pedestrians");
    assert!(held > acknowledged);
    assert!(held - acknowledged <= 2);

    assert_eq!(crossing.initiator.light().link().requests_sent(), 1);
    assert_eq!(crossing.responder.light().link().acknowledges_sent(), 1);
    assert_eq!(crossing.initiator.light().diagnostics().spurious_edges, 0);
    assert_eq!(crossing.responder.light().diagnostics().spurious_edges, 0);
}

#[test]
fn handshake_when_peer_is_already_red() {
    // Both boards in step: the request reaches the responder in its red.
    handshake_with_offset(0);
}

#[test]
fn handshake_when_peer_is_green() {
    // The request reaches the responder early in its green.
    handshake_with_offset(300);
}

#[test]
fn handshake_when_peer_is_yellow() {
    handshake_with_offset(550);
}

#[test]
fn request_is_not_answered_while_peer_is_in_night_mode() {
    let a_events = Events::new();
    let b_events = Events::new();
    let mut crossing = Crossing::new(&a_events, &b_events);

    b_events.set_night_mode(true);
    assert!(crossing.initiator.request_pedestrian_crossing());
    for _ in 0..1000 {
        crossing.step(&a_events, &b_events);
    }
    assert_eq!(crossing.initiator.light().phase(), Phase::AwaitAcknowledge);
    assert_eq!(crossing.responder.light().phase(), Phase::NightBlink);
    assert_eq!(crossing.responder.light().diagnostics().discarded_events, 1);
    assert_eq!(crossing.responder.light().link().acknowledges_sent(), 0);

    // Only local night mode gets the initiator out of the wait.
    a_events.set_night_mode(true);
    crossing.step(&a_events, &b_events);
    assert_eq!(crossing.initiator.light().phase(), Phase::NightBlink);
    a_events.set_night_mode(false);
    crossing.step(&a_events, &b_events);
    assert_eq!(crossing.initiator.light().phase(), Phase::Green);
}
