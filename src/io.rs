/*
 * The I/O module for the crossing.
 *
 * This module owns the actual pins on the DESPI-M02 board. The intention is
 * for this module to be the only part of the program that is device-specific.
 *
 * Outputs are driven by a single task that receives whole frames over a
 * channel, so a phase change is applied in one go and no other task ever
 * touches a lamp. Inputs are watched by small tasks that do nothing but post
 * to the shared `Events`.
 */

use embassy_futures::select::{Either, select};
use embassy_stm32::{
    Peripherals,
    exti::{Channel, ExtiInput},
    gpio::{Input, Level, Output, Pin, Pull, Speed},
};
use embassy_sync::{blocking_mutex::raw::ThreadModeRawMutex, channel::Receiver};
use embassy_time::{Duration, Timer};
use enum_ordinalize::Ordinalize;

use despi_m02_crossing::{Events, Frame, Lamp, LinkPolarity, LinkRole};

pub const CHANNEL_CAPACITY: usize = 4;

const DEBOUNCE: Duration = Duration::from_millis(50);

pub struct Outputs {
    // In `Lamp` order.
    lamps: [Output<'static>; Lamp::VARIANT_COUNT],
    link: Output<'static>,
    link_polarity: LinkPolarity,
    onboard_led: Output<'static>,
}

pub struct Board {
    pub outputs: Outputs,
    pub pedestrian_button: ExtiInput<'static>,
    pub night_button: ExtiInput<'static>,
    pub link_input: ExtiInput<'static>,
    pub role: LinkRole,
}

impl Board {
    // Both boards of a crossing must be given the same polarity.
    pub fn new(peripherals: Peripherals, link_polarity: LinkPolarity) -> Self {
        let lamps: [Output; Lamp::VARIANT_COUNT] = [
            Output::new(peripherals.PE1.degrade(), Level::Low, Speed::Low),
            Output::new(peripherals.PB7.degrade(), Level::Low, Speed::Low),
            Output::new(peripherals.PB6.degrade(), Level::High, Speed::Low),
            Output::new(peripherals.PE0.degrade(), Level::Low, Speed::Low),
        ];
        let link = Output::new(
            peripherals.PA0.degrade(),
            pin_level(link_polarity.pin_high(false)),
            Speed::Low,
        );
        let onboard_led = Output::new(peripherals.PE12.degrade(), Level::High, Speed::Low);

        let link_pull = match link_polarity {
            LinkPolarity::ActiveHigh => Pull::Down,
            LinkPolarity::ActiveLow => Pull::Up,
        };
        let link_input = ExtiInput::new(
            peripherals.PA1.degrade(),
            peripherals.EXTI1.degrade(),
            link_pull,
        );

        let pedestrian_button = ExtiInput::new(
            peripherals.PE11.degrade(),
            peripherals.EXTI11.degrade(),
            Pull::Up,
        );
        let night_button = ExtiInput::new(
            peripherals.PE10.degrade(),
            peripherals.EXTI10.degrade(),
            Pull::Up,
        );

        // Strap PE13 to ground on the board that answers requests.
        let role_strap = Input::new(peripherals.PE13.degrade(), Pull::Up);
        let role = if role_strap.is_low() {
            LinkRole::Responder
        } else {
            LinkRole::Initiator
        };

        Board {
            outputs: Outputs {
                lamps,
                link,
                link_polarity,
                onboard_led,
            },
            pedestrian_button,
            night_button,
            link_input,
            role,
        }
    }
}

#[embassy_executor::task]
pub async fn output_task(
    mut outputs: Outputs,
    frames: Receiver<'static, ThreadModeRawMutex, Frame, CHANNEL_CAPACITY>,
) -> ! {
    loop {
        let frame = frames.receive().await;
        light(&mut outputs, &frame);
    }
}

fn light(outputs: &mut Outputs, frame: &Frame) {
    for lamp in Lamp::VARIANTS {
        outputs.lamps[lamp.ordinal()].set_level(pin_level(frame.lamp(*lamp)));
    }
    outputs
        .link
        .set_level(pin_level(outputs.link_polarity.pin_high(frame.link_active)));
    // the on-board LED is active-low
    outputs.onboard_led.set_level(if frame.link_active {
        Level::Low
    } else {
        Level::High
    });
}

fn pin_level(high: bool) -> Level {
    if high { Level::High } else { Level::Low }
}

#[embassy_executor::task]
pub async fn pedestrian_button_task(mut button: ExtiInput<'static>, events: &'static Events) -> ! {
    loop {
        wait_for_press(&mut button).await;
        events.button_pressed();
        wait_for_release(&mut button).await;
    }
}

#[embassy_executor::task]
pub async fn night_button_task(mut button: ExtiInput<'static>, events: &'static Events) -> ! {
    loop {
        wait_for_press(&mut button).await;
        events.toggle_night_mode();
        wait_for_release(&mut button).await;
    }
}

/*
 * No debouncing here: every edge is reported with the level it left behind,
 * and the traffic light sorts out requests from glitches.
 */
#[embassy_executor::task]
pub async fn link_input_task(
    mut line: ExtiInput<'static>,
    polarity: LinkPolarity,
    events: &'static Events,
) -> ! {
    loop {
        line.wait_for_any_edge().await;
        events.remote_edge(polarity.is_active(line.is_high()));
    }
}

// A press counts once the contacts have been quiet for the debounce time and
// the button is still down. A pushbutton makes brief contact several times as
// it is pressed and released; for the pedestrian button that does no harm, but
// for the night mode toggle every bounce would flip the mode once more.
async fn wait_for_press(button: &mut ExtiInput<'static>) {
    loop {
        button.wait_for_falling_edge().await;
        wait_until_quiet(button).await;
        if button.is_low() {
            break;
        }
    }
}

// Releasing bounces too; those edges must not read as the next press.
async fn wait_for_release(button: &mut ExtiInput<'static>) {
    loop {
        button.wait_for_high().await;
        wait_until_quiet(button).await;
        if button.is_high() {
            break;
        }
    }
}

async fn wait_until_quiet(button: &mut ExtiInput<'static>) {
    'debounce_loop: loop {
        match select(button.wait_for_any_edge(), Timer::after(DEBOUNCE)).await {
            Either::First(_) => {}
            Either::Second(_) => break 'debounce_loop,
        }
    }
}
