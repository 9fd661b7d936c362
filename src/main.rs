#![no_std]
#![no_main]

// https://dev.to/theembeddedrustacean/embedded-rust-embassy-gpio-button-controlled-blinking-3ee6
// https://www.youtube.com/watch?v=dab_vzVDr_M

use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_sync::{
    blocking_mutex::raw::ThreadModeRawMutex,
    channel::{Channel, Sender},
};
use embassy_time::{Duration, Ticker};
use panic_halt as _;

use despi_m02_crossing::{ControllerConfig, Events, Frame, Scheduler};

mod io;
use io::{Board, CHANNEL_CAPACITY};

static EVENTS: Events = Events::new();
static FRAMES: Channel<ThreadModeRawMutex, Frame, CHANNEL_CAPACITY> = Channel::new();

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let mut config = ControllerConfig::DEFAULT;
    let board = Board::new(embassy_stm32::init(Default::default()), config.link_polarity);
    config.link_role = board.role;

    let scheduler = match Scheduler::new(config, &EVENTS) {
        Ok(scheduler) => scheduler,
        Err(error) => defmt::panic!("invalid configuration: {}", error),
    };
    defmt::info!("crossing controller up as {:?}", board.role);

    spawner.must_spawn(io::output_task(board.outputs, FRAMES.receiver()));
    spawner.must_spawn(io::pedestrian_button_task(board.pedestrian_button, &EVENTS));
    spawner.must_spawn(io::night_button_task(board.night_button, &EVENTS));
    spawner.must_spawn(io::link_input_task(
        board.link_input,
        config.link_polarity,
        &EVENTS,
    ));
    spawner.must_spawn(controller_task(scheduler, FRAMES.sender()));
}

/*
 * The one place that knows about time. Each tick the scheduler advances the
 * traffic light and hands back what the outputs should show; only changes are
 * passed on to the output task.
 */
#[embassy_executor::task]
async fn controller_task(
    mut scheduler: Scheduler<'static>,
    frames: Sender<'static, ThreadModeRawMutex, Frame, CHANNEL_CAPACITY>,
) -> ! {
    let mut ticker = Ticker::every(Duration::from_millis(scheduler.tick_ms() as u64));
    let mut shown: Option<Frame> = None;

    loop {
        let frame = scheduler.tick();
        if shown != Some(frame) {
            frames.send(frame).await;
            shown = Some(frame);
        }
        ticker.next().await;
    }
}
