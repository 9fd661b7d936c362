/*
 * Traffic light controller for one crossing, optionally coordinated with the
 * controller of a neighbouring board over a two-wire pulse handshake.
 *
 * Everything in this library is hardware independent and runs on the host,
 * which is where its tests run. The board specific parts live in the firmware
 * binary (`main.rs` and `io.rs`).
 */

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

pub mod config;
pub mod events;
pub mod handshake;
pub mod latch;
pub mod scheduler;
pub mod signal;
pub mod trafficlight;

pub use config::{ConfigError, ControllerConfig, Timings};
pub use events::Events;
pub use handshake::{LinkPolarity, LinkRole};
pub use scheduler::{Frame, Scheduler};
pub use signal::Lamp;
pub use trafficlight::{Phase, TrafficLight};
