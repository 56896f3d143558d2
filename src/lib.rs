//! Indoor bike step sensor with an FTMS control point.
//!
//! Turns crank edge timings into cadence, speed and power, and implements
//! the Fitness Machine Control Point procedures a fitness app uses to take
//! control of, start, pause and reset the trainer.

pub mod bike;
pub mod clock;
pub mod config;
pub mod control_point;
pub mod debug_server;
pub mod interval;
pub mod metrics;
pub mod protocol;
pub mod pulse_source;
pub mod resistance;
pub mod ticker;
