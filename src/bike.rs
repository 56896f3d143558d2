//! The indoor bike session: crank sensor, resistance and control point.
//!
//! `IndoorBike` owns every piece of mutable state. The host feeds it
//! `BikeEvent`s through `dispatch` (or the direct methods) from one logical
//! context; nothing here blocks or performs I/O.

use log::debug;

use crate::control_point::{
    ControlPointCommand, ControlPointResult, ControlPointStateMachine, Notification,
    TrainingState,
};
use crate::interval::IntervalTracker;
use crate::metrics::{compute_metrics, Metrics};
use crate::resistance::ResistanceLevel;

/// Everything the host can deliver to the bike.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BikeEvent {
    /// Falling edge of the step sensor, monotonic microseconds.
    PulseDetected(u64),
    /// Periodic recompute trigger carrying the current time.
    RecomputeTick(u64),
    /// Raw write to the Fitness Machine Control Point.
    ControlPointCommandReceived(ControlPointCommand),
}

/// What the host has to forward to the transport after an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BikeOutput {
    /// Nothing to send.
    None,
    /// New metrics snapshot, to be sent as Indoor Bike Data.
    MetricsUpdated(Metrics),
    /// Control point response indication plus follow-up notifications.
    ControlPoint {
        result: ControlPointResult,
        notifications: Vec<Notification>,
    },
}

#[derive(Debug, Default)]
pub struct IndoorBike {
    tracker: IntervalTracker,
    resistance: ResistanceLevel,
    metrics: Metrics,
    control_point: ControlPointStateMachine,
}

impl IndoorBike {
    pub fn new(resistance: ResistanceLevel) -> Self {
        Self {
            resistance,
            ..Self::default()
        }
    }

    pub fn dispatch(&mut self, event: BikeEvent) -> BikeOutput {
        match event {
            BikeEvent::PulseDetected(ts) => {
                self.on_pulse(ts);
                BikeOutput::None
            }
            BikeEvent::RecomputeTick(now) => match self.recompute(now) {
                Some(metrics) => BikeOutput::MetricsUpdated(metrics),
                None => BikeOutput::None,
            },
            BikeEvent::ControlPointCommandReceived(cmd) => {
                let (result, notifications) = self.handle_command(&cmd);
                BikeOutput::ControlPoint {
                    result,
                    notifications,
                }
            }
        }
    }

    pub fn on_pulse(&mut self, timestamp_us: u64) {
        self.tracker.on_pulse(timestamp_us);
    }

    /// Run the periodic recompute. Returns the new snapshot when the update
    /// period had elapsed, `None` otherwise.
    pub fn recompute(&mut self, now_us: u64) -> Option<Metrics> {
        let interval = self.tracker.recompute(now_us)?;
        self.metrics = compute_metrics(interval, self.resistance);
        debug!(
            "Metrics: cadence={} rpm*2, speed={} km/h*100, power={} W (resistance {})",
            self.metrics.cadence_x2,
            self.metrics.speed_x100,
            self.metrics.power_w,
            self.resistance.get()
        );
        Some(self.metrics)
    }

    /// Latest snapshot, as of the most recent effective recompute.
    pub fn metrics(&self) -> Metrics {
        self.metrics
    }

    pub fn resistance_level(&self) -> u8 {
        self.resistance.get()
    }

    /// Set the resistance, clamped into [10, 80]. Takes effect on the next
    /// recompute.
    pub fn set_resistance_level(&mut self, level10: u8) {
        self.resistance.set(level10);
    }

    /// Step the resistance by whole levels, clamped.
    pub fn step_resistance(&mut self, levels: i8) -> u8 {
        self.resistance.step(levels);
        self.resistance.get()
    }

    pub fn handle_command(
        &mut self,
        cmd: &ControlPointCommand,
    ) -> (ControlPointResult, Vec<Notification>) {
        self.control_point.handle_command(cmd)
    }

    pub fn training_state(&self) -> TrainingState {
        self.control_point.state()
    }

    pub fn stop_or_pause_flag(&self) -> u8 {
        self.control_point.stop_or_pause_flag()
    }
}
