//! End-to-end behaviour of the bike session through its public API:
//! edges in, metrics and control point results out.

use stepbit_ftms::bike::{BikeEvent, BikeOutput, IndoorBike};
use stepbit_ftms::control_point::{ControlPointCommand, Notification, ResultCode, TrainingState};
use stepbit_ftms::interval::{MAX_GAP_US, UPDATE_PERIOD_US};
use stepbit_ftms::metrics::Metrics;
use stepbit_ftms::protocol;
use stepbit_ftms::resistance::ResistanceLevel;

fn cp(bike: &mut IndoorBike, bytes: &[u8]) -> (ResultCode, u8, Vec<Notification>) {
    let cmd = ControlPointCommand::from_bytes(bytes).expect("non-empty write");
    match bike.dispatch(BikeEvent::ControlPointCommandReceived(cmd)) {
        BikeOutput::ControlPoint {
            result,
            notifications,
        } => (result.result_code, result.echoed_opcode, notifications),
        other => panic!("unexpected output {other:?}"),
    }
}

fn tick(bike: &mut IndoorBike, now: u64) -> Option<Metrics> {
    match bike.dispatch(BikeEvent::RecomputeTick(now)) {
        BikeOutput::MetricsUpdated(m) => Some(m),
        BikeOutput::None => None,
        other => panic!("unexpected output {other:?}"),
    }
}

#[test]
fn test_steady_pedaling_session() {
    let mut bike = IndoorBike::new(ResistanceLevel::new(50));
    let mut now = 0;
    assert_eq!(tick(&mut bike, now), Some(Metrics::default()));

    // 120 rpm for 10 seconds, ticking every 100 ms like the host does
    let mut next_edge = 1_000_000;
    let mut updates = Vec::new();
    while now < 11_000_000 {
        now += 100_000;
        while next_edge <= now {
            bike.dispatch(BikeEvent::PulseDetected(next_edge));
            next_edge += 500_000;
        }
        if let Some(m) = tick(&mut bike, now) {
            updates.push(m);
        }
    }

    // one update per second
    assert_eq!(updates.len(), 11);
    let last = *updates.last().unwrap();
    assert_eq!(last.cadence_x2, 240);
    assert_eq!(last.speed_x100, 3600);
    assert_eq!(last.power_w, 295);
    assert_eq!(bike.metrics(), last);

    assert_eq!(
        protocol::encode_indoor_bike_data(&last),
        [0x04, 0x00, 0x10, 0x0E, 0xF0, 0x00]
    );

    // rider stops: within MAX_GAP_US + one period the reading drops to zero
    let last_edge = next_edge - 500_000;
    let deadline = last_edge + MAX_GAP_US + UPDATE_PERIOD_US;
    while now < deadline {
        now += 100_000;
        tick(&mut bike, now);
    }
    assert_eq!(bike.metrics(), Metrics::default());
}

#[test]
fn test_single_edge_gives_slow_first_reading() {
    let mut bike = IndoorBike::new(ResistanceLevel::new(10));
    bike.dispatch(BikeEvent::PulseDetected(20_000_000));
    let m = tick(&mut bike, 20_500_000).unwrap();
    assert_eq!(m.interval_us, MAX_GAP_US as u32);
    assert_eq!(m.cadence_x2, 48);
}

#[test]
fn test_first_edge_right_after_boot() {
    let mut bike = IndoorBike::new(ResistanceLevel::new(10));
    assert_eq!(tick(&mut bike, 0), Some(Metrics::default()));

    bike.dispatch(BikeEvent::PulseDetected(100_000));
    let m = tick(&mut bike, 1_000_000).unwrap();
    assert_eq!(m.interval_us, MAX_GAP_US as u32);
    assert_eq!(m.cadence_x2, 48);
    assert_eq!(m.speed_x100, 720);
    assert_eq!(m.power_w, 17);

    // (1_100_000 - (100_000 - MAX_GAP_US)) / 2
    bike.dispatch(BikeEvent::PulseDetected(1_100_000));
    let m = tick(&mut bike, 2_000_000).unwrap();
    assert_eq!(m.interval_us, 1_750_000);
}

#[test]
fn test_window_is_bounded() {
    let mut bike = IndoorBike::default();
    for i in 0..1000u64 {
        bike.on_pulse(i * 1_000);
    }
    // with three edges 1 ms apart the average is 1 ms
    let m = tick(&mut bike, 1_000_000).unwrap();
    assert_eq!(m.interval_us, 1_000);
}

#[test]
fn test_resistance_clamped_for_all_inputs() {
    let mut bike = IndoorBike::default();
    for r in 0u8..=255 {
        bike.set_resistance_level(r);
        assert_eq!(bike.resistance_level(), r.clamp(10, 80));
    }
}

#[test]
fn test_start_then_stop_sequence() {
    let mut bike = IndoorBike::default();

    let (code, op, notes) = cp(&mut bike, &[0x00]);
    assert_eq!((code, op), (ResultCode::Success, 0x00));
    assert!(notes.is_empty());

    let (code, _, notes) = cp(&mut bike, &[0x07]);
    assert_eq!(code, ResultCode::Success);
    assert_eq!(notes, vec![Notification::TrainingStatus(TrainingState::ManualMode)]);
    assert_eq!(bike.training_state(), TrainingState::ManualMode);

    let (code, op, notes) = cp(&mut bike, &[0x08, 0x01]);
    assert_eq!((code, op), (ResultCode::Success, 0x08));
    assert_eq!(notes, vec![Notification::TrainingStatus(TrainingState::Idle)]);
    assert_eq!(bike.training_state(), TrainingState::Idle);
    assert_eq!(bike.stop_or_pause_flag(), 1);
}

#[test]
fn test_failed_commands_change_nothing() {
    let mut bike = IndoorBike::default();
    cp(&mut bike, &[0x07]);
    cp(&mut bike, &[0x08, 0x02]);
    cp(&mut bike, &[0x07]);

    let (code, op, notes) = cp(&mut bike, &[0x08]);
    assert_eq!((code, op), (ResultCode::InvalidParameter, 0x08));
    assert!(notes.is_empty());

    let (code, op, notes) = cp(&mut bike, &[0xFF]);
    assert_eq!((code, op), (ResultCode::NotSupported, 0xFF));
    assert!(notes.is_empty());

    assert_eq!(bike.training_state(), TrainingState::ManualMode);
    assert_eq!(bike.stop_or_pause_flag(), 2);
}

#[test]
fn test_control_point_does_not_touch_metrics() {
    let mut bike = IndoorBike::new(ResistanceLevel::new(50));
    bike.on_pulse(1_000_000);
    bike.on_pulse(1_500_000);
    bike.on_pulse(2_000_000);
    let before = tick(&mut bike, 2_100_000).unwrap();

    cp(&mut bike, &[0x01]);
    cp(&mut bike, &[0x08, 0x01]);
    assert_eq!(bike.metrics(), before);
}
