//! Crank interval → cadence, speed and power.
//!
//! Units follow the FTMS Indoor Bike Data characteristic: cadence in
//! rpm * 2, speed in km/h * 100. Power is an estimate from speed and the
//! resistance level for a 70 kg rider (https://diary.cyclekikou.net/archives/15876).

use crate::resistance::ResistanceLevel;

/// 60 s * 1_000_000 us * 2 (cadence is reported as rpm * 2).
pub const K_CADENCE: u64 = 120_000_000;

/// One crank revolution is taken as 5 m of travel: km/h * 100 per us.
pub const K_SPEED: u64 = 1_800_000_000;

pub const K_POWER: f64 = 0.8 * (70.0 * 9.80665) / (360.0 * 0.95 * 100.0);
pub const K_INCLINE_A: f64 = 0.9;
pub const K_INCLINE_B: f64 = 0.6;

/// Snapshot of the bike metrics. A zero interval means every field is zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Metrics {
    pub interval_us: u32,
    /// rpm * 2
    pub cadence_x2: u32,
    /// km/h * 100
    pub speed_x100: u32,
    pub power_w: i16,
}

impl Metrics {
    pub fn is_stopped(&self) -> bool {
        self.interval_us == 0
    }
}

/// Compute the metrics for one crank interval at the given resistance.
///
/// Total over its inputs: a zero interval yields all-zero metrics, and power
/// saturates at the `i16` range.
pub fn compute_metrics(interval_us: u32, resistance: ResistanceLevel) -> Metrics {
    if interval_us == 0 {
        return Metrics::default();
    }

    let cadence_x2 = (K_CADENCE / interval_us as u64) as u32;
    let speed_x100 = (K_SPEED / interval_us as u64) as u32;

    let load = K_INCLINE_A * (resistance.get() as f64) / 10.0 + K_INCLINE_B;
    // float -> int `as` casts saturate
    let power_w = (speed_x100 as f64 * load * K_POWER).round() as i16;

    Metrics {
        interval_us,
        cadence_x2,
        speed_x100,
        power_w,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_interval_is_all_zero() {
        for level in [0u8, 10, 45, 80, 255] {
            let m = compute_metrics(0, ResistanceLevel::new(level));
            assert_eq!(m, Metrics::default());
            assert!(m.is_stopped());
        }
    }

    #[test]
    fn test_reference_point() {
        // 0.5 s per revolution at level 5.0
        let m = compute_metrics(500_000, ResistanceLevel::new(50));
        assert_eq!(m.interval_us, 500_000);
        assert_eq!(m.cadence_x2, 240); // 120 rpm
        assert_eq!(m.speed_x100, 3600); // 36.00 km/h
        assert_eq!(m.power_w, 295); // 294.82 rounded
    }

    #[test]
    fn test_power_scales_with_resistance() {
        let low = compute_metrics(500_000, ResistanceLevel::new(10));
        let high = compute_metrics(500_000, ResistanceLevel::new(80));
        assert_eq!(low.power_w, 87);
        assert_eq!(high.power_w, 451);
        assert_eq!(low.speed_x100, high.speed_x100);
        assert_eq!(low.cadence_x2, high.cadence_x2);
    }

    #[test]
    fn test_integer_division_floors() {
        // 120_000_000 / 300_001 = 399.99..., 1_800_000_000 / 300_001 = 5999.98...
        let m = compute_metrics(300_001, ResistanceLevel::new(30));
        assert_eq!(m.cadence_x2, 399);
        assert_eq!(m.speed_x100, 5999);
    }

    #[test]
    fn test_slowest_reading() {
        // the stall threshold interval still gives a valid, small reading
        let m = compute_metrics(2_500_000, ResistanceLevel::new(10));
        assert_eq!(m.cadence_x2, 48);
        assert_eq!(m.speed_x100, 720);
        assert_eq!(m.power_w, 17);
    }

    #[test]
    fn test_tiny_interval_saturates_power() {
        let m = compute_metrics(1, ResistanceLevel::new(80));
        assert_eq!(m.cadence_x2, 120_000_000);
        assert_eq!(m.speed_x100, 1_800_000_000);
        assert_eq!(m.power_w, i16::MAX);
    }

    #[test]
    fn test_max_interval_does_not_panic() {
        let m = compute_metrics(u32::MAX, ResistanceLevel::new(80));
        assert_eq!(m.cadence_x2, 0);
        assert_eq!(m.speed_x100, 0);
        assert_eq!(m.power_w, 0);
    }
}
