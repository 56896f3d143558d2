//! FTMS (Fitness Machine Service) binary encoding for the indoor bike.
//!
//! All multi-byte values are little-endian per the Bluetooth GATT specification.
//! Indoor bike units: speed in km/h * 100, cadence in rpm * 2.

use uuid::Uuid;

use crate::control_point::{ControlPointResult, Notification, TrainingState};
use crate::metrics::Metrics;

// Bluetooth SIG base UUID: 0000XXXX-0000-1000-8000-00805f9b34fb
pub const fn ble_uuid(short: u16) -> Uuid {
    Uuid::from_u128(
        ((short as u128) << 96) | 0x0000_0000_0000_1000_8000_00805f9b34fb_u128,
    )
}

// FTMS service and characteristic UUIDs
pub const FTMS_SERVICE_UUID: Uuid = ble_uuid(0x1826);
pub const FEATURE_UUID: Uuid = ble_uuid(0x2ACC);
pub const INDOOR_BIKE_DATA_UUID: Uuid = ble_uuid(0x2AD2);
pub const TRAINING_STATUS_UUID: Uuid = ble_uuid(0x2AD3);
pub const CONTROL_POINT_UUID: Uuid = ble_uuid(0x2AD9);

pub const RESPONSE_CODE: u8 = 0x80;

/// Indoor Bike Data flags:
///   - Bit 0 = 0: Instantaneous Speed present
///   - Bit 2 = 1: Instantaneous Cadence present
pub const INDOOR_BIKE_DATA_FLAGS: u16 = 0x0004;

/// Training Status flags: status only, no string.
pub const TRAINING_STATUS_FLAGS: u8 = 0x00;

/// Encode FTMS Indoor Bike Data characteristic (0x2AD2).
///
/// Layout: flags(2) + speed(2) + cadence(2) = 6 bytes.
/// Values that do not fit a uint16 are sent as 0xFFFF.
pub fn encode_indoor_bike_data(metrics: &Metrics) -> [u8; 6] {
    let speed = u16::try_from(metrics.speed_x100).unwrap_or(u16::MAX);
    let cadence = u16::try_from(metrics.cadence_x2).unwrap_or(u16::MAX);

    let mut buf = [0u8; 6];
    buf[0..2].copy_from_slice(&INDOOR_BIKE_DATA_FLAGS.to_le_bytes());
    buf[2..4].copy_from_slice(&speed.to_le_bytes());
    buf[4..6].copy_from_slice(&cadence.to_le_bytes());
    buf
}

/// Encode FTMS Feature characteristic (0x2ACC).
///
/// Fitness Machine Features (uint32 LE):
///   - Bit 1: Cadence Supported
///   = 0x0000_0002
///
/// Target Setting Features (uint32 LE): none = 0x0000_0000
pub fn encode_feature() -> [u8; 8] {
    let machine_features: u32 = 0x0000_0002;
    let target_features: u32 = 0x0000_0000;
    let mut buf = [0u8; 8];
    buf[0..4].copy_from_slice(&machine_features.to_le_bytes());
    buf[4..8].copy_from_slice(&target_features.to_le_bytes());
    buf
}

/// Encode Training Status characteristic (0x2AD3): `[flags, status]`.
pub fn encode_training_status(state: TrainingState) -> [u8; 2] {
    [TRAINING_STATUS_FLAGS, state.status_value()]
}

/// Encode a Control Point response indication.
///
/// Format: `[0x80, request_opcode, result_code]`
pub fn encode_control_response(result: &ControlPointResult) -> [u8; 3] {
    [RESPONSE_CODE, result.echoed_opcode, result.result_code as u8]
}

/// Characteristic a notification goes out on, and its payload.
pub fn encode_notification(notification: &Notification) -> (Uuid, Vec<u8>) {
    match notification {
        Notification::TrainingStatus(state) => {
            (TRAINING_STATUS_UUID, encode_training_status(*state).to_vec())
        }
    }
}
