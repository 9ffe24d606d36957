//! Unit and byte conversions between wire integers and physical quantities.
//!
//! Everything here is pure and deterministic: no I/O, no servo state. The
//! [`crate::bus::Bus`] command surface is the only caller.

use crate::error::{Result, ServoBusError};
use crate::types::TemperatureUnit;

/// Degrees per raw position unit (0..=1000 raw maps to 0..=240 degrees).
pub const DEG_PER_RAW: f64 = 0.24;

fn out_of_range(what: &'static str, value: f64, min: f64, max: f64) -> ServoBusError {
    ServoBusError::OutOfRange {
        what,
        value,
        min,
        max,
    }
}

/// Convert an absolute angle in degrees to a raw position in `0..=1000`.
pub fn angle_to_raw(deg: f64) -> Result<u16> {
    let raw = (deg / DEG_PER_RAW).round();
    if !(0.0..=1000.0).contains(&raw) {
        return Err(out_of_range("angle", deg, 0.0, 240.0));
    }
    Ok(raw as u16)
}

/// Convert a raw position in `0..=1000` to an absolute angle in degrees.
///
/// `raw` is taken as given and not range-checked: [`crate::bus::Bus::pos_read`]
/// passes through values outside `0..=1000` unchanged for disabled servos.
pub fn raw_to_angle(raw: i32) -> f64 {
    raw as f64 * DEG_PER_RAW
}

/// Convert a signed angle offset in degrees to the clamped signed raw byte
/// used by `angle_offset_adjust`/`angle_offset_read`.
pub fn signed_angle_offset_to_raw(deg: f64) -> i8 {
    let raw = (deg / DEG_PER_RAW).round();
    raw.clamp(-125.0, 125.0) as i8
}

/// Decode the signed raw angle-offset byte back to degrees.
pub fn raw_to_signed_angle_offset(byte: u8) -> f64 {
    byte as i8 as f64 * DEG_PER_RAW
}

/// Convert volts to the raw little-endian millivolt reading on the wire.
pub fn voltage_to_raw(volts: f64) -> Result<u16> {
    let raw = (volts * 1000.0).round();
    if !(0.0..=u16::MAX as f64).contains(&raw) {
        return Err(out_of_range("voltage", volts, 0.0, u16::MAX as f64 / 1000.0));
    }
    Ok(raw as u16)
}

/// Convert a raw millivolt reading to volts.
pub fn raw_to_voltage(raw: u16) -> f64 {
    raw as f64 / 1000.0
}

/// Encode a temperature value (in the given unit) to the raw whole-degree
/// Celsius byte the wire expects.
pub fn temperature_encode(value: f64, unit: TemperatureUnit) -> Result<u8> {
    let celsius = match unit {
        TemperatureUnit::Celsius => value,
        TemperatureUnit::Fahrenheit => (value - 32.0) * 5.0 / 9.0,
    };
    let rounded = celsius.round();
    if !(0.0..=255.0).contains(&rounded) {
        return Err(out_of_range("temperature", value, 0.0, 255.0));
    }
    Ok(rounded as u8)
}

/// Decode the raw whole-degree Celsius byte to the requested unit.
pub fn temperature_decode(celsius: u8, unit: TemperatureUnit) -> f64 {
    match unit {
        TemperatureUnit::Celsius => celsius as f64,
        TemperatureUnit::Fahrenheit => celsius as f64 * 9.0 / 5.0 + 32.0,
    }
}

/// Convert a duration in seconds to the raw little-endian millisecond count.
pub fn ms_to_raw(seconds: f64) -> Result<u16> {
    let raw = (seconds * 1000.0).round();
    if !(0.0..=u16::MAX as f64).contains(&raw) {
        return Err(out_of_range("duration", seconds, 0.0, u16::MAX as f64 / 1000.0));
    }
    Ok(raw as u16)
}

/// Convert a raw millisecond count to seconds.
pub fn raw_to_seconds(raw: u16) -> f64 {
    raw as f64 / 1000.0
}

/// Pack a `u16` as two little-endian bytes.
pub fn pack_u16_le(v: u16) -> [u8; 2] {
    v.to_le_bytes()
}

/// Unpack two little-endian bytes as a `u16`.
pub fn unpack_u16_le(bytes: [u8; 2]) -> u16 {
    u16::from_le_bytes(bytes)
}
