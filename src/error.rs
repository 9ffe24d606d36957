use std::io;

/// Errors surfaced by the servo bus driver.
///
/// None of these are retried internally: a `BadSync` or `BadChecksum` means
/// the bus may already be out of sync, and only the caller knows whether
/// discarding pending bytes and reissuing the command is safe.
#[derive(Debug, thiserror::Error)]
pub enum ServoBusError {
    #[error("bad sync bytes: expected 55 55, got {0:02X?}")]
    BadSync([u8; 2]),

    #[error("bad frame length: expected {expected}, got {got}")]
    BadLength { expected: u8, got: u8 },

    #[error("checksum mismatch: expected {expected:02X}, got {got:02X}")]
    BadChecksum { expected: u8, got: u8 },

    #[error("timed out waiting for {expected} bytes, got {got}")]
    Timeout { expected: usize, got: usize },

    #[error("attempted to read a response from the broadcast id")]
    BroadcastRead,

    #[error("value {value} out of range for {what} ({min}..={max})")]
    OutOfRange {
        what: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),
}

pub type Result<T> = std::result::Result<T, ServoBusError>;
