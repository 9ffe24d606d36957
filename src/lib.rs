//! Host-side driver for LewanSoul (LX-series) serial bus servos.
//!
//! Small smart actuators chained on a half-duplex asynchronous serial bus,
//! addressed with a 6+N byte frame (`55 55 | id | length | command | payload
//! | checksum`). This crate owns the protocol engine — frame construction,
//! checksum, half-duplex echo handling, request/response correlation and
//! unit conversions — and leaves the serial port itself, CLI wrapping and
//! application configuration to the caller.
//!
//! [`Bus`] is the entry point: it owns a [`sink::ByteSink`] and exposes one
//! method per LewanSoul command, plus a derived [`Bus::velocity_read`] built
//! on top of two timed position reads.

pub mod bus;
pub mod codec;
pub mod error;
pub mod frame;
pub mod sink;
pub mod types;
pub mod velocity;

pub use bus::{Bus, BROADCAST_ID};
pub use error::{Result, ServoBusError};
pub use frame::Frame;
pub use sink::{ByteSink, SerialSink};
pub use types::{LedErrorMask, Mode, TemperatureUnit};
pub use velocity::{Clock, SystemClock};
