//! The byte-sink contract the bus needs from its transport collaborator,
//! plus a concrete adapter over a real serial port.
//!
//! The core never depends on `serialport` directly outside this module:
//! everything else talks to a `dyn ByteSink`, which is what lets tests swap
//! in a mock sink that records writes and can be told to echo them back.

use std::io;
use std::io::{Read, Write};
use std::time::Duration;

use serialport::SerialPort;
use tracing::debug;

/// A byte-stream collaborator for the bus: read, write, flush and close.
///
/// Mirrors the Python `read(n)`/`write(bytes)`/`flush()`/`close()` contract
/// this crate's protocol layer was distilled from, rather than reusing
/// `std::io::{Read, Write}` directly, so a sink can report short reads
/// (timeouts) without the caller treating them as an `io::Error`.
pub trait ByteSink {
    /// Read up to `n` bytes, returning fewer on timeout or EOF.
    fn read(&mut self, n: usize) -> io::Result<Vec<u8>>;
    /// Write `bytes`, returning how many were accepted.
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize>;
    /// Block until pending writes have been transmitted.
    fn flush(&mut self) -> io::Result<()>;
    /// Release the underlying port.
    fn close(&mut self) -> io::Result<()>;
}

/// Default baud rate for LX-series servos.
pub const DEFAULT_BAUDRATE: u32 = 115_200;
/// Default per-read timeout.
pub const DEFAULT_TIMEOUT_MS: u64 = 200;

/// A [`ByteSink`] backed by a real serial port.
pub struct SerialSink {
    port: Box<dyn SerialPort>,
}

impl SerialSink {
    /// Open a serial port at the default baud rate.
    pub fn open(port_name: &str) -> Result<Self, serialport::Error> {
        Self::open_with_baudrate(port_name, DEFAULT_BAUDRATE)
    }

    /// Open a serial port at a custom baud rate.
    pub fn open_with_baudrate(port_name: &str, baudrate: u32) -> Result<Self, serialport::Error> {
        let port = serialport::new(port_name, baudrate)
            .timeout(Duration::from_millis(DEFAULT_TIMEOUT_MS))
            .open()?;
        Ok(Self { port })
    }
}

impl ByteSink for SerialSink {
    fn read(&mut self, n: usize) -> io::Result<Vec<u8>> {
        let mut buf = vec![0u8; n];
        let mut filled = 0;
        while filled < n {
            match self.port.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(read) => filled += read,
                Err(e) if e.kind() == io::ErrorKind::TimedOut => break,
                Err(e) => return Err(e),
            }
        }
        buf.truncate(filled);
        if filled < n {
            debug!("short read: wanted {} bytes, got {}", n, filled);
        }
        Ok(buf)
    }

    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.port.write(bytes)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.port.flush()
    }

    fn close(&mut self) -> io::Result<()> {
        // `Box<dyn SerialPort>` releases the OS handle on drop; there is no
        // explicit close in the `serialport` crate, so this is a no-op that
        // exists to satisfy the `ByteSink` contract.
        Ok(())
    }
}
