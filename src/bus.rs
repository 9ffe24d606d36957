//! The servo bus: transport (frame send/recv/query) and the command surface
//! built on top of it. One `Bus` owns one byte sink, exactly like a physical
//! half-duplex bus has exactly one master.

use std::collections::HashMap;
use std::time::Instant;

use tracing::{trace, warn};

use crate::codec;
use crate::error::{Result, ServoBusError};
use crate::frame::{self, Frame, SYNC};
use crate::sink::ByteSink;
use crate::types::{LedErrorMask, Mode, TemperatureUnit};
use crate::velocity::{Clock, SystemClock};

/// Reserved servo address: commands sent here are write-only and must never
/// expect a reply.
pub const BROADCAST_ID: u8 = 254;

mod cmd {
    pub const MOVE_TIME_WRITE: u8 = 1;
    pub const MOVE_TIME_READ: u8 = 2;
    pub const MOVE_TIME_WAIT_WRITE: u8 = 7;
    pub const MOVE_TIME_WAIT_READ: u8 = 8;
    pub const MOVE_START: u8 = 11;
    pub const MOVE_STOP: u8 = 12;
    pub const ID_WRITE: u8 = 13;
    pub const ANGLE_OFFSET_ADJUST: u8 = 17;
    pub const ANGLE_OFFSET_WRITE: u8 = 18;
    pub const ANGLE_OFFSET_READ: u8 = 19;
    pub const ANGLE_LIMIT_WRITE: u8 = 20;
    pub const ANGLE_LIMIT_READ: u8 = 21;
    pub const VIN_LIMIT_WRITE: u8 = 22;
    pub const VIN_LIMIT_READ: u8 = 23;
    pub const TEMP_MAX_LIMIT_WRITE: u8 = 24;
    pub const TEMP_MAX_LIMIT_READ: u8 = 25;
    pub const TEMP_READ: u8 = 26;
    pub const VIN_READ: u8 = 27;
    pub const POS_READ: u8 = 28;
    pub const MODE_WRITE: u8 = 29;
    pub const MODE_READ: u8 = 30;
    pub const SET_POWERED: u8 = 31;
    pub const IS_POWERED: u8 = 32;
    pub const LED_CTRL_WRITE: u8 = 33;
    pub const LED_CTRL_READ: u8 = 34;
    pub const LED_ERROR_WRITE: u8 = 35;
    pub const LED_ERROR_READ: u8 = 36;
}

/// A servo bus bound to a byte sink, with an injectable clock for the
/// velocity estimator (defaults to the real monotonic clock).
pub struct Bus<S: ByteSink, C: Clock = SystemClock> {
    sink: S,
    discard_echo: bool,
    clock: C,
    /// Most recent `velocity_read` sample per servo id, for future
    /// multi-servo batching; not consulted by `velocity_read` itself, which
    /// always takes two fresh readings.
    last_position: HashMap<u8, (f64, Instant)>,
}

impl<S: ByteSink> Bus<S, SystemClock> {
    /// Take ownership of `sink` with the real monotonic clock.
    pub fn new(sink: S) -> Self {
        Self::with_clock(sink, SystemClock)
    }
}

impl<S: ByteSink, C: Clock> Bus<S, C> {
    /// Take ownership of `sink` with a custom clock (for hermetic tests of
    /// the velocity estimator).
    pub fn with_clock(sink: S, clock: C) -> Self {
        Self {
            sink,
            discard_echo: false,
            clock,
            last_position: HashMap::new(),
        }
    }

    /// Whether the locally echoed copy of each outgoing frame is discarded
    /// before a response is parsed. Off by default.
    pub fn set_discard_echo(&mut self, discard_echo: bool) {
        self.discard_echo = discard_echo;
    }

    pub fn discard_echo(&self) -> bool {
        self.discard_echo
    }

    #[cfg(test)]
    pub(crate) fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    // ---- transport ----

    fn send(&mut self, id: u8, command: u8, payload: &[u8]) -> Result<()> {
        let wire = frame::build(id, command, payload);
        trace!(id, command, frame = ?wire, "send frame");
        self.sink.write(&wire)?;
        self.sink.flush()?;

        if self.discard_echo {
            let echoed = self.sink.read(wire.len())?;
            if echoed.len() != wire.len() {
                warn!(
                    expected = wire.len(),
                    got = echoed.len(),
                    "short echo read while discarding half-duplex echo"
                );
            }
        }
        Ok(())
    }

    fn recv(&mut self, expected_payload_len: usize) -> Result<Frame> {
        let header = self.sink.read(5)?;
        if header.len() < 5 {
            return Err(ServoBusError::Timeout {
                expected: 5,
                got: header.len(),
            });
        }
        if header[0] != SYNC[0] || header[1] != SYNC[1] {
            warn!(bytes = ?&header[..2], "bad sync in response header");
            return Err(ServoBusError::BadSync([header[0], header[1]]));
        }

        let id = header[2];
        let length = header[3];
        let command = header[4];

        let expected_length = (3 + expected_payload_len) as u8;
        if length != expected_length {
            return Err(ServoBusError::BadLength {
                expected: expected_length,
                got: length,
            });
        }

        let rest = self.sink.read(expected_payload_len + 1)?;
        if rest.len() != expected_payload_len + 1 {
            return Err(ServoBusError::Timeout {
                expected: expected_payload_len + 1,
                got: rest.len(),
            });
        }

        let payload = rest[..expected_payload_len].to_vec();
        let received_checksum = rest[expected_payload_len];
        let expected_checksum = frame::checksum(id, length, command, &payload);
        if received_checksum != expected_checksum {
            warn!(
                expected = expected_checksum,
                got = received_checksum,
                "bad checksum in response"
            );
            return Err(ServoBusError::BadChecksum {
                expected: expected_checksum,
                got: received_checksum,
            });
        }

        trace!(id, command, ?payload, "recv frame");
        Ok(Frame {
            id,
            command,
            payload,
        })
    }

    fn query(
        &mut self,
        id: u8,
        command: u8,
        payload: &[u8],
        expected_reply_payload_len: usize,
    ) -> Result<Frame> {
        if id == BROADCAST_ID {
            return Err(ServoBusError::BroadcastRead);
        }
        self.send(id, command, payload)?;
        self.recv(expected_reply_payload_len)
    }

    // ---- move ----

    pub fn move_time_write(&mut self, id: u8, deg: f64, seconds: f64) -> Result<()> {
        let raw_pos = codec::angle_to_raw(deg)?;
        let raw_ms = codec::ms_to_raw(seconds)?;
        let payload = pack_pos_ms(raw_pos, raw_ms);
        self.send(id, cmd::MOVE_TIME_WRITE, &payload)
    }

    pub fn move_time_read(&mut self, id: u8) -> Result<(f64, f64)> {
        let frame = self.query(id, cmd::MOVE_TIME_READ, &[], 4)?;
        Ok(unpack_pos_ms(&frame.payload))
    }

    pub fn move_time_wait_write(&mut self, id: u8, deg: f64, seconds: f64) -> Result<()> {
        let raw_pos = codec::angle_to_raw(deg)?;
        let raw_ms = codec::ms_to_raw(seconds)?;
        let payload = pack_pos_ms(raw_pos, raw_ms);
        self.send(id, cmd::MOVE_TIME_WAIT_WRITE, &payload)
    }

    pub fn move_time_wait_read(&mut self, id: u8) -> Result<(f64, f64)> {
        let frame = self.query(id, cmd::MOVE_TIME_WAIT_READ, &[], 4)?;
        Ok(unpack_pos_ms(&frame.payload))
    }

    pub fn move_start(&mut self, id: u8) -> Result<()> {
        self.send(id, cmd::MOVE_START, &[])
    }

    pub fn move_stop(&mut self, id: u8) -> Result<()> {
        self.send(id, cmd::MOVE_STOP, &[])
    }

    pub fn id_write(&mut self, id: u8, new_id: u8) -> Result<()> {
        self.send(id, cmd::ID_WRITE, &[new_id])
    }

    pub fn angle_offset_adjust(&mut self, id: u8, deg: f64) -> Result<()> {
        let raw = codec::signed_angle_offset_to_raw(deg);
        self.send(id, cmd::ANGLE_OFFSET_ADJUST, &[raw as u8])
    }

    /// Persist the offset most recently set with `angle_offset_adjust`.
    pub fn angle_offset_write(&mut self, id: u8) -> Result<()> {
        self.send(id, cmd::ANGLE_OFFSET_WRITE, &[])
    }

    pub fn angle_offset_read(&mut self, id: u8) -> Result<f64> {
        let frame = self.query(id, cmd::ANGLE_OFFSET_READ, &[], 1)?;
        Ok(codec::raw_to_signed_angle_offset(frame.payload[0]))
    }

    pub fn angle_limit_write(&mut self, id: u8, min_deg: f64, max_deg: f64) -> Result<()> {
        let min_raw = codec::angle_to_raw(min_deg)?;
        let max_raw = codec::angle_to_raw(max_deg)?;
        let payload = pack_pos_ms(min_raw, max_raw);
        self.send(id, cmd::ANGLE_LIMIT_WRITE, &payload)
    }

    pub fn angle_limit_read(&mut self, id: u8) -> Result<(f64, f64)> {
        let frame = self.query(id, cmd::ANGLE_LIMIT_READ, &[], 4)?;
        let (min_raw, max_raw) = unpack_u16_pair(&frame.payload);
        Ok((
            codec::raw_to_angle(min_raw as i32),
            codec::raw_to_angle(max_raw as i32),
        ))
    }

    pub fn vin_limit_write(&mut self, id: u8, min_volts: f64, max_volts: f64) -> Result<()> {
        let min_raw = codec::voltage_to_raw(min_volts)?;
        let max_raw = codec::voltage_to_raw(max_volts)?;
        let payload = pack_pos_ms(min_raw, max_raw);
        self.send(id, cmd::VIN_LIMIT_WRITE, &payload)
    }

    pub fn vin_limit_read(&mut self, id: u8) -> Result<(f64, f64)> {
        let frame = self.query(id, cmd::VIN_LIMIT_READ, &[], 4)?;
        let (min_raw, max_raw) = unpack_u16_pair(&frame.payload);
        Ok((codec::raw_to_voltage(min_raw), codec::raw_to_voltage(max_raw)))
    }

    pub fn temp_max_limit_write(&mut self, id: u8, value: f64, unit: TemperatureUnit) -> Result<()> {
        let raw = codec::temperature_encode(value, unit)?;
        self.send(id, cmd::TEMP_MAX_LIMIT_WRITE, &[raw])
    }

    pub fn temp_max_limit_read(&mut self, id: u8, unit: TemperatureUnit) -> Result<f64> {
        let frame = self.query(id, cmd::TEMP_MAX_LIMIT_READ, &[], 1)?;
        Ok(codec::temperature_decode(frame.payload[0], unit))
    }

    pub fn temp_read(&mut self, id: u8, unit: TemperatureUnit) -> Result<f64> {
        let frame = self.query(id, cmd::TEMP_READ, &[], 1)?;
        Ok(codec::temperature_decode(frame.payload[0], unit))
    }

    pub fn vin_read(&mut self, id: u8) -> Result<f64> {
        let frame = self.query(id, cmd::VIN_READ, &[], 2)?;
        let raw = codec::unpack_u16_le([frame.payload[0], frame.payload[1]]);
        Ok(codec::raw_to_voltage(raw))
    }

    /// Read the raw position and convert to degrees. Values outside
    /// `0..=1000` raw (i.e. outside `0..=240` degrees) are passed through
    /// unclamped for servos with positioning disabled.
    pub fn pos_read(&mut self, id: u8) -> Result<f64> {
        let frame = self.query(id, cmd::POS_READ, &[], 2)?;
        let raw = i16::from_le_bytes([frame.payload[0], frame.payload[1]]);
        Ok(codec::raw_to_angle(raw as i32))
    }

    pub fn mode_write(&mut self, id: u8, mode: Mode) -> Result<()> {
        let payload = match mode {
            Mode::Servo => [0u8, 0, 0, 0],
            Mode::Motor { speed } => {
                let [lo, hi] = speed.to_le_bytes();
                [1, 0, lo, hi]
            }
        };
        self.send(id, cmd::MODE_WRITE, &payload)
    }

    pub fn mode_read(&mut self, id: u8) -> Result<Mode> {
        let frame = self.query(id, cmd::MODE_READ, &[], 4)?;
        if frame.payload[0] == 0 {
            Ok(Mode::Servo)
        } else {
            let speed = i16::from_le_bytes([frame.payload[2], frame.payload[3]]);
            Ok(Mode::Motor { speed })
        }
    }

    pub fn set_powered(&mut self, id: u8, on: bool) -> Result<()> {
        self.send(id, cmd::SET_POWERED, &[on as u8])
    }

    pub fn is_powered(&mut self, id: u8) -> Result<bool> {
        let frame = self.query(id, cmd::IS_POWERED, &[], 1)?;
        Ok(frame.payload[0] != 0)
    }

    /// Turn the status LED on or off. The wire byte is inverted (`0` = on,
    /// `1` = off); the inversion happens only here, at the API boundary.
    pub fn led_ctrl_write(&mut self, id: u8, on: bool) -> Result<()> {
        self.send(id, cmd::LED_CTRL_WRITE, &[(!on) as u8])
    }

    pub fn led_ctrl_read(&mut self, id: u8) -> Result<bool> {
        let frame = self.query(id, cmd::LED_CTRL_READ, &[], 1)?;
        Ok(frame.payload[0] == 0)
    }

    pub fn led_error_write(&mut self, id: u8, mask: LedErrorMask) -> Result<()> {
        self.send(id, cmd::LED_ERROR_WRITE, &[mask.to_raw()])
    }

    pub fn led_error_read(&mut self, id: u8) -> Result<LedErrorMask> {
        let frame = self.query(id, cmd::LED_ERROR_READ, &[], 1)?;
        Ok(LedErrorMask::from_raw(frame.payload[0]))
    }

    /// Move to `target_deg` at approximately `speed_deg_per_s`: reads the
    /// current position, derives a travel time from the remaining distance,
    /// and issues `move_time_write`. A composition of existing primitives,
    /// not a new wire command.
    pub fn move_speed_write(&mut self, id: u8, target_deg: f64, speed_deg_per_s: f64) -> Result<()> {
        let current_deg = self.pos_read(id)?;
        let distance = (target_deg - current_deg).abs();
        let seconds = if speed_deg_per_s <= 0.0 {
            0.001
        } else {
            (distance / speed_deg_per_s).max(0.001)
        };
        self.move_time_write(id, target_deg, seconds)
    }

    // ---- velocity estimator ----

    /// Differentiate two timed `pos_read` calls into an angular velocity.
    ///
    /// Returns a single-element vector so the API can grow to batch several
    /// servos per call without changing its shape.
    pub fn velocity_read(&mut self, id: u8) -> Result<Vec<f64>> {
        let t1 = self.clock.now();
        let p1 = self.pos_read(id)?;
        let t2 = self.clock.now();
        let p2 = self.pos_read(id)?;

        let dt = t2.saturating_duration_since(t1).as_secs_f64();
        let velocity = if dt > 0.0 { (p2 - p1) / dt } else { 0.0 };

        self.last_position.insert(id, (p2, t2));
        Ok(vec![velocity])
    }
}

impl<S: ByteSink, C: Clock> Drop for Bus<S, C> {
    fn drop(&mut self) {
        if let Err(e) = self.sink.close() {
            warn!("failed to close servo bus sink: {}", e);
        }
    }
}

fn pack_pos_ms(a: u16, b: u16) -> [u8; 4] {
    let [a0, a1] = a.to_le_bytes();
    let [b0, b1] = b.to_le_bytes();
    [a0, a1, b0, b1]
}

fn unpack_pos_ms(payload: &[u8]) -> (f64, f64) {
    let (raw_pos, raw_ms) = unpack_u16_pair(payload);
    (codec::raw_to_angle(raw_pos as i32), codec::raw_to_seconds(raw_ms))
}

fn unpack_u16_pair(payload: &[u8]) -> (u16, u16) {
    let a = codec::unpack_u16_le([payload[0], payload[1]]);
    let b = codec::unpack_u16_le([payload[2], payload[3]]);
    (a, b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::velocity::ScriptedClock;
    use std::collections::VecDeque;
    use std::io;

    struct MockSink {
        echo: bool,
        read_buffer: VecDeque<u8>,
        write_buffer: Vec<u8>,
        closed_count: usize,
    }

    impl MockSink {
        fn new() -> Self {
            Self {
                echo: false,
                read_buffer: VecDeque::new(),
                write_buffer: Vec::new(),
                closed_count: 0,
            }
        }

        fn set_read_buffer(&mut self, bytes: &[u8]) {
            self.read_buffer = bytes.iter().copied().collect();
        }
    }

    impl ByteSink for MockSink {
        fn read(&mut self, n: usize) -> io::Result<Vec<u8>> {
            let take = n.min(self.read_buffer.len());
            Ok(self.read_buffer.drain(..take).collect())
        }

        fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
            self.write_buffer.extend_from_slice(bytes);
            if self.echo {
                for (i, &b) in bytes.iter().enumerate() {
                    self.read_buffer.insert(i, b);
                }
            }
            Ok(bytes.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }

        fn close(&mut self) -> io::Result<()> {
            self.closed_count += 1;
            Ok(())
        }
    }

    #[test]
    fn angle_limit_write_fixture() {
        let mut bus = Bus::new(MockSink::new());
        bus.angle_limit_write(1, 90.0, 180.0).unwrap();
        assert_eq!(
            bus.sink_mut().write_buffer,
            vec![0x55, 0x55, 0x01, 0x07, 0x14, 0x77, 0x01, 0xEE, 0x02, 0x7B]
        );
    }

    #[test]
    fn angle_limit_read_fixture() {
        let mut bus = Bus::new(MockSink::new());
        bus.sink_mut()
            .set_read_buffer(&[0x55, 0x55, 0x02, 0x07, 0x15, 0x02, 0x01, 0x04, 0x03, 0xD7]);
        let (min_deg, max_deg) = bus.angle_limit_read(2).unwrap();
        assert!((min_deg - 61.92).abs() < 1e-9);
        assert!((max_deg - 185.28).abs() < 1e-9);
        assert_eq!(
            bus.sink_mut().write_buffer,
            vec![0x55, 0x55, 0x02, 0x03, 0x15, 0xE5]
        );
    }

    #[test]
    fn mode_write_motor_broadcast_fixture() {
        let mut bus = Bus::new(MockSink::new());
        bus.mode_write(BROADCAST_ID, Mode::Motor { speed: 10 })
            .unwrap();
        assert_eq!(
            bus.sink_mut().write_buffer,
            vec![0x55, 0x55, 0xFE, 0x07, 0x1D, 0x01, 0x00, 0x0A, 0x00, 0xD2]
        );
    }

    #[test]
    fn mode_write_servo_broadcast_fixture() {
        let mut bus = Bus::new(MockSink::new());
        bus.mode_write(BROADCAST_ID, Mode::Servo).unwrap();
        assert_eq!(
            bus.sink_mut().write_buffer,
            vec![0x55, 0x55, 0xFE, 0x07, 0x1D, 0x00, 0x00, 0x00, 0x00, 0xDD]
        );
    }

    #[test]
    fn mode_read_motor_fixture() {
        let mut bus = Bus::new(MockSink::new());
        bus.sink_mut()
            .set_read_buffer(&[0x55, 0x55, 0x02, 0x07, 0x1E, 0x01, 0x00, 0x02, 0x03, 0xD2]);
        assert_eq!(bus.mode_read(2).unwrap(), Mode::Motor { speed: 770 });
    }

    #[test]
    fn mode_read_servo_fixture() {
        let mut bus = Bus::new(MockSink::new());
        bus.sink_mut()
            .set_read_buffer(&[0x55, 0x55, 0x02, 0x07, 0x1E, 0x00, 0x00, 0x00, 0x00, 0xD8]);
        assert_eq!(bus.mode_read(2).unwrap(), Mode::Servo);
    }

    #[test]
    fn temp_max_limit_read_fixture() {
        let mut bus = Bus::new(MockSink::new());
        bus.sink_mut()
            .set_read_buffer(&[0x55, 0x55, 0x02, 0x04, 0x19, 0x64, 0x7C]);
        let f = bus.temp_max_limit_read(2, TemperatureUnit::Fahrenheit).unwrap();
        assert!((f - 212.0).abs() < 1e-9);
    }

    #[test]
    fn pos_read_fixture() {
        let mut bus = Bus::new(MockSink::new());
        bus.sink_mut()
            .set_read_buffer(&[0x55, 0x55, 0x01, 0x05, 0x1C, 0x0A, 0x00, 0xD3]);
        let deg = bus.pos_read(1).unwrap();
        assert!((deg - 2.4).abs() < 1e-9);
        assert_eq!(
            bus.sink_mut().write_buffer,
            vec![0x55, 0x55, 0x01, 0x03, 0x1C, 0xDF]
        );
    }

    #[test]
    fn pos_read_discards_echo() {
        let mut bus = Bus::new(MockSink::new());
        bus.set_discard_echo(true);
        bus.sink_mut().echo = true;
        bus.sink_mut()
            .set_read_buffer(&[0x55, 0x55, 0x01, 0x05, 0x1C, 0x0A, 0x00, 0xD3]);

        let deg = bus.pos_read(1).unwrap();

        assert!((deg - 2.4).abs() < 1e-9);
        assert!(bus.sink_mut().read_buffer.is_empty());
    }

    #[test]
    fn set_powered_broadcast_fixtures() {
        let mut bus = Bus::new(MockSink::new());
        bus.set_powered(BROADCAST_ID, false).unwrap();
        assert_eq!(
            bus.sink_mut().write_buffer,
            vec![0x55, 0x55, 0xFE, 0x04, 0x1F, 0x00, 0xDE]
        );

        let mut bus = Bus::new(MockSink::new());
        bus.set_powered(BROADCAST_ID, true).unwrap();
        assert_eq!(
            bus.sink_mut().write_buffer,
            vec![0x55, 0x55, 0xFE, 0x04, 0x1F, 0x01, 0xDD]
        );
    }

    #[test]
    fn angle_offset_write_fixture() {
        let mut bus = Bus::new(MockSink::new());
        bus.angle_offset_write(1).unwrap();
        assert_eq!(
            bus.sink_mut().write_buffer,
            vec![0x55, 0x55, 0x01, 0x03, 0x12, 0xE9]
        );
    }

    #[test]
    fn id_write_fixture() {
        let mut bus = Bus::new(MockSink::new());
        bus.id_write(1, 2).unwrap();
        assert_eq!(
            bus.sink_mut().write_buffer,
            vec![0x55, 0x55, 0x01, 0x04, 0x0D, 0x02, 0xEB]
        );
    }

    #[test]
    fn move_time_write_fixture() {
        let mut bus = Bus::new(MockSink::new());
        bus.move_time_write(1, 2.0, 3.0).unwrap();
        assert_eq!(
            bus.sink_mut().write_buffer,
            vec![0x55, 0x55, 0x01, 0x07, 0x01, 0x08, 0x00, 0xB8, 0x0B, 0x2B]
        );
    }

    #[test]
    fn mock_sink_close_increments_counter() {
        let mut sink = MockSink::new();
        sink.close().unwrap();
        assert_eq!(sink.closed_count, 1);
    }

    #[test]
    fn broadcast_read_is_refused() {
        let mut bus = Bus::new(MockSink::new());
        assert!(matches!(
            bus.pos_read(BROADCAST_ID),
            Err(ServoBusError::BroadcastRead)
        ));
        // Refusing happens before any bytes are written.
        assert!(bus.sink_mut().write_buffer.is_empty());
    }

    #[test]
    fn bus_closes_sink_exactly_once_on_drop() {
        let closed = std::rc::Rc::new(std::cell::RefCell::new(0usize));
        struct TrackingSink {
            closed: std::rc::Rc<std::cell::RefCell<usize>>,
        }
        impl ByteSink for TrackingSink {
            fn read(&mut self, _n: usize) -> io::Result<Vec<u8>> {
                Ok(vec![])
            }
            fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
                Ok(bytes.len())
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
            fn close(&mut self) -> io::Result<()> {
                *self.closed.borrow_mut() += 1;
                Ok(())
            }
        }

        let bus = Bus::new(TrackingSink {
            closed: closed.clone(),
        });
        drop(bus);
        assert_eq!(*closed.borrow(), 1);
    }

    #[test]
    fn velocity_read_differentiates_two_reads() {
        let mut sink = MockSink::new();
        sink.set_read_buffer(&[
            0x55, 0x55, 0x01, 0x05, 0x1C, 0x0A, 0x00, 0xD3, // pos = raw 10 -> 2.4deg
            0x55, 0x55, 0x01, 0x05, 0x1C, 0x14, 0x00, 0xC9, // pos = raw 20 -> 4.8deg
        ]);
        let clock = ScriptedClock::new([0, 500]);
        let mut bus = Bus::with_clock(sink, clock);

        let velocity = bus.velocity_read(1).unwrap();
        assert_eq!(velocity.len(), 1);
        // (4.8 - 2.4) deg over 0.5s = 4.8 deg/s
        assert!((velocity[0] - 4.8).abs() < 1e-6);
    }

    #[test]
    fn move_speed_write_composes_pos_read_and_move_time_write() {
        let mut sink = MockSink::new();
        sink.set_read_buffer(&[0x55, 0x55, 0x01, 0x05, 0x1C, 0x00, 0x00, 0xDD]); // pos = 0
        let mut bus = Bus::new(sink);

        bus.move_speed_write(1, 24.0, 24.0).unwrap();

        // current=0deg, target=24deg, speed=24deg/s -> 1s -> raw_ms=1000, raw_pos=100
        let written = &bus.sink_mut().write_buffer;
        // First the pos_read request, then the move_time_write.
        assert_eq!(&written[..6], &[0x55, 0x55, 0x01, 0x03, 0x1C, 0xDF]);
        let move_frame = &written[6..];
        assert_eq!(move_frame[0..5], [0x55, 0x55, 0x01, 0x07, 0x01]);
        let raw_pos = codec::unpack_u16_le([move_frame[5], move_frame[6]]);
        let raw_ms = codec::unpack_u16_le([move_frame[7], move_frame[8]]);
        assert_eq!(raw_pos, 100);
        assert_eq!(raw_ms, 1000);
    }
}
