// Servo diagnostic: READ-ONLY smoke test to verify a servo responds.
//
// This tool does not write anything to the servo, so it's safe to run on
// powered hardware. Use this first before running servo_move.
//
// Usage: cargo run --bin servo-diagnostic -- <port> [servo_id]
// Example: cargo run --bin servo-diagnostic -- /dev/ttyUSB0 1

use lewansoul_servo_bus::{Bus, SerialSink, TemperatureUnit};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("debug".parse().unwrap()),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let port = args.next().unwrap_or_else(|| "/dev/ttyUSB0".to_string());
    let id: u8 = args.next().and_then(|s| s.parse().ok()).unwrap_or(1);

    println!("Servo diagnostic (read-only)");
    println!("Serial port: {}", port);
    println!("Servo id: {}", id);
    println!();

    println!("Opening serial port...");
    let sink = SerialSink::open(&port)?;
    let mut bus = Bus::new(sink);
    println!("  opened");
    println!();

    match bus.pos_read(id) {
        Ok(deg) => println!("Position:        {:.2} deg", deg),
        Err(e) => println!("Position:        ERROR - {}", e),
    }

    match bus.temp_read(id, TemperatureUnit::Fahrenheit) {
        Ok(f) => println!("Temperature:      {:.1} F", f),
        Err(e) => println!("Temperature:      ERROR - {}", e),
    }

    match bus.vin_read(id) {
        Ok(v) => println!("Input voltage:    {:.2} V", v),
        Err(e) => println!("Input voltage:    ERROR - {}", e),
    }

    match bus.is_powered(id) {
        Ok(on) => println!("Torque enabled:   {}", on),
        Err(e) => println!("Torque enabled:   ERROR - {}", e),
    }

    match bus.mode_read(id) {
        Ok(mode) => println!("Mode:             {:?}", mode),
        Err(e) => println!("Mode:             ERROR - {}", e),
    }

    match bus.velocity_read(id) {
        Ok(v) => println!("Velocity estimate: {:.2} deg/s", v[0]),
        Err(e) => println!("Velocity estimate: ERROR - {}", e),
    }

    Ok(())
}
