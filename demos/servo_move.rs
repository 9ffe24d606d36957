// Servo move: issues a single timed move and waits for it to finish.
//
// IMPORTANT: Run servo-diagnostic first to confirm the servo responds.
// The servo will move when this runs; keep it clear of obstructions.
//
// Usage: cargo run --bin servo-move -- <port> <servo_id> <degrees> <seconds>
// Example: cargo run --bin servo-move -- /dev/ttyUSB0 1 120.0 1.5

use lewansoul_servo_bus::{Bus, SerialSink};
use std::io::{self, Write};
use std::thread::sleep;
use std::time::Duration;

fn confirm(prompt: &str) -> bool {
    print!("{} [y/N]: ", prompt);
    io::stdout().flush().ok();
    let mut input = String::new();
    io::stdin().read_line(&mut input).ok();
    input.trim().eq_ignore_ascii_case("y")
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("info".parse().unwrap()),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let port = args.next().unwrap_or_else(|| "/dev/ttyUSB0".to_string());
    let id: u8 = args.next().and_then(|s| s.parse().ok()).unwrap_or(1);
    let target_deg: f64 = args.next().and_then(|s| s.parse().ok()).unwrap_or(120.0);
    let seconds: f64 = args.next().and_then(|s| s.parse().ok()).unwrap_or(1.0);

    println!("Servo move (WILL move the servo)");
    println!("Serial port: {}, servo id: {}", port, id);
    println!("Target: {:.2} deg over {:.2} s", target_deg, seconds);
    println!();

    if !confirm("Have you run servo-diagnostic first and confirmed the servo responds?") {
        println!("Aborted.");
        return Ok(());
    }

    let sink = SerialSink::open(&port)?;
    let mut bus = Bus::new(sink);

    bus.move_time_write(id, target_deg, seconds)?;
    sleep(Duration::from_secs_f64(seconds));

    let final_deg = bus.pos_read(id)?;
    println!("Reached {:.2} deg", final_deg);

    Ok(())
}
