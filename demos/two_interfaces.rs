//! Two Interface Loop Example
//!
//! Brings can0 and can1 up at 500 kbit/s, with the terminator enabled on
//! can0 only, and checks that a frame sent on can0 arrives on can1 through
//! an acceptance filter. Both interfaces must be wired to the same bus.
//!
//! Needs CAP_NET_ADMIN and write access to the board's GPIO lines.

use can_peripheral::{
    BoardProfile, CanError, CanFilter, CanFrame, CanSocket, InterfaceConfiguration, Timeout,
};

fn main() {
    env_logger::init();

    match run() {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn run() -> can_peripheral::Result<i32> {
    let board = match std::env::args().nth(1).as_deref() {
        Some("s4") => BoardProfile::rev_s4(),
        _ => BoardProfile::rev_s7(),
    };

    println!("{}", "=".repeat(60));
    println!("CAN Two Interface Test");
    println!("{}", "=".repeat(60));
    println!();

    // Configurations take the interfaces down again when dropped
    let mut can0 = InterfaceConfiguration::new("can0", 500_000, &board)?.with_terminator(true);
    let mut can1 = InterfaceConfiguration::new("can1", 500_000, &board)?.with_terminator(false);
    can0.up()?;
    can1.up()?;
    println!("can0: {} (terminator on)", can0.state()?);
    println!("can1: {} (terminator off)", can1.state()?);
    println!();

    let mut tx = CanSocket::new("can0");
    tx.open()?;
    tx.set_send_timeout(Timeout::from_millis(500));
    tx.enable_send_timeout();

    let mut rx = CanSocket::new("can1");
    rx.open()?;
    rx.set_filter(&CanFilter::new(0x123, 0xFFFF))?;
    rx.set_recv_timeout(Timeout::new(1, 0));
    rx.enable_recv_timeout();

    let frame = CanFrame::new(0x123, &[0x0C])?;
    tx.send_frame(&frame)?;
    println!("TX  can0  {}", frame);

    match rx.receive_frame() {
        Ok(received) => {
            println!("RX  can1  {}", received);
            if received != frame {
                println!("FAIL: received frame differs");
                return Ok(1);
            }
        }
        Err(CanError::ReadTimeout) => {
            println!("FAIL: nothing received on can1 within {}", rx.recv_timeout());
            return Ok(1);
        }
        Err(e) => return Err(e),
    }

    println!();
    println!("PASS");
    Ok(0)
}
