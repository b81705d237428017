//! CAN Dump Example
//!
//! Prints every frame received on an interface until interrupted.
//!
//! The interface must already be up, e.g. a virtual bus:
//!
//! ```text
//! ip link add dev vcan0 type vcan && ip link set vcan0 up
//! cargo run --example dump -- vcan0
//! ```

use can_peripheral::CanSocket;

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> can_peripheral::Result<()> {
    let interface = std::env::args().nth(1).unwrap_or_else(|| "can0".to_string());

    let mut socket = CanSocket::new(interface.as_str());
    socket.open()?;
    socket.disable_filter()?;

    // Block until each frame arrives
    socket.disable_recv_timeout();

    println!("Listening on {} (Ctrl+C to stop)", interface);
    loop {
        let frame = socket.receive_frame()?;
        println!("{}  {}", interface, frame);
    }
}
