//! SocketCAN Peripheral Access for Rust
//!
//! This crate provides raw CAN sockets and interface lifecycle control for
//! Linux boards with on-board CAN controllers.
//!
//! # Features
//!
//! - Classic CAN frame codec (standard and extended identifiers, RTR, error frames)
//! - Kernel-side acceptance filters
//! - Send and receive bounded by independently enabled timeouts
//! - Interface bring-up and teardown: bitrate, controller start/stop, terminator
//!   and transceiver control lines
//!
//! # Example
//!
//! ```no_run
//! use can_peripheral::{
//!     BoardProfile, CanError, CanFilter, CanFrame, CanSocket, InterfaceConfiguration, Timeout,
//! };
//!
//! fn main() -> can_peripheral::Result<()> {
//!     // Bring can0 up at 500 kbit/s with the terminator enabled
//!     let board = BoardProfile::rev_s7();
//!     let mut can0 = InterfaceConfiguration::new("can0", 500_000, &board)?.with_terminator(true);
//!     can0.up()?;
//!
//!     let mut socket = CanSocket::new("can0");
//!     socket.open()?;
//!     socket.set_filter(&CanFilter::new(0x123, 0x7FF))?;
//!
//!     // Send a frame
//!     socket.send_frame(&CanFrame::new(0x123, &[0x0C])?)?;
//!
//!     // Read frames, giving up on each after 100 ms
//!     socket.set_recv_timeout(Timeout::from_millis(100));
//!     socket.enable_recv_timeout();
//!     loop {
//!         match socket.receive_frame() {
//!             Ok(frame) => println!("RX  {}", frame),
//!             Err(CanError::ReadTimeout) => continue,
//!             Err(e) => return Err(e),
//!         }
//!     }
//! }
//! ```
//!
//! # Supported Boards
//!
//! - Revision S4: GPIO terminators, TJA1145 transceiver mode attribute
//! - Revision S7: GPIO terminators and transceiver sleep lines
//! - Anything else without control lines (virtual CAN, USB adapters)

pub mod bus;
pub mod constants;
pub mod error;
pub mod filter;
pub mod frame;
pub mod gpio;
pub mod interface;
pub mod socket;
pub mod structures;
pub mod timeout;

// Re-export main types at crate root
pub use constants::{
    // CAN ID flags
    CAN_EFF_FLAG,
    // CAN ID masks
    CAN_EFF_MASK,
    CAN_ERR_FLAG,
    // Frame limits
    CAN_MAX_DLEN,
    CAN_RTR_FLAG,
    CAN_SFF_MASK,
    // CAN state constants
    CAN_STATE_BUS_OFF,
    CAN_STATE_ERROR_ACTIVE,
    CAN_STATE_ERROR_PASSIVE,
    CAN_STATE_ERROR_WARNING,
    CAN_STATE_SLEEPING,
    CAN_STATE_STOPPED,
    DEFAULT_BITRATES,
};

pub use bus::{BusControl, IpLink};
pub use error::{CanError, Result};
pub use filter::CanFilter;
pub use frame::CanFrame;
pub use gpio::{LineControl, SysfsGpio};
pub use interface::InterfaceConfiguration;
pub use socket::CanSocket;
pub use structures::{BoardProfile, InterfaceLines, InterfaceState, TransceiverControl};
pub use timeout::Timeout;
