//! SocketCAN and board constants
//!
//! This module contains the constants used to talk to the Linux CAN stack,
//! including identifier flags, bus state codes and the default sysfs
//! locations used for board control lines.

// ============================================================================
// CAN ID Flags (in the kernel `can_id` field)
// ============================================================================

/// Extended frame format flag (29-bit ID)
pub const CAN_EFF_FLAG: u32 = 0x8000_0000;
/// Remote transmission request flag
pub const CAN_RTR_FLAG: u32 = 0x4000_0000;
/// Error message frame flag
pub const CAN_ERR_FLAG: u32 = 0x2000_0000;

// ============================================================================
// CAN ID Masks
// ============================================================================

/// Standard frame format mask (11-bit ID)
pub const CAN_SFF_MASK: u32 = 0x0000_07FF;
/// Extended frame format mask (29-bit ID)
pub const CAN_EFF_MASK: u32 = 0x1FFF_FFFF;

// ============================================================================
// CAN Payload Definitions
// ============================================================================

/// Maximum data length for classic CAN
pub const CAN_MAX_DLEN: usize = 8;

// ============================================================================
// CAN State codes (linux/can/netlink.h, enum can_state)
// ============================================================================

/// Normal operation, TEC/REC < 96
pub const CAN_STATE_ERROR_ACTIVE: u32 = 0;
/// TEC/REC >= 96
pub const CAN_STATE_ERROR_WARNING: u32 = 1;
/// TEC/REC >= 128
pub const CAN_STATE_ERROR_PASSIVE: u32 = 2;
/// TEC >= 256
pub const CAN_STATE_BUS_OFF: u32 = 3;
/// Device stopped
pub const CAN_STATE_STOPPED: u32 = 4;
/// Device sleeping
pub const CAN_STATE_SLEEPING: u32 = 5;

// ============================================================================
// Bitrates
// ============================================================================

/// Bitrates accepted by a board profile unless it is given its own table
pub const DEFAULT_BITRATES: [u32; 9] = [
    10_000, 20_000, 50_000, 100_000, 125_000, 250_000, 500_000, 800_000, 1_000_000,
];

// ============================================================================
// Sysfs paths
// ============================================================================

/// Default sysfs GPIO class directory
pub const SYSFS_GPIO_BASE: &str = "/sys/class/gpio";

/// TJA1145 transceiver mode attribute used on the S4 board revision
pub const TJA1145_MODECTRL: &str = "/sys/bus/spi/drivers/tja1145/spi2.0/modectrl";
/// Mode written to wake the TJA1145 transceiver
pub const TJA1145_MODE_NORMAL: &str = "normal";
/// Mode written to put the TJA1145 transceiver into standby
pub const TJA1145_MODE_STANDBY: &str = "standby";

/// Name of the iproute2 binary used for bus configuration
pub const IP_COMMAND: &str = "ip";
