//! Interface state and board description structures
//!
//! This module contains the bus state reported for a CAN interface and the
//! data describing which control lines a board wires to each interface.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::constants::{
    CAN_STATE_BUS_OFF, CAN_STATE_ERROR_ACTIVE, CAN_STATE_ERROR_PASSIVE, CAN_STATE_ERROR_WARNING,
    CAN_STATE_SLEEPING, CAN_STATE_STOPPED, DEFAULT_BITRATES, TJA1145_MODECTRL,
    TJA1145_MODE_NORMAL, TJA1145_MODE_STANDBY,
};

/// CAN controller bus state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InterfaceState {
    /// Controller stopped (interface down)
    Stopped,
    /// Normal operation
    ErrorActive,
    /// TEC/REC >= 128
    ErrorPassive,
    /// TEC/REC >= 96
    ErrorWarning,
    /// Controller left the bus after too many transmit errors
    BusOff,
    /// Controller sleeping
    Sleeping,
}

impl InterfaceState {
    /// Map a kernel `enum can_state` code
    ///
    /// Returns `None` for codes this layer does not know.
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            CAN_STATE_ERROR_ACTIVE => Some(InterfaceState::ErrorActive),
            CAN_STATE_ERROR_WARNING => Some(InterfaceState::ErrorWarning),
            CAN_STATE_ERROR_PASSIVE => Some(InterfaceState::ErrorPassive),
            CAN_STATE_BUS_OFF => Some(InterfaceState::BusOff),
            CAN_STATE_STOPPED => Some(InterfaceState::Stopped),
            CAN_STATE_SLEEPING => Some(InterfaceState::Sleeping),
            _ => None,
        }
    }

    /// Map the state name printed by `ip -details link show`
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "ERROR-ACTIVE" => Some(InterfaceState::ErrorActive),
            "ERROR-WARNING" => Some(InterfaceState::ErrorWarning),
            "ERROR-PASSIVE" => Some(InterfaceState::ErrorPassive),
            "BUS-OFF" => Some(InterfaceState::BusOff),
            "STOPPED" => Some(InterfaceState::Stopped),
            "SLEEPING" => Some(InterfaceState::Sleeping),
            _ => None,
        }
    }

    /// Kernel `enum can_state` code
    pub fn code(&self) -> u32 {
        match self {
            InterfaceState::ErrorActive => CAN_STATE_ERROR_ACTIVE,
            InterfaceState::ErrorWarning => CAN_STATE_ERROR_WARNING,
            InterfaceState::ErrorPassive => CAN_STATE_ERROR_PASSIVE,
            InterfaceState::BusOff => CAN_STATE_BUS_OFF,
            InterfaceState::Stopped => CAN_STATE_STOPPED,
            InterfaceState::Sleeping => CAN_STATE_SLEEPING,
        }
    }

    /// Get human-readable state name
    pub fn name(&self) -> &'static str {
        match self {
            InterfaceState::ErrorActive => "ERROR_ACTIVE",
            InterfaceState::ErrorWarning => "ERROR_WARNING",
            InterfaceState::ErrorPassive => "ERROR_PASSIVE",
            InterfaceState::BusOff => "BUS_OFF",
            InterfaceState::Stopped => "STOPPED",
            InterfaceState::Sleeping => "SLEEPING",
        }
    }
}

impl std::fmt::Display for InterfaceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// How a board switches the transceiver of an interface between active and standby
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TransceiverControl {
    /// Transceiver is always active
    #[default]
    None,
    /// GPIO line, high = transceiver enabled
    SleepGpio(u32),
    /// Sysfs attribute taking a mode string
    ModeFile {
        path: PathBuf,
        enable: String,
        disable: String,
    },
}

/// Control lines a board wires to one CAN interface
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InterfaceLines {
    /// GPIO switching the termination resistor, high = terminated
    pub terminator: Option<u32>,
    /// Transceiver enable control
    pub transceiver: TransceiverControl,
    /// Whether this layer exports the GPIO lines itself (and unexports them on teardown)
    pub export: bool,
}

impl InterfaceLines {
    /// GPIO numbers used by these lines, transceiver sleep line first
    ///
    /// Lines are exported, configured and released in this order.
    pub fn gpios(&self) -> Vec<u32> {
        let mut gpios = Vec::with_capacity(2);
        if let TransceiverControl::SleepGpio(gpio) = self.transceiver {
            gpios.push(gpio);
        }
        if let Some(gpio) = self.terminator {
            gpios.push(gpio);
        }
        gpios
    }
}

/// Board description: control lines per interface and accepted bitrates
///
/// Interfaces without an entry (virtual CAN, USB adapters) have no control
/// lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardProfile {
    lines: HashMap<String, InterfaceLines>,
    bitrates: Vec<u32>,
}

impl Default for BoardProfile {
    fn default() -> Self {
        Self::new(DEFAULT_BITRATES.to_vec())
    }
}

impl BoardProfile {
    /// Create a profile without control lines
    ///
    /// # Arguments
    /// * `bitrates` - Bitrates the board accepts, in bit/s
    pub fn new(bitrates: Vec<u32>) -> Self {
        Self {
            lines: HashMap::new(),
            bitrates,
        }
    }

    /// Add or replace the control lines of an interface
    pub fn with_interface(mut self, name: impl Into<String>, lines: InterfaceLines) -> Self {
        self.lines.insert(name.into(), lines);
        self
    }

    /// Board revision S4: terminators on GPIO 500 (can0) and 502 (can1),
    /// can0 transceiver through the TJA1145 mode attribute. Lines are
    /// exported by the platform.
    pub fn rev_s4() -> Self {
        Self::default()
            .with_interface(
                "can0",
                InterfaceLines {
                    terminator: Some(500),
                    transceiver: TransceiverControl::ModeFile {
                        path: PathBuf::from(TJA1145_MODECTRL),
                        enable: TJA1145_MODE_NORMAL.to_string(),
                        disable: TJA1145_MODE_STANDBY.to_string(),
                    },
                    export: false,
                },
            )
            .with_interface(
                "can1",
                InterfaceLines {
                    terminator: Some(502),
                    transceiver: TransceiverControl::None,
                    export: false,
                },
            )
    }

    /// Board revision S7: terminators on GPIO 498 (can0) and 501 (can1),
    /// transceiver sleep lines on 499 (can0) and 500 (can1). Lines are
    /// exported on bring-up and unexported on teardown.
    pub fn rev_s7() -> Self {
        Self::default()
            .with_interface(
                "can0",
                InterfaceLines {
                    terminator: Some(498),
                    transceiver: TransceiverControl::SleepGpio(499),
                    export: true,
                },
            )
            .with_interface(
                "can1",
                InterfaceLines {
                    terminator: Some(501),
                    transceiver: TransceiverControl::SleepGpio(500),
                    export: true,
                },
            )
    }

    /// Control lines of an interface, if the board wires any
    pub fn lines(&self, interface: &str) -> Option<&InterfaceLines> {
        self.lines.get(interface)
    }

    /// Accepted bitrates
    pub fn bitrates(&self) -> &[u32] {
        &self.bitrates
    }

    /// Check if the board accepts a bitrate
    pub fn supports_bitrate(&self, bitrate: u32) -> bool {
        self.bitrates.contains(&bitrate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_codes_round_trip() {
        for code in 0..=5 {
            let state = InterfaceState::from_code(code).unwrap();
            assert_eq!(state.code(), code);
        }
        assert_eq!(InterfaceState::from_code(4), Some(InterfaceState::Stopped));
        assert_eq!(InterfaceState::from_code(6), None);
    }

    #[test]
    fn test_state_names() {
        assert_eq!(
            InterfaceState::from_name("ERROR-PASSIVE"),
            Some(InterfaceState::ErrorPassive)
        );
        assert_eq!(InterfaceState::from_name("BUS-OFF"), Some(InterfaceState::BusOff));
        assert_eq!(InterfaceState::from_name("bogus"), None);
        assert_eq!(InterfaceState::BusOff.to_string(), "BUS_OFF");
    }

    #[test]
    fn test_default_profile() {
        let board = BoardProfile::default();
        assert!(board.lines("can0").is_none());
        assert!(board.supports_bitrate(500_000));
        assert!(!board.supports_bitrate(333_333));
        assert_eq!(board.bitrates().len(), 9);
    }

    #[test]
    fn test_revision_presets() {
        let s7 = BoardProfile::rev_s7();
        let can1 = s7.lines("can1").unwrap();
        assert_eq!(can1.gpios(), vec![500, 501]);
        assert!(can1.export);

        let s4 = BoardProfile::rev_s4();
        let can0 = s4.lines("can0").unwrap();
        assert_eq!(can0.gpios(), vec![500]);
        assert!(matches!(can0.transceiver, TransceiverControl::ModeFile { .. }));
        assert!(!can0.export);
        assert!(s4.lines("vcan0").is_none());
    }
}
