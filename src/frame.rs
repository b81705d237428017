//! CAN frame implementation
//!
//! This module provides the `CanFrame` struct for representing classic CAN
//! frames, and its conversion to and from the frame type the `socketcan`
//! crate reads and writes on a raw CAN socket.

use socketcan::frame::can_frame_default;
use socketcan::{EmbeddedFrame, Frame};

use crate::constants::{
    CAN_EFF_FLAG, CAN_EFF_MASK, CAN_ERR_FLAG, CAN_MAX_DLEN, CAN_RTR_FLAG, CAN_SFF_MASK,
};
use crate::error::{CanError, Result};

/// Classic CAN frame
///
/// Holds the numeric identifier with all flag bits stripped, the payload
/// (0 to 8 bytes) and the three frame flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanFrame {
    id: u32,
    data: Vec<u8>,
    extended: bool,
    remote_request: bool,
    error: bool,
}

impl CanFrame {
    /// Create a new data frame
    ///
    /// The frame uses the extended (29-bit) format exactly when `id` does not
    /// fit in 11 bits.
    ///
    /// # Arguments
    /// * `id` - CAN identifier without flag bits
    /// * `data` - Frame data (up to 8 bytes)
    pub fn new(id: u32, data: &[u8]) -> Result<Self> {
        if id > CAN_EFF_MASK {
            return Err(CanError::InvalidArgument(format!(
                "CAN id 0x{:x} exceeds 29 bits",
                id
            )));
        }
        if data.len() > CAN_MAX_DLEN {
            return Err(CanError::InvalidArgument(format!(
                "payload of {} bytes exceeds {} bytes",
                data.len(),
                CAN_MAX_DLEN
            )));
        }

        Ok(Self {
            id,
            data: data.to_vec(),
            extended: id & CAN_SFF_MASK != id,
            remote_request: false,
            error: false,
        })
    }

    /// Mark the frame as a remote transmission request
    pub fn remote_request(mut self, remote_request: bool) -> Self {
        self.remote_request = remote_request;
        self
    }

    /// Mark the frame as an error frame
    pub fn error_frame(mut self, error: bool) -> Self {
        self.error = error;
        self
    }

    /// Send the frame in extended format even if the id fits in 11 bits
    pub fn extended_format(mut self) -> Self {
        self.extended = true;
        self
    }

    /// Get the identifier (without flags)
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Get frame data as a slice
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Payload length in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the frame carries no payload
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Check if this is an extended ID frame (29-bit)
    pub fn is_extended(&self) -> bool {
        self.extended
    }

    /// Check if this is a remote transmission request
    pub fn is_remote_request(&self) -> bool {
        self.remote_request
    }

    /// Check if this is an error frame
    pub fn is_error(&self) -> bool {
        self.error
    }

    /// Pack the frame for the socket
    ///
    /// The flag bits go into the identifier word as given, so any
    /// combination (e.g. an RTR error frame) survives the trip.
    pub fn encode(&self) -> socketcan::CanFrame {
        let mut can_id = self.id;
        if self.extended {
            can_id |= CAN_EFF_FLAG;
        }
        if self.remote_request {
            can_id |= CAN_RTR_FLAG;
        }
        if self.error {
            can_id |= CAN_ERR_FLAG;
        }

        let mut raw = can_frame_default();
        raw.can_id = can_id;
        raw.can_dlc = self.data.len() as u8;
        raw.data[..self.data.len()].copy_from_slice(&self.data);
        socketcan::CanFrame::from(raw)
    }

    /// Unpack a frame read from the socket
    ///
    /// Flags are tested in the order EFF, ERR, RTR and stripped from the
    /// identifier word.
    pub fn decode(raw: &socketcan::CanFrame) -> Self {
        let mut id = raw.id_word();

        let extended = id & CAN_EFF_FLAG != 0;
        id &= !CAN_EFF_FLAG;

        let error = id & CAN_ERR_FLAG != 0;
        id &= !CAN_ERR_FLAG;

        let remote_request = id & CAN_RTR_FLAG != 0;
        id &= !CAN_RTR_FLAG;

        let data = raw.data();
        let len = data.len().min(CAN_MAX_DLEN);

        Self {
            id,
            data: data[..len].to_vec(),
            extended,
            remote_request,
            error,
        }
    }

    /// Human-readable rendering for logs
    ///
    /// Format: `0x123 EFF RTR ERR 2 -> [0x0c][0x01]`, flags appear only when set.
    pub fn describe(&self) -> String {
        self.to_string()
    }
}

impl From<&socketcan::CanFrame> for CanFrame {
    fn from(raw: &socketcan::CanFrame) -> Self {
        CanFrame::decode(raw)
    }
}

impl From<&CanFrame> for socketcan::CanFrame {
    fn from(frame: &CanFrame) -> Self {
        frame.encode()
    }
}

impl std::fmt::Display for CanFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:x} ", self.id)?;
        if self.extended {
            write!(f, "EFF ")?;
        }
        if self.remote_request {
            write!(f, "RTR ")?;
        }
        if self.error {
            write!(f, "ERR ")?;
        }
        write!(f, "{} -> ", self.data.len())?;
        for byte in &self.data {
            write!(f, "[0x{:02x}]", byte)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_creation() {
        let frame = CanFrame::new(0x123, &[0x0c]).unwrap();
        assert_eq!(frame.id(), 0x123);
        assert_eq!(frame.data(), &[0x0c]);
        assert!(!frame.is_extended());
        assert!(!frame.is_remote_request());
        assert!(!frame.is_error());

        let frame = CanFrame::new(0x800, &[]).unwrap();
        assert!(frame.is_extended());
        assert!(frame.is_empty());
    }

    #[test]
    fn test_rejects_oversized_payload_and_id() {
        let err = CanFrame::new(0x123, &[0u8; 9]).unwrap_err();
        assert!(matches!(err, CanError::InvalidArgument(_)));

        let err = CanFrame::new(0x2000_0000, &[]).unwrap_err();
        assert!(matches!(err, CanError::InvalidArgument(_)));
    }

    #[test]
    fn test_encode_sets_flags_and_length() {
        let frame = CanFrame::new(0x1234_5678, &[1, 2, 3])
            .unwrap()
            .remote_request(true);
        let raw = frame.encode();
        assert!(matches!(raw, socketcan::CanFrame::Remote(_)));
        assert_eq!(raw.id_word(), 0x1234_5678 | CAN_EFF_FLAG | CAN_RTR_FLAG);
        assert_eq!(raw.dlc(), 3);

        let raw = CanFrame::new(0x123, &[0x0c, 0x01]).unwrap().encode();
        assert!(matches!(raw, socketcan::CanFrame::Data(_)));
        assert_eq!(raw.id_word(), 0x123);
        assert_eq!(raw.data(), &[0x0c, 0x01]);
    }

    #[test]
    fn test_round_trip_preserves_flags() {
        let cases = [
            CanFrame::new(0x7FF, &[0xde, 0xad, 0xbe, 0xef, 1, 2, 3, 4]).unwrap(),
            CanFrame::new(0x1FFF_FFFF, &[]).unwrap().error_frame(true),
            CanFrame::new(0x42, &[]).unwrap().extended_format().remote_request(true),
            CanFrame::new(0x100, &[9])
                .unwrap()
                .remote_request(true)
                .error_frame(true),
        ];

        for frame in cases {
            assert_eq!(CanFrame::decode(&frame.encode()), frame);
        }
    }

    #[test]
    fn test_extended_and_error_bits_are_independent() {
        let mut raw = can_frame_default();
        raw.can_id = CAN_EFF_FLAG | CAN_ERR_FLAG | 0x0004;
        raw.can_dlc = 8;
        let raw = socketcan::CanFrame::from(raw);
        assert!(matches!(raw, socketcan::CanFrame::Error(_)));

        let frame = CanFrame::decode(&raw);
        assert!(frame.is_extended());
        assert!(frame.is_error());
        assert!(!frame.is_remote_request());
        assert_eq!(frame.id(), 0x0004);
        assert_eq!(frame.len(), 8);
    }

    #[test]
    fn test_describe() {
        let frame = CanFrame::new(0x123, &[0x0c, 0x01]).unwrap();
        assert_eq!(frame.describe(), "0x123 2 -> [0x0c][0x01]");

        let frame = CanFrame::new(0x18FF_0001, &[0xab])
            .unwrap()
            .remote_request(true)
            .error_frame(true);
        assert_eq!(frame.to_string(), "0x18ff0001 EFF RTR ERR 1 -> [0xab]");
    }
}
