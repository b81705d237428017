//! Error types for the CAN peripheral library
//!
//! This module defines the error types used throughout the library
//! for socket I/O, bus configuration and board control line failures.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for CAN operations
pub type Result<T> = std::result::Result<T, CanError>;

/// Error types for CAN operations
#[derive(Error, Debug)]
pub enum CanError {
    /// Operating system error from a socket call
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Network interface name could not be resolved to an index
    #[error("Interface {interface} not found: {source}")]
    InterfaceNotFound {
        interface: String,
        #[source]
        source: io::Error,
    },

    /// No frame arrived within the receive timeout
    #[error("Read timeout")]
    ReadTimeout,

    /// The socket did not become writable within the send timeout
    #[error("Write timeout")]
    WriteTimeout,

    /// Socket is not open
    #[error("Socket is not open")]
    NotOpen,

    /// Caller supplied a value this layer does not accept
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The bus reported a state this layer does not know
    #[error("Unrecognized interface state: {0}")]
    UnrecognizedState(String),

    /// A bus configuration command failed
    #[error("Command `{command}` failed ({status}): {stderr}")]
    Command {
        command: String,
        status: String,
        stderr: String,
    },

    /// Writing a sysfs control file failed
    #[error("GPIO access to {} failed: {source}", .path.display())]
    Gpio {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Several teardown steps failed
    #[error("Teardown failed in {} steps: {}", .0.len(), join_errors(.0))]
    Teardown(Vec<CanError>),
}

fn join_errors(errors: &[CanError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl CanError {
    /// Check if this error is a timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(self, CanError::ReadTimeout | CanError::WriteTimeout)
    }

    /// Check if this error is an I/O error
    pub fn is_io_error(&self) -> bool {
        match self {
            CanError::Io(_)
            | CanError::InterfaceNotFound { .. }
            | CanError::Command { .. }
            | CanError::Gpio { .. } => true,
            CanError::Teardown(errors) => errors.iter().any(CanError::is_io_error),
            _ => false,
        }
    }

    /// Check if the operation was attempted on a closed socket
    pub fn is_invalid_state(&self) -> bool {
        matches!(self, CanError::NotOpen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::errno::Errno;

    #[test]
    fn test_classification() {
        assert!(CanError::ReadTimeout.is_timeout());
        assert!(CanError::WriteTimeout.is_timeout());
        assert!(!CanError::ReadTimeout.is_io_error());

        let io = CanError::from(io::Error::from(Errno::EIO));
        assert!(io.is_io_error());
        assert!(!io.is_timeout());

        assert!(CanError::NotOpen.is_invalid_state());
        assert!(!CanError::InvalidArgument("x".into()).is_io_error());
    }

    #[test]
    fn test_teardown_message_lists_steps() {
        let err = CanError::Teardown(vec![
            CanError::NotOpen,
            CanError::UnrecognizedState("7".into()),
        ]);
        let text = err.to_string();
        assert!(text.starts_with("Teardown failed in 2 steps"));
        assert!(text.contains("Socket is not open"));
        assert!(text.contains("Unrecognized interface state: 7"));
    }
}
