//! Bus configuration backend
//!
//! `BusControl` is the capability `InterfaceConfiguration` needs from the
//! system to configure a CAN controller. `IpLink` implements it with
//! iproute2.

use std::process::Command;

use log::debug;

use crate::constants::IP_COMMAND;
use crate::error::{CanError, Result};
use crate::structures::InterfaceState;

/// Controller configuration for a named CAN interface
pub trait BusControl {
    /// Set the nominal bitrate, in bit/s
    fn set_bitrate(&mut self, interface: &str, bitrate: u32) -> Result<()>;

    /// Start the controller (bring the interface up)
    fn start(&mut self, interface: &str) -> Result<()>;

    /// Stop the controller (take the interface down)
    fn stop(&mut self, interface: &str) -> Result<()>;

    /// Current bus state as a kernel `enum can_state` code
    fn state(&mut self, interface: &str) -> Result<u32>;
}

/// `BusControl` through the `ip` command
///
/// Needs `CAP_NET_ADMIN` for everything except `state`.
#[derive(Debug, Clone)]
pub struct IpLink {
    program: String,
}

impl Default for IpLink {
    fn default() -> Self {
        Self::new()
    }
}

impl IpLink {
    /// Run `ip` from `PATH`
    pub fn new() -> Self {
        Self {
            program: IP_COMMAND.to_string(),
        }
    }

    /// Use another `ip` binary, e.g. an absolute path
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn run(&self, args: &[&str]) -> Result<String> {
        let command = format!("{} {}", self.program, args.join(" "));
        debug!("running `{}`", command);

        let output = Command::new(&self.program).args(args).output()?;
        if !output.status.success() {
            return Err(CanError::Command {
                command,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl BusControl for IpLink {
    fn set_bitrate(&mut self, interface: &str, bitrate: u32) -> Result<()> {
        let bitrate = bitrate.to_string();
        self.run(&["link", "set", interface, "type", "can", "bitrate", &bitrate])?;
        Ok(())
    }

    fn start(&mut self, interface: &str) -> Result<()> {
        self.run(&["link", "set", interface, "up"])?;
        Ok(())
    }

    fn stop(&mut self, interface: &str) -> Result<()> {
        self.run(&["link", "set", interface, "down"])?;
        Ok(())
    }

    fn state(&mut self, interface: &str) -> Result<u32> {
        let output = self.run(&["-details", "link", "show", interface])?;
        let name = parse_can_state(&output).ok_or_else(|| {
            CanError::UnrecognizedState(format!("{} reports no CAN state", interface))
        })?;
        InterfaceState::from_name(name)
            .map(|state| state.code())
            .ok_or_else(|| CanError::UnrecognizedState(name.to_string()))
    }
}

/// Extract the state word following `can state` in `ip -details link show` output
fn parse_can_state(output: &str) -> Option<&str> {
    let mut words = output.split_whitespace();
    while let Some(word) = words.next() {
        if word == "can" {
            let mut rest = words.clone();
            if rest.next() == Some("state") {
                return rest.next();
            }
        }
    }
    None
}
