//! CAN interface lifecycle
//!
//! This module provides `InterfaceConfiguration`, which brings a physical CAN
//! interface up (bitrate, controller start, terminator and transceiver lines)
//! and takes it down again.

use log::{debug, error, info, warn};

use crate::bus::{BusControl, IpLink};
use crate::error::{CanError, Result};
use crate::gpio::{LineControl, SysfsGpio};
use crate::structures::{BoardProfile, InterfaceLines, InterfaceState, TransceiverControl};

/// Desired configuration of one CAN interface, and its bring-up state
///
/// `up` applies the configuration, `down` reverts it. If the interface was
/// brought up and auto-shutdown is enabled (the default), dropping the value
/// takes it down; failures there are logged.
///
/// # Example
///
/// ```no_run
/// use can_peripheral::{BoardProfile, InterfaceConfiguration};
///
/// let board = BoardProfile::rev_s7();
/// let mut can0 = InterfaceConfiguration::new("can0", 500_000, &board)?.with_terminator(true);
/// can0.up()?;
/// println!("can0 state: {}", can0.state()?);
/// can0.down()?;
/// # Ok::<(), can_peripheral::CanError>(())
/// ```
pub struct InterfaceConfiguration<B: BusControl = IpLink, L: LineControl = SysfsGpio> {
    /// Network interface name
    name: String,
    /// Nominal bitrate in bit/s
    bitrate: u32,
    /// Terminator state applied on bring-up
    terminator: bool,
    /// Take the interface down on drop
    auto_shutdown: bool,
    /// Board lines wired to this interface
    lines: InterfaceLines,
    bus: B,
    gpio: L,
    /// Whether `up` completed and `down` has not run since
    up: bool,
}

impl InterfaceConfiguration {
    /// Create a configuration using iproute2 and sysfs GPIO
    ///
    /// # Arguments
    /// * `name` - Interface name, e.g. "can0"
    /// * `bitrate` - Nominal bitrate in bit/s; must be in the board's table
    /// * `board` - Board description providing the interface's control lines
    pub fn new(name: impl Into<String>, bitrate: u32, board: &BoardProfile) -> Result<Self> {
        Self::with_backends(name, bitrate, board, IpLink::new(), SysfsGpio::new())
    }
}

impl<B: BusControl, L: LineControl> InterfaceConfiguration<B, L> {
    /// Create a configuration with explicit bus and line backends
    pub fn with_backends(
        name: impl Into<String>,
        bitrate: u32,
        board: &BoardProfile,
        bus: B,
        gpio: L,
    ) -> Result<Self> {
        let name = name.into();
        if !board.supports_bitrate(bitrate) {
            return Err(CanError::InvalidArgument(format!(
                "bitrate {} not supported for {} (supported: {:?})",
                bitrate,
                name,
                board.bitrates()
            )));
        }
        let lines = board.lines(&name).cloned().unwrap_or_default();

        Ok(Self {
            name,
            bitrate,
            terminator: false,
            auto_shutdown: true,
            lines,
            bus,
            gpio,
            up: false,
        })
    }

    /// Enable the bus terminator on bring-up
    pub fn with_terminator(mut self, terminator: bool) -> Self {
        self.terminator = terminator;
        self
    }

    /// Take the interface down when dropped (default: true)
    pub fn with_auto_shutdown(mut self, auto_shutdown: bool) -> Self {
        self.auto_shutdown = auto_shutdown;
        self
    }

    /// Get the interface name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the nominal bitrate in bit/s
    pub fn bitrate(&self) -> u32 {
        self.bitrate
    }

    /// Check if the terminator is enabled on bring-up
    pub fn terminator(&self) -> bool {
        self.terminator
    }

    /// Check if dropping the value takes the interface down
    pub fn auto_shutdown(&self) -> bool {
        self.auto_shutdown
    }

    /// Check if `up` completed and `down` has not run since
    pub fn is_up(&self) -> bool {
        self.up
    }

    /// Query the controller's bus state
    ///
    /// A state code this layer does not know is reported as
    /// `CanError::UnrecognizedState`.
    pub fn state(&mut self) -> Result<InterfaceState> {
        let code = self.bus.state(&self.name)?;
        InterfaceState::from_code(code)
            .ok_or_else(|| CanError::UnrecognizedState(format!("{}: code {}", self.name, code)))
    }

    /// Bring the interface up
    ///
    /// An interface that is not stopped is taken down first. Then the
    /// bitrate is set and the controller started, and only after that are
    /// the board lines exported, the terminator switched and the transceiver
    /// enabled. If any step fails the interface is taken down again before
    /// the error is returned.
    pub fn up(&mut self) -> Result<()> {
        let state = self.state()?;
        if state != InterfaceState::Stopped {
            info!("{}: interface is {}, resetting first", self.name, state);
            self.down()?;
        }

        if let Err(err) = self.bring_up() {
            warn!("{}: bring-up failed: {}", self.name, err);
            if let Err(rollback) = self.down() {
                warn!("{}: rollback incomplete: {}", self.name, rollback);
            }
            return Err(err);
        }

        self.up = true;
        info!(
            "{}: up at {} bit/s, terminator {}",
            self.name,
            self.bitrate,
            if self.terminator { "on" } else { "off" }
        );
        Ok(())
    }

    fn bring_up(&mut self) -> Result<()> {
        debug!("{}: setting bitrate {}", self.name, self.bitrate);
        self.bus.set_bitrate(&self.name, self.bitrate)?;
        self.bus.start(&self.name)?;

        if self.lines.export {
            let gpios = self.lines.gpios();
            for &gpio in &gpios {
                self.gpio.export(gpio)?;
            }
            for &gpio in &gpios {
                self.gpio.set_output(gpio)?;
            }
        }

        self.switch_terminator(self.terminator)?;
        self.switch_transceiver(true)
    }

    /// Take the interface down
    ///
    /// Every step is attempted even if an earlier one fails: stop the
    /// controller, drive the terminator and transceiver lines to their
    /// disabled state, release exported GPIOs. A single failure is returned
    /// as-is; several are returned as `CanError::Teardown`.
    pub fn down(&mut self) -> Result<()> {
        let mut failures = Vec::new();

        let stopped = self.bus.stop(&self.name);
        self.record(&mut failures, "stop", stopped);

        if let Some(gpio) = self.lines.terminator {
            if self.line_driven(gpio) {
                let result = self.gpio.write_value(gpio, false);
                self.record(&mut failures, "terminator off", result);
            }
        }

        let transceiver_driven = match self.lines.transceiver {
            TransceiverControl::SleepGpio(gpio) => self.line_driven(gpio),
            _ => true,
        };
        if transceiver_driven {
            let result = self.switch_transceiver(false);
            self.record(&mut failures, "transceiver off", result);
        }

        if self.lines.export {
            for gpio in self.lines.gpios() {
                let result = self.gpio.unexport(gpio);
                self.record(&mut failures, "unexport", result);
            }
        }

        self.up = false;
        debug!("{}: down ({} failed steps)", self.name, failures.len());

        match failures.len() {
            0 => Ok(()),
            1 => Err(failures.remove(0)),
            _ => Err(CanError::Teardown(failures)),
        }
    }

    /// Switch the terminator line, if the board has one for this interface
    pub fn switch_terminator(&mut self, on: bool) -> Result<()> {
        if let Some(gpio) = self.lines.terminator {
            debug!("{}: terminator {}", self.name, if on { "on" } else { "off" });
            self.gpio.write_value(gpio, on)?;
        }
        Ok(())
    }

    fn switch_transceiver(&mut self, on: bool) -> Result<()> {
        match &self.lines.transceiver {
            TransceiverControl::None => Ok(()),
            TransceiverControl::SleepGpio(gpio) => self.gpio.write_value(*gpio, on),
            TransceiverControl::ModeFile {
                path,
                enable,
                disable,
            } => {
                let mode = if on { enable } else { disable };
                self.gpio.write_attribute(path, mode)
            }
        }
    }

    /// Lines this layer exports can only be driven while exported
    fn line_driven(&self, gpio: u32) -> bool {
        !self.lines.export || self.gpio.is_exported(gpio)
    }

    fn record(&self, failures: &mut Vec<CanError>, step: &str, result: Result<()>) {
        if let Err(err) = result {
            warn!("{}: {} failed: {}", self.name, step, err);
            failures.push(err);
        }
    }
}

impl<B: BusControl, L: LineControl> std::fmt::Debug for InterfaceConfiguration<B, L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterfaceConfiguration")
            .field("name", &self.name)
            .field("bitrate", &self.bitrate)
            .field("terminator", &self.terminator)
            .field("auto_shutdown", &self.auto_shutdown)
            .field("lines", &self.lines)
            .field("up", &self.up)
            .finish()
    }
}

impl<B: BusControl, L: LineControl> Drop for InterfaceConfiguration<B, L> {
    fn drop(&mut self) {
        if self.up && self.auto_shutdown {
            if let Err(err) = self.down() {
                error!("{}: shutdown on drop failed: {}", self.name, err);
            }
        }
    }
}
