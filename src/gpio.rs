//! Board control line backend
//!
//! `LineControl` is what `InterfaceConfiguration` needs to drive terminator
//! and transceiver lines. `SysfsGpio` implements it over the legacy
//! `/sys/class/gpio` interface.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::debug;

use crate::constants::SYSFS_GPIO_BASE;
use crate::error::{CanError, Result};

/// GPIO and sysfs attribute access
pub trait LineControl {
    /// Check if a GPIO is exported to userspace
    fn is_exported(&self, gpio: u32) -> bool;

    /// Export a GPIO; exporting an exported GPIO does nothing
    fn export(&mut self, gpio: u32) -> Result<()>;

    /// Unexport a GPIO; unexporting a GPIO that is not exported does nothing
    fn unexport(&mut self, gpio: u32) -> Result<()>;

    /// Configure a GPIO as output
    fn set_output(&mut self, gpio: u32) -> Result<()>;

    /// Drive a GPIO output high or low
    fn write_value(&mut self, gpio: u32, high: bool) -> Result<()>;

    /// Write a string to a sysfs attribute
    fn write_attribute(&mut self, path: &Path, value: &str) -> Result<()>;
}

/// `LineControl` over the sysfs GPIO class directory
#[derive(Debug, Clone)]
pub struct SysfsGpio {
    base: PathBuf,
}

impl Default for SysfsGpio {
    fn default() -> Self {
        Self::new()
    }
}

impl SysfsGpio {
    /// Use `/sys/class/gpio`
    pub fn new() -> Self {
        Self::with_base(SYSFS_GPIO_BASE)
    }

    /// Use a GPIO class directory other than `/sys/class/gpio`
    pub fn with_base(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    fn gpio_dir(&self, gpio: u32) -> PathBuf {
        self.base.join(format!("gpio{}", gpio))
    }
}

/// Write to an existing sysfs file; sysfs files are never created
fn write_sysfs(path: &Path, value: &str) -> Result<()> {
    let to_err = |source: std::io::Error| CanError::Gpio {
        path: path.to_path_buf(),
        source,
    };
    let mut file = OpenOptions::new()
        .write(true)
        .truncate(true)
        .open(path)
        .map_err(to_err)?;
    file.write_all(value.as_bytes()).map_err(to_err)?;
    Ok(())
}

impl LineControl for SysfsGpio {
    fn is_exported(&self, gpio: u32) -> bool {
        self.gpio_dir(gpio).exists()
    }

    fn export(&mut self, gpio: u32) -> Result<()> {
        if self.is_exported(gpio) {
            return Ok(());
        }
        debug!("exporting gpio {}", gpio);
        write_sysfs(&self.base.join("export"), &gpio.to_string())
    }

    fn unexport(&mut self, gpio: u32) -> Result<()> {
        if !self.is_exported(gpio) {
            return Ok(());
        }
        debug!("unexporting gpio {}", gpio);
        write_sysfs(&self.base.join("unexport"), &gpio.to_string())
    }

    fn set_output(&mut self, gpio: u32) -> Result<()> {
        write_sysfs(&self.gpio_dir(gpio).join("direction"), "out")
    }

    fn write_value(&mut self, gpio: u32, high: bool) -> Result<()> {
        let value = if high { "1" } else { "0" };
        write_sysfs(&self.gpio_dir(gpio).join("value"), value)
    }

    fn write_attribute(&mut self, path: &Path, value: &str) -> Result<()> {
        write_sysfs(path, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// Fake sysfs tree with `export`, `unexport` and the given GPIO directories
    fn fake_sysfs(exported: &[u32]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("export"), "").unwrap();
        fs::write(dir.path().join("unexport"), "").unwrap();
        for gpio in exported {
            let gpio_dir = dir.path().join(format!("gpio{}", gpio));
            fs::create_dir(&gpio_dir).unwrap();
            fs::write(gpio_dir.join("direction"), "in").unwrap();
            fs::write(gpio_dir.join("value"), "0").unwrap();
        }
        dir
    }

    #[test]
    fn test_export_writes_number() {
        let dir = fake_sysfs(&[]);
        let mut gpio = SysfsGpio::with_base(dir.path());
        assert!(!gpio.is_exported(499));

        gpio.export(499).unwrap();
        assert_eq!(fs::read_to_string(dir.path().join("export")).unwrap(), "499");
    }

    #[test]
    fn test_export_skips_exported_line() {
        let dir = fake_sysfs(&[499]);
        let mut gpio = SysfsGpio::with_base(dir.path());
        gpio.export(499).unwrap();
        assert_eq!(fs::read_to_string(dir.path().join("export")).unwrap(), "");
    }

    #[test]
    fn test_unexport_only_exported_lines() {
        let dir = fake_sysfs(&[498]);
        let mut gpio = SysfsGpio::with_base(dir.path());

        gpio.unexport(501).unwrap();
        assert_eq!(fs::read_to_string(dir.path().join("unexport")).unwrap(), "");

        gpio.unexport(498).unwrap();
        assert_eq!(fs::read_to_string(dir.path().join("unexport")).unwrap(), "498");
    }

    #[test]
    fn test_direction_and_value() {
        let dir = fake_sysfs(&[498]);
        let mut gpio = SysfsGpio::with_base(dir.path());

        gpio.set_output(498).unwrap();
        gpio.write_value(498, true).unwrap();
        let line = dir.path().join("gpio498");
        assert_eq!(fs::read_to_string(line.join("direction")).unwrap(), "out");
        assert_eq!(fs::read_to_string(line.join("value")).unwrap(), "1");

        gpio.write_value(498, false).unwrap();
        assert_eq!(fs::read_to_string(line.join("value")).unwrap(), "0");
    }

    #[test]
    fn test_missing_line_is_gpio_error() {
        let dir = fake_sysfs(&[]);
        let mut gpio = SysfsGpio::with_base(dir.path());
        let err = gpio.write_value(500, true).unwrap_err();
        assert!(matches!(err, CanError::Gpio { .. }));
        assert!(err.is_io_error());
        assert!(!dir.path().join("gpio500").exists());
    }

    #[test]
    fn test_default_base() {
        assert_eq!(SysfsGpio::new().gpio_dir(498), Path::new("/sys/class/gpio/gpio498"));
        assert_eq!(SysfsGpio::default().base, Path::new(SYSFS_GPIO_BASE));
    }

    #[test]
    fn test_write_attribute() {
        let dir = tempfile::tempdir().unwrap();
        let modectrl = dir.path().join("modectrl");
        fs::write(&modectrl, "").unwrap();

        let mut gpio = SysfsGpio::new();
        gpio.write_attribute(&modectrl, "standby").unwrap();
        assert_eq!(fs::read_to_string(&modectrl).unwrap(), "standby");
    }
}
