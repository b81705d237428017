//! Wait bound used for send and receive readiness

use std::time::Duration;

use nix::poll::PollTimeout;

const MICROS_PER_SEC: u32 = 1_000_000;

/// Timeout used to bound send and receive waits
///
/// Stored as whole seconds plus microseconds, the same split the kernel's
/// `struct timeval` uses. Microseconds beyond one second are carried into
/// the seconds field on construction.
///
/// A zero timeout means "return immediately" when it is enabled on a
/// socket. Disabling the timeout on the socket is what makes a wait
/// unbounded; there is no infinite `Timeout` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Timeout {
    seconds: u32,
    microseconds: u32,
}

impl Timeout {
    /// Zero-length timeout (poll without blocking)
    pub const ZERO: Timeout = Timeout {
        seconds: 0,
        microseconds: 0,
    };

    /// Create a new timeout
    ///
    /// # Arguments
    /// * `seconds` - Whole seconds
    /// * `microseconds` - Additional microseconds (values of a second or more are carried)
    pub fn new(seconds: u32, microseconds: u32) -> Self {
        let carry = microseconds / MICROS_PER_SEC;
        Self {
            seconds: seconds.saturating_add(carry),
            microseconds: microseconds % MICROS_PER_SEC,
        }
    }

    /// Create a timeout from milliseconds
    pub fn from_millis(millis: u32) -> Self {
        Self::new(millis / 1000, (millis % 1000) * 1000)
    }

    /// Whole seconds
    pub fn seconds(&self) -> u32 {
        self.seconds
    }

    /// Sub-second microseconds (always below one million)
    pub fn microseconds(&self) -> u32 {
        self.microseconds
    }

    /// Check if this timeout returns immediately
    pub fn is_zero(&self) -> bool {
        self.seconds == 0 && self.microseconds == 0
    }

    /// Convert to a `Duration`
    pub fn as_duration(&self) -> Duration {
        Duration::new(u64::from(self.seconds), self.microseconds * 1000)
    }

    /// Whole milliseconds, rounded up so a non-zero timeout never becomes zero
    pub fn as_millis_ceil(&self) -> u64 {
        u64::from(self.seconds) * 1000 + u64::from(self.microseconds).div_ceil(1000)
    }

    /// Convert to a `poll(2)` timeout; saturates at `PollTimeout::MAX`
    pub fn to_poll_timeout(&self) -> PollTimeout {
        i32::try_from(self.as_millis_ceil())
            .ok()
            .and_then(|millis| PollTimeout::try_from(millis).ok())
            .unwrap_or(PollTimeout::MAX)
    }
}

impl From<Duration> for Timeout {
    /// Saturates at `u32::MAX` seconds; sub-microsecond precision is dropped
    fn from(duration: Duration) -> Self {
        let seconds = u32::try_from(duration.as_secs()).unwrap_or(u32::MAX);
        Self::new(seconds, duration.subsec_micros())
    }
}

impl From<Timeout> for Duration {
    fn from(timeout: Timeout) -> Self {
        timeout.as_duration()
    }
}

impl std::fmt::Display for Timeout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{:06}s", self.seconds, self.microseconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_microseconds_carry_into_seconds() {
        let timeout = Timeout::new(1, 2_500_000);
        assert_eq!(timeout.seconds(), 3);
        assert_eq!(timeout.microseconds(), 500_000);
    }

    #[test]
    fn test_zero_is_distinct_from_short() {
        assert!(Timeout::ZERO.is_zero());
        assert!(Timeout::default().is_zero());
        assert!(!Timeout::new(0, 1).is_zero());
    }

    #[test]
    fn test_poll_milliseconds_round_up() {
        assert_eq!(Timeout::ZERO.as_millis_ceil(), 0);
        assert_eq!(Timeout::new(0, 1).as_millis_ceil(), 1);
        assert_eq!(Timeout::new(0, 1000).as_millis_ceil(), 1);
        assert_eq!(Timeout::new(0, 1001).as_millis_ceil(), 2);
        assert_eq!(Timeout::new(2, 500_000).as_millis_ceil(), 2500);
    }

    #[test]
    fn test_poll_timeout_conversion() {
        assert_eq!(Timeout::ZERO.to_poll_timeout(), PollTimeout::ZERO);
        assert_eq!(Timeout::new(0, 1000).to_poll_timeout(), PollTimeout::from(1u16));
        assert_eq!(Timeout::new(65, 535_000).to_poll_timeout(), PollTimeout::from(u16::MAX));
        assert_eq!(
            Timeout::new(u32::MAX, 0).to_poll_timeout(),
            PollTimeout::MAX
        );
    }

    #[test]
    fn test_duration_conversion() {
        assert_eq!(Timeout::from_millis(1500).as_duration(), Duration::from_millis(1500));
        assert_eq!(
            Timeout::from(Duration::from_micros(2_000_123)),
            Timeout::new(2, 123)
        );
        assert_eq!(
            Timeout::from(Duration::from_secs(u64::MAX)).seconds(),
            u32::MAX
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Timeout::new(0, 1000).to_string(), "0.001000s");
    }
}
