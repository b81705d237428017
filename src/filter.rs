//! CAN acceptance filters
//!
//! `CanFilter` is the (id, mask) pair installed on a raw CAN socket. It
//! converts into `socketcan::CanFilter` when handed to the kernel.

use crate::constants::CAN_SFF_MASK;

/// Acceptance filter: an (id, mask) pair
///
/// A received identifier matches when `received & mask == id & mask`. With
/// several filters installed a frame is accepted if any one matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CanFilter {
    id: u32,
    mask: u32,
}

impl CanFilter {
    /// Filter installed by `CanSocket::disable_filter`: id 0x7FF with a zero
    /// mask, which matches every identifier.
    pub const ACCEPT_ALL: CanFilter = CanFilter {
        id: CAN_SFF_MASK,
        mask: 0,
    };

    /// Create a new filter
    pub const fn new(id: u32, mask: u32) -> Self {
        Self { id, mask }
    }

    /// Get the configured id
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Get the configured mask
    pub fn mask(&self) -> u32 {
        self.mask
    }

    /// Check if `can_id` passes this filter
    pub fn matches(&self, can_id: u32) -> bool {
        can_id & self.mask == self.id & self.mask
    }

    /// Check if `can_id` passes at least one filter of the set
    pub fn any_match(filters: &[CanFilter], can_id: u32) -> bool {
        filters.iter().any(|filter| filter.matches(can_id))
    }
}

impl From<CanFilter> for socketcan::CanFilter {
    fn from(filter: CanFilter) -> Self {
        socketcan::CanFilter::new(filter.id, filter.mask)
    }
}

impl std::fmt::Display for CanFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:x}/0x{:x}", self.id, self.mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_filter() {
        let filter = CanFilter::new(0x123, 0xFFFF);
        assert!(filter.matches(0x123));
        assert!(!filter.matches(0x124));
    }

    #[test]
    fn test_accept_all() {
        assert_eq!(CanFilter::ACCEPT_ALL, CanFilter::new(0x7FF, 0));
        for id in [0x001, 0x7FE, 0x7FF, 0x1234_5678] {
            assert!(CanFilter::ACCEPT_ALL.matches(id));
        }
    }

    #[test]
    fn test_filters_combine_with_or() {
        let filters = [CanFilter::new(0x100, 0x7F0), CanFilter::new(0x200, 0x7FF)];
        assert!(CanFilter::any_match(&filters, 0x10A));
        assert!(CanFilter::any_match(&filters, 0x200));
        assert!(!CanFilter::any_match(&filters, 0x201));
        assert!(!CanFilter::any_match(&[], 0x100));
    }

    #[test]
    fn test_display() {
        assert_eq!(CanFilter::new(0x123, 0x7FF).to_string(), "0x123/0x7ff");
    }
}
