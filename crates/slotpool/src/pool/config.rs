//! Slot pool configuration

/// Configuration for [`SlotPool`](super::SlotPool)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotPoolConfig {
    /// Enable statistics tracking
    pub track_stats: bool,

    /// Fill pattern byte for freshly allocated slots (for debugging)
    pub alloc_pattern: Option<u8>,
    /// Fill pattern byte for returned slots (for debugging)
    ///
    /// The leading pointer-sized bytes are overwritten by the free-list link
    /// right after the fill.
    pub dealloc_pattern: Option<u8>,

    /// Reject pointers that do not address a slot of this pool on deallocate
    ///
    /// Costs a walk over the block list per deallocation.
    pub check_ownership: bool,
}

impl Default for SlotPoolConfig {
    fn default() -> Self {
        Self {
            track_stats: cfg!(debug_assertions),
            alloc_pattern: if cfg!(debug_assertions) {
                Some(0xBB)
            } else {
                None
            },
            dealloc_pattern: if cfg!(debug_assertions) {
                Some(0xDD)
            } else {
                None
            },
            check_ownership: cfg!(debug_assertions),
        }
    }
}

impl SlotPoolConfig {
    /// Production configuration - statistics on, no fill patterns
    #[must_use]
    pub fn production() -> Self {
        Self {
            track_stats: true,
            alloc_pattern: None,
            dealloc_pattern: None,
            check_ownership: false,
        }
    }

    /// Debug configuration - every check and pattern enabled
    #[must_use]
    pub fn debug() -> Self {
        Self {
            track_stats: true,
            alloc_pattern: Some(0xBB),
            dealloc_pattern: Some(0xDD),
            check_ownership: true,
        }
    }

    /// Configuration for pools shared through the registry
    ///
    /// Build-profile defaults, without the ownership check: registry pools
    /// grow one slot at a time, so the check would walk one block per slot
    /// on every deallocation.
    #[must_use]
    pub fn shared() -> Self {
        Self {
            check_ownership: false,
            ..Self::default()
        }
    }

    /// Performance configuration - minimal overhead
    #[must_use]
    pub fn performance() -> Self {
        Self {
            track_stats: false,
            alloc_pattern: None,
            dealloc_pattern: None,
            check_ownership: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        let debug = SlotPoolConfig::debug();
        assert!(debug.track_stats && debug.check_ownership);
        assert_eq!(debug.alloc_pattern, Some(0xBB));

        let perf = SlotPoolConfig::performance();
        assert!(!perf.track_stats && !perf.check_ownership);
        assert_eq!(perf.dealloc_pattern, None);
    }

    #[test]
    fn test_shared_keeps_profile_defaults_without_ownership_check() {
        let shared = SlotPoolConfig::shared();
        assert!(!shared.check_ownership);
        assert_eq!(shared.track_stats, cfg!(debug_assertions));
        assert_eq!(shared.alloc_pattern, SlotPoolConfig::default().alloc_pattern);
    }

    #[test]
    fn test_default_follows_build_profile() {
        let config = SlotPoolConfig::default();
        assert_eq!(config.track_stats, cfg!(debug_assertions));
        assert_eq!(config.alloc_pattern.is_some(), cfg!(debug_assertions));
    }
}
