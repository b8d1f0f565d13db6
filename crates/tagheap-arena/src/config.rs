//! Arena configuration parameters.

use crate::error::ArenaError;

/// Configuration for a [`MemArena`](crate::MemArena).
///
/// Validated at construction; all values are immutable after creation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Hard ceiling on the arena size in bytes.
    ///
    /// Default: 20 MiB. Must be non-zero and no larger than `u32::MAX`,
    /// because block links are stored as 32-bit arena offsets.
    pub max_bytes: usize,

    /// Number of bytes to reserve in the backing `Vec` up front.
    ///
    /// Purely a performance hint: the break still starts at zero and the
    /// reservation is clamped to `max_bytes`.
    pub initial_capacity: usize,
}

impl ArenaConfig {
    /// Default arena ceiling: 20 MiB.
    pub const DEFAULT_MAX_BYTES: usize = 20 * (1 << 20);

    /// Largest ceiling an arena may be configured with.
    pub const MAX_ADDRESSABLE: usize = u32::MAX as usize;

    /// Create a config with the given ceiling and no preallocation.
    pub fn new(max_bytes: usize) -> Self {
        Self {
            max_bytes,
            initial_capacity: 0,
        }
    }

    /// Set the preallocation hint.
    pub fn with_initial_capacity(mut self, initial_capacity: usize) -> Self {
        self.initial_capacity = initial_capacity;
        self
    }

    /// Check structural constraints.
    pub fn validate(&self) -> Result<(), ArenaError> {
        if self.max_bytes == 0 {
            return Err(ArenaError::InvalidConfig {
                reason: "max_bytes must be non-zero".into(),
            });
        }
        if self.max_bytes > Self::MAX_ADDRESSABLE {
            return Err(ArenaError::InvalidConfig {
                reason: format!(
                    "max_bytes {} exceeds the 32-bit offset limit {}",
                    self.max_bytes,
                    Self::MAX_ADDRESSABLE
                ),
            });
        }
        Ok(())
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_BYTES)
    }
}
