//! Offset pagination for list endpoints.

use serde::{Deserialize, Serialize};

/// Upper bound on `limit` accepted by list endpoints.
pub const MAX_LIMIT: u64 = 500;

/// Offset pagination parameters shared across list endpoints.
///
/// - `skip`: rows to skip, default 0
/// - `limit`: 1–500, default 100
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    #[serde(default)]
    pub skip: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

fn default_limit() -> u64 {
    100
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: default_limit(),
        }
    }
}

impl PageRequest {
    /// Clamp `limit` to the valid range 1–500.
    ///
    /// Call after deserializing from query params to enforce bounds.
    pub fn clamped(self) -> Self {
        Self {
            skip: self.skip,
            limit: self.limit.clamp(1, MAX_LIMIT),
        }
    }
}
