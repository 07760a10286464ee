//! Decode session configuration.

use crate::constants::{DEFAULT_MAX_DEPTH, DEFAULT_MAX_NULL_SLOTS};

/// Limits and policies applied to one decode session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Deepest record nesting accepted before failing with
    /// [`DecodeError::DepthLimitExceeded`](crate::DecodeError::DepthLimitExceeded).
    pub max_depth: usize,
    /// Total null slots that `ObjectNullMultiple256` and `ObjectNullMultiple`
    /// records may expand to. A run costs a few bytes on the wire but one
    /// slot per null once decoded.
    pub max_null_slots: usize,
    /// Let a later record silently take over an id that is already defined.
    pub allow_duplicate_ids: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_null_slots: DEFAULT_MAX_NULL_SLOTS,
            allow_duplicate_ids: false,
        }
    }
}

impl DecodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn max_null_slots(mut self, max_null_slots: usize) -> Self {
        self.max_null_slots = max_null_slots;
        self
    }

    pub fn allow_duplicate_ids(mut self, allow: bool) -> Self {
        self.allow_duplicate_ids = allow;
        self
    }
}
