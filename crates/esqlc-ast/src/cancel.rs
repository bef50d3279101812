//! Cooperative cancellation
//!
//! Stages poll the token at item/statement boundaries, never mid-token, so
//! a pathological input can be abandoned between safe points.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Error returned by a stage that observed a cancelled token
///
/// Cancellation discards partial results; callers get this marker and
/// nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled;

impl fmt::Display for Cancelled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "operation was cancelled")
    }
}

impl std::error::Error for Cancelled {}

/// Shared cancellation flag, cheap to clone across stages
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_is_visible_through_clones() {
        let token = CancelToken::new();
        let seen_by_stage = token.clone();
        assert!(!seen_by_stage.is_cancelled());
        token.cancel();
        assert!(seen_by_stage.is_cancelled());
    }
}
