//! Refresh tokens handed out after every mutation

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Opaque marker of "state as of some mutation". A feed showing an older
/// token than the latest one handed out is stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RefreshToken(u64);

/// Shared counter producing successive refresh tokens
#[derive(Debug, Clone, Default)]
pub struct RefreshClock(Arc<AtomicU64>);

impl RefreshClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> RefreshToken {
        RefreshToken(self.0.load(Ordering::SeqCst))
    }

    /// Record a mutation and return the token describing it
    pub fn bump(&self) -> RefreshToken {
        RefreshToken(self.0.fetch_add(1, Ordering::SeqCst) + 1)
    }
}
