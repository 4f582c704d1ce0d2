use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared "the API refused us" marker.
///
/// Starts unset and, once set, stays set for the life of the handle. Clones
/// observe the same state, so one handle can be given to every client and to
/// whatever displays a degraded-mode notice.
#[derive(Debug, Clone, Default)]
pub struct RateLimitFlag {
    inner: Arc<AtomicBool>,
}

impl RateLimitFlag {
    pub fn new() -> Self { Self::default() }

    /// Set the flag. Returns `true` only for the call that flipped it.
    pub fn trip(&self) -> bool {
        !self.inner.swap(true, Ordering::SeqCst)
    }

    pub fn is_set(&self) -> bool { self.inner.load(Ordering::SeqCst) }
}
