//! Cooperative cancellation for long-running run modes
//!
//! Estimation, MCMC, profiling and simulation loops poll a `StopSignal`
//! between full iterations. A raised signal ends the loop at the next
//! iteration boundary; the model is still finalised.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared stop flag, cheap to clone into another thread
///
/// # Example
/// ```
/// use stock_model_core_rs::StopSignal;
///
/// let signal = StopSignal::new();
/// let remote = signal.clone();
/// assert!(!signal.is_raised());
///
/// remote.raise();
/// assert!(signal.is_raised());
/// ```
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    raised: Arc<AtomicBool>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request the running loop to stop at the next iteration boundary
    pub fn raise(&self) {
        self.raised.store(true, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::SeqCst)
    }

    /// Clear a previously raised signal so the model can run again
    pub fn clear(&self) {
        self.raised.store(false, Ordering::SeqCst);
    }
}
