//! Process-wide kill switch.
//!
//! Engaging the switch prevents new stage invocations across every run
//! sharing it. It never aborts an in-flight approval request and never
//! touches ledger state. What happens to pending requests is the
//! approval gate's configured policy, applied explicitly by the caller.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::warn;

/// Shared, concurrency-safe disable flag checked before every stage
/// invocation.
#[derive(Clone, Default)]
pub struct KillSwitch {
    engaged: Arc<AtomicBool>,
}

impl KillSwitch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn engage(&self) {
        warn!("Kill switch engaged; new stage invocations are disabled");
        self.engaged.store(true, Ordering::SeqCst);
    }

    pub fn release(&self) {
        self.engaged.store(false, Ordering::SeqCst);
    }

    pub fn is_engaged(&self) -> bool {
        self.engaged.load(Ordering::SeqCst)
    }
}
