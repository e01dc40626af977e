//! Single-run guard.
//!
//! RunState is one atomic cell. Acquiring it is a compare-and-swap from Idle
//! to Running and hands back a RunLease; the lease is the only way back to
//! Idle, and it goes back exactly once (explicitly on teardown, or on drop
//! if the run task unwinds).

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Idle,
    Running,
}

const IDLE: u8 = 0;
const RUNNING: u8 = 1;

#[derive(Debug)]
pub struct RunGuard {
    state: AtomicU8,
}

static PROCESS_GUARD: OnceLock<Arc<RunGuard>> = OnceLock::new();

impl Default for RunGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl RunGuard {
    /// A fresh, independent guard starting Idle.
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(IDLE),
        }
    }

    /// The guard shared by every coordinator in this process.
    pub fn process() -> Arc<RunGuard> {
        PROCESS_GUARD.get_or_init(|| Arc::new(RunGuard::new())).clone()
    }

    pub fn state(&self) -> RunState {
        match self.state.load(Ordering::SeqCst) {
            RUNNING => RunState::Running,
            _ => RunState::Idle,
        }
    }

    /// Idle -> Running. None if a run is already active.
    pub fn try_acquire(self: &Arc<Self>) -> Option<RunLease> {
        self.state
            .compare_exchange(IDLE, RUNNING, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| RunLease {
                guard: Arc::clone(self),
                released: false,
            })
    }
}

/// Proof that the holder owns the Running state.
#[derive(Debug)]
pub struct RunLease {
    guard: Arc<RunGuard>,
    released: bool,
}

impl RunLease {
    /// Running -> Idle.
    pub fn release(mut self) {
        self.reset();
    }

    fn reset(&mut self) {
        if !self.released {
            self.guard.state.store(IDLE, Ordering::SeqCst);
            self.released = true;
        }
    }
}

impl Drop for RunLease {
    fn drop(&mut self) {
        if !self.released {
            tracing::warn!("Run lease dropped without teardown, returning to idle");
        }
        self.reset();
    }
}
