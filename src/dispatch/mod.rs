//! Dispatch runs
//!
//! The coordinator owns the run-level state machine; the guard enforces
//! that at most one run exists per process.

pub mod coordinator;
pub mod guard;

pub use coordinator::{DispatchCoordinator, DispatchPolicy, RunHandle, RunReport};
pub use guard::{RunGuard, RunLease, RunState};
