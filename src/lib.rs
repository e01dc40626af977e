//! guardian-sos - Emergency SMS dispatch and delivery correlation
//!
//! Sends an emergency text to a list of contacts one recipient at a time,
//! matches asynchronous delivery acknowledgements back to the recipient that
//! caused them, and surfaces progress and failures to the user. At most one
//! dispatch run exists per process.

pub mod bridge;
pub mod classify;
pub mod correlator;
pub mod dispatch;
pub mod domain;
pub mod error;
pub mod id;
pub mod notify;
pub mod segment;
pub mod transport;

pub use error::{DispatchError, Result};
