//! Domain types for guardian-sos
//!
//! - DispatchRequest: recipients + message handed over by the bridge
//! - RecipientAttempt: per-recipient delivery bookkeeping for one run
//! - DeliveryOutcome / ResultCode: what the transport reports back
//! - FailureReason: classified carrier/radio failure

pub mod attempt;
pub mod outcome;
pub mod reason;
pub mod request;

pub use attempt::{AttemptStatus, RecipientAttempt};
pub use outcome::{DeliveryOutcome, ResultCode};
pub use reason::FailureReason;
pub use request::DispatchRequest;
