//! ID generation utilities for guardian-sos
//!
//! Provides functions for generating run identifiers and the correlation
//! tokens attached to every segment send.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Get current timestamp in milliseconds since Unix epoch
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Generate a unique run ID
///
/// Format: `run-{timestamp_ms}-{random_hex}`
/// Example: `run-1738300800123-a1b2`
pub fn generate_run_id() -> String {
    let timestamp = now_ms();
    let random: u16 = rand::rng().random();
    format!("run-{}-{:04x}", timestamp, random)
}

/// Opaque identifier matching one segment send to its delivery outcome.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationToken(String);

impl CorrelationToken {
    /// Token for segment `segment` of the recipient at position `recipient` in run `run_id`.
    ///
    /// Format: `{run_id}/{recipient:03}/{segment:03}`. Positions, not phone
    /// numbers, keep duplicate recipients apart.
    pub fn new(run_id: &str, recipient: usize, segment: usize) -> Self {
        Self(format!("{}/{:03}/{:03}", run_id, recipient, segment))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Run the token was minted for.
    pub fn run_id(&self) -> &str {
        self.0.split('/').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for CorrelationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CorrelationToken {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
