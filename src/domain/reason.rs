//! Classified delivery failure reasons.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Why a recipient attempt failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "code", rename_all = "snake_case")]
pub enum FailureReason {
    /// Handset has no network service
    NoService,
    /// Radio is switched off (airplane mode)
    RadioOff,
    /// Carrier block, no balance, or an OEM background restriction
    GenericFailure,
    /// Anything else; carries the raw transport code when there is one.
    /// `None` means the send could not even be issued locally.
    Unknown(Option<i32>),
}

impl FailureReason {
    /// Short human-readable hint appended to the failure message.
    pub fn hint(&self) -> String {
        match self {
            FailureReason::NoService => "No Network Service".to_string(),
            FailureReason::RadioOff => "Airplane Mode?".to_string(),
            FailureReason::GenericFailure => "Carrier Block/No Balance".to_string(),
            FailureReason::Unknown(Some(code)) => format!("Error Code: {}", code),
            FailureReason::Unknown(None) => "System Error".to_string(),
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hint())
    }
}
