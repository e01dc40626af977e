//! Dispatch request handed to the coordinator.

use serde::{Deserialize, Serialize};

use crate::error::{DispatchError, Result};

/// Recipients plus message for one dispatch run. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchRequest {
    recipients: Vec<String>,
    message: String,
}

impl DispatchRequest {
    /// Build a request from possibly-missing fields.
    ///
    /// Recipient format is not checked and duplicates are kept. An empty
    /// message is allowed; an absent one, or no recipients at all, is not.
    pub fn new(recipients: Option<Vec<String>>, message: Option<String>) -> Result<Self> {
        let (Some(recipients), Some(message)) = (recipients, message) else {
            return Err(DispatchError::Validation("Missing phoneNumbers or message".to_string()));
        };
        if recipients.is_empty() {
            return Err(DispatchError::Validation("No phoneNumbers given".to_string()));
        }
        Ok(Self { recipients, message })
    }

    pub fn recipients(&self) -> &[String] {
        &self.recipients
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
