//! Per-recipient delivery attempt.
//!
//! A RecipientAttempt tracks how many of a recipient's segments are still
//! outstanding and the worst outcome seen so far. Status only ever moves
//! forward: Pending -> Succeeded once every segment reports success, or
//! Pending -> Failed on the first failure. Nothing reverts a Failed attempt.

use serde::{Deserialize, Serialize};

use crate::domain::FailureReason;
use crate::id::CorrelationToken;

/// Delivery status of one recipient attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "failure", rename_all = "snake_case")]
pub enum AttemptStatus {
    Pending,
    Succeeded,
    Failed(FailureReason),
}

impl AttemptStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, AttemptStatus::Pending)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientAttempt {
    /// Position of the recipient in the request
    pub index: usize,
    pub recipient: String,
    /// Tokens registered so far, in segment order
    pub tokens: Vec<CorrelationToken>,
    /// Number of segments the message was split into
    pub expected: usize,
    /// Segments with no outcome yet
    pub outstanding: usize,
    pub status: AttemptStatus,
}

impl RecipientAttempt {
    pub fn new(index: usize, recipient: impl Into<String>, expected: usize) -> Self {
        Self {
            index,
            recipient: recipient.into(),
            tokens: Vec::with_capacity(expected),
            expected,
            outstanding: expected,
            status: AttemptStatus::Pending,
        }
    }

    pub fn register(&mut self, token: CorrelationToken) {
        self.tokens.push(token);
    }

    /// Record one successful segment. Returns true if the attempt just became Succeeded.
    pub fn settle_success(&mut self) -> bool {
        self.outstanding = self.outstanding.saturating_sub(1);
        if self.outstanding == 0 && self.status == AttemptStatus::Pending {
            self.status = AttemptStatus::Succeeded;
            return true;
        }
        false
    }

    /// Record one failed segment. Returns true if the attempt just became Failed.
    pub fn settle_failure(&mut self, reason: FailureReason) -> bool {
        self.outstanding = self.outstanding.saturating_sub(1);
        self.fail(reason)
    }

    /// Mark failed without an outcome, e.g. when the send itself errored.
    pub fn fail(&mut self, reason: FailureReason) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = AttemptStatus::Failed(reason);
        true
    }
}
