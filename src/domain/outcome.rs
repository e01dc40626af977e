//! Delivery outcome types reported by the transport.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::id::CorrelationToken;

/// Raw result code from the transport's completion channel.
///
/// Values follow the Android `SmsManager` sent-intent result codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultCode(pub i32);

impl ResultCode {
    /// `Activity.RESULT_OK`
    pub const OK: ResultCode = ResultCode(-1);
    pub const GENERIC_FAILURE: ResultCode = ResultCode(1);
    pub const RADIO_OFF: ResultCode = ResultCode(2);
    pub const NULL_PDU: ResultCode = ResultCode(3);
    pub const NO_SERVICE: ResultCode = ResultCode(4);

    pub fn is_ok(&self) -> bool {
        *self == Self::OK
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for ResultCode {
    fn from(code: i32) -> Self {
        ResultCode(code)
    }
}

/// One asynchronous acknowledgement for one segment send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryOutcome {
    pub token: CorrelationToken,
    pub code: ResultCode,
    /// Recipient the segment was addressed to, used for user messaging
    pub recipient: String,
}

impl DeliveryOutcome {
    pub fn new(token: CorrelationToken, code: impl Into<ResultCode>, recipient: impl Into<String>) -> Self {
        Self {
            token,
            code: code.into(),
            recipient: recipient.into(),
        }
    }
}
