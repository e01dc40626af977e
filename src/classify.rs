//! Outcome classification.
//!
//! Pure mapping from the transport's raw result code to a delivery verdict.
//! Supplementary messaging (the OEM advisory) is decided by the notification
//! policy, not here.

use crate::domain::{FailureReason, ResultCode};

/// Verdict for one segment outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Delivered,
    Failed(FailureReason),
}

/// Classify a raw result code.
pub fn classify(code: ResultCode) -> Classification {
    match code {
        ResultCode::OK => Classification::Delivered,
        ResultCode::NO_SERVICE => Classification::Failed(FailureReason::NoService),
        ResultCode::RADIO_OFF => Classification::Failed(FailureReason::RadioOff),
        ResultCode::GENERIC_FAILURE => Classification::Failed(FailureReason::GenericFailure),
        ResultCode(other) => Classification::Failed(FailureReason::Unknown(Some(other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_is_delivered() {
        assert_eq!(classify(ResultCode::OK), Classification::Delivered);
    }

    #[test]
    fn test_well_known_codes() {
        assert_eq!(
            classify(ResultCode::NO_SERVICE),
            Classification::Failed(FailureReason::NoService)
        );
        assert_eq!(
            classify(ResultCode::RADIO_OFF),
            Classification::Failed(FailureReason::RadioOff)
        );
        assert_eq!(
            classify(ResultCode::GENERIC_FAILURE),
            Classification::Failed(FailureReason::GenericFailure)
        );
    }

    #[test]
    fn test_other_codes_keep_raw_value() {
        assert_eq!(
            classify(ResultCode::NULL_PDU),
            Classification::Failed(FailureReason::Unknown(Some(3)))
        );
        assert_eq!(
            classify(ResultCode(0)),
            Classification::Failed(FailureReason::Unknown(Some(0)))
        );
        assert_eq!(
            classify(ResultCode(133)),
            Classification::Failed(FailureReason::Unknown(Some(133)))
        );
    }
}
