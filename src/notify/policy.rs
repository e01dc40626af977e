//! Notification policy: which message the user sees for which event.

use serde::{Deserialize, Serialize};

use crate::domain::FailureReason;
use crate::notify::types::{ProgressIndicator, Severity, TapAction, TransientMessage};

/// Guidance for vendors that silently block background SMS.
pub const OEM_BACKGROUND_SMS_ADVISORY: &str =
    "IMPORTANT: If you use Xiaomi/Redmi, enable 'Send SMS in background' in Security Settings.";

/// Texts and rules for user-facing notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationPolicy {
    /// Prepended to every transient message except the OEM advisory
    pub toast_prefix: String,
    pub progress_title: String,
    pub progress_text: String,
}

impl Default for NotificationPolicy {
    fn default() -> Self {
        Self {
            toast_prefix: "SOS: ".to_string(),
            progress_title: "Guardian Mode Active".to_string(),
            progress_text: "Emergency SOS processing...".to_string(),
        }
    }
}

impl NotificationPolicy {
    pub fn progress(&self) -> ProgressIndicator {
        ProgressIndicator {
            title: self.progress_title.clone(),
            text: self.progress_text.clone(),
            ongoing: true,
            tap_action: TapAction::OpenApp,
        }
    }

    fn toast(&self, text: impl AsRef<str>, severity: Severity) -> TransientMessage {
        TransientMessage {
            text: format!("{}{}", self.toast_prefix, text.as_ref()),
            severity,
        }
    }

    pub fn run_started(&self, recipients: usize) -> TransientMessage {
        self.toast(
            format!("Sending emergency alerts to {} contacts...", recipients),
            Severity::Info,
        )
    }

    pub fn validation_failed(&self, detail: &str) -> TransientMessage {
        self.toast(format!("SMS Error: {}", detail), Severity::Warning)
    }

    pub fn transport_unavailable(&self) -> TransientMessage {
        self.toast("Critical Error: SIM Manager not accessible.", Severity::Critical)
    }

    /// Message for a recipient whose attempt just failed.
    pub fn delivery_failed(&self, recipient: &str, reason: &FailureReason) -> TransientMessage {
        self.toast(
            format!("Failed to send SMS to {} ({})", recipient, reason.hint()),
            Severity::Warning,
        )
    }

    /// Message for a send that errored before reaching the carrier.
    pub fn dispatch_error(&self, recipient: &str, detail: &str) -> TransientMessage {
        self.toast(format!("System Error for {}: {}", recipient, detail), Severity::Warning)
    }

    /// Supplementary guidance attached to a failure reason, if any.
    pub fn advisory(&self, reason: &FailureReason) -> Option<TransientMessage> {
        match reason {
            FailureReason::GenericFailure => Some(TransientMessage {
                text: OEM_BACKGROUND_SMS_ADVISORY.to_string(),
                severity: Severity::Advisory,
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_indicator() {
        let policy = NotificationPolicy::default();
        let progress = policy.progress();
        assert_eq!(progress.title, "Guardian Mode Active");
        assert_eq!(progress.text, "Emergency SOS processing...");
        assert!(progress.ongoing);
        assert_eq!(progress.tap_action, TapAction::OpenApp);
    }

    #[test]
    fn test_delivery_failed_messages() {
        let policy = NotificationPolicy::default();
        assert_eq!(
            policy.delivery_failed("+1555000222", &FailureReason::NoService).text,
            "SOS: Failed to send SMS to +1555000222 (No Network Service)"
        );
        assert_eq!(
            policy.delivery_failed("+1", &FailureReason::RadioOff).text,
            "SOS: Failed to send SMS to +1 (Airplane Mode?)"
        );
        assert_eq!(
            policy.delivery_failed("+1", &FailureReason::Unknown(Some(3))).text,
            "SOS: Failed to send SMS to +1 (Error Code: 3)"
        );
    }

    #[test]
    fn test_dispatch_error_message() {
        let policy = NotificationPolicy::default();
        let msg = policy.dispatch_error("+1555000111", "send rejected: bad pdu");
        assert_eq!(msg.text, "SOS: System Error for +1555000111: send rejected: bad pdu");
        assert_eq!(msg.severity, Severity::Warning);
    }

    #[test]
    fn test_advisory_only_for_generic_failure() {
        let policy = NotificationPolicy::default();
        let advisory = policy.advisory(&FailureReason::GenericFailure).unwrap();
        assert_eq!(advisory.text, OEM_BACKGROUND_SMS_ADVISORY);
        assert_eq!(advisory.severity, Severity::Advisory);

        assert!(policy.advisory(&FailureReason::NoService).is_none());
        assert!(policy.advisory(&FailureReason::RadioOff).is_none());
        assert!(policy.advisory(&FailureReason::Unknown(Some(9))).is_none());
    }

    #[test]
    fn test_transport_unavailable_is_critical() {
        let msg = NotificationPolicy::default().transport_unavailable();
        assert_eq!(msg.severity, Severity::Critical);
        assert_eq!(msg.text, "SOS: Critical Error: SIM Manager not accessible.");
    }

    #[test]
    fn test_custom_prefix() {
        let policy = NotificationPolicy {
            toast_prefix: String::new(),
            ..Default::default()
        };
        assert_eq!(
            policy.run_started(2).text,
            "Sending emergency alerts to 2 contacts..."
        );
    }
}
