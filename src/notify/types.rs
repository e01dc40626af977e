//! Notification payloads.

use serde::{Deserialize, Serialize};

/// What tapping the progress indicator does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TapAction {
    /// Bring the main application to the foreground
    OpenApp,
}

/// Persistent indicator shown while a run is active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressIndicator {
    pub title: String,
    pub text: String,
    pub ongoing: bool,
    pub tap_action: TapAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    /// A single recipient could not be reached
    Warning,
    /// The whole run is affected
    Critical,
    /// Longer-lived guidance, not tied to one recipient
    Advisory,
}

/// Ephemeral user-facing message, shown for the host's long toast duration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransientMessage {
    pub text: String,
    pub severity: Severity,
}

/// Anything the core asks the host UI to show or hide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    Progress(ProgressIndicator),
    Transient(TransientMessage),
    ClearProgress,
}

impl Notification {
    pub fn transient_text(&self) -> Option<&str> {
        match self {
            Notification::Transient(msg) => Some(&msg.text),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_text() {
        let n = Notification::Transient(TransientMessage {
            text: "SOS: hello".to_string(),
            severity: Severity::Info,
        });
        assert_eq!(n.transient_text(), Some("SOS: hello"));
        assert_eq!(Notification::ClearProgress.transient_text(), None);
    }

    #[test]
    fn test_notification_serialization() {
        let json = serde_json::to_string(&Notification::ClearProgress).unwrap();
        assert_eq!(json, r#"{"kind":"clear_progress"}"#);
    }
}
