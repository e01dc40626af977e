//! Entry bridge: turns a caller's `sendEmergencySms` call into a dispatch run.
//!
//! The bridge owns what happens before the core sees a request: decoding
//! the plugin payload, checking that the required runtime permissions are
//! held, and normalising phone numbers. Interactive permission prompting is
//! the host's job; a missing permission here is simply a rejection.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dispatch::{DispatchCoordinator, RunHandle};
use crate::domain::DispatchRequest;
use crate::error::DispatchError;
use crate::notify::Notifier;
use crate::transport::Transport;

/// Runtime permissions a dispatch needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    SendSms,
    ReadPhoneState,
    PostNotifications,
}

impl Permission {
    pub const REQUIRED: [Permission; 3] = [
        Permission::SendSms,
        Permission::ReadPhoneState,
        Permission::PostNotifications,
    ];
}

/// Answers whether the host currently holds a permission.
pub trait PermissionProbe: Send + Sync {
    fn is_granted(&self, permission: Permission) -> bool;
}

/// Fixed permission set.
#[derive(Debug, Clone, Default)]
pub struct StaticPermissions {
    granted: Vec<Permission>,
}

impl StaticPermissions {
    pub fn all() -> Self {
        Self {
            granted: Permission::REQUIRED.to_vec(),
        }
    }

    pub fn only(granted: &[Permission]) -> Self {
        Self {
            granted: granted.to_vec(),
        }
    }
}

impl PermissionProbe for StaticPermissions {
    fn is_granted(&self, permission: Permission) -> bool {
        self.granted.contains(&permission)
    }
}

/// Why the bridge refused a call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BridgeRejection {
    #[error("{0}")]
    Invalid(String),

    #[error("Failed to parse phone numbers")]
    Unparseable,

    #[error("Required permissions (SMS/Phone/Notifications) denied")]
    PermissionsDenied,

    #[error("Emergency SMS already in progress")]
    AlreadyRunning,
}

/// Plugin call payload: `{"phoneNumbers": [...], "message": "..."}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendEmergencySmsCall {
    #[serde(default)]
    pub phone_numbers: Option<Vec<Value>>,
    #[serde(default)]
    pub message: Option<String>,
}

/// What the caller gets back for a JSON call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BridgeResponse {
    Resolved { run_id: String },
    Rejected { reason: String },
}

/// Remove all whitespace from a phone number.
pub fn normalize_number(raw: &str) -> String {
    raw.chars().filter(|c| !c.is_whitespace()).collect()
}

pub struct EmergencySmsBridge<T, N, P>
where
    T: Transport + 'static,
    N: Notifier + 'static,
    P: PermissionProbe,
{
    coordinator: DispatchCoordinator<T, N>,
    notifier: Arc<N>,
    permissions: Arc<P>,
}

impl<T, N, P> EmergencySmsBridge<T, N, P>
where
    T: Transport + 'static,
    N: Notifier + 'static,
    P: PermissionProbe,
{
    pub fn new(coordinator: DispatchCoordinator<T, N>, notifier: Arc<N>, permissions: Arc<P>) -> Self {
        Self {
            coordinator,
            notifier,
            permissions,
        }
    }

    pub fn coordinator(&self) -> &DispatchCoordinator<T, N> {
        &self.coordinator
    }

    /// Typed entry point. On success the run is already under way.
    pub fn send_emergency_sms(
        &self,
        phone_numbers: Option<Vec<String>>,
        message: Option<String>,
    ) -> Result<RunHandle, BridgeRejection> {
        if phone_numbers.is_none() || message.is_none() {
            return Err(self.reject(BridgeRejection::Invalid(
                "Missing phoneNumbers or message".to_string(),
            )));
        }

        if let Some(missing) = Permission::REQUIRED
            .iter()
            .find(|p| !self.permissions.is_granted(**p))
        {
            tracing::warn!(permission = ?missing, "Dispatch refused, permission not granted");
            return Err(self.reject(BridgeRejection::PermissionsDenied));
        }

        let phone_numbers: Option<Vec<String>> =
            phone_numbers.map(|numbers| numbers.iter().map(|n| normalize_number(n)).collect());

        let request = match DispatchRequest::new(phone_numbers, message) {
            Ok(request) => request,
            Err(DispatchError::Validation(detail)) => return Err(self.reject(BridgeRejection::Invalid(detail))),
            Err(e) => return Err(self.reject(BridgeRejection::Invalid(e.to_string()))),
        };

        self.coordinator.start(request).map_err(|e| match e {
            DispatchError::AlreadyRunning => self.reject(BridgeRejection::AlreadyRunning),
            other => self.reject(BridgeRejection::Invalid(other.to_string())),
        })
    }

    /// JSON entry point, as the plugin layer calls it.
    pub fn handle_call(&self, payload: &str) -> BridgeResponse {
        let result = serde_json::from_str::<SendEmergencySmsCall>(payload)
            .map_err(|e| {
                tracing::warn!(error = %e, "Malformed sendEmergencySms payload");
                self.reject(BridgeRejection::Invalid(
                    "Missing phoneNumbers or message".to_string(),
                ))
            })
            .and_then(|call| {
                let numbers = call
                    .phone_numbers
                    .map(|values| {
                        values
                            .into_iter()
                            .map(|v| v.as_str().map(str::to_string))
                            .collect::<Option<Vec<_>>>()
                            .ok_or_else(|| self.reject(BridgeRejection::Unparseable))
                    })
                    .transpose()?;
                self.send_emergency_sms(numbers, call.message)
            });

        match result {
            Ok(handle) => BridgeResponse::Resolved {
                run_id: handle.run_id().to_string(),
            },
            Err(rejection) => BridgeResponse::Rejected {
                reason: rejection.to_string(),
            },
        }
    }

    /// Surface a rejection to the user. A duplicate trigger stays silent so
    /// the active run's notifications are left alone.
    fn reject(&self, rejection: BridgeRejection) -> BridgeRejection {
        if rejection != BridgeRejection::AlreadyRunning {
            self.notifier.show_transient(
                &self
                    .coordinator
                    .notifications()
                    .validation_failed(&rejection.to_string()),
            );
        }
        rejection
    }
}
