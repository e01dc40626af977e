//! Lifecycle notifications
//!
//! The core surfaces a persistent "in progress" indicator while a run is
//! active and short-lived messages for failures. It never blocks on the UI:
//! a Notifier implementation is responsible for getting each call onto
//! whatever context the host UI requires.

pub mod notifier;
pub mod policy;
pub mod types;

pub use notifier::{ChannelNotifier, LogNotifier, Notifier, RecordingNotifier};
pub use policy::{NotificationPolicy, OEM_BACKGROUND_SMS_ADVISORY};
pub use types::{Notification, ProgressIndicator, Severity, TapAction, TransientMessage};
