//! Notifier capability and its implementations.

use std::sync::Mutex;

use tokio::sync::mpsc;

use crate::notify::types::{Notification, ProgressIndicator, Severity, TransientMessage};

/// Host UI capability the core calls into.
///
/// Calls come from the dispatch worker and from the outcome handler, so
/// implementations must not block and must hand off to the UI context.
pub trait Notifier: Send + Sync {
    fn show_progress(&self, indicator: &ProgressIndicator);

    fn show_transient(&self, message: &TransientMessage);

    fn clear_progress(&self);
}

/// Posts notifications onto a channel drained by the UI-affine consumer.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelNotifier {
    /// Create a notifier together with the receiving end for the UI side.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn post(&self, notification: Notification) {
        // UI side gone: nothing left to show it to
        if self.tx.send(notification).is_err() {
            tracing::debug!("Notification receiver dropped");
        }
    }
}

impl Notifier for ChannelNotifier {
    fn show_progress(&self, indicator: &ProgressIndicator) {
        self.post(Notification::Progress(indicator.clone()));
    }

    fn show_transient(&self, message: &TransientMessage) {
        self.post(Notification::Transient(message.clone()));
    }

    fn clear_progress(&self) {
        self.post(Notification::ClearProgress);
    }
}

/// Writes notifications as tracing events. Useful headless.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn show_progress(&self, indicator: &ProgressIndicator) {
        tracing::info!(title = %indicator.title, text = %indicator.text, "Progress indicator shown");
    }

    fn show_transient(&self, message: &TransientMessage) {
        match message.severity {
            Severity::Critical => tracing::error!(text = %message.text, "Notification"),
            Severity::Warning | Severity::Advisory => tracing::warn!(text = %message.text, "Notification"),
            Severity::Info => tracing::info!(text = %message.text, "Notification"),
        }
    }

    fn clear_progress(&self) {
        tracing::info!("Progress indicator cleared");
    }
}

/// Keeps every notification in memory, in call order.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    records: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, notification: Notification) {
        if let Ok(mut records) = self.records.lock() {
            records.push(notification);
        }
    }

    /// Everything recorded so far.
    pub fn records(&self) -> Vec<Notification> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Transient messages with the given severity.
    pub fn transients(&self, severity: Severity) -> Vec<TransientMessage> {
        self.records()
            .into_iter()
            .filter_map(|n| match n {
                Notification::Transient(msg) if msg.severity == severity => Some(msg),
                _ => None,
            })
            .collect()
    }

    /// Whether a progress indicator is currently showing.
    pub fn progress_visible(&self) -> bool {
        let mut visible = false;
        for n in self.records() {
            match n {
                Notification::Progress(_) => visible = true,
                Notification::ClearProgress => visible = false,
                Notification::Transient(_) => {}
            }
        }
        visible
    }
}

impl Notifier for RecordingNotifier {
    fn show_progress(&self, indicator: &ProgressIndicator) {
        self.push(Notification::Progress(indicator.clone()));
    }

    fn show_transient(&self, message: &TransientMessage) {
        self.push(Notification::Transient(message.clone()));
    }

    fn clear_progress(&self) {
        self.push(Notification::ClearProgress);
    }
}
