//! Transport capability
//!
//! The transport is what actually puts a text segment on the radio. The
//! core only knows how to hand it a segment with a correlation token and
//! where to report the outcome; a real implementation lives with the host
//! platform. `SimulatedTransport` stands in for it in tests and the CLI.

pub mod simulated;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::{DeliveryOutcome, ResultCode};
use crate::id::CorrelationToken;

pub use simulated::{Scripted, SentSegment, SimulatedTransport};

/// One segment ready to go out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingSegment {
    pub recipient: String,
    pub text: String,
    pub token: CorrelationToken,
    /// Zero-based position of this segment in the message
    pub part: usize,
    pub parts: usize,
}

/// Errors raised while handing a segment to the transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// No radio manager could be obtained at all; fatal for the run
    #[error("transport unavailable: {0}")]
    Unavailable(String),

    /// This one send could not be issued
    #[error("send rejected: {0}")]
    Rejected(String),
}

impl TransportError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, TransportError::Unavailable(_))
    }
}

/// Completion channel the transport reports outcomes on.
///
/// Cheap to clone and safe to call from any thread. Reports made after the
/// run has been torn down are dropped silently.
#[derive(Debug, Clone)]
pub struct OutcomeSink {
    tx: mpsc::UnboundedSender<DeliveryOutcome>,
}

impl OutcomeSink {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<DeliveryOutcome>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn report(&self, token: CorrelationToken, code: impl Into<ResultCode>, recipient: impl Into<String>) {
        self.report_outcome(DeliveryOutcome::new(token, code, recipient));
    }

    pub fn report_outcome(&self, outcome: DeliveryOutcome) {
        if let Err(e) = self.tx.send(outcome) {
            tracing::debug!(token = %e.0.token, "Outcome arrived after run ended, dropping");
        }
    }
}

/// Sends text segments over the carrier network.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue one segment. Returns as soon as the send is queued; the delivery
    /// outcome is reported later through `sink`.
    async fn send(&self, segment: OutgoingSegment, sink: OutcomeSink) -> Result<(), TransportError>;
}
