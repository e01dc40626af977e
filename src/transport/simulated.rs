//! Simulated carrier transport.
//!
//! Accepts every send, records it, and reports an outcome after a delay.
//! Outcomes can be scripted per recipient and segment to reproduce
//! out-of-order, failing, or missing acknowledgements.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::domain::ResultCode;
use crate::id::CorrelationToken;
use crate::transport::{OutcomeSink, OutgoingSegment, Transport, TransportError};

/// Scripted behaviour for one segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scripted {
    /// Report `code` after `delay`
    Report { code: ResultCode, delay: Duration },
    /// Never report anything
    Silent,
}

impl Scripted {
    pub fn ok_after(delay: Duration) -> Self {
        Scripted::Report {
            code: ResultCode::OK,
            delay,
        }
    }

    pub fn code_after(code: impl Into<ResultCode>, delay: Duration) -> Self {
        Scripted::Report {
            code: code.into(),
            delay,
        }
    }
}

/// Record of one accepted send.
#[derive(Debug, Clone)]
pub struct SentSegment {
    pub recipient: String,
    pub text: String,
    pub token: CorrelationToken,
    pub at: Instant,
}

#[derive(Debug)]
pub struct SimulatedTransport {
    default_code: ResultCode,
    latency: Duration,
    scripts: HashMap<String, Vec<Scripted>>,
    recipient_codes: HashMap<String, ResultCode>,
    rejected: HashSet<String>,
    unavailable: bool,
    sent: Mutex<Vec<SentSegment>>,
}

impl Default for SimulatedTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedTransport {
    /// Transport that delivers everything immediately.
    pub fn new() -> Self {
        Self {
            default_code: ResultCode::OK,
            latency: Duration::ZERO,
            scripts: HashMap::new(),
            recipient_codes: HashMap::new(),
            rejected: HashSet::new(),
            unavailable: false,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_default_code(mut self, code: impl Into<ResultCode>) -> Self {
        self.default_code = code.into();
        self
    }

    /// Script outcomes for `recipient`, one entry per segment. Segments past
    /// the end of the script use the default code and latency.
    pub fn script(mut self, recipient: impl Into<String>, outcomes: Vec<Scripted>) -> Self {
        self.scripts.insert(recipient.into(), outcomes);
        self
    }

    /// Unscripted segments to `recipient` report `code` instead of the default.
    pub fn fail_recipient(mut self, recipient: impl Into<String>, code: impl Into<ResultCode>) -> Self {
        self.recipient_codes.insert(recipient.into(), code.into());
        self
    }

    /// Sends to `recipient` error out before reaching the carrier.
    pub fn reject_recipient(mut self, recipient: impl Into<String>) -> Self {
        self.rejected.insert(recipient.into());
        self
    }

    /// No radio manager available at all.
    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    /// Accepted sends, in the order they were issued.
    pub fn sent(&self) -> Vec<SentSegment> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    fn plan(&self, segment: &OutgoingSegment) -> Scripted {
        self.scripts
            .get(&segment.recipient)
            .and_then(|script| script.get(segment.part).copied())
            .unwrap_or_else(|| Scripted::Report {
                code: self
                    .recipient_codes
                    .get(&segment.recipient)
                    .copied()
                    .unwrap_or(self.default_code),
                delay: self.latency,
            })
    }
}

#[async_trait]
impl Transport for SimulatedTransport {
    async fn send(&self, segment: OutgoingSegment, sink: OutcomeSink) -> Result<(), TransportError> {
        if self.unavailable {
            return Err(TransportError::Unavailable("SMS manager not accessible".to_string()));
        }
        if self.rejected.contains(&segment.recipient) {
            return Err(TransportError::Rejected(format!(
                "Invalid destination address {}",
                segment.recipient
            )));
        }

        if let Ok(mut sent) = self.sent.lock() {
            sent.push(SentSegment {
                recipient: segment.recipient.clone(),
                text: segment.text.clone(),
                token: segment.token.clone(),
                at: Instant::now(),
            });
        }

        if let Scripted::Report { code, delay } = self.plan(&segment) {
            let OutgoingSegment { recipient, token, .. } = segment;
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                sink.report(token, code, recipient);
            });
        }

        Ok(())
    }
}
