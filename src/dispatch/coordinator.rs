//! Dispatch coordinator - runs one emergency alert from start to teardown.
//!
//! A run:
//! 1. Takes the process-wide run guard (a second start is rejected)
//! 2. Shows the progress indicator
//! 3. Sends every segment to every recipient, in request order, pacing
//!    between recipients
//! 4. Waits a fixed grace window for outstanding delivery outcomes
//! 5. Tears down: closes correlation, clears the indicator, releases the guard
//!
//! A transport that cannot be obtained at all ends the run immediately; any
//! other send problem only fails the recipient it happened on.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use crate::correlator::{AttemptSlot, DeliveryCorrelator};
use crate::dispatch::guard::{RunGuard, RunLease, RunState};
use crate::domain::{AttemptStatus, DispatchRequest, RecipientAttempt};
use crate::error::{DispatchError, Result};
use crate::id::{CorrelationToken, generate_run_id};
use crate::notify::{NotificationPolicy, Notifier};
use crate::segment::segment;
use crate::transport::{OutcomeSink, OutgoingSegment, Transport};

/// Timing policy for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchPolicy {
    /// Delay between consecutive recipients
    pub pacing: Duration,
    /// Wait after the last send before tearing down
    pub grace: Duration,
}

impl Default for DispatchPolicy {
    fn default() -> Self {
        Self {
            pacing: Duration::from_millis(1500),
            grace: Duration::from_secs(10),
        }
    }
}

/// Final state of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Every attempt the run began, in dispatch order
    pub attempts: Vec<RecipientAttempt>,
    /// Ended early because the transport was unavailable
    pub aborted: bool,
}

impl RunReport {
    fn count(&self, pred: impl Fn(&AttemptStatus) -> bool) -> usize {
        self.attempts.iter().filter(|a| pred(&a.status)).count()
    }

    pub fn succeeded(&self) -> usize {
        self.count(|s| *s == AttemptStatus::Succeeded)
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, AttemptStatus::Failed(_)))
    }

    pub fn pending(&self) -> usize {
        self.count(|s| *s == AttemptStatus::Pending)
    }

    pub fn status_of(&self, index: usize) -> Option<AttemptStatus> {
        self.attempts.iter().find(|a| a.index == index).map(|a| a.status)
    }
}

/// Acknowledgement returned by `start`; await it for the run's report.
#[derive(Debug)]
pub struct RunHandle {
    run_id: String,
    handle: JoinHandle<RunReport>,
}

impl RunHandle {
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Wait for teardown and collect the report.
    pub async fn wait(self) -> Result<RunReport> {
        self.handle
            .await
            .map_err(|e| DispatchError::RunAborted(format!("{}: {}", self.run_id, e)))
    }
}

pub struct DispatchCoordinator<T, N>
where
    T: Transport + 'static,
    N: Notifier + 'static,
{
    transport: Arc<T>,
    notifier: Arc<N>,
    guard: Arc<RunGuard>,
    policy: DispatchPolicy,
    notifications: NotificationPolicy,
}

impl<T, N> DispatchCoordinator<T, N>
where
    T: Transport + 'static,
    N: Notifier + 'static,
{
    /// Coordinator bound to the process-wide run guard.
    pub fn new(transport: Arc<T>, notifier: Arc<N>) -> Self {
        Self {
            transport,
            notifier,
            guard: RunGuard::process(),
            policy: DispatchPolicy::default(),
            notifications: NotificationPolicy::default(),
        }
    }

    /// Use a specific guard instead of the process-wide one.
    pub fn with_guard(mut self, guard: Arc<RunGuard>) -> Self {
        self.guard = guard;
        self
    }

    pub fn with_policy(mut self, policy: DispatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_notifications(mut self, notifications: NotificationPolicy) -> Self {
        self.notifications = notifications;
        self
    }

    pub fn state(&self) -> RunState {
        self.guard.state()
    }

    pub fn policy(&self) -> DispatchPolicy {
        self.policy
    }

    pub fn notifications(&self) -> &NotificationPolicy {
        &self.notifications
    }

    /// Begin a run on a background task and return immediately.
    ///
    /// Must be called from within a tokio runtime. Fails with
    /// `AlreadyRunning` if another run holds the guard; nothing about the
    /// active run changes in that case.
    pub fn start(&self, request: DispatchRequest) -> Result<RunHandle> {
        let Some(lease) = self.guard.try_acquire() else {
            tracing::warn!("Dispatch already running, ignoring duplicate start");
            return Err(DispatchError::AlreadyRunning);
        };

        let run_id = generate_run_id();
        tracing::info!(
            run_id = %run_id,
            recipients = request.recipients().len(),
            "Starting dispatch run"
        );

        let run = Run {
            run_id: run_id.clone(),
            transport: self.transport.clone(),
            notifier: self.notifier.clone(),
            policy: self.policy,
            notifications: self.notifications.clone(),
        };
        let handle = tokio::spawn(run.execute(request, lease));

        Ok(RunHandle { run_id, handle })
    }
}

/// Outcome of issuing one recipient's segments.
enum Issued {
    Sent,
    Failed,
    TransportGone,
}

struct Run<T: Transport, N: Notifier> {
    run_id: String,
    transport: Arc<T>,
    notifier: Arc<N>,
    policy: DispatchPolicy,
    notifications: NotificationPolicy,
}

impl<T, N> Run<T, N>
where
    T: Transport + 'static,
    N: Notifier + 'static,
{
    async fn execute(self, request: DispatchRequest, lease: RunLease) -> RunReport {
        let started_at = Utc::now();
        let recipients = request.recipients();

        self.notifier.show_progress(&self.notifications.progress());
        self.notifier
            .show_transient(&self.notifications.run_started(recipients.len()));

        let correlator = Arc::new(DeliveryCorrelator::new(
            self.run_id.clone(),
            self.notifier.clone(),
            self.notifications.clone(),
        ));
        let (sink, mut outcomes) = OutcomeSink::channel();
        let pump = {
            let correlator = correlator.clone();
            tokio::spawn(async move {
                while let Some(outcome) = outcomes.recv().await {
                    correlator.on_outcome(&outcome);
                }
            })
        };

        let segmentation = segment(request.message());
        tracing::debug!(
            run_id = %self.run_id,
            segments = segmentation.len(),
            encoding = ?segmentation.encoding,
            "Message segmented"
        );

        let mut aborted = false;
        for (index, recipient) in recipients.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(self.policy.pacing).await;
            }

            tracing::info!(run_id = %self.run_id, recipient = %recipient, "Dispatching SMS");
            let slot = correlator.begin_attempt(index, recipient, segmentation.len());

            match self
                .issue(&correlator, &slot, index, recipient, &segmentation.segments, &sink)
                .await
            {
                Issued::Sent | Issued::Failed => {}
                Issued::TransportGone => {
                    self.notifier
                        .show_transient(&self.notifications.transport_unavailable());
                    aborted = true;
                    break;
                }
            }
        }
        drop(sink);

        if !aborted {
            tokio::time::sleep(self.policy.grace).await;
        }

        // teardown
        let attempts = correlator.close();
        pump.abort();
        self.notifier.clear_progress();
        lease.release();

        let report = RunReport {
            run_id: self.run_id,
            started_at,
            finished_at: Utc::now(),
            attempts,
            aborted,
        };
        tracing::info!(
            run_id = %report.run_id,
            succeeded = report.succeeded(),
            failed = report.failed(),
            pending = report.pending(),
            aborted,
            "Dispatch run stopped"
        );
        report
    }

    async fn issue(
        &self,
        correlator: &DeliveryCorrelator<N>,
        slot: &AttemptSlot,
        index: usize,
        recipient: &str,
        segments: &[String],
        sink: &OutcomeSink,
    ) -> Issued {
        for (part, text) in segments.iter().enumerate() {
            let token = CorrelationToken::new(&self.run_id, index, part);
            correlator.register(slot, token.clone());

            let outgoing = OutgoingSegment {
                recipient: recipient.to_string(),
                text: text.clone(),
                token: token.clone(),
                part,
                parts: segments.len(),
            };
            let sent = AssertUnwindSafe(self.transport.send(outgoing, sink.clone()))
                .catch_unwind()
                .await;

            match sent {
                Ok(Ok(())) => {}
                Ok(Err(e)) if e.is_fatal() => {
                    correlator.unregister(&token);
                    tracing::error!(run_id = %self.run_id, error = %e, "Transport unavailable, aborting run");
                    return Issued::TransportGone;
                }
                Ok(Err(e)) => {
                    correlator.unregister(&token);
                    tracing::error!(run_id = %self.run_id, recipient = %recipient, error = %e, "Failed to dispatch");
                    correlator.record_dispatch_error(slot, &e.to_string());
                    return Issued::Failed;
                }
                Err(_) => {
                    correlator.unregister(&token);
                    tracing::error!(run_id = %self.run_id, recipient = %recipient, "Transport panicked during send");
                    correlator.record_dispatch_error(slot, "unexpected transport error");
                    return Issued::Failed;
                }
            }
        }
        Issued::Sent
    }
}
