//! Delivery correlation.
//!
//! The DeliveryCorrelator owns the per-run mapping from correlation token to
//! recipient attempt. Outcomes arrive from the transport's completion
//! channel in any order, possibly interleaved with sends still being issued,
//! so each attempt sits behind its own lock and the token map is only held
//! long enough to find (and remove) the owning attempt.
//!
//! Tokens that no longer map to anything (duplicates, or outcomes that arrive
//! after teardown) are dropped without error.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::classify::{Classification, classify};
use crate::domain::{AttemptStatus, DeliveryOutcome, FailureReason, RecipientAttempt};
use crate::id::CorrelationToken;
use crate::notify::{NotificationPolicy, Notifier};

/// Shared handle to one recipient attempt.
pub type AttemptSlot = Arc<Mutex<RecipientAttempt>>;

fn lock(slot: &AttemptSlot) -> MutexGuard<'_, RecipientAttempt> {
    // A poisoned attempt still holds consistent counters; keep using it
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub struct DeliveryCorrelator<N: Notifier> {
    run_id: String,
    tokens: Mutex<HashMap<CorrelationToken, AttemptSlot>>,
    attempts: Mutex<Vec<AttemptSlot>>,
    notifier: Arc<N>,
    policy: NotificationPolicy,
    advisory_shown: AtomicBool,
    closed: AtomicBool,
}

impl<N: Notifier> DeliveryCorrelator<N> {
    pub fn new(run_id: impl Into<String>, notifier: Arc<N>, policy: NotificationPolicy) -> Self {
        Self {
            run_id: run_id.into(),
            tokens: Mutex::new(HashMap::new()),
            attempts: Mutex::new(Vec::new()),
            notifier,
            policy,
            advisory_shown: AtomicBool::new(false),
            closed: AtomicBool::new(false),
        }
    }

    /// Start tracking a recipient whose message splits into `segments` parts.
    pub fn begin_attempt(&self, index: usize, recipient: &str, segments: usize) -> AttemptSlot {
        let slot = Arc::new(Mutex::new(RecipientAttempt::new(index, recipient, segments)));
        self.attempts
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(slot.clone());
        slot
    }

    /// Register a token against an attempt before its segment is sent.
    ///
    /// Ignored once the correlator is closed.
    pub fn register(&self, slot: &AttemptSlot, token: CorrelationToken) {
        if self.closed.load(Ordering::SeqCst) {
            return;
        }
        lock(slot).register(token.clone());
        self.tokens
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert(token, slot.clone());
    }

    /// Forget a token whose send never went out.
    pub fn unregister(&self, token: &CorrelationToken) {
        self.tokens
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .remove(token);
    }

    /// Fail an attempt whose send errored locally. Notifies on first failure.
    pub fn record_dispatch_error(&self, slot: &AttemptSlot, detail: &str) {
        let (transitioned, recipient) = {
            let mut attempt = lock(slot);
            (attempt.fail(FailureReason::Unknown(None)), attempt.recipient.clone())
        };
        if transitioned {
            tracing::warn!(run_id = %self.run_id, recipient = %recipient, detail, "Dispatch error");
            self.notifier
                .show_transient(&self.policy.dispatch_error(&recipient, detail));
        }
    }

    /// Route one transport outcome to its attempt.
    ///
    /// Returns the attempt's status after the update, or None for a token
    /// that maps to no live attempt.
    pub fn on_outcome(&self, outcome: &DeliveryOutcome) -> Option<AttemptStatus> {
        if outcome.token.run_id() != self.run_id {
            tracing::debug!(run_id = %self.run_id, token = %outcome.token, "Ignoring outcome from another run");
            return None;
        }

        let slot = self
            .tokens
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .remove(&outcome.token);

        let Some(slot) = slot else {
            tracing::debug!(token = %outcome.token, code = %outcome.code, "Ignoring outcome for unknown token");
            return None;
        };

        let classification = classify(outcome.code);
        let (status, newly_failed, recipient) = {
            let mut attempt = lock(&slot);
            let newly_failed = match classification {
                Classification::Delivered => {
                    attempt.settle_success();
                    None
                }
                Classification::Failed(reason) => attempt.settle_failure(reason).then_some(reason),
            };
            (attempt.status, newly_failed, attempt.recipient.clone())
        };

        match (classification, newly_failed) {
            (Classification::Delivered, _) => {
                tracing::info!(run_id = %self.run_id, recipient = %recipient, token = %outcome.token, "Delivery success");
            }
            (Classification::Failed(_), Some(reason)) => {
                tracing::error!(
                    run_id = %self.run_id,
                    recipient = %recipient,
                    code = %outcome.code,
                    reason = %reason,
                    "Delivery failure"
                );
                self.notify_failure(&recipient, &reason);
            }
            (Classification::Failed(reason), None) => {
                tracing::debug!(recipient = %recipient, reason = %reason, "Recipient already failed");
            }
        }

        Some(status)
    }

    fn notify_failure(&self, recipient: &str, reason: &FailureReason) {
        self.notifier
            .show_transient(&self.policy.delivery_failed(recipient, reason));

        if let Some(advisory) = self.policy.advisory(reason) {
            if !self.advisory_shown.swap(true, Ordering::SeqCst) {
                self.notifier.show_transient(&advisory);
            }
        }
    }

    /// Tokens still waiting on an outcome.
    pub fn pending_tokens(&self) -> usize {
        self.tokens.lock().unwrap_or_else(|p| p.into_inner()).len()
    }

    /// Current state of every attempt, in dispatch order.
    pub fn snapshot(&self) -> Vec<RecipientAttempt> {
        self.attempts
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .iter()
            .map(|slot| lock(slot).clone())
            .collect()
    }

    /// Stop correlating: drop every outstanding token and return final state.
    pub fn close(&self) -> Vec<RecipientAttempt> {
        self.closed.store(true, Ordering::SeqCst);
        let dropped = {
            let mut tokens = self.tokens.lock().unwrap_or_else(|p| p.into_inner());
            let n = tokens.len();
            tokens.clear();
            n
        };
        if dropped > 0 {
            tracing::debug!(run_id = %self.run_id, dropped, "Closing with unresolved tokens");
        }
        self.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ResultCode;
    use crate::notify::{OEM_BACKGROUND_SMS_ADVISORY, RecordingNotifier, Severity};

    fn correlator() -> (Arc<RecordingNotifier>, DeliveryCorrelator<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::new());
        let correlator = DeliveryCorrelator::new("run-1-0000", notifier.clone(), NotificationPolicy::default());
        (notifier, correlator)
    }

    fn track(
        correlator: &DeliveryCorrelator<RecordingNotifier>,
        index: usize,
        recipient: &str,
        segments: usize,
    ) -> (AttemptSlot, Vec<CorrelationToken>) {
        let slot = correlator.begin_attempt(index, recipient, segments);
        let tokens: Vec<_> = (0..segments)
            .map(|part| CorrelationToken::new("run-1-0000", index, part))
            .collect();
        for token in &tokens {
            correlator.register(&slot, token.clone());
        }
        (slot, tokens)
    }

    fn outcome(token: &CorrelationToken, code: ResultCode, recipient: &str) -> DeliveryOutcome {
        DeliveryOutcome::new(token.clone(), code, recipient)
    }

    #[test]
    fn test_single_segment_success() {
        let (notifier, correlator) = correlator();
        let (_slot, tokens) = track(&correlator, 0, "+1", 1);

        let status = correlator.on_outcome(&outcome(&tokens[0], ResultCode::OK, "+1"));
        assert_eq!(status, Some(AttemptStatus::Succeeded));
        assert!(notifier.records().is_empty());
        assert_eq!(correlator.pending_tokens(), 0);
    }

    #[test]
    fn test_multipart_succeeds_only_when_all_report() {
        let (_notifier, correlator) = correlator();
        let (_slot, tokens) = track(&correlator, 0, "+1", 3);

        assert_eq!(
            correlator.on_outcome(&outcome(&tokens[2], ResultCode::OK, "+1")),
            Some(AttemptStatus::Pending)
        );
        assert_eq!(
            correlator.on_outcome(&outcome(&tokens[0], ResultCode::OK, "+1")),
            Some(AttemptStatus::Pending)
        );
        assert_eq!(
            correlator.on_outcome(&outcome(&tokens[1], ResultCode::OK, "+1")),
            Some(AttemptStatus::Succeeded)
        );
    }

    #[test]
    fn test_early_success_before_all_registered_stays_pending() {
        let (_notifier, correlator) = correlator();
        let slot = correlator.begin_attempt(0, "+1", 2);
        let first = CorrelationToken::new("run-1-0000", 0, 0);
        correlator.register(&slot, first.clone());

        // segment 1 acknowledged before segment 2 is even registered
        assert_eq!(
            correlator.on_outcome(&outcome(&first, ResultCode::OK, "+1")),
            Some(AttemptStatus::Pending)
        );

        let second = CorrelationToken::new("run-1-0000", 0, 1);
        correlator.register(&slot, second.clone());
        assert_eq!(
            correlator.on_outcome(&outcome(&second, ResultCode::OK, "+1")),
            Some(AttemptStatus::Succeeded)
        );
    }

    #[test]
    fn test_first_failure_wins_single_notification() {
        let (notifier, correlator) = correlator();
        let (_slot, tokens) = track(&correlator, 0, "+1555000222", 3);

        correlator.on_outcome(&outcome(&tokens[0], ResultCode::NO_SERVICE, "+1555000222"));
        correlator.on_outcome(&outcome(&tokens[1], ResultCode::RADIO_OFF, "+1555000222"));
        let status = correlator.on_outcome(&outcome(&tokens[2], ResultCode::OK, "+1555000222"));

        assert_eq!(status, Some(AttemptStatus::Failed(FailureReason::NoService)));
        let warnings = notifier.transients(Severity::Warning);
        assert_eq!(warnings.len(), 1);
        assert_eq!(
            warnings[0].text,
            "SOS: Failed to send SMS to +1555000222 (No Network Service)"
        );
    }

    #[test]
    fn test_generic_failure_advisory_shown_once_per_run() {
        let (notifier, correlator) = correlator();
        let (_a, a) = track(&correlator, 0, "+1", 1);
        let (_b, b) = track(&correlator, 1, "+2", 1);

        correlator.on_outcome(&outcome(&a[0], ResultCode::GENERIC_FAILURE, "+1"));
        correlator.on_outcome(&outcome(&b[0], ResultCode::GENERIC_FAILURE, "+2"));

        assert_eq!(notifier.transients(Severity::Warning).len(), 2);
        let advisories = notifier.transients(Severity::Advisory);
        assert_eq!(advisories.len(), 1);
        assert_eq!(advisories[0].text, OEM_BACKGROUND_SMS_ADVISORY);
    }

    #[test]
    fn test_unknown_token_is_ignored() {
        let (notifier, correlator) = correlator();
        let status = correlator.on_outcome(&outcome(
            &CorrelationToken::from("run-0-ffff/000/000"),
            ResultCode::NO_SERVICE,
            "+1",
        ));
        assert_eq!(status, None);
        assert!(notifier.records().is_empty());
    }

    #[test]
    fn test_outcome_from_previous_run_is_ignored() {
        let (notifier, correlator) = correlator();
        let (_slot, _tokens) = track(&correlator, 0, "+1", 1);

        let stale = CorrelationToken::new("run-0-aaaa", 0, 0);
        assert_eq!(correlator.on_outcome(&outcome(&stale, ResultCode::RADIO_OFF, "+1")), None);
        assert_eq!(correlator.pending_tokens(), 1);
        assert_eq!(correlator.snapshot()[0].status, AttemptStatus::Pending);
        assert!(notifier.records().is_empty());
    }

    #[test]
    fn test_duplicate_outcome_is_ignored() {
        let (_notifier, correlator) = correlator();
        let (_slot, tokens) = track(&correlator, 0, "+1", 2);

        correlator.on_outcome(&outcome(&tokens[0], ResultCode::OK, "+1"));
        assert_eq!(correlator.on_outcome(&outcome(&tokens[0], ResultCode::OK, "+1")), None);
        assert_eq!(correlator.snapshot()[0].status, AttemptStatus::Pending);
    }

    #[test]
    fn test_outcome_after_close_is_noop() {
        let (notifier, correlator) = correlator();
        let (_slot, tokens) = track(&correlator, 0, "+1", 1);

        let final_state = correlator.close();
        assert_eq!(final_state[0].status, AttemptStatus::Pending);

        assert_eq!(
            correlator.on_outcome(&outcome(&tokens[0], ResultCode::NO_SERVICE, "+1")),
            None
        );
        assert!(notifier.records().is_empty());
        assert_eq!(correlator.snapshot()[0].status, AttemptStatus::Pending);
    }

    #[test]
    fn test_register_after_close_is_ignored() {
        let (_notifier, correlator) = correlator();
        correlator.close();
        let slot = correlator.begin_attempt(0, "+1", 1);
        correlator.register(&slot, CorrelationToken::new("run-1-0000", 0, 0));
        assert_eq!(correlator.pending_tokens(), 0);
    }

    #[test]
    fn test_dispatch_error_marks_unknown_and_notifies() {
        let (notifier, correlator) = correlator();
        let (slot, tokens) = track(&correlator, 0, "+1", 1);

        correlator.unregister(&tokens[0]);
        correlator.record_dispatch_error(&slot, "Invalid destination address");
        correlator.record_dispatch_error(&slot, "again");

        assert_eq!(
            correlator.snapshot()[0].status,
            AttemptStatus::Failed(FailureReason::Unknown(None))
        );
        let warnings = notifier.transients(Severity::Warning);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].text, "SOS: System Error for +1: Invalid destination address");
    }

    #[test]
    fn test_outcomes_from_many_threads() {
        let notifier = Arc::new(RecordingNotifier::new());
        let correlator = Arc::new(DeliveryCorrelator::new(
            "run-1-0000",
            notifier.clone(),
            NotificationPolicy::default(),
        ));
        let (_slot, tokens) = track(&correlator, 0, "+1", 8);

        let handles: Vec<_> = tokens
            .into_iter()
            .map(|token| {
                let correlator = correlator.clone();
                std::thread::spawn(move || {
                    correlator.on_outcome(&DeliveryOutcome::new(token, ResultCode::OK, "+1"));
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let attempt = &correlator.snapshot()[0];
        assert_eq!(attempt.status, AttemptStatus::Succeeded);
        assert_eq!(attempt.outstanding, 0);
    }
}
