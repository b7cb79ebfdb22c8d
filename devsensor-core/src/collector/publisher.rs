//! Delivery cycles: drain, send, and settle the batch
//!
//! A cycle drains the whole buffer into one batch and makes a single
//! delivery attempt. What happens to the batch afterwards depends on the
//! outcome and the configured [`FailurePolicy`]:
//!
//! | outcome | requeue policy | drop policy |
//! |---|---|---|
//! | success | discarded | discarded |
//! | partial failure | rejected events not re-sent | same |
//! | retryable total failure | back to the buffer head | dropped, logged |
//! | non-retryable total failure | dropped, logged | dropped, logged |
//!
//! Cycles are serialized so a requeued batch cannot overtake or interleave
//! with another cycle's batch. Once the owner is closing, failed batches are
//! dropped whatever the policy; the flag is read after the attempt returns,
//! so a cycle already in flight when shutdown begins never requeues.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::buffer::EventBuffer;
use crate::config::FailurePolicy;

use super::{Deliver, DeliveryOutcome};

/// Publishing statistics
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PublishStats {
    /// Total events the collector accepted
    pub events_sent: usize,
    /// Total events rejected by the collector
    pub events_rejected: usize,
    /// Events put back in the buffer after a failed cycle
    pub events_requeued: usize,
    /// Events given up on (failed cycle under drop policy, capacity overflow,
    /// non-retryable failure, failure after shutdown)
    pub events_dropped: usize,
    /// Number of API calls made
    pub api_calls: usize,
    /// Number of API calls that failed outright
    pub api_failures: usize,
}

/// What one delivery cycle did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub batch_size: usize,
    pub outcome: DeliveryOutcome,
    pub requeued: usize,
    pub dropped: usize,
}

impl CycleReport {
    /// One-line summary, e.g. `5 sent` or `failed (timeout), 5 requeued`
    pub fn describe(&self) -> String {
        match &self.outcome {
            DeliveryOutcome::Success { accepted } => format!("{} sent", accepted),
            DeliveryOutcome::PartialFailure { accepted, rejected } => {
                format!("{} sent, {} rejected", accepted, rejected)
            }
            DeliveryOutcome::TotalFailure { reason, .. } if self.requeued > 0 => {
                format!("failed ({}), {} requeued", reason, self.requeued)
            }
            DeliveryOutcome::TotalFailure { reason, .. } => {
                format!("failed ({}), {} dropped", reason, self.dropped)
            }
        }
    }
}

/// Runs delivery cycles against a [`Deliver`] implementation
pub struct Publisher {
    deliverer: Box<dyn Deliver>,
    policy: FailurePolicy,
    capacity: usize,
    stats: Mutex<PublishStats>,
    cycle: Mutex<()>,
}

impl Publisher {
    pub fn new(deliverer: Box<dyn Deliver>, policy: FailurePolicy, capacity: usize) -> Self {
        Self {
            deliverer,
            policy,
            capacity: capacity.max(1),
            stats: Mutex::new(PublishStats::default()),
            cycle: Mutex::new(()),
        }
    }

    /// Drain `buffer` and deliver it as one batch
    ///
    /// Returns `None` without touching the network when the buffer is
    /// empty. `closing` is checked when the batch is settled; while it is
    /// set nothing goes back to the buffer.
    pub fn run_cycle(&self, buffer: &EventBuffer, closing: &AtomicBool) -> Option<CycleReport> {
        let _cycle = self.cycle.lock();

        let batch = buffer.drain_all();
        if batch.is_empty() {
            return None;
        }
        let batch_size = batch.len();

        let outcome = self.deliverer.deliver(&batch);
        let mut requeued = 0;
        let mut dropped = 0;

        match &outcome {
            DeliveryOutcome::Success { accepted } => {
                tracing::debug!(accepted, "Delivered batch to collector");
            }
            DeliveryOutcome::PartialFailure { accepted, rejected } => {
                tracing::warn!(
                    accepted,
                    rejected,
                    "Collector rejected part of the batch"
                );
            }
            DeliveryOutcome::TotalFailure { retryable, reason } => {
                let requeue = *retryable
                    && self.policy == FailurePolicy::Requeue
                    && !closing.load(Ordering::SeqCst);
                if requeue {
                    let overflow = buffer.requeue_front(batch, self.capacity);
                    requeued = batch_size - overflow.min(batch_size);
                    dropped = overflow;
                    tracing::warn!(
                        batch_size,
                        requeued,
                        overflow,
                        error = %reason,
                        "Delivery failed, batch requeued for next cycle"
                    );
                } else {
                    dropped = batch_size;
                    tracing::warn!(
                        batch_size,
                        retryable,
                        error = %reason,
                        "Delivery failed, batch dropped"
                    );
                }
            }
        }

        let mut stats = self.stats.lock();
        stats.api_calls += 1;
        match &outcome {
            DeliveryOutcome::Success { accepted } => stats.events_sent += accepted,
            DeliveryOutcome::PartialFailure { accepted, rejected } => {
                stats.events_sent += accepted;
                stats.events_rejected += rejected;
            }
            DeliveryOutcome::TotalFailure { .. } => stats.api_failures += 1,
        }
        stats.events_requeued += requeued;
        stats.events_dropped += dropped;

        Some(CycleReport {
            batch_size,
            outcome,
            requeued,
            dropped,
        })
    }

    /// Get current publishing statistics
    pub fn stats(&self) -> PublishStats {
        self.stats.lock().clone()
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }
}
