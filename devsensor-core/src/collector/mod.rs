//! Delivery of buffered events to the remote collector
//!
//! ## Architecture
//!
//! - [`Deliver`] is the seam between the sensor and the network: one call
//!   per delivery cycle, one batch per call, and a [`DeliveryOutcome`] back.
//! - [`BlockingCollector`] is the real implementation, posting JSON to the
//!   collector over HTTP with a bounded timeout.
//! - [`Publisher`] runs cycles: drain the buffer, deliver, then discard,
//!   requeue or drop the batch.
//!
//! Network failures never reach the code that submitted the events.
//!
//! ## Usage
//!
//! Point the sensor at a collector in `~/.config/devsensor/config.toml`:
//!
//! ```toml
//! [sensor]
//! host = "https://collector.example.com"
//! user = "dev@example.com"
//! key = "xxxxxxxxxxxx"
//! ```

mod client;
mod publisher;
mod wire;

pub use client::{
    classify, BlockingCollector, CollectorClient, Credential, EventsResponse, SendError,
};
pub use publisher::{CycleReport, PublishStats, Publisher};
pub use wire::{EventBatch, SensorIdentity, WireEvent};

use crate::event::EventRecord;

/// Result of one delivery attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The collector took the whole batch
    Success { accepted: usize },
    /// The collector took some events and refused the rest
    PartialFailure { accepted: usize, rejected: usize },
    /// Nothing was delivered
    TotalFailure { retryable: bool, reason: String },
}

impl DeliveryOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, DeliveryOutcome::Success { .. })
    }
}

/// Sends one batch to a collector
///
/// Implementations block for at most their own request timeout and must
/// never panic on network errors.
pub trait Deliver: Send + Sync {
    fn deliver(&self, batch: &[EventRecord]) -> DeliveryOutcome;
}

/// Stand-in used when no collector is configured; every batch fails and is
/// kept for a later cycle.
pub struct Unconfigured;

impl Deliver for Unconfigured {
    fn deliver(&self, _batch: &[EventRecord]) -> DeliveryOutcome {
        DeliveryOutcome::TotalFailure {
            retryable: true,
            reason: "no collector configured".to_string(),
        }
    }
}
