//! # devsensor-core
//!
//! Core library for devsensor - an editor telemetry sensor.
//!
//! This library provides:
//! - The event record model and the repeat-suppression rules
//! - A thread-safe event buffer fed by many observation threads
//! - Periodic samplers and timer-driven delivery
//! - An HTTP client for the remote collector
//! - Configuration management
//! - Logging infrastructure
//!
//! ## Architecture
//!
//! Events flow through three stages:
//! - **Observe:** host adapters call [`SensorCore`] from their callbacks
//! - **Buffer:** accepted events are stamped and queued in memory
//! - **Deliver:** a delivery cycle drains the queue into one batch and posts
//!   it to the collector, requeueing it on transient failure
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use devsensor_core::{Config, NoMetrics, SensorCore};
//!
//! // Load configuration
//! let config = Config::load().expect("failed to load config");
//!
//! // Create the sensor and start its timers
//! let sensor = SensorCore::from_config(config.sensor, Arc::new(NoMetrics))
//!     .expect("failed to create sensor");
//! sensor.start().expect("failed to start sensor");
//! ```

// Re-export commonly used items at the crate root
pub use buffer::EventBuffer;
pub use config::{Config, FailurePolicy, SensorConfig};
pub use error::{Error, Result};
pub use event::{EventKind, EventRecord, Properties, SessionClock, Submission};
pub use metrics::{FileMetrics, MetricsProvider, NoMetrics, TestMetrics};
pub use sensor::{FlushStatus, SensorCore, SensorEvent, SensorListener, Sink};

// Public modules
pub mod buffer;
pub mod collector;
pub mod config;
pub mod dedup;
pub mod error;
pub mod event;
pub mod logging;
pub mod metrics;
pub mod scheduler;
pub mod sensor;
