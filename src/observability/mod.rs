//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Filter middleware and server produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (decision counters)
//!
//! Consumers:
//!     → stdout (tracing-subscriber fmt layer)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through every log line of a request
//! - Denials are expected traffic: debug level, never error
//! - Metric updates are no-ops until a recorder is installed

pub mod logging;
pub mod metrics;
