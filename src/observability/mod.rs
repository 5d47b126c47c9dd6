//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Relay handler and middleware produce:
//!     → logging.rs (structured log events via `tracing`)
//!     → metrics.rs (counters, histograms via `metrics`)
//!
//! Consumers:
//!     → stdout (fmt subscriber)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through every log line of a request
//! - The upstream credential is never a log field
//! - Metrics are cheap no-ops when no recorder is installed

pub mod logging;
pub mod metrics;
