//! Prometheus metrics and structured logging for the Dexalot RFQ integration.
//!
//! - Prometheus counters for polling cycles, order-book writes, firm quotes
//!   and policy rejections
//! - Structured logging with tracing (JSON in production)

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::init_logging;
pub use metrics::Metrics;
