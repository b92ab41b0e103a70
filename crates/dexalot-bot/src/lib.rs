//! Dexalot RFQ integration.
//!
//! Application facade that wires every component:
//! - Token, pair, price and blacklist polling into the shared cache
//! - Indicative pricing by order-book walk
//! - Firm-quote negotiation and order verification before settlement

pub mod app;
pub mod config;
pub mod error;

pub use app::Application;
pub use config::{AppConfig, BlacklistConfig, FetcherConfig, PricesConfig};
pub use error::{AppError, AppResult};
