//! Core domain types for the Dexalot RFQ integration.
//!
//! This crate provides fundamental types used throughout the integration:
//! - `Token`, `Pair`: Directory entries published by the maker's REST API
//! - `PriceLevel`, `BookSide`: Discrete order-book levels as cached per pair
//! - `FirmOrder`: Maker-signed order returned by the firm-quote endpoint
//! - `Price`, `Size`: Precision-safe numeric types and smallest-unit conversions

pub mod book;
pub mod decimal;
pub mod error;
pub mod order;
pub mod token;

pub use book::{BookSide, OrderBook, PriceLevel};
pub use decimal::{from_token_units, to_token_units, Price, Size};
pub use error::{CoreError, Result};
pub use order::{FirmOrder, SwapSide};
pub use token::{normalize_address, Pair, Token};
