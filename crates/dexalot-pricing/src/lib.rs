//! Indicative pricing for the Dexalot RFQ integration.
//!
//! Walks cached order books to compute the realizable output of a trade at
//! each requested size. Reads only the in-memory directories and the shared
//! cache.

pub mod book;
pub mod error;
pub mod service;

pub use book::{calc_output, calc_outputs, output_for, walk_book, BookWalk};
pub use error::{PricingError, PricingResult};
pub use service::{pool_identifier, PoolLiquidity, PriceQuote, PricingService};
