//! Pricing error types.
//!
//! Missing liquidity is not an error; it surfaces as `None`. Neither is an
//! unreadable cached book or an amount too large to convert; those price to
//! `None` and `0` respectively.

use dexalot_registry::RegistryError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PricingError {
    #[error("Cache read failed: {0}")]
    Cache(#[from] RegistryError),
}

pub type PricingResult<T> = Result<T, PricingError>;
