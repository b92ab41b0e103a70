//! Executor error types.
//!
//! Policy violations (`Blacklisted`, `SignatureMismatch`) are distinct from
//! negotiation failures so callers can tell them apart.

use alloy::primitives::B256;
use dexalot_registry::RegistryError;
use thiserror::Error;

/// Marker the maker appends when refusing a trader.
pub const RESTRICTED_USER_MARKER: &str = "User is restricted from using Dexalot";

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("Firm quote requested for a zero amount")]
    ZeroAmount,

    #[error("User {0} is blacklisted")]
    Blacklisted(String),

    #[error("Firm quote request failed: {0}")]
    QuoteRequest(#[source] RegistryError),

    #[error("Firm quote is missing {0}")]
    MissingField(&'static str),

    #[error("Firm quote has invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("Firm quote {field} is {actual}, expected {expected}")]
    QuoteMismatch {
        field: &'static str,
        expected: String,
        actual: String,
    },

    #[error("Firm quote expired at {expiry} (now {now})")]
    Expired { expiry: u64, now: u64 },

    #[error("Order signature does not verify for digest {digest}")]
    SignatureMismatch { digest: B256 },

    #[error("Too much slippage: {0}")]
    Slippage(String),

    #[error("Cache error: {0}")]
    Cache(#[source] RegistryError),

    #[error("Unknown token: {0}")]
    UnknownToken(String),
}

impl ExecutorError {
    /// Whether the maker rejected the trader as restricted.
    pub fn is_restricted_user(&self) -> bool {
        matches!(self, Self::QuoteRequest(e) if e.to_string().contains(RESTRICTED_USER_MARKER))
    }
}

pub type ExecutorResult<T> = Result<T, ExecutorError>;
