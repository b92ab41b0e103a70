//! Token and pair directory entries.
//!
//! Tokens are identified by their lowercased address; pairs by the
//! `BASE/QUOTE` symbol string. The inverse ordering `QUOTE/BASE` is never
//! indexed, so lookups must try both orderings.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical form of an address used as identity and cache-key component.
pub fn normalize_address(address: &str) -> String {
    address.trim().to_ascii_lowercase()
}

/// A token listed by the maker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Lowercased address.
    pub address: String,
    pub symbol: String,
    pub name: String,
    pub description: String,
    /// Decimal precision of the smallest unit.
    pub decimals: u8,
    /// Maker-reported token type (e.g. "ERC20", "NATIVE").
    pub token_type: String,
}

impl Token {
    /// Create a token, normalizing its address.
    pub fn new(
        address: &str,
        symbol: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        decimals: u8,
        token_type: impl Into<String>,
    ) -> Self {
        Self {
            address: normalize_address(address),
            symbol: symbol.into(),
            name: name.into(),
            description: description.into(),
            decimals,
            token_type: token_type.into(),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.symbol, self.address)
    }
}

/// A tradable pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pair {
    pub base: String,
    pub quote: String,
    /// Liquidity in USD as reported by the maker.
    pub liquidity_usd: Decimal,
}

impl Pair {
    pub fn new(base: impl Into<String>, quote: impl Into<String>, liquidity_usd: Decimal) -> Self {
        Self {
            base: base.into(),
            quote: quote.into(),
            liquidity_usd,
        }
    }

    /// Pair identity: `BASE/QUOTE`.
    pub fn name(&self) -> String {
        Self::name_of(&self.base, &self.quote)
    }

    /// Format a pair name from two symbols.
    pub fn name_of(base: &str, quote: &str) -> String {
        format!("{base}/{quote}")
    }

    /// Split a pair name into `(base, quote)`.
    pub fn split_name(name: &str) -> Option<(&str, &str)> {
        let (base, quote) = name.split_once('/')?;
        if base.is_empty() || quote.is_empty() {
            return None;
        }
        Some((base, quote))
    }

    /// Check whether `symbol` is either leg.
    pub fn involves(&self, symbol: &str) -> bool {
        self.base == symbol || self.quote == symbol
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}
