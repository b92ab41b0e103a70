//! Response schemas of the polled resources.
//!
//! Each payload is deserialized into a typed struct and then checked by
//! [`Validate`]. A payload that deserializes but carries nonsense (empty
//! address, negative price) is rejected here so it never reaches pricing.

use crate::error::{RegistryError, RegistryResult};
use dexalot_core::{normalize_address, OrderBook, Pair, Token};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Semantic checks applied after deserialization.
pub trait Validate {
    /// Resource name used in logs and errors.
    const RESOURCE: &'static str;

    fn validate(&self) -> Result<(), String>;
}

/// Deserialize and validate a raw payload in one step.
pub fn validate_and_cast<T>(value: serde_json::Value) -> RegistryResult<T>
where
    T: DeserializeOwned + Validate,
{
    let typed: T = serde_json::from_value(value)
        .map_err(|e| RegistryError::validation(T::RESOURCE, e.to_string()))?;
    typed
        .validate()
        .map_err(|reason| RegistryError::validation(T::RESOURCE, reason))?;
    Ok(typed)
}

/// `0x` followed by 40 hex digits, any case.
pub fn is_hex_address(address: &str) -> bool {
    let Some(digits) = address.strip_prefix("0x").or_else(|| address.strip_prefix("0X")) else {
        return false;
    };
    digits.len() == 40 && digits.chars().all(|c| c.is_ascii_hexdigit())
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenData {
    pub symbol: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub address: String,
    pub decimals: u8,
    #[serde(rename = "type", default)]
    pub token_type: String,
}

impl TokenData {
    pub fn to_token(&self) -> Token {
        Token::new(
            &self.address,
            self.symbol.clone(),
            self.name.clone(),
            self.description.clone(),
            self.decimals,
            self.token_type.clone(),
        )
    }
}

/// `{ tokens: { [symbol]: TokenData } }`
#[derive(Debug, Clone, Deserialize)]
pub struct TokensResponse {
    pub tokens: BTreeMap<String, TokenData>,
}

impl Validate for TokensResponse {
    const RESOURCE: &'static str = "tokens";

    fn validate(&self) -> Result<(), String> {
        for (key, token) in &self.tokens {
            if !is_hex_address(token.address.trim()) {
                return Err(format!("token {key} has malformed address {:?}", token.address));
            }
            if token.symbol.is_empty() {
                return Err(format!("token {key} has empty symbol"));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PairData {
    pub base: String,
    pub quote: String,
    #[serde(rename = "liquidityUSD", default)]
    pub liquidity_usd: Decimal,
}

impl PairData {
    pub fn to_pair(&self) -> Pair {
        Pair::new(self.base.clone(), self.quote.clone(), self.liquidity_usd)
    }
}

/// `{ pairs: { [name]: PairData } }`
#[derive(Debug, Clone, Deserialize)]
pub struct PairsResponse {
    pub pairs: BTreeMap<String, PairData>,
}

impl Validate for PairsResponse {
    const RESOURCE: &'static str = "pairs";

    fn validate(&self) -> Result<(), String> {
        for (name, pair) in &self.pairs {
            if pair.base.is_empty() || pair.quote.is_empty() {
                return Err(format!("pair {name} is missing base or quote"));
            }
            if pair.liquidity_usd.is_sign_negative() {
                return Err(format!("pair {name} has negative liquidity"));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PriceData {
    pub bids: OrderBook,
    pub asks: OrderBook,
}

/// `{ prices: { [pairName]: { bids, asks } } }`
#[derive(Debug, Clone, Deserialize)]
pub struct PricesResponse {
    pub prices: BTreeMap<String, PriceData>,
}

impl Validate for PricesResponse {
    const RESOURCE: &'static str = "prices";

    fn validate(&self) -> Result<(), String> {
        for (name, data) in &self.prices {
            for level in data.bids.levels().iter().chain(data.asks.levels()) {
                if !level.price.is_positive() || level.quantity.inner().is_sign_negative() {
                    return Err(format!(
                        "pair {name} has invalid level [{}, {}]",
                        level.price, level.quantity
                    ));
                }
            }
        }
        Ok(())
    }
}

/// `{ blacklist: [address, ...] }`
#[derive(Debug, Clone, Deserialize)]
pub struct BlacklistResponse {
    pub blacklist: Vec<String>,
}

impl BlacklistResponse {
    /// Lowercased addresses.
    pub fn normalized(&self) -> Vec<String> {
        self.blacklist.iter().map(|a| normalize_address(a)).collect()
    }
}

impl Validate for BlacklistResponse {
    const RESOURCE: &'static str = "blacklist";

    fn validate(&self) -> Result<(), String> {
        match self.blacklist.iter().find(|a| !is_hex_address(a.trim())) {
            Some(bad) => Err(format!("malformed address {bad:?}")),
            None => Ok(()),
        }
    }
}
