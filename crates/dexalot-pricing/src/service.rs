//! Indicative price requests.
//!
//! Resolves the pair for a token pair, picks the book side the taker walks,
//! converts smallest-unit amounts into book units and back.

use crate::book::calc_output;
use crate::error::PricingResult;
use dexalot_core::{normalize_address, to_token_units, BookSide, SwapSide, Token};
use dexalot_registry::{read_order_book, CacheScope, DynCache, RateState, RegistryError};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// Pool identifier of a directed token pair: `{dex_key}_{src}_{dest}`, lowercased.
pub fn pool_identifier(dex_key: &str, src_address: &str, dest_address: &str) -> String {
    format!("{dex_key}_{src_address}_{dest_address}").to_ascii_lowercase()
}

/// Indicative outputs for a list of amounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriceQuote {
    /// One output per requested amount, in `unit_decimals` smallest units.
    pub prices: Vec<u128>,
    pub unit_decimals: u8,
    /// Pair name the book belongs to.
    pub pool_identifier: String,
    pub exchange: String,
    pub gas_cost: u64,
    /// Asset the maker delivers (destination).
    pub maker_asset: String,
    /// Asset the taker delivers (source).
    pub taker_asset: String,
    pub book: BookSide,
}

/// A pair ranked by liquidity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolLiquidity {
    pub exchange: String,
    pub pair: String,
    pub connector_tokens: Vec<Token>,
    pub liquidity_usd: Decimal,
}

pub struct PricingService {
    state: Arc<RateState>,
    cache: DynCache,
    scope: CacheScope,
    gas_cost: u64,
}

impl PricingService {
    pub fn new(state: Arc<RateState>, cache: DynCache, scope: CacheScope, gas_cost: u64) -> Self {
        Self {
            state,
            cache,
            scope,
            gas_cost,
        }
    }

    pub fn dex_key(&self) -> &str {
        &self.scope.dex_key
    }

    /// Pool identifiers usable for a swap between two tokens.
    ///
    /// Empty when the maker lists no pair joining them.
    pub fn pool_identifiers(&self, src_address: &str, dest_address: &str) -> Vec<String> {
        let tokens = self.state.tokens();
        let (Some(src), Some(dest)) = (tokens.by_address(src_address), tokens.by_address(dest_address))
        else {
            return Vec::new();
        };
        if self.state.pairs().find(&src.symbol, &dest.symbol).is_none() {
            return Vec::new();
        }
        vec![pool_identifier(self.dex_key(), &src.address, &dest.address)]
    }

    /// Indicative output for each of `amounts` (smallest units).
    ///
    /// `Ok(None)` when a token, the pair or the book side is unknown or
    /// unreadable, or when `limit_pools` excludes this pair. An amount too
    /// large to convert prices to `0` without affecting the others.
    pub async fn prices_volume(
        &self,
        src_address: &str,
        dest_address: &str,
        amounts: &[u128],
        side: SwapSide,
        limit_pools: Option<&[String]>,
    ) -> PricingResult<Option<PriceQuote>> {
        let tokens = self.state.tokens();
        let (Some(src), Some(dest)) = (tokens.by_address(src_address), tokens.by_address(dest_address))
        else {
            debug!(src = %src_address, dest = %dest_address, "Unknown token");
            return Ok(None);
        };

        let pairs = self.state.pairs();
        let Some((pair, src_is_base)) = pairs.find(&src.symbol, &dest.symbol) else {
            debug!(src = %src.symbol, dest = %dest.symbol, "No pair listed");
            return Ok(None);
        };

        if let Some(allowed) = limit_pools {
            let forward = pool_identifier(self.dex_key(), &src.address, &dest.address);
            let reverse = pool_identifier(self.dex_key(), &dest.address, &src.address);
            if !allowed.iter().any(|p| {
                let p = normalize_address(p);
                p == forward || p == reverse
            }) {
                return Ok(None);
            }
        }

        let book_side = match (side, src_is_base) {
            (SwapSide::Sell, true) | (SwapSide::Buy, false) => BookSide::Bids,
            _ => BookSide::Asks,
        };
        let (base, quote) = if src_is_base { (src, dest) } else { (dest, src) };

        let book = match read_order_book(
            self.cache.as_ref(),
            &self.scope,
            &base.address,
            &quote.address,
            book_side,
        )
        .await
        {
            Ok(book) => book,
            Err(RegistryError::Json(e)) => {
                warn!(pair = %pair.name(), side = %book_side, error = %e, "Unreadable cached book");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        if book.is_empty() {
            debug!(pair = %pair.name(), side = %book_side, "No cached book");
            return Ok(None);
        }

        let (in_decimals, out_decimals) = match side {
            SwapSide::Sell => (src.decimals, dest.decimals),
            SwapSide::Buy => (dest.decimals, src.decimals),
        };

        let prices = amounts
            .iter()
            .map(|&amount| match to_token_units(amount, in_decimals) {
                Some(units) => calc_output(&book, units, book_side, out_decimals),
                None => {
                    debug!(amount, decimals = in_decimals, "Amount out of range, priced as unfilled");
                    0
                }
            })
            .collect();

        Ok(Some(PriceQuote {
            prices,
            unit_decimals: out_decimals,
            pool_identifier: pair.name(),
            exchange: self.dex_key().to_string(),
            gas_cost: self.gas_cost,
            maker_asset: dest.address.clone(),
            taker_asset: src.address.clone(),
            book: book_side,
        }))
    }

    /// Pairs involving a token, highest liquidity first, at most `limit`.
    pub fn top_pairs_for_token(&self, token_address: &str, limit: usize) -> Vec<PoolLiquidity> {
        let tokens = self.state.tokens();
        let Some(token) = tokens.by_address(token_address) else {
            return Vec::new();
        };

        let mut ranked: Vec<PoolLiquidity> = self
            .state
            .pairs()
            .iter()
            .filter(|(_, pair)| pair.involves(&token.symbol))
            .map(|(name, pair)| PoolLiquidity {
                exchange: self.dex_key().to_string(),
                pair: name.clone(),
                connector_tokens: [&pair.base, &pair.quote]
                    .into_iter()
                    .filter_map(|symbol| tokens.by_symbol(symbol).cloned())
                    .collect(),
                liquidity_usd: pair.liquidity_usd,
            })
            .collect();

        ranked.sort_by(|a, b| b.liquidity_usd.cmp(&a.liquidity_usd));
        ranked.truncate(limit);
        ranked
    }
}
