//! In-memory token and pair directories.
//!
//! Each refresh builds a complete new directory and publishes it with a
//! single pointer swap. Readers hold an `Arc` snapshot and never observe a
//! half-applied update.

use dexalot_core::{normalize_address, Pair, Token};
use dexalot_telemetry::Metrics;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Tokens indexed by symbol, with a derived address index.
#[derive(Debug, Clone, Default)]
pub struct TokenDirectory {
    by_symbol: HashMap<String, Token>,
    by_address: HashMap<String, Token>,
}

impl TokenDirectory {
    /// Build from `(symbol, token)` entries. The address index is derived.
    pub fn from_entries(entries: impl IntoIterator<Item = (String, Token)>) -> Self {
        let by_symbol: HashMap<String, Token> = entries.into_iter().collect();
        let by_address = by_symbol
            .values()
            .map(|token| (token.address.clone(), token.clone()))
            .collect();
        Self {
            by_symbol,
            by_address,
        }
    }

    pub fn by_symbol(&self, symbol: &str) -> Option<&Token> {
        self.by_symbol.get(symbol)
    }

    /// Case-insensitive address lookup.
    pub fn by_address(&self, address: &str) -> Option<&Token> {
        self.by_address.get(&normalize_address(address))
    }

    pub fn symbols(&self) -> &HashMap<String, Token> {
        &self.by_symbol
    }

    pub fn addresses(&self) -> &HashMap<String, Token> {
        &self.by_address
    }

    pub fn len(&self) -> usize {
        self.by_symbol.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_symbol.is_empty()
    }
}

/// Pairs indexed by `BASE/QUOTE` name.
#[derive(Debug, Clone, Default)]
pub struct PairDirectory {
    pairs: BTreeMap<String, Pair>,
}

impl PairDirectory {
    pub fn from_entries(entries: impl IntoIterator<Item = (String, Pair)>) -> Self {
        Self {
            pairs: entries.into_iter().collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Pair> {
        self.pairs.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.pairs.contains_key(name)
    }

    /// Find the pair joining two symbols in either ordering.
    ///
    /// Returns the pair and whether `first` is its base.
    pub fn find(&self, first: &str, second: &str) -> Option<(&Pair, bool)> {
        if let Some(pair) = self.pairs.get(&Pair::name_of(first, second)) {
            return Some((pair, true));
        }
        self.pairs
            .get(&Pair::name_of(second, first))
            .map(|pair| (pair, false))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Pair)> {
        self.pairs.iter()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Last-fetch-wins view of the maker's directories.
#[derive(Default)]
pub struct RateState {
    tokens: RwLock<Arc<TokenDirectory>>,
    pairs: RwLock<Arc<PairDirectory>>,
}

impl RateState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tokens(&self) -> Arc<TokenDirectory> {
        self.tokens.read().clone()
    }

    pub fn pairs(&self) -> Arc<PairDirectory> {
        self.pairs.read().clone()
    }

    pub fn replace_tokens(&self, directory: TokenDirectory) {
        Metrics::directory_size("tokens", directory.len());
        *self.tokens.write() = Arc::new(directory);
    }

    pub fn replace_pairs(&self, directory: PairDirectory) {
        Metrics::directory_size("pairs", directory.len());
        *self.pairs.write() = Arc::new(directory);
    }

    /// Resolve a pair's base and quote tokens, if both are known.
    pub fn pair_tokens(&self, pair: &Pair) -> Option<(Token, Token)> {
        let tokens = self.tokens();
        let base = tokens.by_symbol(&pair.base)?.clone();
        let quote = tokens.by_symbol(&pair.quote)?.clone();
        Some((base, quote))
    }
}
