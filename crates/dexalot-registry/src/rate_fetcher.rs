//! The four polled resources and their handlers.
//!
//! - tokens: replace the token directory
//! - pairs: replace the pair directory, restarting the prices feed around it
//! - prices: write each known pair's non-empty book sides to the cache
//! - blacklist: merge reported addresses into the cached deny set

use crate::cache::{read_order_book, write_order_book, CacheScope, DynCache};
use crate::client::{BoxFuture, DynRequester, RequestDescriptor};
use crate::coordinator::PriceFeedCoordinator;
use crate::error::{RegistryError, RegistryResult};
use crate::fetcher::{CycleOutcome, FetchHandler, Fetcher, Poller};
use crate::rate_state::{PairDirectory, RateState, TokenDirectory};
use crate::responses::{BlacklistResponse, PairsResponse, PricesResponse, TokensResponse};
use dexalot_core::{BookSide, OrderBook, Pair};
use dexalot_telemetry::Metrics;
use futures_util::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Interval of the prices feed and lifetime of the books it writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub data_ttl: Duration,
}

#[derive(Debug, Clone)]
pub struct RateFetcherConfig {
    /// Base URL; resources live under `{api_url}/api/rfq/`.
    pub api_url: String,
    pub api_key: String,
    pub scope: CacheScope,
    pub tokens_interval: Duration,
    pub pairs_interval: Duration,
    pub prices: PollSettings,
    /// None disables the blacklist feed.
    pub blacklist_interval: Option<Duration>,
}

impl RateFetcherConfig {
    pub fn endpoint(&self, resource: &str) -> String {
        format!("{}/api/rfq/{resource}", self.api_url.trim_end_matches('/'))
    }

    fn get(&self, resource: &str) -> RequestDescriptor {
        RequestDescriptor::get(self.endpoint(resource)).with_api_key(&self.api_key)
    }
}

struct TokensHandler {
    state: Arc<RateState>,
}

impl FetchHandler<TokensResponse> for TokensHandler {
    fn handle(&self, payload: TokensResponse) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            let directory = TokenDirectory::from_entries(
                payload
                    .tokens
                    .iter()
                    .map(|(symbol, data)| (symbol.clone(), data.to_token())),
            );
            debug!(count = directory.len(), "Token directory replaced");
            self.state.replace_tokens(directory);
        })
    }
}

struct PairsHandler {
    state: Arc<RateState>,
    coordinator: Arc<PriceFeedCoordinator>,
}

impl FetchHandler<PairsResponse> for PairsHandler {
    fn handle(&self, payload: PairsResponse) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            let directory = PairDirectory::from_entries(
                payload
                    .pairs
                    .iter()
                    .map(|(name, data)| (name.clone(), data.to_pair())),
            );
            let count = directory.len();
            self.coordinator
                .on_pairs_updated(|| self.state.replace_pairs(directory));
            debug!(count, "Pair directory replaced");
        })
    }
}

struct PricesHandler {
    state: Arc<RateState>,
    cache: DynCache,
    scope: CacheScope,
    ttl: Duration,
}

impl FetchHandler<PricesResponse> for PricesHandler {
    fn handle(&self, payload: PricesResponse) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            let pairs = self.state.pairs();
            let cache = self.cache.as_ref();
            let scope = &self.scope;
            let ttl = self.ttl;

            let mut writes = Vec::new();
            for (name, data) in payload.prices {
                let Some(pair) = pairs.get(&name) else {
                    continue;
                };
                let Some((base, quote)) = self.state.pair_tokens(pair) else {
                    debug!(pair = %name, "Skipping pair with unknown token");
                    continue;
                };

                for (side, book) in [(BookSide::Bids, data.bids), (BookSide::Asks, data.asks)] {
                    // Empty sides are left to expire.
                    if book.is_empty() {
                        continue;
                    }
                    let base_address = base.address.clone();
                    let quote_address = quote.address.clone();
                    writes.push(async move {
                        let result = write_order_book(
                            cache,
                            scope,
                            &base_address,
                            &quote_address,
                            side,
                            &book,
                            ttl,
                        )
                        .await;
                        (side, result)
                    });
                }
            }

            for (side, result) in join_all(writes).await {
                match result {
                    Ok(()) => Metrics::book_written(side.as_str()),
                    Err(e) => warn!(%side, error = %e, "Order book write failed"),
                }
            }
        })
    }
}

struct BlacklistHandler {
    cache: DynCache,
    key: String,
}

impl FetchHandler<BlacklistResponse> for BlacklistHandler {
    fn handle(&self, payload: BlacklistResponse) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            let cache = self.cache.as_ref();
            let key = self.key.as_str();
            let adds = payload
                .normalized()
                .into_iter()
                .map(|address| cache.set_add(key, address));
            for result in join_all(adds).await {
                if let Err(e) = result {
                    warn!(error = %e, "Blacklist write failed");
                }
            }
        })
    }
}

/// Owner of the four fetchers and the state they feed.
pub struct RateFetcher {
    config: RateFetcherConfig,
    state: Arc<RateState>,
    cache: DynCache,
    tokens_fetcher: Fetcher<TokensResponse>,
    pairs_fetcher: Fetcher<PairsResponse>,
    prices_fetcher: Arc<Fetcher<PricesResponse>>,
    blacklist_fetcher: Option<Fetcher<BlacklistResponse>>,
    coordinator: Arc<PriceFeedCoordinator>,
}

impl RateFetcher {
    pub fn new(config: RateFetcherConfig, requester: DynRequester, cache: DynCache) -> Self {
        let state = Arc::new(RateState::new());

        let prices_fetcher = Arc::new(Fetcher::new(
            "prices",
            config.get("prices"),
            config.prices.interval,
            requester.clone(),
            Arc::new(PricesHandler {
                state: state.clone(),
                cache: cache.clone(),
                scope: config.scope.clone(),
                ttl: config.prices.data_ttl,
            }),
        ));
        let coordinator = Arc::new(PriceFeedCoordinator::new(
            prices_fetcher.clone() as Arc<dyn Poller>,
        ));

        let tokens_fetcher = Fetcher::new(
            "tokens",
            config.get("tokens"),
            config.tokens_interval,
            requester.clone(),
            Arc::new(TokensHandler {
                state: state.clone(),
            }),
        );

        let pairs_fetcher = Fetcher::new(
            "pairs",
            config.get("pairs"),
            config.pairs_interval,
            requester.clone(),
            Arc::new(PairsHandler {
                state: state.clone(),
                coordinator: coordinator.clone(),
            }),
        );

        let blacklist_fetcher = config.blacklist_interval.map(|interval| {
            Fetcher::new(
                "blacklist",
                config.get("blacklist"),
                interval,
                requester,
                Arc::new(BlacklistHandler {
                    cache: cache.clone(),
                    key: config.scope.blacklist_key(),
                }) as Arc<dyn FetchHandler<BlacklistResponse>>,
            )
        });

        Self {
            config,
            state,
            cache,
            tokens_fetcher,
            pairs_fetcher,
            prices_fetcher,
            blacklist_fetcher,
            coordinator,
        }
    }

    /// Start the tokens, pairs and blacklist feeds. Prices start on the
    /// first pairs update.
    pub fn start(&self) {
        info!(api_url = %self.config.api_url, "Starting rate fetchers");
        self.tokens_fetcher.start_polling();
        self.pairs_fetcher.start_polling();
        if let Some(blacklist) = &self.blacklist_fetcher {
            blacklist.start_polling();
        }
    }

    /// Stop every feed. In-flight cycles complete; nothing new is scheduled.
    pub fn stop(&self) {
        self.tokens_fetcher.stop_polling();
        self.pairs_fetcher.stop_polling();
        self.coordinator.stop();
        if let Some(blacklist) = &self.blacklist_fetcher {
            blacklist.stop_polling();
        }
        info!("Rate fetchers stopped");
    }

    /// Run one cycle of every feed in dependency order.
    ///
    /// Pairs completion starts the prices schedule as usual.
    pub async fn refresh_once(&self) -> Vec<(&'static str, CycleOutcome)> {
        let mut outcomes = vec![
            ("tokens", self.tokens_fetcher.fetch_once().await),
            ("pairs", self.pairs_fetcher.fetch_once().await),
            ("prices", self.prices_fetcher.fetch_once().await),
        ];
        if let Some(blacklist) = &self.blacklist_fetcher {
            outcomes.push(("blacklist", blacklist.fetch_once().await));
        }
        outcomes
    }

    pub fn is_polling(&self) -> bool {
        self.tokens_fetcher.is_polling() || self.pairs_fetcher.is_polling()
    }

    pub fn is_prices_polling(&self) -> bool {
        self.prices_fetcher.is_polling()
    }

    pub fn has_blacklist_feed(&self) -> bool {
        self.blacklist_fetcher.is_some()
    }

    pub fn state(&self) -> Arc<RateState> {
        self.state.clone()
    }

    pub fn cache(&self) -> DynCache {
        self.cache.clone()
    }

    pub fn scope(&self) -> &CacheScope {
        &self.config.scope
    }

    pub fn config(&self) -> &RateFetcherConfig {
        &self.config
    }

    pub fn tokens(&self) -> Arc<TokenDirectory> {
        self.state.tokens()
    }

    pub fn pairs(&self) -> Arc<PairDirectory> {
        self.state.pairs()
    }

    /// Cached book side of a pair given by name (`BASE/QUOTE`).
    pub async fn order_book(&self, pair_name: &str, side: BookSide) -> RegistryResult<OrderBook> {
        let (base_symbol, quote_symbol) = Pair::split_name(pair_name)
            .ok_or_else(|| RegistryError::UnknownPair(pair_name.to_string()))?;
        let tokens = self.state.tokens();
        let base = tokens
            .by_symbol(base_symbol)
            .ok_or_else(|| RegistryError::UnknownToken(base_symbol.to_string()))?;
        let quote = tokens
            .by_symbol(quote_symbol)
            .ok_or_else(|| RegistryError::UnknownToken(quote_symbol.to_string()))?;
        read_order_book(
            self.cache.as_ref(),
            &self.config.scope,
            &base.address,
            &quote.address,
            side,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheStore, MemoryCache};
    use crate::client::MockRequester;
    use rust_decimal_macros::dec;
    use serde_json::json;

    const API: &str = "http://maker";
    const AVAX: &str = "0x1111111111111111111111111111111111111111";
    const USDC: &str = "0xb97ef9ef8734c71904d8002f8b6bc66dd9c48a6e";
    const USDC_CHECKSUM: &str = "0xB97EF9Ef8734C71904D8002F8b6Bc66Dd9c48a6E";
    const ALOT: &str = "0x3333333333333333333333333333333333333333";

    fn config(blacklist: bool) -> RateFetcherConfig {
        RateFetcherConfig {
            api_url: format!("{API}/"),
            api_key: "key".to_string(),
            scope: CacheScope::new("dexalot", 43114),
            tokens_interval: Duration::from_secs(10),
            pairs_interval: Duration::from_secs(10),
            prices: PollSettings {
                interval: Duration::from_secs(10),
                data_ttl: Duration::from_secs(15),
            },
            blacklist_interval: blacklist.then(|| Duration::from_secs(10)),
        }
    }

    fn seed(requester: &MockRequester) {
        requester.set_json(
            format!("{API}/api/rfq/tokens"),
            json!({"tokens": {
                "AVAX": {"symbol": "AVAX", "name": "Avalanche", "address": AVAX, "decimals": 18, "type": "NATIVE"},
                "USDC": {"symbol": "USDC", "name": "USD Coin", "address": USDC_CHECKSUM, "decimals": 6, "type": "ERC20"}
            }}),
        );
        requester.set_json(
            format!("{API}/api/rfq/pairs"),
            json!({"pairs": {
                "AVAX/USDC": {"base": "AVAX", "quote": "USDC", "liquidityUSD": 5000},
                "ALOT/USDC": {"base": "ALOT", "quote": "USDC", "liquidityUSD": 100}
            }}),
        );
        requester.set_json(
            format!("{API}/api/rfq/prices"),
            json!({"prices": {
                "AVAX/USDC": {"bids": [["9.9", "4"]], "asks": []},
                "ALOT/USDC": {"bids": [["1", "1"]], "asks": [["1.1", "1"]]},
                "BTC/USDC": {"bids": [["60000", "1"]], "asks": [["60001", "1"]]}
            }}),
        );
        requester.set_json(
            format!("{API}/api/rfq/blacklist"),
            json!({"blacklist": ["0x000000000000000000000000000000000000BEEF"]}),
        );
    }

    fn setup(blacklist: bool) -> (Arc<MockRequester>, Arc<MemoryCache>, RateFetcher) {
        let requester = Arc::new(MockRequester::new());
        let cache = Arc::new(MemoryCache::new());
        seed(&requester);
        let fetcher = RateFetcher::new(config(blacklist), requester.clone(), cache.clone());
        (requester, cache, fetcher)
    }

    #[test]
    fn test_endpoint() {
        assert_eq!(config(false).endpoint("firm"), "http://maker/api/rfq/firm");
    }

    #[tokio::test]
    async fn test_refresh_populates_state_and_cache() {
        let (requester, cache, fetcher) = setup(true);
        let outcomes = fetcher.refresh_once().await;
        assert!(outcomes.iter().all(|(_, o)| *o == CycleOutcome::Ok));

        let tokens = fetcher.tokens();
        assert_eq!(tokens.by_symbol("USDC").unwrap().address, USDC);
        assert_eq!(fetcher.pairs().get("AVAX/USDC").unwrap().liquidity_usd, dec!(5000));

        // Pairs completion started the prices feed.
        assert!(fetcher.is_prices_polling());

        let bids = fetcher.order_book("AVAX/USDC", BookSide::Bids).await.unwrap();
        assert_eq!(bids.len(), 1);

        // Empty side not written.
        let asks = fetcher.order_book("AVAX/USDC", BookSide::Asks).await.unwrap();
        assert!(asks.is_empty());
        assert!(cache
            .get(&fetcher.scope().book_key(AVAX, USDC, BookSide::Asks))
            .await
            .unwrap()
            .is_none());

        // ALOT is listed as a pair but has no token entry.
        assert!(cache
            .get(&fetcher.scope().book_key(ALOT, USDC, BookSide::Bids))
            .await
            .unwrap()
            .is_none());

        let members = cache
            .set_members(&fetcher.scope().blacklist_key())
            .await
            .unwrap();
        assert!(members.contains("0x000000000000000000000000000000000000beef"));

        let sent = requester.requests();
        assert!(sent.iter().all(|r| r.header("api_key") == Some("key")));

        fetcher.stop();
        assert!(!fetcher.is_prices_polling());
    }

    #[tokio::test]
    async fn test_prices_only_reference_latest_pairs() {
        let (requester, cache, fetcher) = setup(false);
        fetcher.refresh_once().await;

        // AVAX/USDC drops out of the pair set.
        requester.set_json(
            format!("{API}/api/rfq/pairs"),
            json!({"pairs": {"ALOT/USDC": {"base": "ALOT", "quote": "USDC", "liquidityUSD": 1}}}),
        );
        requester.set_json(
            format!("{API}/api/rfq/prices"),
            json!({"prices": {"AVAX/USDC": {"bids": [["8", "1"]], "asks": [["12", "1"]]}}}),
        );
        fetcher.refresh_once().await;

        assert!(fetcher.is_prices_polling());
        assert!(fetcher.pairs().get("AVAX/USDC").is_none());
        assert!(cache
            .get(&fetcher.scope().book_key(AVAX, USDC, BookSide::Asks))
            .await
            .unwrap()
            .is_none());

        fetcher.stop();
    }

    #[tokio::test]
    async fn test_empty_side_keeps_previous_book() {
        let (requester, _cache, fetcher) = setup(false);
        fetcher.refresh_once().await;

        requester.set_json(
            format!("{API}/api/rfq/prices"),
            json!({"prices": {"AVAX/USDC": {"bids": [], "asks": []}}}),
        );
        fetcher.refresh_once().await;

        let bids = fetcher.order_book("AVAX/USDC", BookSide::Bids).await.unwrap();
        assert_eq!(bids.levels()[0].quantity.inner(), dec!(4));
        fetcher.stop();
    }

    #[tokio::test]
    async fn test_order_book_unknown_names() {
        let (_requester, _cache, fetcher) = setup(false);
        assert!(matches!(
            fetcher.order_book("AVAXUSDC", BookSide::Bids).await,
            Err(RegistryError::UnknownPair(_))
        ));
        assert!(matches!(
            fetcher.order_book("AVAX/USDC", BookSide::Bids).await,
            Err(RegistryError::UnknownToken(_))
        ));
    }

    #[tokio::test]
    async fn test_start_and_stop() {
        let (_requester, _cache, fetcher) = setup(true);
        assert!(fetcher.has_blacklist_feed());
        fetcher.start();
        assert!(fetcher.is_polling());
        fetcher.stop();
        assert!(!fetcher.is_polling());
        assert!(!fetcher.is_prices_polling());
    }
}
