//! Main application facade.
//!
//! Wires the polling core, pricing and order preparation around one shared
//! cache and one requester:
//! - `initialize_pricing` / `stop` drive the fetchers
//! - `prices_volume`, `pool_identifiers`, `top_pairs_for_token` serve
//!   indicative requests from memory and cache
//! - `prepare_order` runs the firm-quote chain before transaction building

use crate::config::AppConfig;
use crate::error::AppResult;
use dexalot_core::{BookSide, OrderBook, SwapSide};
use dexalot_executor::{
    AuthorizedSigners, BlacklistGuard, DynSignatureValidator, OrderHasher, OrderPreparer,
    PrepareRequest, PreparedOrder, QuoteNegotiator,
};
use dexalot_pricing::{PoolLiquidity, PriceQuote, PricingService};
use dexalot_registry::{
    CycleOutcome, DynCache, DynRequester, MemoryCache, PairDirectory, RateFetcher,
    ReqwestRequester, TokenDirectory,
};
use dexalot_telemetry::Metrics;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Status log interval while running.
const STATUS_INTERVAL: Duration = Duration::from_secs(60);

pub struct Application {
    config: AppConfig,
    rate_fetcher: RateFetcher,
    pricing: PricingService,
    preparer: OrderPreparer,
}

impl Application {
    /// Production wiring: `reqwest` requester, in-process cache and the
    /// configured authorized signers.
    pub fn new(config: AppConfig) -> AppResult<Self> {
        let requester = Arc::new(ReqwestRequester::new(config.request_timeout())?);
        let cache = Arc::new(MemoryCache::new());
        let signers = config.signer_addresses()?;
        if signers.is_empty() {
            warn!("No authorized signers configured, every firm order will fail verification");
        }
        let validator = Arc::new(AuthorizedSigners::new(signers));
        Self::with_components(config, requester, cache, validator)
    }

    /// Wire the application around injected collaborators.
    pub fn with_components(
        config: AppConfig,
        requester: DynRequester,
        cache: DynCache,
        validator: DynSignatureValidator,
    ) -> AppResult<Self> {
        let maker = config.maker_address()?;
        let fetcher_config = config.rate_fetcher_config();
        let firm_url = fetcher_config.endpoint("firm");
        let scope = config.cache_scope();

        let rate_fetcher = RateFetcher::new(fetcher_config, requester.clone(), cache.clone());
        let state = rate_fetcher.state();

        let pricing = PricingService::new(state.clone(), cache.clone(), scope.clone(), config.gas_cost);
        let preparer = OrderPreparer::new(
            state,
            BlacklistGuard::new(cache, &scope),
            QuoteNegotiator::new(requester, firm_url, config.api_key.clone()),
            OrderHasher::new(config.network, maker),
            validator,
        );

        info!(
            dex_key = %config.dex_key,
            network = config.network,
            %maker,
            "Application wired"
        );
        Ok(Self {
            config,
            rate_fetcher,
            pricing,
            preparer,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Start polling unless another process owns the shared cache.
    pub fn initialize_pricing(&self) {
        if self.config.is_slave {
            info!("Slave instance, polling left to the master");
            return;
        }
        self.rate_fetcher.start();
    }

    /// Stop every fetcher.
    pub fn stop(&self) {
        self.rate_fetcher.stop();
    }

    pub fn is_polling(&self) -> bool {
        self.rate_fetcher.is_polling()
    }

    pub fn is_prices_polling(&self) -> bool {
        self.rate_fetcher.is_prices_polling()
    }

    /// One cycle of every feed, in dependency order.
    pub async fn refresh(&self) -> Vec<(&'static str, CycleOutcome)> {
        self.rate_fetcher.refresh_once().await
    }

    /// Poll until Ctrl-C, then stop.
    pub async fn run(self) -> AppResult<()> {
        self.initialize_pricing();

        let mut status = tokio::time::interval(STATUS_INTERVAL);
        status.tick().await;

        loop {
            tokio::select! {
                _ = status.tick() => {
                    info!(
                        tokens = self.tokens().len(),
                        pairs = self.pairs().len(),
                        prices_polling = self.is_prices_polling(),
                        "Status"
                    );
                }
                result = tokio::signal::ctrl_c() => {
                    result?;
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        self.stop();
        Ok(())
    }

    pub async fn prices_volume(
        &self,
        src_address: &str,
        dest_address: &str,
        amounts: &[u128],
        side: SwapSide,
        limit_pools: Option<&[String]>,
    ) -> AppResult<Option<PriceQuote>> {
        Ok(self
            .pricing
            .prices_volume(src_address, dest_address, amounts, side, limit_pools)
            .await?)
    }

    pub fn pool_identifiers(&self, src_address: &str, dest_address: &str) -> Vec<String> {
        self.pricing.pool_identifiers(src_address, dest_address)
    }

    pub fn top_pairs_for_token(&self, token_address: &str, limit: usize) -> Vec<PoolLiquidity> {
        self.pricing.top_pairs_for_token(token_address, limit)
    }

    pub async fn prepare_order(&self, request: &PrepareRequest) -> AppResult<PreparedOrder> {
        Ok(self.preparer.prepare(request).await?)
    }

    /// [`prepare_order`](Self::prepare_order) against an explicit clock.
    pub async fn prepare_order_at(&self, request: &PrepareRequest, now_secs: u64) -> AppResult<PreparedOrder> {
        Ok(self.preparer.prepare_at(request, now_secs).await?)
    }

    pub async fn is_blacklisted(&self, address: &str) -> AppResult<bool> {
        Ok(self.preparer.guard().is_blacklisted(address).await?)
    }

    pub fn tokens(&self) -> Arc<TokenDirectory> {
        self.rate_fetcher.tokens()
    }

    pub fn pairs(&self) -> Arc<PairDirectory> {
        self.rate_fetcher.pairs()
    }

    pub async fn order_book(&self, pair_name: &str, side: BookSide) -> AppResult<OrderBook> {
        Ok(self.rate_fetcher.order_book(pair_name, side).await?)
    }

    /// Prometheus text exposition of every registered metric.
    pub fn render_metrics(&self) -> AppResult<String> {
        Ok(Metrics::render()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dexalot_executor::MockSignatureValidator;
    use dexalot_registry::MockRequester;

    fn app(config: AppConfig) -> Application {
        Application::with_components(
            config,
            Arc::new(MockRequester::new()),
            Arc::new(MemoryCache::new()),
            Arc::new(MockSignatureValidator::new(true)),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_slave_does_not_poll() {
        let app = app(AppConfig {
            is_slave: true,
            ..AppConfig::default()
        });
        app.initialize_pricing();
        assert!(!app.is_polling());
    }

    #[tokio::test]
    async fn test_master_polls_until_stopped() {
        let app = app(AppConfig::default());
        app.initialize_pricing();
        assert!(app.is_polling());
        app.stop();
        assert!(!app.is_polling());
        assert!(!app.is_prices_polling());
    }

    #[test]
    fn test_invalid_maker_rejected() {
        let result = Application::with_components(
            AppConfig {
                maker: "maker".to_string(),
                ..AppConfig::default()
            },
            Arc::new(MockRequester::new()),
            Arc::new(MemoryCache::new()),
            Arc::new(MockSignatureValidator::new(true)),
        );
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_empty_directories_price_to_none() {
        let app = app(AppConfig::default());
        let quote = app
            .prices_volume("0x01", "0x02", &[1], SwapSide::Sell, None)
            .await
            .unwrap();
        assert!(quote.is_none());
        assert!(app.pool_identifiers("0x01", "0x02").is_empty());
        assert!(app.render_metrics().is_ok());
    }
}
