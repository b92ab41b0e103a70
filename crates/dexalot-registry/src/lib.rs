//! Token, pair and order-book polling for the Dexalot RFQ integration.
//!
//! Four polling fetchers keep the maker's directories fresh:
//! - tokens and pairs feed the in-memory [`RateState`]
//! - pairs completion restarts the prices feed ([`PriceFeedCoordinator`])
//! - prices and blacklist write into the shared [`CacheStore`]
//!
//! Request-path readers only touch `RateState` and the cache, never the network.

pub mod cache;
pub mod client;
pub mod coordinator;
pub mod error;
pub mod fetcher;
pub mod rate_fetcher;
pub mod rate_state;
pub mod responses;

pub use cache::{read_order_book, write_order_book, CacheScope, CacheStore, DynCache, MemoryCache};
pub use client::{
    BoxFuture, DynRequester, HttpMethod, HttpRequester, MockReply, MockRequester,
    RequestDescriptor, ReqwestRequester, API_KEY_HEADER, DEFAULT_TIMEOUT,
};
pub use coordinator::{FeedState, MockPoller, PriceFeedCoordinator};
pub use error::{RegistryError, RegistryResult};
pub use fetcher::{CycleOutcome, FetchHandler, Fetcher, Poller};
pub use rate_fetcher::{PollSettings, RateFetcher, RateFetcherConfig};
pub use rate_state::{PairDirectory, RateState, TokenDirectory};
pub use responses::{
    is_hex_address, validate_and_cast, BlacklistResponse, PairData, PairsResponse, PriceData,
    PricesResponse, TokenData, TokensResponse, Validate,
};
