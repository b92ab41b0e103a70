//! End-to-end scenarios through the application facade.
//!
//! A mock requester plays the maker API; the in-memory cache stands in for
//! the shared store.

use alloy::primitives::{Address, U256};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::SignerSync;
use dexalot_bot::{AppConfig, AppError, Application};
use dexalot_core::{BookSide, FirmOrder, SwapSide};
use dexalot_executor::{AuthorizedSigners, ExecutorError, OrderHasher, PrepareRequest};
use dexalot_registry::{CycleOutcome, MemoryCache, MockRequester};
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use std::sync::Arc;

const API: &str = "http://maker.test";
const NETWORK: u64 = 43114;
const MAKER: &str = "0xd62f9E53Be8884C21f5aa523B3c7D6F9a0050af5";
const AVAX: &str = "0x1111111111111111111111111111111111111111";
const USDC: &str = "0xb97ef9ef8734c71904d8002f8b6bc66dd9c48a6e";
const ALOT: &str = "0x3333333333333333333333333333333333333333";
const TRADER: &str = "0x70997970c51812dc3a010c7d01b50e0d17dc79c8";
const DENIED: &str = "0x000000000000000000000000000000000000BEEF";
const NOW: u64 = 1_699_999_000;
const EXPIRY: u64 = 1_700_000_000;

// Well-known test private key (DO NOT use in production)
const TEST_PRIVATE_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

const ONE_AVAX: u128 = 1_000_000_000_000_000_000;
const ONE_USDC: u128 = 1_000_000;

fn url(resource: &str) -> String {
    format!("{API}/api/rfq/{resource}")
}

fn signer() -> PrivateKeySigner {
    PrivateKeySigner::from_slice(&hex::decode(TEST_PRIVATE_KEY).unwrap()).unwrap()
}

fn seed(requester: &MockRequester) {
    requester.set_json(
        url("tokens"),
        json!({"tokens": {
            "AVAX": {"symbol": "AVAX", "name": "Avalanche", "address": AVAX, "decimals": 18, "type": "NATIVE"},
            "USDC": {"symbol": "USDC", "name": "USD Coin", "address": USDC, "decimals": 6, "type": "ERC20"},
            "ALOT": {"symbol": "ALOT", "name": "Dexalot", "address": ALOT, "decimals": 18, "type": "ERC20"}
        }}),
    );
    requester.set_json(
        url("pairs"),
        json!({"pairs": {
            "AVAX/USDC": {"base": "AVAX", "quote": "USDC", "liquidityUSD": 250000},
            "ALOT/USDC": {"base": "ALOT", "quote": "USDC", "liquidityUSD": 40000},
            "ALOT/AVAX": {"base": "ALOT", "quote": "AVAX", "liquidityUSD": 90000}
        }}),
    );
    requester.set_json(
        url("prices"),
        json!({"prices": {
            "AVAX/USDC": {
                "bids": [["10", "5"], ["11", "5"]],
                "asks": [["12.5", "8"], ["13", "5"]]
            },
            "ALOT/USDC": {"bids": [], "asks": [["0.5", "100"]]}
        }}),
    );
    requester.set_json(url("blacklist"), json!({"blacklist": [DENIED]}));
}

struct Harness {
    requester: Arc<MockRequester>,
    app: Application,
}

async fn harness() -> Harness {
    let requester = Arc::new(MockRequester::new());
    seed(&requester);
    let config = AppConfig {
        api_url: API.to_string(),
        network: NETWORK,
        maker: MAKER.to_string(),
        api_key: "scenario-key".to_string(),
        ..AppConfig::default()
    };
    let app = Application::with_components(
        config,
        requester.clone(),
        Arc::new(MemoryCache::new()),
        Arc::new(AuthorizedSigners::new([signer().address()])),
    )
    .unwrap();

    let outcomes = app.refresh().await;
    assert!(outcomes.iter().all(|(_, o)| *o == CycleOutcome::Ok), "{outcomes:?}");
    Harness { requester, app }
}

/// Firm-quote response for `order`, signed with the test key.
fn signed_response(order: &FirmOrder) -> Value {
    let digest = OrderHasher::new(NETWORK, MAKER.parse().unwrap()).digest(order);
    let signature = signer().sign_hash_sync(&digest).unwrap();
    json!({
        "order": {
            "nonceAndMeta": order.nonce_and_meta.to_string(),
            "expiry": order.expiry,
            "makerAsset": order.maker_asset.to_string(),
            "takerAsset": order.taker_asset.to_string(),
            "maker": order.maker.to_string(),
            "taker": order.taker.to_string(),
            "makerAmount": order.maker_amount.to_string(),
            "takerAmount": order.taker_amount.to_string(),
            "signature": format!("0x{}", hex::encode(signature.as_bytes())),
        }
    })
}

fn sell_avax_order(maker_amount: u128) -> FirmOrder {
    FirmOrder {
        nonce_and_meta: U256::from(7u64),
        expiry: EXPIRY,
        maker_asset: USDC.parse().unwrap(),
        taker_asset: AVAX.parse().unwrap(),
        maker: MAKER.parse().unwrap(),
        taker: TRADER.parse().unwrap(),
        maker_amount: U256::from(maker_amount),
        taker_amount: U256::from(7 * ONE_AVAX),
        signature: Default::default(),
    }
}

fn sell_avax_request(user: &str) -> PrepareRequest {
    PrepareRequest {
        src_address: AVAX.to_string(),
        dest_address: USDC.to_string(),
        src_amount: 7 * ONE_AVAX,
        dest_amount: 72 * ONE_USDC,
        side: SwapSide::Sell,
        user_address: user.to_string(),
        slippage_factor: dec!(0.995),
    }
}

#[tokio::test]
async fn test_sell_seven_recovers_notional() {
    let h = harness().await;

    // 5 @ 10 + 2 @ 11 = 72 over 7.
    let quote = h
        .app
        .prices_volume(AVAX, USDC, &[7 * ONE_AVAX, 0, 11 * ONE_AVAX], SwapSide::Sell, None)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(quote.prices, vec![72 * ONE_USDC, 0, 0]);
    assert_eq!(quote.unit_decimals, 6);
    assert_eq!(quote.book, BookSide::Bids);
    assert_eq!(quote.pool_identifier, "AVAX/USDC");
    assert_eq!(quote.exchange, "dexalot");
    assert_eq!(quote.maker_asset, USDC);
    assert_eq!(quote.taker_asset, AVAX);
}

#[tokio::test]
async fn test_selling_quote_walks_asks() {
    let h = harness().await;

    // 5 USDC against asks [12.5 x 8]: qty/notional = 5/62.5, output 0.4 AVAX.
    let quote = h
        .app
        .prices_volume(USDC, AVAX, &[5 * ONE_USDC], SwapSide::Sell, None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(quote.book, BookSide::Asks);
    assert_eq!(quote.unit_decimals, 18);
    assert_eq!(quote.prices, vec![4 * ONE_AVAX / 10]);
}

#[tokio::test]
async fn test_missing_liquidity_is_none() {
    let h = harness().await;

    // ALOT/USDC bids were never written.
    let quote = h
        .app
        .prices_volume(ALOT, USDC, &[ONE_AVAX], SwapSide::Sell, None)
        .await
        .unwrap();
    assert!(quote.is_none());

    // ALOT/AVAX is listed but has no prices at all.
    let quote = h
        .app
        .prices_volume(AVAX, ALOT, &[ONE_AVAX], SwapSide::Sell, None)
        .await
        .unwrap();
    assert!(quote.is_none());

    let book = h.app.order_book("ALOT/USDC", BookSide::Asks).await.unwrap();
    assert_eq!(book.len(), 1);
}

#[tokio::test]
async fn test_limit_pools_and_identifiers() {
    let h = harness().await;

    let pools = h.app.pool_identifiers(AVAX, USDC);
    assert_eq!(pools, vec![format!("dexalot_{AVAX}_{USDC}")]);

    let other = vec!["dexalot_0xdead_0xbeef".to_string()];
    let excluded = h
        .app
        .prices_volume(AVAX, USDC, &[ONE_AVAX], SwapSide::Sell, Some(&other))
        .await
        .unwrap();
    assert!(excluded.is_none());

    let included = h
        .app
        .prices_volume(AVAX, USDC, &[ONE_AVAX], SwapSide::Sell, Some(&pools))
        .await
        .unwrap();
    assert_eq!(included.unwrap().prices, vec![10 * ONE_USDC]);
}

#[tokio::test]
async fn test_top_pairs_by_liquidity() {
    let h = harness().await;

    let top = h.app.top_pairs_for_token(ALOT, 5);
    let names: Vec<_> = top.iter().map(|p| p.pair.as_str()).collect();
    assert_eq!(names, vec!["ALOT/AVAX", "ALOT/USDC"]);
    assert_eq!(top[0].connector_tokens.len(), 2);

    assert_eq!(h.app.top_pairs_for_token(ALOT, 1).len(), 1);
}

#[tokio::test]
async fn test_prepare_sell_order() {
    let h = harness().await;
    h.requester.set_json(url("firm"), signed_response(&sell_avax_order(72 * ONE_USDC)));

    let prepared = h
        .app
        .prepare_order_at(&sell_avax_request(TRADER), NOW)
        .await
        .unwrap();
    assert_eq!(prepared.deadline, EXPIRY);
    assert_eq!(prepared.order.maker, MAKER.parse::<Address>().unwrap());

    let firm = h
        .requester
        .requests()
        .into_iter()
        .find(|r| r.url == url("firm"))
        .unwrap();
    assert_eq!(firm.header("api_key"), Some("scenario-key"));
    assert_eq!(firm.body.unwrap()["takerAmount"], "7000000000000000000");
}

#[tokio::test]
async fn test_blacklisted_trader_rejected_before_quote() {
    let h = harness().await;
    h.requester.set_json(url("firm"), signed_response(&sell_avax_order(72 * ONE_USDC)));

    // Listed mixed-case, requested lowercase.
    let err = h
        .app
        .prepare_order_at(&sell_avax_request(&DENIED.to_lowercase()), NOW)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Executor(ExecutorError::Blacklisted(_))));
    assert_eq!(h.requester.request_count(&url("firm")), 0);
}

#[tokio::test]
async fn test_restricted_trader_fed_back_into_blacklist() {
    let h = harness().await;
    h.requester.set_status(
        url("firm"),
        400,
        r#"{"error":"User is restricted from using Dexalot"}"#,
    );

    let err = h
        .app
        .prepare_order_at(&sell_avax_request(TRADER), NOW)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Executor(ExecutorError::QuoteRequest(_))));
    assert!(h.app.is_blacklisted(TRADER).await.unwrap());
}

#[tokio::test]
async fn test_unauthorized_signature_rejected() {
    let h = harness().await;
    let mut response = signed_response(&sell_avax_order(72 * ONE_USDC));
    response["order"]["makerAmount"] = json!((73 * ONE_USDC).to_string());
    h.requester.set_json(url("firm"), response);

    let err = h
        .app
        .prepare_order_at(&sell_avax_request(TRADER), NOW)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::Executor(ExecutorError::SignatureMismatch { .. })
    ));
}

#[tokio::test]
async fn test_zero_amount_rejected_without_request() {
    let h = harness().await;
    let request = PrepareRequest {
        src_amount: 0,
        ..sell_avax_request(TRADER)
    };
    let err = h.app.prepare_order_at(&request, NOW).await.unwrap_err();
    assert!(matches!(err, AppError::Executor(ExecutorError::ZeroAmount)));
    assert_eq!(h.requester.request_count(&url("firm")), 0);
}
