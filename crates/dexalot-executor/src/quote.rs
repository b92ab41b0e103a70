//! Firm-quote negotiation.
//!
//! Converts an exact-size request into a maker-signed [`FirmOrder`]. This is
//! the only network round-trip on the request-to-transaction path, so it is
//! issued as late as possible and never retried with a different amount.
//!
//! Every field of the returned order is checked; a missing one fails with
//! its exact wire name.

use crate::error::{ExecutorError, ExecutorResult};
use alloy::primitives::{Address, Bytes, U256};
use dexalot_core::{FirmOrder, SwapSide, Token};
use dexalot_registry::{DynRequester, RequestDescriptor};
use dexalot_telemetry::Metrics;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

/// Request body posted to the firm-quote endpoint.
///
/// SELL fixes `takerAmount` (what the taker pays); BUY fixes `makerAmount`
/// (what the taker receives).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FirmQuoteRequest {
    pub maker_asset: String,
    pub taker_asset: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub taker_amount: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maker_amount: Option<String>,
    pub user_address: String,
}

impl FirmQuoteRequest {
    pub fn new(src: &Token, dest: &Token, amount: u128, side: SwapSide, user: &str) -> Self {
        let amount = amount.to_string();
        let (taker_amount, maker_amount) = match side {
            SwapSide::Sell => (Some(amount), None),
            SwapSide::Buy => (None, Some(amount)),
        };
        Self {
            maker_asset: dest.address.clone(),
            taker_asset: src.address.clone(),
            taker_amount,
            maker_amount,
            user_address: user.to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawFirmResponse {
    order: Option<RawOrder>,
}

/// Wire order, every field optional so absence is reported by name.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawOrder {
    nonce_and_meta: Option<Value>,
    expiry: Option<Value>,
    maker_asset: Option<Value>,
    taker_asset: Option<Value>,
    maker: Option<Value>,
    taker: Option<Value>,
    maker_amount: Option<Value>,
    taker_amount: Option<Value>,
    signature: Option<Value>,
}

fn required<'a>(value: &'a Option<Value>, field: &'static str) -> ExecutorResult<&'a Value> {
    match value {
        None | Some(Value::Null) => Err(ExecutorError::MissingField(field)),
        Some(Value::String(s)) if s.trim().is_empty() => Err(ExecutorError::MissingField(field)),
        Some(v) => Ok(v),
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ExecutorError {
    ExecutorError::InvalidField {
        field,
        reason: reason.into(),
    }
}

/// Decimal or `0x` hex string, or a JSON integer.
fn parse_u256(value: &Value, field: &'static str) -> ExecutorResult<U256> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
                Some(hex) => U256::from_str_radix(hex, 16),
                None => U256::from_str_radix(s, 10),
            };
            parsed.map_err(|e| invalid(field, format!("{s}: {e}")))
        }
        Value::Number(n) => n
            .as_u64()
            .map(U256::from)
            .ok_or_else(|| invalid(field, format!("{n} is not an unsigned integer"))),
        other => Err(invalid(field, format!("unexpected {other}"))),
    }
}

fn parse_u64(value: &Value, field: &'static str) -> ExecutorResult<u64> {
    let wide = parse_u256(value, field)?;
    u64::try_from(wide).map_err(|_| invalid(field, format!("{wide} overflows u64")))
}

fn parse_address(value: &Value, field: &'static str) -> ExecutorResult<Address> {
    let s = value
        .as_str()
        .ok_or_else(|| invalid(field, format!("expected address string, got {value}")))?;
    s.trim()
        .parse::<Address>()
        .map_err(|e| invalid(field, format!("{s}: {e}")))
}

fn parse_signature(value: &Value) -> ExecutorResult<Bytes> {
    const FIELD: &str = "signature";
    let s = value
        .as_str()
        .ok_or_else(|| invalid(FIELD, format!("expected hex string, got {value}")))?;
    let raw = s.trim().trim_start_matches("0x");
    let bytes = hex::decode(raw).map_err(|e| invalid(FIELD, e.to_string()))?;
    if bytes.is_empty() {
        return Err(ExecutorError::MissingField(FIELD));
    }
    Ok(Bytes::from(bytes))
}

/// Map the maker's response into a [`FirmOrder`], checking every field.
pub fn parse_firm_response(body: Value) -> ExecutorResult<FirmOrder> {
    let raw: RawFirmResponse = serde_json::from_value(body)
        .map_err(|e| invalid("order", format!("malformed response: {e}")))?;
    let order = raw.order.ok_or(ExecutorError::MissingField("order"))?;

    let maker = parse_address(required(&order.maker, "maker")?, "maker")?;
    let taker = parse_address(required(&order.taker, "taker")?, "taker")?;
    let maker_asset = parse_address(required(&order.maker_asset, "makerAsset")?, "makerAsset")?;
    let taker_asset = parse_address(required(&order.taker_asset, "takerAsset")?, "takerAsset")?;
    let maker_amount = parse_u256(required(&order.maker_amount, "makerAmount")?, "makerAmount")?;
    let taker_amount = parse_u256(required(&order.taker_amount, "takerAmount")?, "takerAmount")?;
    let signature = parse_signature(required(&order.signature, "signature")?)?;
    let nonce_and_meta =
        parse_u256(required(&order.nonce_and_meta, "nonceAndMeta")?, "nonceAndMeta")?;
    let expiry = parse_u64(required(&order.expiry, "expiry")?, "expiry")?;

    Ok(FirmOrder {
        nonce_and_meta,
        expiry,
        maker_asset,
        taker_asset,
        maker,
        taker,
        maker_amount,
        taker_amount,
        signature,
    })
}

/// Requests firm orders from the maker.
pub struct QuoteNegotiator {
    requester: DynRequester,
    firm_url: String,
    api_key: String,
}

impl QuoteNegotiator {
    pub fn new(requester: DynRequester, firm_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            requester,
            firm_url: firm_url.into(),
            api_key: api_key.into(),
        }
    }

    pub fn firm_url(&self) -> &str {
        &self.firm_url
    }

    /// Request a firm order for exactly `amount` smallest units.
    ///
    /// SELL: `amount` is the taker's input. BUY: `amount` is the desired
    /// output. A zero amount fails before any network call.
    pub async fn firm_rate(
        &self,
        src: &Token,
        dest: &Token,
        amount: u128,
        side: SwapSide,
        user: &str,
    ) -> ExecutorResult<FirmOrder> {
        if amount == 0 {
            return Err(ExecutorError::ZeroAmount);
        }

        let body = FirmQuoteRequest::new(src, dest, amount, side, user);
        debug!(
            src = %src.symbol,
            dest = %dest.symbol,
            amount,
            %side,
            "Requesting firm quote"
        );
        let payload = serde_json::to_value(&body)
            .map_err(|e| invalid("request", e.to_string()))?;
        let request = RequestDescriptor::post(&self.firm_url, payload).with_api_key(&self.api_key);

        let response = match self.requester.execute(request).await {
            Ok(response) => response,
            Err(e) => {
                Metrics::firm_quote("request_error");
                warn!(error = %e, src = %src.symbol, dest = %dest.symbol, "Firm quote request failed");
                return Err(ExecutorError::QuoteRequest(e));
            }
        };

        match parse_firm_response(response) {
            Ok(order) => {
                Metrics::firm_quote("ok");
                info!(
                    maker_amount = %order.maker_amount,
                    taker_amount = %order.taker_amount,
                    expiry = order.expiry,
                    "Firm quote received"
                );
                Ok(order)
            }
            Err(e) => {
                Metrics::firm_quote("invalid");
                warn!(error = %e, "Firm quote rejected");
                Err(e)
            }
        }
    }
}
