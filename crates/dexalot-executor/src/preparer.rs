//! Order preparation ahead of transaction building.
//!
//! Runs, in order: token resolution, blacklist guard, firm quote, field
//! checks, expiry check, digest and signature verification, slippage check.
//! Any failure aborts the build. A trader the maker reports as restricted
//! is added to the shared blacklist before the error is returned.

use crate::blacklist::BlacklistGuard;
use crate::error::{ExecutorError, ExecutorResult};
use crate::order_hash::OrderHasher;
use crate::quote::QuoteNegotiator;
use crate::validator::DynSignatureValidator;
use alloy::primitives::{Address, B256, U256};
use dexalot_core::{normalize_address, FirmOrder, SwapSide, Token};
use dexalot_registry::RateState;
use dexalot_telemetry::Metrics;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{error, info, warn};

/// One swap to turn into a settleable order.
#[derive(Debug, Clone)]
pub struct PrepareRequest {
    pub src_address: String,
    pub dest_address: String,
    /// Smallest units of the source token.
    pub src_amount: u128,
    /// Smallest units of the destination token.
    pub dest_amount: u128,
    pub side: SwapSide,
    /// Trader initiating the transaction.
    pub user_address: String,
    /// SELL: minimum fraction of `dest_amount` accepted.
    /// BUY: maximum multiple of `src_amount` accepted.
    pub slippage_factor: Decimal,
}

/// A verified order ready for transaction building.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedOrder {
    pub order: FirmOrder,
    pub digest: B256,
    /// Transaction deadline, equal to the order expiry.
    pub deadline: u64,
}

pub struct OrderPreparer {
    state: Arc<RateState>,
    guard: BlacklistGuard,
    negotiator: QuoteNegotiator,
    hasher: OrderHasher,
    validator: DynSignatureValidator,
}

impl OrderPreparer {
    pub fn new(
        state: Arc<RateState>,
        guard: BlacklistGuard,
        negotiator: QuoteNegotiator,
        hasher: OrderHasher,
        validator: DynSignatureValidator,
    ) -> Self {
        Self {
            state,
            guard,
            negotiator,
            hasher,
            validator,
        }
    }

    /// Maker contract the orders must come from.
    pub fn maker(&self) -> Address {
        self.hasher.verifying_contract()
    }

    pub fn guard(&self) -> &BlacklistGuard {
        &self.guard
    }

    pub async fn prepare(&self, request: &PrepareRequest) -> ExecutorResult<PreparedOrder> {
        let now = u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0);
        self.prepare_at(request, now).await
    }

    /// [`prepare`](Self::prepare) with an explicit clock, in unix seconds.
    pub async fn prepare_at(&self, request: &PrepareRequest, now_secs: u64) -> ExecutorResult<PreparedOrder> {
        let (src, dest) = self.resolve(request)?;

        self.guard.ensure_allowed(&request.user_address).await?;

        let amount = match request.side {
            SwapSide::Sell => request.src_amount,
            SwapSide::Buy => request.dest_amount,
        };
        let order = match self
            .negotiator
            .firm_rate(&src, &dest, amount, request.side, &request.user_address)
            .await
        {
            Ok(order) => order,
            Err(e) if e.is_restricted_user() => {
                warn!(
                    user = %normalize_address(&request.user_address),
                    "Encountered restricted user, adding to blacklist"
                );
                self.guard.add(&request.user_address).await?;
                return Err(e);
            }
            Err(e) => return Err(e),
        };

        self.check_fields(&order, &src, &dest, request)?;

        if order.is_expired(now_secs) {
            return Err(ExecutorError::Expired {
                expiry: order.expiry,
                now: now_secs,
            });
        }

        let digest = self.hasher.digest(&order);
        if !self.validator.is_valid_signature(digest, &order.signature).await? {
            Metrics::signature_mismatch();
            error!(%digest, maker = %order.maker, "Firm order signature does not verify");
            return Err(ExecutorError::SignatureMismatch { digest });
        }

        check_slippage(&order, request)?;

        info!(
            src = %src.symbol,
            dest = %dest.symbol,
            side = %request.side,
            deadline = order.deadline(),
            "Order prepared"
        );
        Ok(PreparedOrder {
            deadline: order.deadline(),
            digest,
            order,
        })
    }

    fn resolve(&self, request: &PrepareRequest) -> ExecutorResult<(Token, Token)> {
        let tokens = self.state.tokens();
        let src = tokens
            .by_address(&request.src_address)
            .cloned()
            .ok_or_else(|| ExecutorError::UnknownToken(normalize_address(&request.src_address)))?;
        let dest = tokens
            .by_address(&request.dest_address)
            .cloned()
            .ok_or_else(|| ExecutorError::UnknownToken(normalize_address(&request.dest_address)))?;
        Ok((src, dest))
    }

    fn check_fields(
        &self,
        order: &FirmOrder,
        src: &Token,
        dest: &Token,
        request: &PrepareRequest,
    ) -> ExecutorResult<()> {
        expect_eq("makerAsset", token_address(dest)?, order.maker_asset)?;
        expect_eq("takerAsset", token_address(src)?, order.taker_asset)?;
        expect_eq("maker", self.maker(), order.maker)?;
        match request.side {
            SwapSide::Sell => {
                expect_eq("takerAmount", U256::from(request.src_amount), order.taker_amount)
            }
            SwapSide::Buy => {
                expect_eq("makerAmount", U256::from(request.dest_amount), order.maker_amount)
            }
        }
    }
}

fn token_address(token: &Token) -> ExecutorResult<Address> {
    token
        .address
        .parse::<Address>()
        .map_err(|e| ExecutorError::InvalidField {
            field: "token address",
            reason: format!("{}: {e}", token.address),
        })
}

fn expect_eq<T>(field: &'static str, expected: T, actual: T) -> ExecutorResult<()>
where
    T: PartialEq + std::fmt::Display,
{
    if expected == actual {
        return Ok(());
    }
    Err(ExecutorError::QuoteMismatch {
        field,
        expected: expected.to_string(),
        actual: actual.to_string(),
    })
}

/// `floor(amount × factor)` in integer units.
fn scale_amount(amount: u128, factor: Decimal) -> ExecutorResult<U256> {
    if factor.is_sign_negative() {
        return Err(ExecutorError::Slippage(format!("negative slippage factor {factor}")));
    }
    let mantissa = U256::from(factor.mantissa().unsigned_abs());
    let divisor = U256::from(10u64).pow(U256::from(factor.scale()));
    U256::from(amount)
        .checked_mul(mantissa)
        .map(|n| n / divisor)
        .ok_or_else(|| ExecutorError::Slippage(format!("{amount} × {factor} overflows")))
}

/// SELL: the maker must pay at least `dest_amount × factor`.
/// BUY: the taker must pay at most `src_amount × factor`.
fn check_slippage(order: &FirmOrder, request: &PrepareRequest) -> ExecutorResult<()> {
    match request.side {
        SwapSide::Sell => {
            let minimum = scale_amount(request.dest_amount, request.slippage_factor)?;
            if order.maker_amount < minimum {
                return Err(ExecutorError::Slippage(format!(
                    "SELL makerAmount {} < destAmount {} × {}",
                    order.maker_amount, request.dest_amount, request.slippage_factor
                )));
            }
        }
        SwapSide::Buy => {
            let maximum = scale_amount(request.src_amount, request.slippage_factor)?;
            if order.taker_amount > maximum {
                return Err(ExecutorError::Slippage(format!(
                    "BUY takerAmount {} > srcAmount {} × {}",
                    order.taker_amount, request.src_amount, request.slippage_factor
                )));
            }
        }
    }
    Ok(())
}
