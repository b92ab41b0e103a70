//! Swap direction and maker-signed firm orders.

use alloy::primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of a swap request from the taker's point of view.
///
/// `Sell` fixes the source amount; `Buy` fixes the destination amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SwapSide {
    Sell,
    Buy,
}

impl fmt::Display for SwapSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sell => write!(f, "SELL"),
            Self::Buy => write!(f, "BUY"),
        }
    }
}

/// A maker-signed order for an exact maker/taker amount pair.
///
/// Built once from the firm-quote response and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirmOrder {
    pub nonce_and_meta: U256,
    /// Unix seconds after which the settlement contract rejects the order.
    pub expiry: u64,
    pub maker_asset: Address,
    pub taker_asset: Address,
    pub maker: Address,
    pub taker: Address,
    pub maker_amount: U256,
    pub taker_amount: U256,
    pub signature: Bytes,
}

impl FirmOrder {
    /// Whether the order can no longer settle at `now_secs`.
    pub fn is_expired(&self, now_secs: u64) -> bool {
        self.expiry <= now_secs
    }

    /// Deadline to attach to the settlement transaction.
    pub fn deadline(&self) -> u64 {
        self.expiry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(expiry: u64) -> FirmOrder {
        FirmOrder {
            nonce_and_meta: U256::from(1u64),
            expiry,
            maker_asset: Address::repeat_byte(0x11),
            taker_asset: Address::repeat_byte(0x22),
            maker: Address::repeat_byte(0x33),
            taker: Address::repeat_byte(0x44),
            maker_amount: U256::from(72u64),
            taker_amount: U256::from(7u64),
            signature: Bytes::from(vec![0u8; 65]),
        }
    }

    #[test]
    fn test_swap_side_wire_format() {
        assert_eq!(serde_json::to_string(&SwapSide::Sell).unwrap(), "\"SELL\"");
        let side: SwapSide = serde_json::from_str("\"BUY\"").unwrap();
        assert_eq!(side, SwapSide::Buy);
    }

    #[test]
    fn test_expiry_boundary() {
        let o = order(1_000);
        assert!(!o.is_expired(999));
        assert!(o.is_expired(1_000));
        assert!(o.is_expired(1_001));
        assert_eq!(o.deadline(), 1_000);
    }
}
