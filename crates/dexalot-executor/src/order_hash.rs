//! EIP-712 digest of a firm order.
//!
//! Reproduces the hash the settlement contract checks the maker's signature
//! against:
//! 1. `struct_hash = keccak256(ORDER_TYPEHASH ‖ enc(fields))`
//! 2. `domain_separator = keccak256(DOMAIN_TYPEHASH ‖ keccak256(name) ‖ keccak256(version) ‖ chainId ‖ verifyingContract)`
//! 3. `digest = keccak256(0x1901 ‖ domain_separator ‖ struct_hash)`
//!
//! Built from raw `keccak256` over 32-byte words so the encoding is visible
//! and independent of any typed-data helper.

use alloy::primitives::{keccak256, Address, B256, U256};
use dexalot_core::FirmOrder;

pub const EIP712_DOMAIN_NAME: &str = "Dexalot";
pub const EIP712_DOMAIN_VERSION: &str = "1";

pub const DOMAIN_TYPE: &str =
    "EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)";

pub const ORDER_TYPE: &str = "Order(uint256 nonceAndMeta,uint128 expiry,address makerAsset,address takerAsset,address maker,address taker,uint256 makerAmount,uint256 takerAmount)";

fn word_u256(value: U256) -> [u8; 32] {
    value.to_be_bytes::<32>()
}

fn word_address(address: Address) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(address.as_slice());
    word
}

/// Digest calculator bound to one chain and verifying contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderHasher {
    chain_id: u64,
    verifying_contract: Address,
    domain_separator: B256,
}

impl OrderHasher {
    pub fn new(chain_id: u64, verifying_contract: Address) -> Self {
        let mut data = Vec::with_capacity(32 * 5);
        data.extend_from_slice(keccak256(DOMAIN_TYPE.as_bytes()).as_slice());
        data.extend_from_slice(keccak256(EIP712_DOMAIN_NAME.as_bytes()).as_slice());
        data.extend_from_slice(keccak256(EIP712_DOMAIN_VERSION.as_bytes()).as_slice());
        data.extend_from_slice(&word_u256(U256::from(chain_id)));
        data.extend_from_slice(&word_address(verifying_contract));

        Self {
            chain_id,
            verifying_contract,
            domain_separator: keccak256(&data),
        }
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn verifying_contract(&self) -> Address {
        self.verifying_contract
    }

    pub fn domain_separator(&self) -> B256 {
        self.domain_separator
    }

    /// Struct hash of the order's signed fields. The signature is excluded.
    pub fn struct_hash(order: &FirmOrder) -> B256 {
        let mut data = Vec::with_capacity(32 * 9);
        data.extend_from_slice(keccak256(ORDER_TYPE.as_bytes()).as_slice());
        data.extend_from_slice(&word_u256(order.nonce_and_meta));
        data.extend_from_slice(&word_u256(U256::from(order.expiry)));
        data.extend_from_slice(&word_address(order.maker_asset));
        data.extend_from_slice(&word_address(order.taker_asset));
        data.extend_from_slice(&word_address(order.maker));
        data.extend_from_slice(&word_address(order.taker));
        data.extend_from_slice(&word_u256(order.maker_amount));
        data.extend_from_slice(&word_u256(order.taker_amount));
        keccak256(&data)
    }

    /// Final digest the maker signs.
    pub fn digest(&self, order: &FirmOrder) -> B256 {
        let mut data = Vec::with_capacity(2 + 32 + 32);
        data.extend_from_slice(&[0x19, 0x01]);
        data.extend_from_slice(self.domain_separator.as_slice());
        data.extend_from_slice(Self::struct_hash(order).as_slice());
        keccak256(&data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::Bytes;
    use alloy::sol;
    use alloy::sol_types::{eip712_domain, SolStruct};

    sol! {
        #[derive(Debug)]
        struct Order {
            uint256 nonceAndMeta;
            uint128 expiry;
            address makerAsset;
            address takerAsset;
            address maker;
            address taker;
            uint256 makerAmount;
            uint256 takerAmount;
        }
    }

    const CHAIN_ID: u64 = 43114;

    fn maker() -> Address {
        "0xd62f9E53Be8884C21f5aa523B3c7D6F9a0050af5".parse().unwrap()
    }

    fn sample_order() -> FirmOrder {
        FirmOrder {
            nonce_and_meta: U256::from_str_radix(
                "70997970c51812dc3a010c7d01b50e0d17dc79c8000000000000000000000001",
                16,
            )
            .unwrap(),
            expiry: 1_700_000_000,
            maker_asset: "0xB97EF9Ef8734C71904D8002F8b6Bc66Dd9c48a6E".parse().unwrap(),
            taker_asset: Address::ZERO,
            maker: maker(),
            taker: "0x70997970C51812dc3A010C7d01b50e0d17dc79C8".parse().unwrap(),
            maker_amount: U256::from(72_000_000u64),
            taker_amount: U256::from(7_000_000_000_000_000_000u128),
            signature: Bytes::new(),
        }
    }

    fn sol_order(order: &FirmOrder) -> Order {
        Order {
            nonceAndMeta: order.nonce_and_meta,
            expiry: u128::from(order.expiry),
            makerAsset: order.maker_asset,
            takerAsset: order.taker_asset,
            maker: order.maker,
            taker: order.taker,
            makerAmount: order.maker_amount,
            takerAmount: order.taker_amount,
        }
    }

    #[test]
    fn test_domain_separator_matches_alloy() {
        let domain = eip712_domain! {
            name: EIP712_DOMAIN_NAME,
            version: EIP712_DOMAIN_VERSION,
            chain_id: CHAIN_ID,
            verifying_contract: maker(),
        };
        let hasher = OrderHasher::new(CHAIN_ID, maker());
        assert_eq!(hasher.domain_separator(), domain.hash_struct());
    }

    #[test]
    fn test_struct_hash_matches_alloy() {
        let order = sample_order();
        assert_eq!(
            OrderHasher::struct_hash(&order),
            sol_order(&order).eip712_hash_struct()
        );
    }

    #[test]
    fn test_type_string_matches_alloy() {
        let order = sample_order();
        assert_eq!(sol_order(&order).eip712_type_hash(), keccak256(ORDER_TYPE.as_bytes()));
    }

    #[test]
    fn test_digest_matches_alloy_signing_hash() {
        let domain = eip712_domain! {
            name: EIP712_DOMAIN_NAME,
            version: EIP712_DOMAIN_VERSION,
            chain_id: CHAIN_ID,
            verifying_contract: maker(),
        };
        let order = sample_order();
        let hasher = OrderHasher::new(CHAIN_ID, maker());
        assert_eq!(
            hasher.digest(&order),
            sol_order(&order).eip712_signing_hash(&domain)
        );
    }

    #[test]
    fn test_digest_is_deterministic() {
        let hasher = OrderHasher::new(CHAIN_ID, maker());
        let order = sample_order();
        assert_eq!(hasher.digest(&order), hasher.digest(&order.clone()));

        // Signature is not part of the digest.
        let mut signed = order.clone();
        signed.signature = Bytes::from(vec![1u8; 65]);
        assert_eq!(hasher.digest(&order), hasher.digest(&signed));
    }

    #[test]
    fn test_digest_binds_every_field_and_domain() {
        let hasher = OrderHasher::new(CHAIN_ID, maker());
        let base = sample_order();
        let digest = hasher.digest(&base);

        let mut changed = base.clone();
        changed.taker_amount += U256::from(1u64);
        assert_ne!(hasher.digest(&changed), digest);

        let mut changed = base.clone();
        changed.expiry += 1;
        assert_ne!(hasher.digest(&changed), digest);

        let other_chain = OrderHasher::new(43113, maker());
        assert_ne!(other_chain.digest(&base), digest);

        let other_contract = OrderHasher::new(CHAIN_ID, Address::repeat_byte(0x01));
        assert_ne!(other_contract.digest(&base), digest);
    }
}
