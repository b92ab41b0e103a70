//! Maker signature validation.
//!
//! The settlement contract accepts an order when its signature checks out
//! against the maker's validator. [`AuthorizedSigners`] reproduces that
//! check locally by recovering the signer from the digest. An on-chain
//! ERC-1271 call would plug in behind the same trait.

use crate::error::ExecutorResult;
use alloy::primitives::{Address, PrimitiveSignature, B256};
use dexalot_registry::BoxFuture;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

pub trait SignatureValidator: Send + Sync {
    /// Whether `signature` over `digest` would pass the on-chain check.
    fn is_valid_signature<'a>(
        &'a self,
        digest: B256,
        signature: &'a [u8],
    ) -> BoxFuture<'a, ExecutorResult<bool>>;
}

/// Arc wrapper for validator trait objects.
pub type DynSignatureValidator = Arc<dyn SignatureValidator>;

/// Accepts signatures recovered to one of a fixed set of addresses.
#[derive(Debug, Clone, Default)]
pub struct AuthorizedSigners {
    signers: HashSet<Address>,
}

impl AuthorizedSigners {
    pub fn new(signers: impl IntoIterator<Item = Address>) -> Self {
        Self {
            signers: signers.into_iter().collect(),
        }
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.signers.contains(address)
    }

    pub fn len(&self) -> usize {
        self.signers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signers.is_empty()
    }

    /// Recover the signer of `digest`. None for malformed signatures.
    pub fn recover(digest: B256, signature: &[u8]) -> Option<Address> {
        let signature = PrimitiveSignature::try_from(signature).ok()?;
        signature.recover_address_from_prehash(&digest).ok()
    }
}

impl SignatureValidator for AuthorizedSigners {
    fn is_valid_signature<'a>(
        &'a self,
        digest: B256,
        signature: &'a [u8],
    ) -> BoxFuture<'a, ExecutorResult<bool>> {
        Box::pin(async move {
            let Some(signer) = Self::recover(digest, signature) else {
                debug!(len = signature.len(), "Unrecoverable signature");
                return Ok(false);
            };
            Ok(self.signers.contains(&signer))
        })
    }
}

/// Mock validator for testing.
pub struct MockSignatureValidator {
    valid: Mutex<bool>,
    checked: Mutex<Vec<B256>>,
}

impl MockSignatureValidator {
    pub fn new(valid: bool) -> Self {
        Self {
            valid: Mutex::new(valid),
            checked: Mutex::new(Vec::new()),
        }
    }

    pub fn set_valid(&self, valid: bool) {
        *self.valid.lock() = valid;
    }

    /// Digests checked so far.
    pub fn checked(&self) -> Vec<B256> {
        self.checked.lock().clone()
    }
}

impl SignatureValidator for MockSignatureValidator {
    fn is_valid_signature<'a>(
        &'a self,
        digest: B256,
        _signature: &'a [u8],
    ) -> BoxFuture<'a, ExecutorResult<bool>> {
        Box::pin(async move {
            self.checked.lock().push(digest);
            Ok(*self.valid.lock())
        })
    }
}
