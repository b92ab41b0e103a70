//! Firm-order execution path for the Dexalot RFQ integration.
//!
//! Turns an indicative swap into a settleable, verified order:
//!
//! - [`BlacklistGuard`]: rejects denied traders before any network call
//! - [`QuoteNegotiator`]: requests a maker-signed [`FirmOrder`](dexalot_core::FirmOrder)
//!   for an exact size
//! - [`OrderHasher`]: recomputes the EIP-712 digest the settlement contract checks
//! - [`SignatureValidator`]: decides whether the maker's signature would pass
//! - [`OrderPreparer`]: runs the whole chain ahead of transaction building
//!
//! # Preparation order
//!
//! 1. Unknown token -> `UnknownToken`
//! 2. Blacklisted trader -> `Blacklisted`
//! 3. Firm quote failure -> `QuoteRequest` / `MissingField` / `InvalidField`
//! 4. Order fields differ from the request -> `QuoteMismatch`
//! 5. Order expired -> `Expired`
//! 6. Signature does not verify -> `SignatureMismatch`
//! 7. Amounts outside the slippage factor -> `Slippage`

pub mod blacklist;
pub mod error;
pub mod order_hash;
pub mod preparer;
pub mod quote;
pub mod validator;

pub use blacklist::BlacklistGuard;
pub use error::{ExecutorError, ExecutorResult, RESTRICTED_USER_MARKER};
pub use order_hash::{OrderHasher, DOMAIN_TYPE, EIP712_DOMAIN_NAME, EIP712_DOMAIN_VERSION, ORDER_TYPE};
pub use preparer::{OrderPreparer, PrepareRequest, PreparedOrder};
pub use quote::{parse_firm_response, FirmQuoteRequest, QuoteNegotiator};
pub use validator::{
    AuthorizedSigners, DynSignatureValidator, MockSignatureValidator, SignatureValidator,
};
