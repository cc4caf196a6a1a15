//! Signature codec for the sigkit workspace.
//!
//! Converts raw signer output into a canonical 65-byte `r || s || v` form,
//! serializes it to and from the `0x`-prefixed hex string wallets exchange,
//! and recovers the signing address from a digest. Recovery refuses
//! signatures whose `s` lies in the upper half of the curve order.

use thiserror::Error;

pub mod details;
pub mod recover;
pub mod signature;

pub use details::SignatureDetails;
pub use recover::{public_key_address, recover_address};
pub use signature::{normalize, parse, serialize, SignatureBytes, SECP256K1_N, SECP256K1_N_DIV_2};

/// Errors that can occur while decoding or recovering a signature.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
	/// Wrong length, bad hex, bad recovery byte or out-of-range scalar.
	#[error("Malformed signature: {0}")]
	MalformedSignature(String),
	/// No public key can be recovered from the signature and digest.
	#[error("Invalid signature: {0}")]
	InvalidSignature(String),
	/// `s` is in the upper half of the curve order.
	#[error("Non-canonical signature: s is in the upper half of the curve order")]
	NonCanonicalS,
}
