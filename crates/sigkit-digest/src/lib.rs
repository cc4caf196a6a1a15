//! Digest builder for the sigkit workspace.
//!
//! Computes the exact 32-byte value each signing scheme signs:
//! - structured data: `keccak256(0x1901 || domainSeparator || hashStruct(message))`
//! - authorization delegation: `keccak256(rlp([chainId, delegator, nonce]))`
//!
//! Encoding mistakes here do not fail loudly, they silently produce a
//! different digest on one side of the signer/verifier pair. Every rule is
//! therefore pinned by byte-exact tests.

use alloy_primitives::B256;
use sigkit_types::{AuthorizationRequest, SignatureScheme, TypedData};
use thiserror::Error;

pub mod authorization;
pub mod eip712;
pub mod encoder;

pub use authorization::{authorization_digest, authorization_rlp};
pub use eip712::{
	compute_final_digest, domain_separator, encode_type, hash_struct, resolve_primary_type,
	structured_digest, type_hash, DOMAIN_TYPE,
};
pub use encoder::Eip712AbiEncoder;

/// Errors that can occur while building a digest.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DigestError {
	/// The message does not satisfy its type schema, or the schema itself is invalid.
	#[error("Schema mismatch: {0}")]
	SchemaMismatch(String),
}

/// The digest a signer must sign, together with the input it was derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningDigest {
	pub scheme: SignatureScheme,
	pub digest: B256,
	/// For structured data, the input with its primary type resolved.
	/// Signers that take structured input instead of a raw digest need it.
	pub structured: Option<TypedData>,
}

impl SigningDigest {
	/// Builds the structured-data digest for `data`.
	pub fn structured(data: &TypedData) -> Result<Self, DigestError> {
		let primary_type = resolve_primary_type(data)?;
		let digest = structured_digest(data)?;
		Ok(Self {
			scheme: SignatureScheme::StructuredData,
			digest,
			structured: Some(data.clone().with_primary_type(primary_type)),
		})
	}

	/// Builds the authorization-delegation digest for `request`.
	pub fn authorization(request: &AuthorizationRequest) -> Self {
		Self {
			scheme: SignatureScheme::AuthorizationDelegation,
			digest: authorization_digest(request),
			structured: None,
		}
	}
}
