//! Signing orchestration and verification for the sigkit workspace.
//!
//! The orchestrator drives a single signing attempt against an external
//! signer: it builds the digest, dispatches to the signer according to the
//! scheme, bounds the wait with a timeout and normalizes the returned bytes.
//! The verifier recomputes the digest from caller inputs and recovers the
//! signer address. Both share the scheme-tagged request type defined here.

use alloy_primitives::B256;
use serde::{Deserialize, Serialize};
use sigkit_codec::{CodecError, SignatureBytes, SignatureDetails};
use sigkit_digest::DigestError;
use sigkit_signer::SignerError;
use sigkit_types::{AuthorizationRequest, SignatureScheme, TypedData};
use std::time::Duration;
use thiserror::Error;

pub mod orchestrator;
pub mod state;
pub mod verifier;

pub use orchestrator::SigningOrchestrator;
pub use state::SigningState;
pub use verifier::{verify, VerificationFailure, VerificationResult};

/// Errors returned by a signing attempt.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SigningError {
	/// The structured message does not satisfy its schema. The signer was not called.
	#[error("Schema mismatch: {0}")]
	SchemaMismatch(String),
	/// The signer returned bytes that are not a valid signature.
	#[error("Malformed signature: {0}")]
	MalformedSignature(String),
	/// The key holder refused to sign.
	#[error("Rejected by signer: {0}")]
	Rejected(String),
	/// No answer arrived within the caller's timeout.
	#[error("Signer did not respond within {0:?}")]
	TimedOut(Duration),
	/// Another attempt is still waiting on the signer.
	#[error("A signing request is already in progress")]
	Busy,
	/// The signing environment cannot produce this kind of signature.
	#[error("Signature scheme {0} is not supported by the current signer")]
	Unsupported(SignatureScheme),
	/// Any other signer failure.
	#[error("Signer error: {0}")]
	Signer(SignerError),
}

impl From<DigestError> for SigningError {
	fn from(err: DigestError) -> Self {
		match err {
			DigestError::SchemaMismatch(msg) => SigningError::SchemaMismatch(msg),
		}
	}
}

impl From<CodecError> for SigningError {
	fn from(err: CodecError) -> Self {
		SigningError::MalformedSignature(err.to_string())
	}
}

impl From<SignerError> for SigningError {
	fn from(err: SignerError) -> Self {
		match err {
			SignerError::Rejected(msg) => SigningError::Rejected(msg),
			other => SigningError::Signer(other),
		}
	}
}

/// A signing request tagged with its scheme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scheme", content = "request")]
pub enum SigningRequest {
	#[serde(rename = "eip712")]
	StructuredData(TypedData),
	#[serde(rename = "eip7702")]
	AuthorizationDelegation(AuthorizationRequest),
}

impl SigningRequest {
	pub fn scheme(&self) -> SignatureScheme {
		match self {
			SigningRequest::StructuredData(_) => SignatureScheme::StructuredData,
			SigningRequest::AuthorizationDelegation(_) => SignatureScheme::AuthorizationDelegation,
		}
	}
}

/// The inputs a verifier needs to recompute the signed digest.
///
/// Same shape as [`SigningRequest`]: verification of a structured signature
/// needs the full domain, types and message, and verification of an
/// authorization needs chain id, delegator and nonce.
pub type VerificationContext = SigningRequest;

/// Result of a successful signing attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedMessage {
	pub scheme: SignatureScheme,
	pub signature: SignatureBytes,
	/// `0x`-prefixed hex with the recovery byte as 27/28.
	pub serialized: String,
	pub digest: B256,
}

impl SignedMessage {
	pub fn details(&self) -> SignatureDetails {
		SignatureDetails::from(&self.signature)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_primitives::Address;
	use serde_json::json;

	#[test]
	fn test_signer_errors_map_to_signing_errors() {
		assert_eq!(
			SigningError::from(SignerError::Rejected("user denied".into())),
			SigningError::Rejected("user denied".into())
		);
		assert!(matches!(
			SigningError::from(SignerError::Unavailable("no wallet".into())),
			SigningError::Signer(SignerError::Unavailable(_))
		));
		assert!(matches!(
			SigningError::from(CodecError::NonCanonicalS),
			SigningError::MalformedSignature(_)
		));
	}

	#[test]
	fn test_request_serialization() {
		let request =
			SigningRequest::AuthorizationDelegation(AuthorizationRequest::new(97, Address::ZERO, 3));
		let value = serde_json::to_value(&request).unwrap();

		assert_eq!(value["scheme"], json!("eip7702"));
		assert_eq!(value["request"]["nonce"], json!(3));
		assert_eq!(request.scheme(), SignatureScheme::AuthorizationDelegation);
	}
}
