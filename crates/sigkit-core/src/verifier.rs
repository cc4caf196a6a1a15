//! Signature verification.
//!
//! Verification never fails with an error: every problem with the inputs is
//! reported as a [`VerificationFailure`] inside the result, so a caller can
//! display it next to the signature being checked.

use crate::VerificationContext;
use alloy_primitives::{Address, B256};
use serde::Serialize;
use sigkit_codec::{parse, recover_address, CodecError};
use sigkit_digest::{authorization_digest, structured_digest, DigestError};
use sigkit_types::SignatureScheme;

/// Why a signature did not verify.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum VerificationFailure {
	/// The signature string could not be decoded.
	MalformedSignature(String),
	/// The structured message does not match its schema.
	SchemaMismatch(String),
	/// No address could be recovered, or `s` was non-canonical.
	RecoveryFailure(String),
	/// An address was recovered but it is not the expected signer.
	SignerMismatch { expected: Address, recovered: Address },
}

/// Outcome of a verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
	pub valid: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub recovered_address: Option<Address>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub reason: Option<VerificationFailure>,
	pub scheme: SignatureScheme,
	/// Digest the signature was checked against, when it could be computed.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub digest: Option<B256>,
}

impl VerificationResult {
	fn failure(scheme: SignatureScheme, digest: Option<B256>, reason: VerificationFailure) -> Self {
		Self {
			valid: false,
			recovered_address: None,
			reason: Some(reason),
			scheme,
			digest,
		}
	}

	/// Requires the recovered address to equal `expected`.
	///
	/// A valid result recovered from another key becomes invalid with
	/// [`VerificationFailure::SignerMismatch`]; invalid results are returned as-is.
	pub fn expect_signer(mut self, expected: Address) -> Self {
		if let (true, Some(recovered)) = (self.valid, self.recovered_address) {
			if recovered != expected {
				self.valid = false;
				self.reason = Some(VerificationFailure::SignerMismatch {
					expected,
					recovered,
				});
			}
		}
		self
	}
}

/// Verifies `signature_hex` against the digest recomputed from `context`.
///
/// `valid` is true whenever an address can be recovered; pair with
/// [`VerificationResult::expect_signer`] to check who signed.
pub fn verify(context: &VerificationContext, signature_hex: &str) -> VerificationResult {
	let scheme = context.scheme();

	let digest = match context {
		VerificationContext::StructuredData(data) => match structured_digest(data) {
			Ok(digest) => digest,
			Err(DigestError::SchemaMismatch(msg)) => {
				tracing::debug!(%scheme, reason = %msg, "Verification failed: schema mismatch");
				return VerificationResult::failure(
					scheme,
					None,
					VerificationFailure::SchemaMismatch(msg),
				);
			},
		},
		VerificationContext::AuthorizationDelegation(request) => authorization_digest(request),
	};

	let signature = match parse(signature_hex) {
		Ok(signature) => signature,
		Err(e) => {
			tracing::debug!(%scheme, error = %e, "Verification failed: malformed signature");
			return VerificationResult::failure(
				scheme,
				Some(digest),
				VerificationFailure::MalformedSignature(e.to_string()),
			);
		},
	};

	match recover_address(&digest, &signature) {
		Ok(address) => {
			tracing::debug!(%scheme, %address, "Signature verified");
			VerificationResult {
				valid: true,
				recovered_address: Some(address),
				reason: None,
				scheme,
				digest: Some(digest),
			}
		},
		Err(e @ (CodecError::NonCanonicalS | CodecError::InvalidSignature(_))) => {
			tracing::debug!(%scheme, error = %e, "Verification failed: recovery");
			VerificationResult::failure(
				scheme,
				Some(digest),
				VerificationFailure::RecoveryFailure(e.to_string()),
			)
		},
		Err(e @ CodecError::MalformedSignature(_)) => VerificationResult::failure(
			scheme,
			Some(digest),
			VerificationFailure::MalformedSignature(e.to_string()),
		),
	}
}
