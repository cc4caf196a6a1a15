//! Authorization-delegation digest.
//!
//! The authorization tuple is RLP-encoded as the list
//! `[chainId, delegator, nonce]`: integers use their minimal big-endian form
//! (zero is the empty string, encoded `0x80`) and the delegator is the raw
//! 20-byte string. The digest is the keccak256 of that encoding.

use alloy_primitives::{keccak256, B256};
use alloy_rlp::{Encodable, Header};
use sigkit_types::AuthorizationRequest;

/// RLP encoding of the authorization tuple.
pub fn authorization_rlp(request: &AuthorizationRequest) -> Vec<u8> {
	let delegator = request.delegator.as_slice();
	let payload_length = request.chain_id.length() + delegator.length() + request.nonce.length();

	let mut out = Vec::with_capacity(payload_length + 1);
	Header {
		list: true,
		payload_length,
	}
	.encode(&mut out);
	request.chain_id.encode(&mut out);
	delegator.encode(&mut out);
	request.nonce.encode(&mut out);
	out
}

/// keccak256 of [`authorization_rlp`].
pub fn authorization_digest(request: &AuthorizationRequest) -> B256 {
	let encoded = authorization_rlp(request);
	tracing::trace!(
		chain_id = request.chain_id,
		nonce = request.nonce,
		encoded_len = encoded.len(),
		"Encoded authorization tuple"
	);
	keccak256(encoded)
}
