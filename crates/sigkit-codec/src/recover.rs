//! Address recovery.

use crate::{CodecError, SignatureBytes};
use alloy_primitives::{keccak256, Address, B256};
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};

/// Recovers the address that produced `sig` over `digest`.
///
/// The address is the last 20 bytes of `keccak256` over the uncompressed
/// public key without its `0x04` tag.
pub fn recover_address(digest: &B256, sig: &SignatureBytes) -> Result<Address, CodecError> {
	if !sig.is_low_s() {
		return Err(CodecError::NonCanonicalS);
	}

	let bytes = sig.as_bytes();
	let signature = Signature::from_slice(&bytes[..64])
		.map_err(|e| CodecError::InvalidSignature(e.to_string()))?;
	let recovery_id = RecoveryId::from_byte(sig.recovery_id())
		.ok_or_else(|| CodecError::InvalidSignature("invalid recovery id".to_string()))?;

	let key = VerifyingKey::recover_from_prehash(digest.as_slice(), &signature, recovery_id)
		.map_err(|e| CodecError::InvalidSignature(e.to_string()))?;

	Ok(public_key_address(&key))
}

/// Derives the account address of a secp256k1 public key.
pub fn public_key_address(key: &VerifyingKey) -> Address {
	let point = key.to_encoded_point(false);
	let hash = keccak256(&point.as_bytes()[1..]);
	Address::from_slice(&hash[12..])
}
