//! Canonical signature representation and its hex wire form.

use crate::CodecError;
use alloy_primitives::{hex, B256, U256};

/// secp256k1 curve order.
pub const SECP256K1_N: U256 = U256::from_limbs([
	0xBFD25E8CD0364141,
	0xBAAEDCE6AF48A03B,
	0xFFFFFFFFFFFFFFFE,
	0xFFFFFFFFFFFFFFFF,
]);

/// Half the curve order. Signatures with `s` above this are malleable.
pub const SECP256K1_N_DIV_2: U256 = U256::from_limbs([
	0xDFE92F46681B20A0,
	0x5D576E7357A4501D,
	0xFFFFFFFFFFFFFFFF,
	0x7FFFFFFFFFFFFFFF,
]);

/// A 65-byte recoverable ECDSA signature.
///
/// The recovery id is always stored as 0 or 1; the 27/28 wallet convention
/// only appears on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SignatureBytes {
	r: B256,
	s: B256,
	recovery_id: u8,
}

impl SignatureBytes {
	pub fn r(&self) -> B256 {
		self.r
	}

	pub fn s(&self) -> B256 {
		self.s
	}

	/// Recovery id in {0, 1}.
	pub fn recovery_id(&self) -> u8 {
		self.recovery_id
	}

	/// Recovery byte in the 27/28 convention.
	pub fn v(&self) -> u8 {
		self.recovery_id + 27
	}

	/// Whether `s` lies in the lower half of the curve order.
	pub fn is_low_s(&self) -> bool {
		U256::from_be_bytes(self.s.0) <= SECP256K1_N_DIV_2
	}

	/// Canonical bytes `r || s || recovery_id` with the recovery id in {0, 1}.
	pub fn as_bytes(&self) -> [u8; 65] {
		let mut out = [0u8; 65];
		out[..32].copy_from_slice(self.r.as_slice());
		out[32..64].copy_from_slice(self.s.as_slice());
		out[64] = self.recovery_id;
		out
	}

	/// EIP-2098 compact form `r || (yParity << 255 | s)`.
	pub fn to_compact(&self) -> [u8; 64] {
		let mut out = [0u8; 64];
		out[..32].copy_from_slice(self.r.as_slice());
		out[32..].copy_from_slice(self.s.as_slice());
		if self.recovery_id == 1 {
			out[32] |= 0x80;
		}
		out
	}
}

/// Normalizes raw signer output.
///
/// Accepts 65 bytes with a trailing recovery byte in {0, 1, 27, 28}, or the
/// 64-byte EIP-2098 compact form. `r` and `s` must both be in `[1, n)`.
/// High `s` values are accepted here and rejected at recovery time.
pub fn normalize(raw: &[u8]) -> Result<SignatureBytes, CodecError> {
	let (r, s, recovery_id) = match raw.len() {
		65 => {
			let recovery_id = match raw[64] {
				0 | 27 => 0,
				1 | 28 => 1,
				v => {
					return Err(CodecError::MalformedSignature(format!(
						"invalid recovery byte {}",
						v
					)))
				},
			};
			(
				B256::from_slice(&raw[..32]),
				B256::from_slice(&raw[32..64]),
				recovery_id,
			)
		},
		64 => {
			let mut s = B256::from_slice(&raw[32..]);
			let recovery_id = s[0] >> 7;
			s[0] &= 0x7f;
			(B256::from_slice(&raw[..32]), s, recovery_id)
		},
		len => {
			return Err(CodecError::MalformedSignature(format!(
				"expected 64 or 65 bytes, got {}",
				len
			)))
		},
	};

	check_scalar("r", &r)?;
	check_scalar("s", &s)?;

	Ok(SignatureBytes { r, s, recovery_id })
}

fn check_scalar(name: &str, value: &B256) -> Result<(), CodecError> {
	let scalar = U256::from_be_bytes(value.0);
	if scalar.is_zero() || scalar >= SECP256K1_N {
		return Err(CodecError::MalformedSignature(format!(
			"{} is outside the curve order",
			name
		)));
	}
	Ok(())
}

/// Serializes to `0x` + 130 lowercase hex characters, recovery byte as 27/28.
pub fn serialize(sig: &SignatureBytes) -> String {
	let mut bytes = sig.as_bytes();
	bytes[64] = sig.v();
	format!("0x{}", hex::encode(bytes))
}

/// Parses the hex wire form. Exact inverse of [`serialize`].
pub fn parse(text: &str) -> Result<SignatureBytes, CodecError> {
	let body = text
		.strip_prefix("0x")
		.ok_or_else(|| CodecError::MalformedSignature("missing 0x prefix".to_string()))?;
	if body.len() != 130 || !body.bytes().all(|b| b.is_ascii_hexdigit()) {
		return Err(CodecError::MalformedSignature(format!(
			"expected 130 hex characters after 0x, got '{}'",
			body
		)));
	}
	let bytes = hex::decode(body)
		.map_err(|e| CodecError::MalformedSignature(format!("invalid hex: {}", e)))?;
	if bytes.len() != 65 {
		return Err(CodecError::MalformedSignature(format!(
			"expected 65 bytes, got {}",
			bytes.len()
		)));
	}
	normalize(&bytes)
}
