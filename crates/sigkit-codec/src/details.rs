//! Human-readable breakdown of a signature.

use crate::{serialize, SignatureBytes};
use alloy_primitives::hex;
use serde::{Deserialize, Serialize};

/// Components of a signature as displayed after signing or verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureDetails {
	pub r: String,
	pub s: String,
	/// Recovery byte in the 27/28 convention.
	pub v: u8,
	pub recovery_id: u8,
	pub serialized: String,
	/// EIP-2098 64-byte form.
	pub compact: String,
}

impl From<&SignatureBytes> for SignatureDetails {
	fn from(sig: &SignatureBytes) -> Self {
		Self {
			r: format!("0x{}", hex::encode(sig.r())),
			s: format!("0x{}", hex::encode(sig.s())),
			v: sig.v(),
			recovery_id: sig.recovery_id(),
			serialized: serialize(sig),
			compact: format!("0x{}", hex::encode(sig.to_compact())),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::normalize;

	#[test]
	fn test_details() {
		let mut raw = [0u8; 65];
		raw[31] = 0x0a;
		raw[63] = 0x0b;
		raw[64] = 28;
		let sig = normalize(&raw).unwrap();
		let details = SignatureDetails::from(&sig);

		assert_eq!(details.v, 28);
		assert_eq!(details.recovery_id, 1);
		assert!(details.r.ends_with("0a"));
		assert!(details.s.ends_with("0b"));
		assert_eq!(details.compact.len(), 2 + 128);
		assert!(details.compact[66..].starts_with('8'));

		let json = serde_json::to_value(&details).unwrap();
		assert_eq!(json["recoveryId"], 1);
	}
}
