//! Signature scheme tag attached to every signing and verification request.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The two signing schemes supported by the toolkit.
///
/// The scheme determines which digest algorithm is used and which signer
/// capability is invoked. The serialized tags match the ones used by wallets
/// and by previously issued signatures (`eip712`, `eip7702`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignatureScheme {
	/// Domain-separated typed structured data (EIP-712).
	#[serde(rename = "eip712")]
	StructuredData,
	/// RLP-encoded authorization delegation (EIP-7702 style).
	#[serde(rename = "eip7702")]
	AuthorizationDelegation,
}

impl SignatureScheme {
	/// Returns the wire tag of the scheme.
	pub fn as_str(&self) -> &'static str {
		match self {
			SignatureScheme::StructuredData => "eip712",
			SignatureScheme::AuthorizationDelegation => "eip7702",
		}
	}

	/// Human readable name used in CLI output.
	pub fn display_name(&self) -> &'static str {
		match self {
			SignatureScheme::StructuredData => "EIP-712 Typed Data",
			SignatureScheme::AuthorizationDelegation => "EIP-7702 Authorization",
		}
	}
}

impl fmt::Display for SignatureScheme {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Error returned when a scheme tag cannot be parsed.
#[derive(Debug, Error)]
#[error("Unknown signature scheme: {0}")]
pub struct ParseSchemeError(pub String);

impl FromStr for SignatureScheme {
	type Err = ParseSchemeError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"eip712" | "eip-712" | "structured" | "typed-data" => Ok(Self::StructuredData),
			"eip7702" | "eip-7702" | "authorization" | "delegation" => {
				Ok(Self::AuthorizationDelegation)
			},
			_ => Err(ParseSchemeError(s.to_string())),
		}
	}
}
