//! Signer capability descriptor.

use serde::{Deserialize, Serialize};

/// What the connected signing environment is able to do.
///
/// Structured-data signing is assumed everywhere; raw-digest signing for
/// authorization delegation is not offered by every wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerCapabilities {
	#[serde(default = "default_true")]
	pub supports_authorization_delegation: bool,
}

impl Default for SignerCapabilities {
	fn default() -> Self {
		Self {
			supports_authorization_delegation: true,
		}
	}
}

fn default_true() -> bool {
	true
}
