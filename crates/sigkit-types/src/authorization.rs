//! Authorization-delegation request.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

/// Intent to delegate authority for `delegator` on `chain_id` at `nonce`.
///
/// The nonce must be the delegator's next unused value. It is sourced by the
/// caller; nothing in this workspace tracks on-chain nonce state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationRequest {
	pub chain_id: u64,
	pub delegator: Address,
	pub nonce: u64,
}

impl AuthorizationRequest {
	pub fn new(chain_id: u64, delegator: Address, nonce: u64) -> Self {
		Self {
			chain_id,
			delegator,
			nonce,
		}
	}
}
