//! Payment request types embedded in merchant QR codes.
//!
//! The JSON shape of [`PaymentPayload`] is a wire contract with scanning
//! wallets: field names, nesting and the literal `type` / `version` values
//! must not change. Construction and parsing rules live in `sigkit-payment`.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

/// Literal value of the payload `type` field.
pub const PAYMENT_TYPE: &str = "tether_payment";

/// Literal value of the payload `version` field.
pub const PAYMENT_VERSION: &str = "1.0";

/// A time-bounded token transfer request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
	/// Address receiving the payment.
	pub recipient: Address,
	/// Positive decimal amount, kept verbatim as entered (e.g. "10.00").
	pub amount: String,
	pub chain_id: u64,
	/// Token contract the amount is denominated in.
	pub token_address: Address,
	/// Random 32-bit request nonce.
	pub nonce: u32,
	/// Unix timestamp (seconds) after which the request must be rejected.
	pub deadline: u64,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub memo: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub merchant_id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub order_id: Option<String>,
}

/// Payload metadata. `expires_at` always equals the request deadline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMetadata {
	pub created_at: u64,
	pub expires_at: u64,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub merchant_name: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
}

/// The complete value serialized into a payment QR code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPayload {
	#[serde(rename = "type")]
	pub payload_type: String,
	pub version: String,
	pub chain_id: u64,
	pub payment: PaymentRequest,
	pub metadata: PaymentMetadata,
}

impl PaymentPayload {
	/// Returns true once `now` has reached the expiry instant.
	pub fn is_expired(&self, now: u64) -> bool {
		now >= self.metadata.expires_at
	}

	/// Seconds left before expiry, zero when already expired.
	pub fn remaining_seconds(&self, now: u64) -> u64 {
		self.metadata.expires_at.saturating_sub(now)
	}
}
