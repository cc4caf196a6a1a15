//! JSON wire form of payment payloads.
//!
//! Keys appear in declaration order (`type`, `version`, `chainId`, `payment`,
//! `metadata`) and absent optional fields are omitted, so a payload survives
//! `parse(serialize(p))` unchanged.

use crate::{
	builder::{parse_recipient, validate_amount},
	PaymentError,
};
use sigkit_types::{PaymentPayload, PAYMENT_TYPE, PAYMENT_VERSION};

/// Serializes a payload to compact JSON for QR embedding.
pub fn serialize(payload: &PaymentPayload) -> Result<String, PaymentError> {
	serde_json::to_string(payload).map_err(|e| PaymentError::Serialization(e.to_string()))
}

/// Parses and validates a scanned payload.
///
/// Expiry is not checked here: a scanner should show an expired request as
/// such and refuse it with [`ensure_not_expired`].
pub fn parse(text: &str) -> Result<PaymentPayload, PaymentError> {
	let value: serde_json::Value =
		serde_json::from_str(text).map_err(|e| PaymentError::MalformedPayload(e.to_string()))?;
	// The checksum lives in the letter case, which `Address` discards.
	let recipient = value["payment"]["recipient"]
		.as_str()
		.map(str::to_owned)
		.ok_or_else(|| malformed("payment.recipient must be a string".to_string()))?;
	let payload: PaymentPayload =
		serde_json::from_value(value).map_err(|e| PaymentError::MalformedPayload(e.to_string()))?;

	if payload.payload_type != PAYMENT_TYPE {
		return Err(malformed(format!(
			"unknown payload type '{}'",
			payload.payload_type
		)));
	}
	if payload.version != PAYMENT_VERSION {
		return Err(malformed(format!(
			"unsupported version '{}'",
			payload.version
		)));
	}
	if payload.chain_id != payload.payment.chain_id {
		return Err(malformed(format!(
			"chainId {} does not match payment chainId {}",
			payload.chain_id, payload.payment.chain_id
		)));
	}
	if payload.metadata.expires_at != payload.payment.deadline {
		return Err(malformed(format!(
			"expiresAt {} does not match deadline {}",
			payload.metadata.expires_at, payload.payment.deadline
		)));
	}
	if payload.metadata.created_at >= payload.metadata.expires_at {
		return Err(malformed(format!(
			"createdAt {} is not before expiresAt {}",
			payload.metadata.created_at, payload.metadata.expires_at
		)));
	}
	validate_amount(&payload.payment.amount).map_err(|e| malformed(e.to_string()))?;
	parse_recipient(&recipient).map_err(|e| malformed(e.to_string()))?;

	Ok(payload)
}

/// Fails with [`PaymentError::Expired`] once `now` has reached the deadline.
///
/// Call at scan time and again right before settlement.
pub fn ensure_not_expired(payload: &PaymentPayload, now: u64) -> Result<(), PaymentError> {
	if payload.is_expired(now) {
		tracing::warn!(
			expires_at = payload.metadata.expires_at,
			now,
			"Rejecting expired payment request"
		);
		return Err(PaymentError::Expired {
			expires_at: payload.metadata.expires_at,
			now,
		});
	}
	Ok(())
}

fn malformed(message: String) -> PaymentError {
	PaymentError::MalformedPayload(message)
}
