//! Construction of payment payloads.

use crate::PaymentError;
use alloy_primitives::Address;
use regex::Regex;
use rust_decimal::Decimal;
use sigkit_types::{
	current_timestamp, BnbNetwork, PaymentMetadata, PaymentPayload, PaymentRequest, PAYMENT_TYPE,
	PAYMENT_VERSION,
};
use std::str::FromStr;

/// Merchant input for a payment request, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentDraft {
	/// Recipient as entered: `0x` followed by 40 hex characters.
	pub recipient: String,
	/// Decimal amount as entered, kept verbatim in the payload.
	pub amount: String,
	pub chain_id: u64,
	pub token_address: Address,
	pub memo: Option<String>,
	pub merchant_id: Option<String>,
	pub order_id: Option<String>,
}

impl PaymentDraft {
	/// Draft denominated in the USDT deployment of `network`.
	pub fn for_network(
		network: BnbNetwork,
		recipient: impl Into<String>,
		amount: impl Into<String>,
	) -> Self {
		let info = network.info();
		Self {
			recipient: recipient.into(),
			amount: amount.into(),
			chain_id: info.chain_id,
			token_address: info.usdt_address,
			memo: None,
			merchant_id: None,
			order_id: None,
		}
	}

	pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
		self.memo = Some(memo.into());
		self
	}

	pub fn with_merchant_id(mut self, merchant_id: impl Into<String>) -> Self {
		self.merchant_id = Some(merchant_id.into());
		self
	}

	pub fn with_order_id(mut self, order_id: impl Into<String>) -> Self {
		self.order_id = Some(order_id.into());
		self
	}
}

/// Free-text metadata shown to the payer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentNotes {
	pub merchant_name: Option<String>,
	pub description: Option<String>,
}

/// Builds a payload that expires `ttl_seconds` from now, with a random nonce.
pub fn build(
	draft: PaymentDraft,
	ttl_seconds: u64,
	notes: PaymentNotes,
) -> Result<PaymentPayload, PaymentError> {
	build_at(draft, ttl_seconds, notes, current_timestamp(), rand::random::<u32>())
}

/// Deterministic variant of [`build`] with an explicit clock and nonce.
pub fn build_at(
	draft: PaymentDraft,
	ttl_seconds: u64,
	notes: PaymentNotes,
	now: u64,
	nonce: u32,
) -> Result<PaymentPayload, PaymentError> {
	validate_amount(&draft.amount)?;
	let recipient = parse_recipient(&draft.recipient)?;
	if ttl_seconds == 0 {
		return Err(PaymentError::InvalidTtl("ttl must be positive".to_string()));
	}
	let deadline = now
		.checked_add(ttl_seconds)
		.ok_or_else(|| PaymentError::InvalidTtl(format!("{} overflows the deadline", ttl_seconds)))?;

	let payload = PaymentPayload {
		payload_type: PAYMENT_TYPE.to_string(),
		version: PAYMENT_VERSION.to_string(),
		chain_id: draft.chain_id,
		payment: PaymentRequest {
			recipient,
			amount: draft.amount,
			chain_id: draft.chain_id,
			token_address: draft.token_address,
			nonce,
			deadline,
			memo: draft.memo,
			merchant_id: draft.merchant_id,
			order_id: draft.order_id,
		},
		metadata: PaymentMetadata {
			created_at: now,
			expires_at: deadline,
			merchant_name: notes.merchant_name,
			description: notes.description,
		},
	};

	tracing::info!(
		chain_id = payload.chain_id,
		amount = %payload.payment.amount,
		nonce,
		expires_at = deadline,
		"Built payment request"
	);
	Ok(payload)
}

/// Requires `amount` to be a positive decimal number in plain notation.
///
/// Only digits with an optional fractional part are accepted, so signs,
/// exponents, separators and bare leading or trailing dots are rejected.
pub fn validate_amount(amount: &str) -> Result<Decimal, PaymentError> {
	let plain = Regex::new(r"^[0-9]+(\.[0-9]+)?$")
		.map_err(|e| PaymentError::InvalidAmount(format!("Regex error: {}", e)))?;
	if !plain.is_match(amount) {
		return Err(PaymentError::InvalidAmount(format!(
			"'{}' is not a plain decimal number",
			amount
		)));
	}

	let value = Decimal::from_str(amount)
		.map_err(|_| PaymentError::InvalidAmount(format!("'{}' is not a decimal number", amount)))?;
	if value <= Decimal::ZERO {
		return Err(PaymentError::InvalidAmount(format!(
			"'{}' is not positive",
			amount
		)));
	}
	Ok(value)
}

/// Parses a recipient address.
///
/// Requires `0x` and 40 hex characters. All-lowercase and all-uppercase
/// forms are accepted as-is; mixed case must carry a valid EIP-55 checksum.
pub fn parse_recipient(text: &str) -> Result<Address, PaymentError> {
	let body = text
		.strip_prefix("0x")
		.filter(|body| body.len() == 40 && body.chars().all(|c| c.is_ascii_hexdigit()))
		.ok_or_else(|| PaymentError::InvalidAddress(format!("'{}' is not 0x + 40 hex", text)))?;

	let address = Address::from_str(text)
		.map_err(|e| PaymentError::InvalidAddress(format!("'{}': {}", text, e)))?;

	let has_lower = body.chars().any(|c| c.is_ascii_lowercase());
	let has_upper = body.chars().any(|c| c.is_ascii_uppercase());
	if has_lower && has_upper && address.to_checksum(None) != text {
		return Err(PaymentError::InvalidAddress(format!(
			"'{}' has an invalid checksum",
			text
		)));
	}
	Ok(address)
}
