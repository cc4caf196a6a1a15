//! Payment request payloads for merchant QR codes.
//!
//! A merchant builds a time-bounded `tether_payment` request, serializes it
//! to compact JSON and hands the string to a QR renderer. A scanning wallet
//! parses the same string back and must refuse it once it has expired.

use thiserror::Error;

pub mod builder;
pub mod qr;
pub mod wire;

pub use builder::{build, build_at, parse_recipient, validate_amount, PaymentDraft, PaymentNotes};
pub use qr::{render_payment_qr, ErrorCorrectionLevel, QrError, QrOptions, QrRenderer};
pub use wire::{ensure_not_expired, parse, serialize};

/// Default lifetime of a payment request in seconds.
pub const DEFAULT_TTL_SECONDS: u64 = 30 * 60;

/// Errors that can occur while building, parsing or accepting a payment request.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PaymentError {
	/// Amount is not a positive decimal number.
	#[error("Invalid amount: {0}")]
	InvalidAmount(String),
	/// Recipient is not a well-formed address.
	#[error("Invalid address: {0}")]
	InvalidAddress(String),
	/// Lifetime is zero or overflows the deadline.
	#[error("Invalid ttl: {0}")]
	InvalidTtl(String),
	/// The serialized payload cannot be decoded or breaks an invariant.
	#[error("Malformed payload: {0}")]
	MalformedPayload(String),
	/// The payload could not be encoded as JSON.
	#[error("Serialization error: {0}")]
	Serialization(String),
	/// The request's deadline has passed.
	#[error("Payment request expired at {expires_at} (now {now})")]
	Expired { expires_at: u64, now: u64 },
}
