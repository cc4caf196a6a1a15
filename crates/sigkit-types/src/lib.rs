//! Common types module for the sigkit workspace.
//!
//! This module defines the data model shared by the digest builder, the
//! signature codec, the signing orchestrator and the payment payload model.
//! Values defined here are treated as immutable once constructed.

/// Authorization-delegation request types.
pub mod authorization;
/// Signer capability descriptor.
pub mod capabilities;
/// Network catalogue used by payment requests and display helpers.
pub mod networks;
/// Payment request and payload types.
pub mod payment;
/// Registry trait for self-registering signer implementations.
pub mod registry;
/// Signature scheme tag.
pub mod scheme;
/// Secret string wrapper for private key material.
pub mod secret_string;
/// Structured-data (EIP-712) domain, schema and message types.
pub mod structured;
/// Utility functions for formatting and time.
pub mod utils;

pub use alloy_primitives::{Address, Bytes, B256, I256, U256};
pub use authorization::AuthorizationRequest;
pub use capabilities::SignerCapabilities;
pub use networks::{network_name, BnbNetwork, NetworkInfo};
pub use payment::{PaymentMetadata, PaymentPayload, PaymentRequest, PAYMENT_TYPE, PAYMENT_VERSION};
pub use registry::ImplementationRegistry;
pub use scheme::{ParseSchemeError, SignatureScheme};
pub use secret_string::SecretString;
pub use structured::{
	FieldValue, FieldValueError, StructuredDomain, StructuredMessage, StructuredTypes, TypedData,
	TypedField, DOMAIN_TYPE_NAME,
};
pub use utils::{current_timestamp, short_address};
