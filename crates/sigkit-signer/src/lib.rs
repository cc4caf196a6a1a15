//! External signer module for the sigkit workspace.
//!
//! This module defines the boundary to whatever holds the signing key: a
//! browser wallet bridge, a hardware device, or the local development signer
//! shipped here. The core never sees key material; it asks the signer for
//! accounts, its chain id, and for signatures over structured data or raw
//! digests, and receives opaque signature bytes back.

use alloy_primitives::{Address, B256};
use async_trait::async_trait;
use sigkit_types::{ImplementationRegistry, TypedData};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod local;
}

/// Errors that can occur during signer operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignerError {
	/// The key holder explicitly refused the request.
	#[error("Signing request rejected: {0}")]
	Rejected(String),
	/// No signer is reachable or no account is connected.
	#[error("Signer unavailable: {0}")]
	Unavailable(String),
	/// Error that occurs when a cryptographic key is invalid or malformed.
	#[error("Invalid key: {0}")]
	InvalidKey(String),
	/// Error that occurs when interacting with the signer implementation.
	#[error("Implementation error: {0}")]
	Implementation(String),
}

/// Trait defining the interface for external signer implementations.
///
/// Calls may suspend for as long as the key holder takes to respond; callers
/// bound them with their own timeout.
#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait ExternalSigner: Send + Sync {
	/// Returns the accounts the signer controls. The first one is the active account.
	async fn request_accounts(&self) -> Result<Vec<Address>, SignerError>;

	/// Returns the chain id the signer is currently connected to.
	async fn chain_id(&self) -> Result<u64, SignerError>;

	/// Signs structured data the way `eth_signTypedData_v4` does.
	///
	/// The signer receives the full domain, type schema and message, so it can
	/// show them to the key holder, and hashes them itself.
	async fn sign_structured_data(&self, data: &TypedData) -> Result<Vec<u8>, SignerError>;

	/// Signs a precomputed 32-byte digest without any prefix.
	async fn sign_digest(&self, digest: &B256) -> Result<Vec<u8>, SignerError>;
}

/// Type alias for signer factory functions.
pub type SignerFactory = fn(&toml::Value) -> Result<Box<dyn ExternalSigner>, SignerError>;

/// Registry trait for signer implementations.
pub trait SignerRegistry: ImplementationRegistry<Factory = SignerFactory> {}

/// Get all registered signer implementations.
///
/// Returns a vector of (name, factory) tuples for all available signer implementations.
pub fn get_all_implementations() -> Vec<(&'static str, SignerFactory)> {
	use implementations::local;

	vec![(local::Registry::NAME, local::Registry::factory())]
}

/// Looks up a factory by its configuration name.
pub fn find_implementation(name: &str) -> Option<SignerFactory> {
	get_all_implementations()
		.into_iter()
		.find(|(registered, _)| *registered == name)
		.map(|(_, factory)| factory)
}

/// Service that manages signer operations.
///
/// This struct provides a high-level interface over an underlying
/// [`ExternalSigner`] implementation.
pub struct SignerService {
	/// The underlying signer implementation.
	implementation: Box<dyn ExternalSigner>,
}

impl SignerService {
	pub fn new(implementation: Box<dyn ExternalSigner>) -> Self {
		Self { implementation }
	}

	/// Lists the accounts exposed by the signer.
	pub async fn accounts(&self) -> Result<Vec<Address>, SignerError> {
		self.implementation.request_accounts().await
	}

	/// Returns the active account, failing with `Unavailable` when none is connected.
	pub async fn primary_account(&self) -> Result<Address, SignerError> {
		self.accounts()
			.await?
			.into_iter()
			.next()
			.ok_or_else(|| SignerError::Unavailable("no account connected".to_string()))
	}

	pub async fn chain_id(&self) -> Result<u64, SignerError> {
		self.implementation.chain_id().await
	}

	pub async fn sign_structured_data(&self, data: &TypedData) -> Result<Vec<u8>, SignerError> {
		tracing::debug!(
			domain = %data.domain.name,
			primary_type = data.primary_type.as_deref().unwrap_or("<derived>"),
			"Requesting structured data signature"
		);
		self.implementation.sign_structured_data(data).await
	}

	pub async fn sign_digest(&self, digest: &B256) -> Result<Vec<u8>, SignerError> {
		tracing::debug!(%digest, "Requesting digest signature");
		self.implementation.sign_digest(digest).await
	}
}
