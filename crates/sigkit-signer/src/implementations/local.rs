//! Local private-key signer.
//!
//! Signs in-process with a key read from configuration. Intended for
//! development and tests; it behaves like a wallet that approves every request.

use crate::{ExternalSigner, SignerError, SignerFactory, SignerRegistry};
use alloy_primitives::{Address, B256};
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;
use serde::Deserialize;
use sigkit_types::{ImplementationRegistry, SecretString, TypedData};

/// Chain the local signer reports when none is configured (BNB Smart Chain testnet).
pub const DEFAULT_CHAIN_ID: u64 = 97;

/// Configuration of the local signer.
#[derive(Debug, Clone, Deserialize)]
pub struct LocalSignerConfig {
	pub private_key: SecretString,
	#[serde(default = "default_chain_id")]
	pub chain_id: u64,
}

fn default_chain_id() -> u64 {
	DEFAULT_CHAIN_ID
}

/// Local signer backed by an in-memory private key.
#[derive(Debug)]
pub struct LocalSigner {
	signer: PrivateKeySigner,
	chain_id: u64,
}

impl LocalSigner {
	/// Creates a signer from a hex private key, with or without `0x`.
	pub fn new(private_key: &SecretString, chain_id: u64) -> Result<Self, SignerError> {
		let signer: PrivateKeySigner = private_key.with_exposed(|key| {
			key.parse()
				.map_err(|_| SignerError::InvalidKey("invalid private key format".to_string()))
		})?;
		Ok(Self { signer, chain_id })
	}

	pub fn address(&self) -> Address {
		self.signer.address()
	}

	fn sign_hash(&self, digest: &B256) -> Result<Vec<u8>, SignerError> {
		let signature = self
			.signer
			.sign_hash_sync(digest)
			.map_err(|e| SignerError::Implementation(e.to_string()))?;
		Ok(signature.as_bytes().to_vec())
	}
}

#[async_trait]
impl ExternalSigner for LocalSigner {
	async fn request_accounts(&self) -> Result<Vec<Address>, SignerError> {
		Ok(vec![self.signer.address()])
	}

	async fn chain_id(&self) -> Result<u64, SignerError> {
		Ok(self.chain_id)
	}

	async fn sign_structured_data(&self, data: &TypedData) -> Result<Vec<u8>, SignerError> {
		// A wallet hashes the typed data itself; so does this one.
		let digest = sigkit_digest::structured_digest(data)
			.map_err(|e| SignerError::Implementation(e.to_string()))?;
		self.sign_hash(&digest)
	}

	async fn sign_digest(&self, digest: &B256) -> Result<Vec<u8>, SignerError> {
		self.sign_hash(digest)
	}
}

/// Factory function to create a local signer from configuration.
///
/// Configuration parameters:
/// - `private_key`: hex private key (required)
/// - `chain_id`: chain id reported to callers (default 97)
pub fn create_signer(config: &toml::Value) -> Result<Box<dyn ExternalSigner>, SignerError> {
	let config: LocalSignerConfig = config
		.clone()
		.try_into()
		.map_err(|e| SignerError::Implementation(format!("Invalid local signer config: {}", e)))?;

	if config.private_key.is_empty() {
		return Err(SignerError::InvalidKey("private_key is empty".to_string()));
	}

	let signer = LocalSigner::new(&config.private_key, config.chain_id)?;
	tracing::info!(
		address = %sigkit_types::short_address(&signer.address()),
		chain_id = config.chain_id,
		"Local signer ready"
	);
	Ok(Box::new(signer))
}

/// Registry for the local signer implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "local";
	type Factory = SignerFactory;

	fn factory() -> Self::Factory {
		create_signer
	}
}

impl SignerRegistry for Registry {}
