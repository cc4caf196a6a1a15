//! Configuration builder for test and development configurations.

use crate::{Config, DomainConfig, PaymentConfig, SignerConfig};
use sigkit_payment::QrOptions;
use sigkit_types::{BnbNetwork, SignerCapabilities};
use std::collections::HashMap;

/// Well-known development key (first account of the default Hardhat/Anvil mnemonic).
const DEV_PRIVATE_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

/// Builder for creating `Config` instances with a fluent API.
///
/// Defaults to the local signer with the development key on BNB testnet.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
	private_key: String,
	signer_chain_id: u64,
	timeout_seconds: u64,
	supports_authorization_delegation: bool,
	payment_network: BnbNetwork,
	ttl_seconds: u64,
	merchant_name: Option<String>,
}

impl Default for ConfigBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigBuilder {
	pub fn new() -> Self {
		Self {
			private_key: DEV_PRIVATE_KEY.to_string(),
			signer_chain_id: 97,
			timeout_seconds: 30,
			supports_authorization_delegation: true,
			payment_network: BnbNetwork::Testnet,
			ttl_seconds: sigkit_payment::DEFAULT_TTL_SECONDS,
			merchant_name: None,
		}
	}

	pub fn private_key(mut self, key: impl Into<String>) -> Self {
		self.private_key = key.into();
		self
	}

	pub fn signer_chain_id(mut self, chain_id: u64) -> Self {
		self.signer_chain_id = chain_id;
		self
	}

	pub fn timeout_seconds(mut self, timeout: u64) -> Self {
		self.timeout_seconds = timeout;
		self
	}

	pub fn supports_authorization_delegation(mut self, supported: bool) -> Self {
		self.supports_authorization_delegation = supported;
		self
	}

	pub fn payment_network(mut self, network: BnbNetwork) -> Self {
		self.payment_network = network;
		self
	}

	pub fn ttl_seconds(mut self, ttl: u64) -> Self {
		self.ttl_seconds = ttl;
		self
	}

	pub fn merchant_name(mut self, name: impl Into<String>) -> Self {
		self.merchant_name = Some(name.into());
		self
	}

	/// Builds the configuration. The result is not validated.
	pub fn build(self) -> Config {
		let mut local = toml::Table::new();
		local.insert("private_key".into(), toml::Value::String(self.private_key));
		local.insert(
			"chain_id".into(),
			toml::Value::Integer(self.signer_chain_id as i64),
		);

		let mut implementations = HashMap::new();
		implementations.insert("local".to_string(), toml::Value::Table(local));

		Config {
			signer: SignerConfig {
				primary: "local".to_string(),
				timeout_seconds: self.timeout_seconds,
				implementations,
			},
			capabilities: SignerCapabilities {
				supports_authorization_delegation: self.supports_authorization_delegation,
			},
			domain: DomainConfig::default(),
			payment: PaymentConfig {
				network: self.payment_network,
				ttl_seconds: self.ttl_seconds,
				merchant_name: self.merchant_name,
			},
			qr: QrOptions::default(),
		}
	}
}
