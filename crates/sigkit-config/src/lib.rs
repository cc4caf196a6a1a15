//! Configuration module for the sigkit toolkit.
//!
//! This module provides structures and utilities for loading the toolkit
//! configuration from TOML files and validating it before any signer or
//! payment component is built from it.
//!
//! ## Modular Configuration Support
//!
//! Configurations can be split into multiple files:
//! - Use `include = ["signer.toml", "payment.toml"]` to include other config files
//! - Each top-level section must be unique across all files (no duplicates allowed)
//!
//! String values may reference environment variables as `${VAR}` or
//! `${VAR:-default}`; signer keys are usually supplied that way.

pub mod builders;
mod loader;

pub use builders::ConfigBuilder;

use alloy_primitives::Address;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sigkit_payment::{QrOptions, DEFAULT_TTL_SECONDS};
use sigkit_types::{BnbNetwork, SignerCapabilities, StructuredDomain};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Keep the message, drop the echoed input.
		ConfigError::Parse(err.message().to_string())
	}
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// External signer selection and timeouts.
	pub signer: SignerConfig,
	/// What the configured signer can do.
	#[serde(default)]
	pub capabilities: SignerCapabilities,
	/// Default domain for structured-data signing.
	#[serde(default)]
	pub domain: DomainConfig,
	/// Payment request defaults.
	#[serde(default)]
	pub payment: PaymentConfig,
	/// QR rendering options.
	#[serde(default)]
	pub qr: QrOptions,
}

/// Configuration for the external signer.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SignerConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Seconds to wait for the signer before giving up on a request.
	#[serde(default = "default_signer_timeout_seconds")]
	pub timeout_seconds: u64,
	/// Map of signer implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

fn default_signer_timeout_seconds() -> u64 {
	120
}

/// Structured-data domain used when a request does not carry its own.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DomainConfig {
	#[serde(default = "default_domain_name")]
	pub name: String,
	#[serde(default = "default_domain_version")]
	pub version: String,
	/// Pinned chain id. When absent, the signer's current chain is used.
	#[serde(default)]
	pub chain_id: Option<u64>,
	#[serde(default)]
	pub verifying_contract: Address,
}

fn default_domain_name() -> String {
	"Wallet Signature Test".to_string()
}

fn default_domain_version() -> String {
	"1".to_string()
}

impl Default for DomainConfig {
	fn default() -> Self {
		Self {
			name: default_domain_name(),
			version: default_domain_version(),
			chain_id: None,
			verifying_contract: Address::ZERO,
		}
	}
}

impl DomainConfig {
	/// Builds the domain, falling back to `signer_chain_id` when no chain is pinned.
	pub fn to_domain(&self, signer_chain_id: u64) -> StructuredDomain {
		StructuredDomain::new(
			self.name.clone(),
			self.version.clone(),
			self.chain_id.unwrap_or(signer_chain_id),
			self.verifying_contract,
		)
	}
}

/// Payment request defaults.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PaymentConfig {
	#[serde(default)]
	pub network: BnbNetwork,
	/// Lifetime of generated requests. Defaults to 30 minutes.
	#[serde(default = "default_ttl_seconds")]
	pub ttl_seconds: u64,
	#[serde(default)]
	pub merchant_name: Option<String>,
}

fn default_ttl_seconds() -> u64 {
	DEFAULT_TTL_SECONDS
}

impl Default for PaymentConfig {
	fn default() -> Self {
		Self {
			network: BnbNetwork::default(),
			ttl_seconds: DEFAULT_TTL_SECONDS,
			merchant_name: None,
		}
	}
}

/// Resolves environment variables in a string.
///
/// Replaces ${VAR_NAME} with the value of the environment variable VAR_NAME.
/// Supports default values with ${VAR_NAME:-default_value}.
///
/// Input strings are limited to 1MB.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut out = String::with_capacity(input.len());
	let mut last = 0;

	for cap in re.captures_iter(input) {
		let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
			continue;
		};
		let value = match (std::env::var(var_name.as_str()), cap.get(2)) {
			(Ok(v), _) => v,
			(Err(_), Some(default)) => default.as_str().to_string(),
			(Err(_), None) => {
				return Err(ConfigError::Validation(format!(
					"Environment variable '{}' not found",
					var_name.as_str()
				)))
			},
		};

		out.push_str(&input[last..full_match.start()]);
		out.push_str(&value);
		last = full_match.end();
	}
	out.push_str(&input[last..]);

	Ok(out)
}

impl Config {
	/// Loads configuration from a file, following `include` directives.
	///
	/// Each top-level section must be unique across all configuration files.
	pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let base_dir = path.parent().unwrap_or_else(|| Path::new("."));

		let mut loader = loader::ConfigLoader::new(base_dir);
		let file_name = path.file_name().ok_or_else(|| {
			ConfigError::Validation(format!("Invalid path: {}", path.display()))
		})?;
		loader.load_config(file_name).await
	}

	/// Signer timeout as a duration.
	pub fn signer_timeout(&self) -> std::time::Duration {
		std::time::Duration::from_secs(self.signer.timeout_seconds)
	}

	/// Configuration of the primary signer implementation.
	pub fn primary_signer_config(&self) -> Option<&toml::Value> {
		self.signer.implementations.get(&self.signer.primary)
	}

	/// Validates the configuration:
	/// - the primary signer is named and configured
	/// - the signer timeout is between 1 second and 1 hour
	/// - the domain has a name and version
	/// - payment ttl is positive
	/// - QR options are well formed
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.signer.primary.is_empty() {
			return Err(ConfigError::Validation(
				"Signer primary implementation cannot be empty".into(),
			));
		}
		if !self
			.signer
			.implementations
			.contains_key(&self.signer.primary)
		{
			return Err(ConfigError::Validation(format!(
				"Primary signer '{}' not found in implementations",
				self.signer.primary
			)));
		}
		if self.signer.timeout_seconds == 0 || self.signer.timeout_seconds > 3600 {
			return Err(ConfigError::Validation(
				"Signer timeout_seconds must be between 1 and 3600".into(),
			));
		}

		if self.domain.name.is_empty() || self.domain.version.is_empty() {
			return Err(ConfigError::Validation(
				"Domain name and version cannot be empty".into(),
			));
		}

		if self.payment.ttl_seconds == 0 {
			return Err(ConfigError::Validation(
				"Payment ttl_seconds must be greater than 0".into(),
			));
		}

		self.qr
			.validate()
			.map_err(|e| ConfigError::Validation(e.to_string()))?;

		Ok(())
	}
}

/// Parses a TOML string. Environment variables are resolved and the
/// configuration is validated after parsing.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use sigkit_payment::ErrorCorrectionLevel;

	const MINIMAL: &str = r#"
[signer]
primary = "local"
[signer.implementations.local]
private_key = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"
"#;

	#[test]
	fn test_env_var_resolution() {
		std::env::set_var("SIGKIT_TEST_HOST", "localhost");
		std::env::set_var("SIGKIT_TEST_PORT", "5432");

		let input = "host = \"${SIGKIT_TEST_HOST}:${SIGKIT_TEST_PORT}\"";
		let result = resolve_env_vars(input).unwrap();
		assert_eq!(result, "host = \"localhost:5432\"");

		std::env::remove_var("SIGKIT_TEST_HOST");
		std::env::remove_var("SIGKIT_TEST_PORT");
	}

	#[test]
	fn test_env_var_with_default() {
		let input = "value = \"${SIGKIT_MISSING_VAR:-default_value}\"";
		let result = resolve_env_vars(input).unwrap();
		assert_eq!(result, "value = \"default_value\"");
	}

	#[test]
	fn test_missing_env_var_error() {
		let input = "value = \"${SIGKIT_MISSING_VAR}\"";
		let result = resolve_env_vars(input);
		assert!(result.is_err());
		assert!(result.unwrap_err().to_string().contains("SIGKIT_MISSING_VAR"));
	}

	#[test]
	fn test_minimal_config_defaults() {
		let config: Config = MINIMAL.parse().unwrap();

		assert_eq!(config.signer.primary, "local");
		assert_eq!(config.signer.timeout_seconds, 120);
		assert!(config.capabilities.supports_authorization_delegation);
		assert_eq!(config.domain.name, "Wallet Signature Test");
		assert_eq!(config.domain.to_domain(97).chain_id, 97);
		assert_eq!(config.payment.network, BnbNetwork::Testnet);
		assert_eq!(config.payment.ttl_seconds, 1800);
		assert_eq!(config.qr, QrOptions::default());
		assert!(config.primary_signer_config().is_some());
	}

	#[test]
	fn test_full_config() {
		std::env::set_var("SIGKIT_TEST_MERCHANT", "Corner Cafe");

		let config_str = r#"
[signer]
primary = "local"
timeout_seconds = 45
[signer.implementations.local]
private_key = "${SIGKIT_TEST_KEY:-0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80}"
chain_id = 56

[capabilities]
supports_authorization_delegation = false

[domain]
name = "Shop"
version = "2"
chain_id = 1
verifying_contract = "0xCcCCccccCCCCcCCCCCCcCcCccCcCCCcCcccccccC"

[payment]
network = "mainnet"
ttl_seconds = 600
merchant_name = "${SIGKIT_TEST_MERCHANT}"

[qr]
width = 200
error_correction = "H"
"#;

		let config: Config = config_str.parse().unwrap();
		assert_eq!(config.signer_timeout(), std::time::Duration::from_secs(45));
		assert!(!config.capabilities.supports_authorization_delegation);
		assert_eq!(config.domain.to_domain(97).chain_id, 1);
		assert_eq!(config.payment.network, BnbNetwork::Mainnet);
		assert_eq!(config.payment.merchant_name.as_deref(), Some("Corner Cafe"));
		assert_eq!(config.qr.width, 200);
		assert_eq!(config.qr.margin, 2);
		assert_eq!(config.qr.error_correction, ErrorCorrectionLevel::H);

		std::env::remove_var("SIGKIT_TEST_MERCHANT");
	}

	#[test]
	fn test_validation_errors() {
		let missing_primary = r#"
[signer]
primary = "ledger"
[signer.implementations.local]
private_key = "0x01"
"#;
		let err = missing_primary.parse::<Config>().unwrap_err();
		assert!(err.to_string().contains("'ledger' not found"));

		let zero_timeout = MINIMAL.replace("primary = \"local\"", "primary = \"local\"\ntimeout_seconds = 0");
		assert!(zero_timeout.parse::<Config>().is_err());

		let zero_ttl = format!("{}\n[payment]\nttl_seconds = 0\n", MINIMAL);
		assert!(zero_ttl.parse::<Config>().is_err());

		let bad_colour = format!("{}\n[qr]\ndark = \"black\"\n", MINIMAL);
		assert!(bad_colour.parse::<Config>().is_err());
	}

	#[test]
	fn test_parse_error_is_reported() {
		let result = "[signer\nprimary = 1".parse::<Config>();
		assert!(matches!(result, Err(ConfigError::Parse(_))));
	}
}
