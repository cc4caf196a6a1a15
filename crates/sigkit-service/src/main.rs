//! Main entry point for the sigkit command-line tool.
//!
//! This binary signs structured data and authorization delegations through
//! the configured signer, verifies signatures against recomputed digests and
//! creates USDT payment requests for QR display.

use clap::{Parser, Subcommand};
use sigkit_config::Config;
use sigkit_core::SigningOrchestrator;
use sigkit_signer::{find_implementation, SignerError, SignerService};
use std::path::PathBuf;
use std::sync::Arc;

mod commands;

use commands::{CommandError, PaymentArgs, SignArgs, VerifyArgs};

/// Command-line arguments for the sigkit tool.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// List the accounts and chain of the configured signer
	Accounts,
	/// Sign the test message (eip712) or an authorization (eip7702)
	Sign(SignArgs),
	/// Verify a signature and recover its signer
	Verify(VerifyArgs),
	/// Create a payment request payload
	Payment(PaymentArgs),
}

/// Main entry point for the sigkit tool.
///
/// Logs go to stderr so that stdout carries only the command output.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	use tracing_subscriber::{fmt, EnvFilter};

	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

	fmt()
		.with_env_filter(env_filter)
		.with_writer(std::io::stderr)
		.with_target(true)
		.init();

	let config = Config::from_file(&args.config).await?;
	tracing::debug!(
		config = %args.config.display(),
		signer = %config.signer.primary,
		"Loaded configuration"
	);

	let output = match &args.command {
		Command::Accounts => {
			let signer = build_signer(&config)?;
			serde_json::to_string_pretty(&commands::accounts(&signer).await?)?
		},
		Command::Sign(sign_args) => {
			let orchestrator = build_orchestrator(&config)?;
			serde_json::to_string_pretty(&commands::sign(&orchestrator, &config, sign_args).await?)?
		},
		Command::Verify(verify_args) => {
			let signer = build_signer(&config)?;
			serde_json::to_string_pretty(
				&commands::verify_signature(&signer, &config, verify_args).await?,
			)?
		},
		Command::Payment(payment_args) => commands::payment(&config, payment_args)?,
	};

	println!("{}", output);
	Ok(())
}

/// Instantiates the primary signer named in the configuration.
fn build_signer(config: &Config) -> Result<SignerService, CommandError> {
	let name = &config.signer.primary;
	let factory = find_implementation(name).ok_or_else(|| {
		SignerError::Implementation(format!("Unknown signer implementation '{}'", name))
	})?;
	let signer_config = config.primary_signer_config().ok_or_else(|| {
		SignerError::Implementation(format!("Signer '{}' is not configured", name))
	})?;

	let implementation = factory(signer_config)?;
	tracing::info!(implementation = %name, "Initialized signer");
	Ok(SignerService::new(implementation))
}

/// Wraps the primary signer in an orchestrator with the configured capabilities.
fn build_orchestrator(config: &Config) -> Result<SigningOrchestrator, CommandError> {
	let signer = build_signer(config)?;
	Ok(SigningOrchestrator::new(
		Arc::new(signer),
		config.capabilities,
	))
}
