//! Subcommand implementations.
//!
//! Each command returns its output instead of printing it, so the binary
//! decides on formatting and the commands can be tested directly.

use alloy_primitives::Address;
use serde_json::{json, Value};
use sigkit_codec::SignatureDetails;
use sigkit_config::Config;
use sigkit_core::{verify, SigningError, SigningOrchestrator, SigningRequest};
use sigkit_payment::{build, serialize, PaymentDraft, PaymentError, PaymentNotes};
use sigkit_signer::{SignerError, SignerService};
use sigkit_types::{
	current_timestamp, network_name, short_address, AuthorizationRequest, BnbNetwork,
	FieldValue, SignatureScheme, StructuredDomain, StructuredMessage, StructuredTypes, TypedData,
	TypedField,
};
use thiserror::Error;

/// Errors surfaced by the CLI.
#[derive(Debug, Error)]
pub enum CommandError {
	#[error(transparent)]
	Signer(#[from] SignerError),
	#[error(transparent)]
	Signing(#[from] SigningError),
	#[error(transparent)]
	Payment(#[from] PaymentError),
	#[error("Missing argument: {0}")]
	MissingArgument(&'static str),
}

/// Arguments of `sigkit sign`.
#[derive(clap::Args, Debug, Clone)]
pub struct SignArgs {
	/// Signature scheme (eip712 or eip7702)
	#[arg(long, default_value = "eip712")]
	pub scheme: SignatureScheme,

	/// Message content for eip712
	#[arg(long, default_value = "Hello from sigkit")]
	pub content: String,

	/// Message timestamp for eip712, defaults to now
	#[arg(long)]
	pub timestamp: Option<u64>,

	/// Authorization nonce for eip7702
	#[arg(long, default_value_t = 0)]
	pub nonce: u64,
}

/// Arguments of `sigkit verify`.
#[derive(clap::Args, Debug, Clone)]
pub struct VerifyArgs {
	/// Signature scheme (eip712 or eip7702)
	#[arg(long)]
	pub scheme: SignatureScheme,

	/// Signature as 0x-prefixed hex (65 bytes)
	#[arg(long)]
	pub signature: String,

	/// Signed message content for eip712
	#[arg(long)]
	pub content: Option<String>,

	/// Signed message timestamp for eip712
	#[arg(long)]
	pub timestamp: Option<u64>,

	/// Chain id the signature was made on, defaults to the configured domain or signer chain
	#[arg(long)]
	pub chain_id: Option<u64>,

	/// Delegating account for eip7702, defaults to --expected
	#[arg(long)]
	pub delegator: Option<Address>,

	/// Authorization nonce for eip7702
	#[arg(long, default_value_t = 0)]
	pub nonce: u64,

	/// Address the signature must recover to
	#[arg(long)]
	pub expected: Option<Address>,
}

/// Arguments of `sigkit payment`.
#[derive(clap::Args, Debug, Clone)]
pub struct PaymentArgs {
	/// Recipient address
	#[arg(long)]
	pub recipient: String,

	/// Amount in USDT, e.g. 10.00
	#[arg(long)]
	pub amount: String,

	#[arg(long)]
	pub memo: Option<String>,

	#[arg(long)]
	pub order_id: Option<String>,

	#[arg(long)]
	pub merchant_id: Option<String>,

	/// Description shown to the payer
	#[arg(long)]
	pub description: Option<String>,

	/// Lifetime in seconds, defaults to the configured ttl
	#[arg(long)]
	pub ttl: Option<u64>,

	/// Issue on BNB Smart Chain mainnet instead of the configured network
	#[arg(long)]
	pub mainnet: bool,
}

/// The "Wallet Signature Test" message: `Message(string content,uint256 timestamp)`.
pub fn wallet_test_message(domain: StructuredDomain, content: &str, timestamp: u64) -> TypedData {
	let mut types = StructuredTypes::new();
	types.insert(
		"Message".to_string(),
		vec![
			TypedField::new("content", "string"),
			TypedField::new("timestamp", "uint256"),
		],
	);

	let mut message = StructuredMessage::new();
	message.insert("content".to_string(), FieldValue::from(content));
	message.insert("timestamp".to_string(), FieldValue::from(timestamp));

	TypedData::new(domain, types, message).with_primary_type("Message")
}

/// Lists the signer's accounts and chain.
pub async fn accounts(signer: &SignerService) -> Result<Value, CommandError> {
	let accounts = signer.accounts().await?;
	let chain_id = signer.chain_id().await?;

	for account in &accounts {
		tracing::debug!(account = %short_address(account), "Found account");
	}

	Ok(json!({
		"chainId": chain_id,
		"network": network_name(chain_id),
		"accounts": accounts,
	}))
}

/// Signs the test message or an authorization for the first account.
pub async fn sign(
	orchestrator: &SigningOrchestrator,
	config: &Config,
	args: &SignArgs,
) -> Result<Value, CommandError> {
	let signer = orchestrator.signer();
	let account = signer.primary_account().await?;
	let chain_id = signer.chain_id().await?;

	let request = match args.scheme {
		SignatureScheme::StructuredData => {
			let timestamp = args.timestamp.unwrap_or_else(current_timestamp);
			SigningRequest::StructuredData(wallet_test_message(
				config.domain.to_domain(chain_id),
				&args.content,
				timestamp,
			))
		},
		SignatureScheme::AuthorizationDelegation => SigningRequest::AuthorizationDelegation(
			AuthorizationRequest::new(chain_id, account, args.nonce),
		),
	};

	let signed = orchestrator.sign(&request, config.signer_timeout()).await?;
	tracing::info!(
		scheme = %signed.scheme,
		signer = %short_address(&account),
		"Signed with {}",
		signed.scheme.display_name()
	);

	Ok(json!({
		"scheme": signed.scheme,
		"signer": account,
		"network": network_name(chain_id),
		"digest": signed.digest,
		"signature": signed.serialized,
		"details": signed.details(),
		"request": request,
	}))
}

/// Recomputes the digest from the arguments and recovers the signer.
pub async fn verify_signature(
	signer: &SignerService,
	config: &Config,
	args: &VerifyArgs,
) -> Result<Value, CommandError> {
	let chain_id = match args.chain_id.or(config.domain.chain_id) {
		Some(chain_id) => chain_id,
		None => signer.chain_id().await?,
	};

	let context = match args.scheme {
		SignatureScheme::StructuredData => {
			let content = args
				.content
				.as_deref()
				.ok_or(CommandError::MissingArgument("--content"))?;
			let timestamp = args
				.timestamp
				.ok_or(CommandError::MissingArgument("--timestamp"))?;
			SigningRequest::StructuredData(wallet_test_message(
				config.domain.to_domain(chain_id),
				content,
				timestamp,
			))
		},
		SignatureScheme::AuthorizationDelegation => {
			let delegator = args
				.delegator
				.or(args.expected)
				.ok_or(CommandError::MissingArgument("--delegator"))?;
			SigningRequest::AuthorizationDelegation(AuthorizationRequest::new(
				chain_id, delegator, args.nonce,
			))
		},
	};

	let mut result = verify(&context, &args.signature);
	if let Some(expected) = args.expected {
		result = result.expect_signer(expected);
	}
	tracing::info!(scheme = %args.scheme, valid = result.valid, "Verification finished");

	let details = sigkit_codec::parse(&args.signature)
		.ok()
		.map(|signature| SignatureDetails::from(&signature));

	Ok(json!({
		"result": result,
		"details": details,
	}))
}

/// Builds a payment request and returns its serialized payload.
pub fn payment(config: &Config, args: &PaymentArgs) -> Result<String, CommandError> {
	let network = if args.mainnet {
		BnbNetwork::Mainnet
	} else {
		config.payment.network
	};

	let mut draft = PaymentDraft::for_network(network, args.recipient.clone(), args.amount.clone());
	if let Some(memo) = &args.memo {
		draft = draft.with_memo(memo.clone());
	}
	if let Some(order_id) = &args.order_id {
		draft = draft.with_order_id(order_id.clone());
	}
	if let Some(merchant_id) = &args.merchant_id {
		draft = draft.with_merchant_id(merchant_id.clone());
	}

	let notes = PaymentNotes {
		merchant_name: config.payment.merchant_name.clone(),
		description: args.description.clone(),
	};
	let ttl = args.ttl.unwrap_or(config.payment.ttl_seconds);

	let payload = build(draft, ttl, notes)?;
	tracing::info!(
		network = network.info().name,
		amount = %payload.payment.amount,
		expires_at = payload.metadata.expires_at,
		"Created payment request"
	);

	Ok(serialize(&payload)?)
}
