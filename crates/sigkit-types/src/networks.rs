//! Network catalogue.
//!
//! Payment requests are issued on BNB Smart Chain and denominated in its
//! USDT deployment. The display names cover the chains a connected wallet
//! commonly reports.

use alloy_primitives::{address, Address};
use serde::{Deserialize, Serialize};

/// Static description of a network a payment can be issued on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkInfo {
	pub chain_id: u64,
	pub name: &'static str,
	pub symbol: &'static str,
	pub rpc_url: &'static str,
	pub block_explorer_url: &'static str,
	pub usdt_address: Address,
}

pub const BSC_MAINNET: NetworkInfo = NetworkInfo {
	chain_id: 56,
	name: "BNB Smart Chain",
	symbol: "BNB",
	rpc_url: "https://bsc-dataseed1.binance.org/",
	block_explorer_url: "https://bscscan.com",
	usdt_address: address!("55d398326f99059fF775485246999027B3197955"),
};

pub const BSC_TESTNET: NetworkInfo = NetworkInfo {
	chain_id: 97,
	name: "BNB Smart Chain Testnet",
	symbol: "tBNB",
	rpc_url: "https://data-seed-prebsc-1-s1.binance.org:8545/",
	block_explorer_url: "https://testnet.bscscan.com",
	usdt_address: address!("337610d27c682E347C9cD60BD4b3b107C9d34dDd"),
};

/// Selects which BNB network a payment request targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BnbNetwork {
	Mainnet,
	#[default]
	Testnet,
}

impl BnbNetwork {
	pub fn info(&self) -> &'static NetworkInfo {
		match self {
			BnbNetwork::Mainnet => &BSC_MAINNET,
			BnbNetwork::Testnet => &BSC_TESTNET,
		}
	}

	/// Looks up the BNB network for a chain id.
	pub fn from_chain_id(chain_id: u64) -> Option<Self> {
		match chain_id {
			56 => Some(BnbNetwork::Mainnet),
			97 => Some(BnbNetwork::Testnet),
			_ => None,
		}
	}
}

/// Display name for a chain id, `Network <id>` when unknown.
pub fn network_name(chain_id: u64) -> String {
	let known = match chain_id {
		1 => "Ethereum",
		5 => "Goerli",
		11155111 => "Sepolia",
		137 => "Polygon",
		80001 => "Mumbai",
		56 => "BSC",
		97 => "BSC Testnet",
		_ => return format!("Network {}", chain_id),
	};
	known.to_string()
}
