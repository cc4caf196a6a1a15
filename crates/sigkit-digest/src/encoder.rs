//! Minimal ABI word encoder for EIP-712 `encodeData`.
//!
//! Every member of an encoded struct occupies exactly one 32-byte word:
//! dynamic values and nested structs are pushed as their hashes.

use alloy_primitives::{Address, B256, U256};

/// Accumulates 32-byte words.
pub struct Eip712AbiEncoder {
	buf: Vec<u8>,
}

impl Default for Eip712AbiEncoder {
	fn default() -> Self {
		Self::new()
	}
}

impl Eip712AbiEncoder {
	pub fn new() -> Self {
		Self { buf: Vec::new() }
	}

	pub fn with_words(words: usize) -> Self {
		Self {
			buf: Vec::with_capacity(words * 32),
		}
	}

	pub fn push_b256(&mut self, v: &B256) {
		self.buf.extend_from_slice(v.as_slice());
	}

	/// Left-pads the 20 address bytes to a word.
	pub fn push_address(&mut self, addr: &Address) {
		let mut word = [0u8; 32];
		word[12..].copy_from_slice(addr.as_slice());
		self.buf.extend_from_slice(&word);
	}

	pub fn push_u256(&mut self, v: U256) {
		let word: [u8; 32] = v.to_be_bytes::<32>();
		self.buf.extend_from_slice(&word);
	}

	pub fn finish(self) -> Vec<u8> {
		self.buf
	}
}
