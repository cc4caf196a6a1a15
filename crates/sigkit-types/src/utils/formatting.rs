//! String formatting utilities for addresses.

use alloy_primitives::Address;

/// Abbreviated checksummed address for display, e.g. `0xf39F...2266`.
pub fn short_address(address: &Address) -> String {
	let full = address.to_checksum(None);
	format!("{}...{}", &full[..6], &full[full.len() - 4..])
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_primitives::address;

	#[test]
	fn test_short_address() {
		let addr = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
		assert_eq!(short_address(&addr), "0xf39F...2266");
	}
}
