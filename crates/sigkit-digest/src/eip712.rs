//! EIP-712 structured hashing.
//!
//! Implements `encodeType`, `typeHash`, `encodeData` and `hashStruct` over a
//! runtime [`StructuredTypes`] schema, plus the domain separator for the fixed
//! four-field domain and the final `0x1901` digest.

use crate::{encoder::Eip712AbiEncoder, DigestError};
use alloy_primitives::{hex, keccak256, Address, B256, U256};
use sigkit_types::{
	FieldValue, StructuredDomain, StructuredMessage, StructuredTypes, TypedData, TypedField,
	DOMAIN_TYPE_NAME,
};
use std::collections::BTreeSet;
use std::str::FromStr;

/// Type string of the domain struct. Field order is fixed.
pub const DOMAIN_TYPE: &str =
	"EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)";

/// Compute the domain separator:
/// `keccak256(typeHash || keccak(name) || keccak(version) || chainId || verifyingContract)`.
pub fn domain_separator(domain: &StructuredDomain) -> B256 {
	let mut enc = Eip712AbiEncoder::with_words(5);
	enc.push_b256(&keccak256(DOMAIN_TYPE.as_bytes()));
	enc.push_b256(&keccak256(domain.name.as_bytes()));
	enc.push_b256(&keccak256(domain.version.as_bytes()));
	enc.push_u256(U256::from(domain.chain_id));
	enc.push_address(&domain.verifying_contract);
	keccak256(enc.finish())
}

/// Compute the final EIP-712 digest: keccak256(0x1901 || domainHash || structHash).
pub fn compute_final_digest(domain_hash: &B256, struct_hash: &B256) -> B256 {
	let mut out = Vec::with_capacity(2 + 32 + 32);
	out.push(0x19);
	out.push(0x01);
	out.extend_from_slice(domain_hash.as_slice());
	out.extend_from_slice(struct_hash.as_slice());
	keccak256(out)
}

/// Full structured-data digest for `data`.
///
/// The schema is validated and the message checked against it before any
/// hashing happens.
pub fn structured_digest(data: &TypedData) -> Result<B256, DigestError> {
	let primary_type = resolve_primary_type(data)?;
	validate_types(&data.types)?;
	let struct_hash = hash_struct(&primary_type, &data.types, &data.message)?;
	let domain_hash = domain_separator(&data.domain);
	Ok(compute_final_digest(&domain_hash, &struct_hash))
}

/// Returns the explicit primary type, or the single struct type not referenced
/// by any other type.
pub fn resolve_primary_type(data: &TypedData) -> Result<String, DigestError> {
	if let Some(primary) = &data.primary_type {
		if !data.types.contains_key(primary) {
			return Err(mismatch(format!(
				"primary type '{}' is not defined",
				primary
			)));
		}
		return Ok(primary.clone());
	}

	let referenced: BTreeSet<&str> = data
		.types
		.iter()
		.flat_map(|(owner, fields)| {
			fields
				.iter()
				.map(|f| base_type(&f.type_name))
				.filter(move |base| *base != owner.as_str())
		})
		.collect();

	let candidates: Vec<&String> = data
		.types
		.keys()
		.filter(|name| name.as_str() != DOMAIN_TYPE_NAME && !referenced.contains(name.as_str()))
		.collect();

	match candidates.as_slice() {
		[single] => Ok((*single).clone()),
		[] => Err(mismatch("no primary type found in schema")),
		many => Err(mismatch(format!(
			"ambiguous primary type, candidates: {}",
			many.iter()
				.map(|s| s.as_str())
				.collect::<Vec<_>>()
				.join(", ")
		))),
	}
}

/// `encodeType`: the primary type followed by every referenced struct type
/// sorted by name.
pub fn encode_type(primary: &str, types: &StructuredTypes) -> Result<String, DigestError> {
	let mut deps = BTreeSet::new();
	collect_dependencies(primary, types, &mut deps);
	if !deps.remove(primary) {
		return Err(mismatch(format!("unknown struct type '{}'", primary)));
	}

	let mut out = String::new();
	for name in std::iter::once(primary).chain(deps.iter().map(String::as_str)) {
		let fields = &types[name];
		out.push_str(name);
		out.push('(');
		let members: Vec<String> = fields
			.iter()
			.map(|f| format!("{} {}", f.type_name, f.name))
			.collect();
		out.push_str(&members.join(","));
		out.push(')');
	}
	Ok(out)
}

/// `typeHash = keccak256(encodeType(primary))`.
pub fn type_hash(primary: &str, types: &StructuredTypes) -> Result<B256, DigestError> {
	Ok(keccak256(encode_type(primary, types)?.as_bytes()))
}

/// `hashStruct = keccak256(typeHash || encodeData(message))`.
///
/// Fields are encoded in schema order. A message field missing from the
/// schema, or a schema field missing from the message, is a schema mismatch.
pub fn hash_struct(
	primary: &str,
	types: &StructuredTypes,
	message: &StructuredMessage,
) -> Result<B256, DigestError> {
	let fields = types
		.get(primary)
		.ok_or_else(|| mismatch(format!("unknown struct type '{}'", primary)))?;
	check_fields(primary, fields, message)?;

	let mut enc = Eip712AbiEncoder::with_words(fields.len() + 1);
	enc.push_b256(&type_hash(primary, types)?);
	for field in fields {
		let value = &message[&field.name];
		let word = encode_value(&field.type_name, value, types)
			.map_err(|e| prefix_field(primary, &field.name, e))?;
		enc.push_b256(&word);
	}
	Ok(keccak256(enc.finish()))
}

fn check_fields(
	primary: &str,
	fields: &[TypedField],
	message: &StructuredMessage,
) -> Result<(), DigestError> {
	for field in fields {
		if !message.contains_key(&field.name) {
			return Err(mismatch(format!(
				"field '{}' of type '{}' is missing from the message",
				field.name, primary
			)));
		}
	}
	for key in message.keys() {
		if !fields.iter().any(|f| &f.name == key) {
			return Err(mismatch(format!(
				"field '{}' is not declared in type '{}'",
				key, primary
			)));
		}
	}
	Ok(())
}

/// Rejects schemas with duplicate field names or undefined member types.
fn validate_types(types: &StructuredTypes) -> Result<(), DigestError> {
	for (name, fields) in types {
		if name == DOMAIN_TYPE_NAME {
			continue;
		}
		let mut seen = BTreeSet::new();
		for field in fields {
			if !seen.insert(field.name.as_str()) {
				return Err(mismatch(format!(
					"duplicate field '{}' in type '{}'",
					field.name, name
				)));
			}
			let base = base_type(&field.type_name);
			if !types.contains_key(base) && AtomicType::parse(base).is_none() {
				return Err(mismatch(format!(
					"unknown type '{}' for field '{}' in type '{}'",
					field.type_name, field.name, name
				)));
			}
		}
	}
	Ok(())
}

fn collect_dependencies(name: &str, types: &StructuredTypes, found: &mut BTreeSet<String>) {
	if found.contains(name) {
		return;
	}
	let Some(fields) = types.get(name) else {
		return;
	};
	found.insert(name.to_string());
	for field in fields {
		collect_dependencies(base_type(&field.type_name), types, found);
	}
}

/// Encodes one member as a 32-byte word.
fn encode_value(
	type_name: &str,
	value: &FieldValue,
	types: &StructuredTypes,
) -> Result<B256, DigestError> {
	if let Some((inner, fixed_len)) = split_array(type_name) {
		let FieldValue::Array(items) = value else {
			return Err(type_error(type_name, value));
		};
		if let Some(expected) = fixed_len {
			if items.len() != expected {
				return Err(mismatch(format!(
					"expected {} elements for '{}', got {}",
					expected,
					type_name,
					items.len()
				)));
			}
		}
		let mut enc = Eip712AbiEncoder::with_words(items.len());
		for item in items {
			enc.push_b256(&encode_value(inner, item, types)?);
		}
		return Ok(keccak256(enc.finish()));
	}

	if types.contains_key(type_name) {
		let FieldValue::Struct(fields) = value else {
			return Err(type_error(type_name, value));
		};
		return hash_struct(type_name, types, fields);
	}

	let atomic = AtomicType::parse(type_name)
		.ok_or_else(|| mismatch(format!("unknown type '{}'", type_name)))?;
	atomic.encode(type_name, value)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AtomicType {
	Address,
	Bool,
	String,
	Bytes,
	FixedBytes(usize),
	Uint(usize),
	Int(usize),
}

impl AtomicType {
	fn parse(type_name: &str) -> Option<Self> {
		match type_name {
			"address" => return Some(AtomicType::Address),
			"bool" => return Some(AtomicType::Bool),
			"string" => return Some(AtomicType::String),
			"bytes" => return Some(AtomicType::Bytes),
			_ => {},
		}
		if let Some(n) = type_name.strip_prefix("bytes") {
			return parse_size(n)
				.filter(|n| (1..=32).contains(n))
				.map(AtomicType::FixedBytes);
		}
		if let Some(n) = type_name.strip_prefix("uint") {
			return parse_size(n).filter(valid_bits).map(AtomicType::Uint);
		}
		if let Some(n) = type_name.strip_prefix("int") {
			return parse_size(n).filter(valid_bits).map(AtomicType::Int);
		}
		None
	}

	fn encode(self, type_name: &str, value: &FieldValue) -> Result<B256, DigestError> {
		match self {
			AtomicType::String => match value {
				FieldValue::String(s) => Ok(keccak256(s.as_bytes())),
				_ => Err(type_error(type_name, value)),
			},
			AtomicType::Bytes => Ok(keccak256(bytes_of(type_name, value)?)),
			AtomicType::Bool => match value {
				FieldValue::Bool(b) => Ok(B256::from(U256::from(*b as u8))),
				_ => Err(type_error(type_name, value)),
			},
			AtomicType::Address => {
				let address = match value {
					FieldValue::Address(a) => *a,
					FieldValue::String(s) if s.starts_with("0x") || s.starts_with("0X") => {
						Address::from_str(s).map_err(|_| {
							mismatch(format!("'{}' is not a valid address", s))
						})?
					},
					_ => return Err(type_error(type_name, value)),
				};
				Ok(address.into_word())
			},
			AtomicType::FixedBytes(size) => {
				let bytes = bytes_of(type_name, value)?;
				if bytes.len() != size {
					return Err(mismatch(format!(
						"expected {} bytes for '{}', got {}",
						size,
						type_name,
						bytes.len()
					)));
				}
				let mut word = B256::ZERO;
				word[..size].copy_from_slice(&bytes);
				Ok(word)
			},
			AtomicType::Uint(bits) => {
				let (negative, magnitude) = integer_of(type_name, value)?;
				if negative && !magnitude.is_zero() {
					return Err(mismatch(format!(
						"negative value for unsigned type '{}'",
						type_name
					)));
				}
				if magnitude.bit_len() > bits {
					return Err(out_of_range(type_name));
				}
				Ok(B256::from(magnitude))
			},
			AtomicType::Int(bits) => {
				let (negative, magnitude) = integer_of(type_name, value)?;
				let limit = U256::from(1u8) << (bits - 1);
				let in_range = if negative {
					magnitude <= limit
				} else {
					magnitude < limit
				};
				if !in_range {
					return Err(out_of_range(type_name));
				}
				let word = if negative {
					magnitude.wrapping_neg()
				} else {
					magnitude
				};
				Ok(B256::from(word))
			},
		}
	}
}

fn valid_bits(bits: &usize) -> bool {
	(8..=256).contains(bits) && bits % 8 == 0
}

fn parse_size(s: &str) -> Option<usize> {
	if s.is_empty() || s.starts_with('0') {
		return None;
	}
	s.parse().ok()
}

/// Splits `T[]` / `T[n]` into `(T, n)`; `None` for non-array types.
fn split_array(type_name: &str) -> Option<(&str, Option<usize>)> {
	let without_close = type_name.strip_suffix(']')?;
	let open = without_close.rfind('[')?;
	let inner = &type_name[..open];
	let len = &without_close[open + 1..];
	if len.is_empty() {
		Some((inner, None))
	} else {
		len.parse().ok().map(|n| (inner, Some(n)))
	}
}

/// Struct or atomic name with every array suffix removed.
fn base_type(type_name: &str) -> &str {
	match type_name.find('[') {
		Some(idx) => &type_name[..idx],
		None => type_name,
	}
}

fn bytes_of(type_name: &str, value: &FieldValue) -> Result<Vec<u8>, DigestError> {
	match value {
		FieldValue::Bytes(b) => Ok(b.to_vec()),
		FieldValue::String(s) if s.starts_with("0x") || s.starts_with("0X") => {
			let body = &s[2..];
			if !body.bytes().all(|b| b.is_ascii_hexdigit()) {
				return Err(mismatch(format!("'{}' is not valid hex for '{}'", s, type_name)));
			}
			hex::decode(body)
				.map_err(|_| mismatch(format!("'{}' is not valid hex for '{}'", s, type_name)))
		},
		_ => Err(type_error(type_name, value)),
	}
}

/// Sign and magnitude of an integer-like value.
fn integer_of(type_name: &str, value: &FieldValue) -> Result<(bool, U256), DigestError> {
	match value {
		FieldValue::Integer(i) => Ok((*i < 0, U256::from(i.unsigned_abs()))),
		FieldValue::BigUint(u) => Ok((false, *u)),
		FieldValue::BigInt(i) => Ok((i.is_negative(), i.unsigned_abs())),
		FieldValue::String(s) => {
			let (negative, digits) = match s.strip_prefix('-') {
				Some(rest) => (true, rest),
				None => (false, s.as_str()),
			};
			let magnitude = U256::from_str(digits).map_err(|_| {
				mismatch(format!("'{}' is not a valid integer for '{}'", s, type_name))
			})?;
			Ok((negative, magnitude))
		},
		_ => Err(type_error(type_name, value)),
	}
}

fn mismatch(message: impl Into<String>) -> DigestError {
	DigestError::SchemaMismatch(message.into())
}

fn type_error(type_name: &str, value: &FieldValue) -> DigestError {
	mismatch(format!(
		"cannot encode {} value as '{}'",
		value.kind(),
		type_name
	))
}

fn out_of_range(type_name: &str) -> DigestError {
	mismatch(format!("value out of range for '{}'", type_name))
}

fn prefix_field(owner: &str, field: &str, err: DigestError) -> DigestError {
	match err {
		DigestError::SchemaMismatch(msg) if !msg.starts_with("field '") => {
			mismatch(format!("field '{}.{}': {}", owner, field, msg))
		},
		other => other,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_primitives::{address, b256, Address};
	use serde_json::json;

	fn wallet_test_data(timestamp: FieldValue) -> TypedData {
		let domain = StructuredDomain::new("Wallet Signature Test", "1", 1, Address::ZERO);
		let mut types = StructuredTypes::new();
		types.insert(
			"Message".to_string(),
			vec![
				TypedField::new("content", "string"),
				TypedField::new("timestamp", "uint256"),
			],
		);
		let mut message = StructuredMessage::new();
		message.insert("content".to_string(), FieldValue::from("hello"));
		message.insert("timestamp".to_string(), timestamp);
		TypedData::new(domain, types, message)
	}

	fn mail_data() -> TypedData {
		serde_json::from_value(json!({
			"domain": {
				"name": "Ether Mail",
				"version": "1",
				"chainId": 1,
				"verifyingContract": "0xCcCCccccCCCCcCCCCCCcCcCccCcCCCcCcccccccC"
			},
			"types": {
				"Person": [
					{ "name": "name", "type": "string" },
					{ "name": "wallet", "type": "address" }
				],
				"Mail": [
					{ "name": "from", "type": "Person" },
					{ "name": "to", "type": "Person" },
					{ "name": "contents", "type": "string" }
				]
			},
			"message": {
				"from": { "name": "Cow", "wallet": "0xCD2a3d9F938E13CD947Ec05AbC7FE734Df8DD826" },
				"to": { "name": "Bob", "wallet": "0xbBbBBBBbbBBBbbbBbbBbbbbBBbBbbbbBbBbbBBbB" },
				"contents": "Hello, Bob!"
			}
		}))
		.unwrap()
	}

	#[test]
	fn test_reference_mail_vector() {
		let data = mail_data();

		assert_eq!(
			encode_type("Mail", &data.types).unwrap(),
			"Mail(Person from,Person to,string contents)Person(string name,address wallet)"
		);
		assert_eq!(resolve_primary_type(&data).unwrap(), "Mail");
		assert_eq!(
			domain_separator(&data.domain),
			b256!("f2cee375fa42b42143804025fc449deafd50cc031ca257e0b194a650a912090f")
		);
		assert_eq!(
			hash_struct("Mail", &data.types, &data.message).unwrap(),
			b256!("c52c0ee5d84264471806290a3f2c4cecfc5490626bf912d01f240d7a274b371e")
		);
		assert_eq!(
			structured_digest(&data).unwrap(),
			b256!("be609aee343fb3c4b28e1df9e632fca64fcfaede20f02e86244efddf30957bd2")
		);
	}

	#[test]
	fn test_wallet_signature_test_vector() {
		let data = wallet_test_data(FieldValue::Integer(1_700_000_000));

		assert_eq!(
			domain_separator(&data.domain),
			b256!("55b4ad4fd6ac97c8d246881d1be9f5fefa6d7a023bf3a0464f7dd397ee6d371a")
		);
		assert_eq!(
			hash_struct("Message", &data.types, &data.message).unwrap(),
			b256!("f9da430ffaa8e42852eec41b133a270bd0b10ac47bc954a21387ea6b2de31282")
		);
		assert_eq!(
			structured_digest(&data).unwrap(),
			b256!("61d3c95333b3353cf0ec9c1d25c70b820cb31d3af2c7b89042bda5eee5c03720")
		);
	}

	#[test]
	fn test_integer_representations_agree() {
		let expected = structured_digest(&wallet_test_data(FieldValue::Integer(1_700_000_000)));
		for value in [
			FieldValue::from("1700000000"),
			FieldValue::from("0x6553f100"),
			FieldValue::from(1_700_000_000u64),
		] {
			assert_eq!(structured_digest(&wallet_test_data(value)), expected);
		}
	}

	#[test]
	fn test_extra_field_is_schema_mismatch() {
		let mut data = wallet_test_data(FieldValue::Integer(1));
		data.message
			.insert("extra".to_string(), FieldValue::Bool(true));

		let err = structured_digest(&data).unwrap_err();
		assert!(matches!(err, DigestError::SchemaMismatch(ref m) if m.contains("'extra'")));
	}

	#[test]
	fn test_missing_field_is_schema_mismatch() {
		let mut data = wallet_test_data(FieldValue::Integer(1));
		data.message.remove("timestamp");

		let err = structured_digest(&data).unwrap_err();
		assert!(matches!(err, DigestError::SchemaMismatch(ref m) if m.contains("'timestamp'")));
	}

	#[test]
	fn test_value_type_mismatch() {
		let data = wallet_test_data(FieldValue::Bool(true));
		assert!(structured_digest(&data).is_err());

		let data = wallet_test_data(FieldValue::Integer(-1));
		let err = structured_digest(&data).unwrap_err();
		assert!(err.to_string().contains("negative value"));
	}

	#[test]
	fn test_unknown_member_type() {
		let mut data = wallet_test_data(FieldValue::Integer(1));
		data.types.get_mut("Message").unwrap()[1].type_name = "uint7".to_string();

		let err = structured_digest(&data).unwrap_err();
		assert!(err.to_string().contains("unknown type 'uint7'"));
	}

	#[test]
	fn test_ambiguous_primary_type() {
		let mut data = wallet_test_data(FieldValue::Integer(1));
		data.types
			.insert("Other".to_string(), vec![TypedField::new("x", "bool")]);
		assert!(resolve_primary_type(&data).is_err());

		let data = data.with_primary_type("Message");
		assert_eq!(resolve_primary_type(&data).unwrap(), "Message");
	}

	#[test]
	fn test_domain_type_is_ignored_for_primary_type() {
		let mut data = wallet_test_data(FieldValue::Integer(1));
		data.types.insert(
			DOMAIN_TYPE_NAME.to_string(),
			vec![
				TypedField::new("name", "string"),
				TypedField::new("version", "string"),
				TypedField::new("chainId", "uint256"),
				TypedField::new("verifyingContract", "address"),
			],
		);
		assert_eq!(resolve_primary_type(&data).unwrap(), "Message");
	}

	#[test]
	fn test_atomic_ranges() {
		assert_eq!(
			AtomicType::Uint(8).encode("uint8", &FieldValue::Integer(255)).unwrap(),
			B256::from(U256::from(255u64))
		);
		assert!(AtomicType::Uint(8)
			.encode("uint8", &FieldValue::Integer(256))
			.is_err());
		assert_eq!(
			AtomicType::Int(8).encode("int8", &FieldValue::Integer(-128)).unwrap(),
			B256::from(U256::MAX - U256::from(127u64))
		);
		assert!(AtomicType::Int(8)
			.encode("int8", &FieldValue::Integer(128))
			.is_err());
		assert_eq!(
			AtomicType::Int(256).encode("int256", &FieldValue::from("-1")).unwrap(),
			B256::from(U256::MAX)
		);
	}

	#[test]
	fn test_fixed_bytes_and_arrays() {
		let word = AtomicType::FixedBytes(2)
			.encode("bytes2", &FieldValue::from("0xabcd"))
			.unwrap();
		assert_eq!(word[0], 0xab);
		assert_eq!(word[1], 0xcd);
		assert!(word[2..].iter().all(|b| *b == 0));

		let types = StructuredTypes::new();
		let list = FieldValue::Array(vec![FieldValue::Integer(1), FieldValue::Integer(2)]);
		let mut enc = Eip712AbiEncoder::new();
		enc.push_u256(U256::from(1u64));
		enc.push_u256(U256::from(2u64));
		assert_eq!(
			encode_value("uint256[]", &list, &types).unwrap(),
			keccak256(enc.finish())
		);
		assert!(encode_value("uint256[3]", &list, &types).is_err());
	}

	#[test]
	fn test_hex_values_take_a_single_prefix() {
		assert_eq!(bytes_of("bytes", &FieldValue::from("0x")).unwrap(), Vec::<u8>::new());
		assert_eq!(bytes_of("bytes", &FieldValue::from("0XAB")).unwrap(), vec![0xab]);

		for bad in ["0x0xabcd", "0x0Xabcd", "0xab cd", "0xabc"] {
			assert!(
				matches!(
					bytes_of("bytes", &FieldValue::from(bad)),
					Err(DigestError::SchemaMismatch(_))
				),
				"{} should be rejected",
				bad
			);
		}
		assert!(AtomicType::FixedBytes(2)
			.encode("bytes2", &FieldValue::from("0x0xab"))
			.is_err());
	}

	#[test]
	fn test_split_array() {
		assert_eq!(split_array("uint256[]"), Some(("uint256", None)));
		assert_eq!(split_array("Person[2]"), Some(("Person", Some(2))));
		assert_eq!(split_array("uint256[][3]"), Some(("uint256[]", Some(3))));
		assert_eq!(split_array("uint256"), None);
		assert_eq!(base_type("Person[2][]"), "Person");
	}

	#[test]
	fn test_address_from_string_and_value_agree() {
		let typed = AtomicType::Address
			.encode(
				"address",
				&FieldValue::Address(address!("CD2a3d9F938E13CD947Ec05AbC7FE734Df8DD826")),
			)
			.unwrap();
		let text = AtomicType::Address
			.encode(
				"address",
				&FieldValue::from("0xcd2a3d9f938e13cd947ec05abc7fe734df8dd826"),
			)
			.unwrap();
		assert_eq!(typed, text);
	}
}
