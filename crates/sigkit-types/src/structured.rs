//! Structured-data (EIP-712) types.
//!
//! A structured signing request is the triple (domain, types, message). The
//! domain scopes the message to an application, chain and contract. The types
//! map every struct name to its ordered field list; the order is part of the
//! encoding and is never changed. The message maps field names to values that
//! are encoded according to the declared field types.

use alloy_primitives::{hex, Address, Bytes, I256, U256};
use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// Reserved type name of the domain struct.
pub const DOMAIN_TYPE_NAME: &str = "EIP712Domain";

/// Domain that scopes a structured message.
///
/// Fields are hashed in the fixed order name, version, chainId,
/// verifyingContract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredDomain {
	pub name: String,
	pub version: String,
	pub chain_id: u64,
	pub verifying_contract: Address,
}

impl StructuredDomain {
	pub fn new(
		name: impl Into<String>,
		version: impl Into<String>,
		chain_id: u64,
		verifying_contract: Address,
	) -> Self {
		Self {
			name: name.into(),
			version: version.into(),
			chain_id,
			verifying_contract,
		}
	}
}

/// A single `(name, type)` entry of a struct definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypedField {
	pub name: String,
	#[serde(rename = "type")]
	pub type_name: String,
}

impl TypedField {
	pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			type_name: type_name.into(),
		}
	}
}

/// Mapping from struct name to its ordered field list.
pub type StructuredTypes = BTreeMap<String, Vec<TypedField>>;

/// Mapping from field name to value.
pub type StructuredMessage = BTreeMap<String, FieldValue>;

/// A complete structured signing input: domain, type schema and message.
///
/// `primary_type` may be left out; it is then derived from the schema as the
/// single struct type that no other type references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedData {
	pub domain: StructuredDomain,
	pub types: StructuredTypes,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub primary_type: Option<String>,
	pub message: StructuredMessage,
}

impl TypedData {
	pub fn new(domain: StructuredDomain, types: StructuredTypes, message: StructuredMessage) -> Self {
		Self {
			domain,
			types,
			primary_type: None,
			message,
		}
	}

	/// Pins the primary type instead of deriving it from the schema.
	pub fn with_primary_type(mut self, primary_type: impl Into<String>) -> Self {
		self.primary_type = Some(primary_type.into());
		self
	}
}

/// Errors raised when converting JSON into a [`FieldValue`].
#[derive(Debug, Error)]
pub enum FieldValueError {
	#[error("null values are not allowed in structured messages")]
	Null,
	#[error("number {0} is not an integer")]
	NotAnInteger(String),
}

/// A value of a structured message field.
///
/// Scalars cover the value shapes a caller usually supplies (strings,
/// integers, booleans, big integers). Addresses and bytes may also be given
/// as hex strings; they are coerced to the declared field type at encoding
/// time. Nested structs and arrays are used by schemas that reference other
/// struct types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
	String(String),
	Integer(i64),
	BigUint(U256),
	BigInt(I256),
	Bool(bool),
	Address(Address),
	Bytes(Bytes),
	Struct(StructuredMessage),
	Array(Vec<FieldValue>),
}

impl FieldValue {
	/// Converts a JSON value into a field value.
	///
	/// Non-negative integers that do not fit an `i64` become [`FieldValue::BigUint`].
	pub fn from_json(value: &Value) -> Result<Self, FieldValueError> {
		match value {
			Value::Null => Err(FieldValueError::Null),
			Value::Bool(b) => Ok(FieldValue::Bool(*b)),
			Value::String(s) => Ok(FieldValue::String(s.clone())),
			Value::Number(n) => {
				if let Some(i) = n.as_i64() {
					Ok(FieldValue::Integer(i))
				} else if let Some(u) = n.as_u64() {
					Ok(FieldValue::BigUint(U256::from(u)))
				} else {
					Err(FieldValueError::NotAnInteger(n.to_string()))
				}
			},
			Value::Array(items) => items
				.iter()
				.map(FieldValue::from_json)
				.collect::<Result<Vec<_>, _>>()
				.map(FieldValue::Array),
			Value::Object(map) => map
				.iter()
				.map(|(k, v)| FieldValue::from_json(v).map(|v| (k.clone(), v)))
				.collect::<Result<StructuredMessage, _>>()
				.map(FieldValue::Struct),
		}
	}

	/// Converts the value into the JSON shape wallets expect for
	/// `eth_signTypedData_v4`. Big integers are rendered as decimal strings.
	pub fn to_json(&self) -> Value {
		match self {
			FieldValue::String(s) => Value::String(s.clone()),
			FieldValue::Integer(i) => Value::from(*i),
			FieldValue::BigUint(u) => Value::String(u.to_string()),
			FieldValue::BigInt(i) => Value::String(i.to_string()),
			FieldValue::Bool(b) => Value::Bool(*b),
			FieldValue::Address(a) => Value::String(a.to_checksum(None)),
			FieldValue::Bytes(b) => Value::String(format!("0x{}", hex::encode(b))),
			FieldValue::Struct(fields) => Value::Object(
				fields
					.iter()
					.map(|(k, v)| (k.clone(), v.to_json()))
					.collect(),
			),
			FieldValue::Array(items) => Value::Array(items.iter().map(FieldValue::to_json).collect()),
		}
	}

	/// Short name of the value shape, used in schema mismatch messages.
	pub fn kind(&self) -> &'static str {
		match self {
			FieldValue::String(_) => "string",
			FieldValue::Integer(_) => "integer",
			FieldValue::BigUint(_) | FieldValue::BigInt(_) => "big integer",
			FieldValue::Bool(_) => "boolean",
			FieldValue::Address(_) => "address",
			FieldValue::Bytes(_) => "bytes",
			FieldValue::Struct(_) => "struct",
			FieldValue::Array(_) => "array",
		}
	}
}

impl From<&str> for FieldValue {
	fn from(value: &str) -> Self {
		FieldValue::String(value.to_string())
	}
}

impl From<String> for FieldValue {
	fn from(value: String) -> Self {
		FieldValue::String(value)
	}
}

impl From<i64> for FieldValue {
	fn from(value: i64) -> Self {
		FieldValue::Integer(value)
	}
}

impl From<u64> for FieldValue {
	fn from(value: u64) -> Self {
		FieldValue::BigUint(U256::from(value))
	}
}

impl From<U256> for FieldValue {
	fn from(value: U256) -> Self {
		FieldValue::BigUint(value)
	}
}

impl From<bool> for FieldValue {
	fn from(value: bool) -> Self {
		FieldValue::Bool(value)
	}
}

impl From<Address> for FieldValue {
	fn from(value: Address) -> Self {
		FieldValue::Address(value)
	}
}

impl From<StructuredMessage> for FieldValue {
	fn from(value: StructuredMessage) -> Self {
		FieldValue::Struct(value)
	}
}

impl Serialize for FieldValue {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		self.to_json().serialize(serializer)
	}
}

impl<'de> Deserialize<'de> for FieldValue {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let value = Value::deserialize(deserializer)?;
		FieldValue::from_json(&value).map_err(D::Error::custom)
	}
}
