use std::cell::Cell;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use crate::StateBundle;

/// Deepest nesting of lists and bundles accepted when decoding.
pub const MAX_DEPTH: usize = 64;

/// A value stored in a [`StateBundle`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum StateValue {
	/// Boolean value.
	Bool(bool),
	/// Signed integer value.
	Int(i64),
	/// Floating point value.
	Float(f64),
	/// UTF-8 string value.
	Str(String),
	/// Raw bytes.
	Bytes(Vec<u8>),
	/// Ordered list of values.
	List(Vec<StateValue>),
	/// Nested bundle.
	Bundle(StateBundle),
}

impl StateValue {
	/// Returns the boolean value if this is a `Bool` variant.
	pub fn as_bool(&self) -> Option<bool> {
		match self {
			StateValue::Bool(v) => Some(*v),
			_ => None,
		}
	}

	/// Returns the integer value if this is an `Int` variant.
	pub fn as_int(&self) -> Option<i64> {
		match self {
			StateValue::Int(v) => Some(*v),
			_ => None,
		}
	}

	/// Returns the float value if this is a `Float` variant.
	pub fn as_float(&self) -> Option<f64> {
		match self {
			StateValue::Float(v) => Some(*v),
			_ => None,
		}
	}

	/// Returns the string value if this is a `Str` variant.
	pub fn as_str(&self) -> Option<&str> {
		match self {
			StateValue::Str(v) => Some(v),
			_ => None,
		}
	}

	pub fn as_bytes(&self) -> Option<&[u8]> {
		match self {
			StateValue::Bytes(v) => Some(v),
			_ => None,
		}
	}

	pub fn as_list(&self) -> Option<&[StateValue]> {
		match self {
			StateValue::List(v) => Some(v),
			_ => None,
		}
	}

	pub fn as_bundle(&self) -> Option<&StateBundle> {
		match self {
			StateValue::Bundle(v) => Some(v),
			_ => None,
		}
	}

	/// Returns the type name of this value.
	pub fn type_name(&self) -> &'static str {
		match self {
			StateValue::Bool(_) => "bool",
			StateValue::Int(_) => "int",
			StateValue::Float(_) => "float",
			StateValue::Str(_) => "string",
			StateValue::Bytes(_) => "bytes",
			StateValue::List(_) => "list",
			StateValue::Bundle(_) => "bundle",
		}
	}
}

/// Decoding shape of [`StateValue`]; nested values go back through the
/// depth-checked impl below.
#[derive(Deserialize)]
#[serde(remote = "StateValue")]
#[allow(dead_code)]
enum StateValueDef {
	Bool(bool),
	Int(i64),
	Float(f64),
	Str(String),
	Bytes(Vec<u8>),
	List(Vec<StateValue>),
	Bundle(StateBundle),
}

thread_local! {
	static DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// Counts one level of value nesting on the decoding thread.
struct DepthGuard;

impl DepthGuard {
	fn enter() -> Option<Self> {
		DEPTH.with(|depth| {
			let current = depth.get();
			if current >= MAX_DEPTH {
				return None;
			}
			depth.set(current + 1);
			Some(DepthGuard)
		})
	}
}

impl Drop for DepthGuard {
	fn drop(&mut self) {
		DEPTH.with(|depth| depth.set(depth.get() - 1));
	}
}

impl<'de> Deserialize<'de> for StateValue {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let _guard = DepthGuard::enter().ok_or_else(|| D::Error::custom(format!("state nested deeper than {MAX_DEPTH} levels")))?;
		StateValueDef::deserialize(deserializer)
	}
}

impl From<bool> for StateValue {
	fn from(v: bool) -> Self {
		StateValue::Bool(v)
	}
}

impl From<i64> for StateValue {
	fn from(v: i64) -> Self {
		StateValue::Int(v)
	}
}

impl From<i32> for StateValue {
	fn from(v: i32) -> Self {
		StateValue::Int(v.into())
	}
}

impl From<f64> for StateValue {
	fn from(v: f64) -> Self {
		StateValue::Float(v)
	}
}

impl From<String> for StateValue {
	fn from(v: String) -> Self {
		StateValue::Str(v)
	}
}

impl From<&str> for StateValue {
	fn from(v: &str) -> Self {
		StateValue::Str(v.to_string())
	}
}

impl From<Vec<u8>> for StateValue {
	fn from(v: Vec<u8>) -> Self {
		StateValue::Bytes(v)
	}
}

impl From<Vec<StateValue>> for StateValue {
	fn from(v: Vec<StateValue>) -> Self {
		StateValue::List(v)
	}
}

impl From<StateBundle> for StateValue {
	fn from(v: StateBundle) -> Self {
		StateValue::Bundle(v)
	}
}
