use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{Result, StateError, StateValue};

/// Ordered mapping of string keys to [`StateValue`]s.
///
/// Keys keep their insertion order, so two bundles built by the same sequence
/// of `put` calls encode to identical bytes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateBundle {
	entries: IndexMap<String, StateValue>,
}

impl StateBundle {
	/// Creates an empty bundle.
	pub fn new() -> Self {
		Self::default()
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn contains_key(&self, key: &str) -> bool {
		self.entries.contains_key(key)
	}

	/// Stores `value` under `key`, returning the value it replaced.
	///
	/// A replaced key keeps its original position.
	pub fn put(&mut self, key: impl Into<String>, value: impl Into<StateValue>) -> Option<StateValue> {
		self.entries.insert(key.into(), value.into())
	}

	/// Builder form of [`StateBundle::put`].
	pub fn with(mut self, key: impl Into<String>, value: impl Into<StateValue>) -> Self {
		self.put(key, value);
		self
	}

	pub fn get(&self, key: &str) -> Option<&StateValue> {
		self.entries.get(key)
	}

	/// Removes `key`, keeping the order of the remaining entries.
	pub fn remove(&mut self, key: &str) -> Option<StateValue> {
		self.entries.shift_remove(key)
	}

	pub fn keys(&self) -> impl Iterator<Item = &str> {
		self.entries.keys().map(String::as_str)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &StateValue)> {
		self.entries.iter().map(|(k, v)| (k.as_str(), v))
	}

	pub fn get_bool(&self, key: &str) -> Option<bool> {
		self.get(key).and_then(StateValue::as_bool)
	}

	pub fn get_int(&self, key: &str) -> Option<i64> {
		self.get(key).and_then(StateValue::as_int)
	}

	pub fn get_float(&self, key: &str) -> Option<f64> {
		self.get(key).and_then(StateValue::as_float)
	}

	pub fn get_str(&self, key: &str) -> Option<&str> {
		self.get(key).and_then(StateValue::as_str)
	}

	pub fn get_bytes(&self, key: &str) -> Option<&[u8]> {
		self.get(key).and_then(StateValue::as_bytes)
	}

	pub fn get_bundle(&self, key: &str) -> Option<&StateBundle> {
		self.get(key).and_then(StateValue::as_bundle)
	}

	/// Returns the boolean under `key` or a typed error.
	pub fn require_bool(&self, key: &str) -> Result<bool> {
		self.require(key, "bool", StateValue::as_bool)
	}

	/// Returns the integer under `key` or a typed error.
	pub fn require_int(&self, key: &str) -> Result<i64> {
		self.require(key, "int", StateValue::as_int)
	}

	pub fn require_float(&self, key: &str) -> Result<f64> {
		self.require(key, "float", StateValue::as_float)
	}

	pub fn require_str(&self, key: &str) -> Result<&str> {
		self.require(key, "string", StateValue::as_str)
	}

	pub fn require_bundle(&self, key: &str) -> Result<&StateBundle> {
		self.require(key, "bundle", StateValue::as_bundle)
	}

	fn require<'a, T>(&'a self, key: &str, expected: &'static str, extract: impl FnOnce(&'a StateValue) -> Option<T>) -> Result<T> {
		let value = self.get(key).ok_or_else(|| StateError::Missing { key: key.to_string() })?;
		extract(value).ok_or_else(|| StateError::TypeMismatch {
			key: key.to_string(),
			expected,
			found: value.type_name(),
		})
	}

	/// Encodes the bundle into a compact binary blob.
	pub fn to_bytes(&self) -> Result<Vec<u8>> {
		postcard::to_allocvec(self).map_err(StateError::Encode)
	}

	/// Decodes a blob produced by [`StateBundle::to_bytes`].
	pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
		postcard::from_bytes(bytes).map_err(StateError::Decode)
	}
}

impl<K: Into<String>, V: Into<StateValue>> FromIterator<(K, V)> for StateBundle {
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		Self {
			entries: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
		}
	}
}

impl<K: Into<String>, V: Into<StateValue>> Extend<(K, V)> for StateBundle {
	fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
		self.entries.extend(iter.into_iter().map(|(k, v)| (k.into(), v.into())));
	}
}

impl IntoIterator for StateBundle {
	type Item = (String, StateValue);
	type IntoIter = indexmap::map::IntoIter<String, StateValue>;

	fn into_iter(self) -> Self::IntoIter {
		self.entries.into_iter()
	}
}
