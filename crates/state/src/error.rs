/// Errors raised while reading or encoding a [`crate::StateBundle`].
#[derive(Debug, thiserror::Error)]
pub enum StateError {
	/// A required key is absent.
	#[error("missing state key: {key}")]
	Missing { key: String },

	/// A key holds a value of another type.
	#[error("type mismatch for state key '{key}': expected {expected}, got {found}")]
	TypeMismatch {
		key: String,
		expected: &'static str,
		found: &'static str,
	},

	#[error("failed to encode state bundle: {0}")]
	Encode(#[source] postcard::Error),

	#[error("failed to decode state bundle: {0}")]
	Decode(#[source] postcard::Error),
}

pub type Result<T> = std::result::Result<T, StateError>;
