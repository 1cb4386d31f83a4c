//! Restoration tokens.
//!
//! A token is what a host persists for a presenter: the presenter kind, the
//! lineage it belongs to, and the presenter's own saved state. Converted to a
//! [`StateBundle`] it looks like:
//!
//! ```text
//! presenter_kind:    Str     (required)
//! presenter_lineage: Str     (optional, UUID)
//! presenter_data:    Bundle  (optional, presenter-defined)
//! ```

use perch_state::{StateBundle, StateError, StateValue};

use crate::id::Lineage;

/// Bundle key holding the presenter kind.
pub const KIND_KEY: &str = "presenter_kind";
/// Bundle key holding the lineage UUID.
pub const LINEAGE_KEY: &str = "presenter_lineage";
/// Bundle key holding the presenter-defined state.
pub const DATA_KEY: &str = "presenter_data";

/// Errors decoding a [`RestorationToken`] from a bundle or blob.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
	#[error("restoration token has no 'presenter_kind' string")]
	MissingKind,

	#[error("restoration token has an invalid lineage: {0}")]
	InvalidLineage(String),

	#[error(transparent)]
	State(#[from] StateError),
}

/// Everything needed to recreate an equivalent presenter.
#[derive(Debug, Clone, PartialEq)]
pub struct RestorationToken {
	kind: String,
	lineage: Option<Lineage>,
	state: StateBundle,
}

impl RestorationToken {
	/// Creates a token outside of any lineage.
	///
	/// Restoring it starts a new lineage.
	pub fn new(kind: impl Into<String>, state: StateBundle) -> Self {
		Self {
			kind: kind.into(),
			lineage: None,
			state,
		}
	}

	pub(crate) fn with_lineage(kind: &str, lineage: Lineage, state: StateBundle) -> Self {
		Self {
			kind: kind.to_string(),
			lineage: Some(lineage),
			state,
		}
	}

	pub fn kind(&self) -> &str {
		&self.kind
	}

	pub fn lineage(&self) -> Option<Lineage> {
		self.lineage
	}

	/// Presenter-defined saved state.
	pub fn state(&self) -> &StateBundle {
		&self.state
	}

	/// Lays the token out as a bundle suitable for nesting in host state.
	pub fn to_bundle(&self) -> StateBundle {
		let mut bundle = StateBundle::new();
		bundle.put(KIND_KEY, self.kind.as_str());
		if let Some(lineage) = self.lineage {
			bundle.put(LINEAGE_KEY, lineage.to_string());
		}
		bundle.put(DATA_KEY, self.state.clone());
		bundle
	}

	/// Reads a token laid out by [`RestorationToken::to_bundle`].
	pub fn from_bundle(bundle: &StateBundle) -> Result<Self, TokenError> {
		let kind = bundle.get_str(KIND_KEY).ok_or(TokenError::MissingKind)?.to_string();

		let lineage = match bundle.get(LINEAGE_KEY) {
			None => None,
			Some(StateValue::Str(raw)) => Some(Lineage::parse(raw).map_err(|_| TokenError::InvalidLineage(raw.clone()))?),
			Some(other) => return Err(TokenError::InvalidLineage(format!("expected string, got {}", other.type_name()))),
		};

		let state = if bundle.contains_key(DATA_KEY) {
			bundle.require_bundle(DATA_KEY)?.clone()
		} else {
			StateBundle::new()
		};

		Ok(Self { kind, lineage, state })
	}

	/// Encodes the token as a binary blob.
	pub fn to_bytes(&self) -> Result<Vec<u8>, TokenError> {
		Ok(self.to_bundle().to_bytes()?)
	}

	pub fn from_bytes(bytes: &[u8]) -> Result<Self, TokenError> {
		Self::from_bundle(&StateBundle::from_bytes(bytes)?)
	}
}
