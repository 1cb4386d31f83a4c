//! Registry configuration.
//!
//! Every field has a default, so an empty document is a valid configuration:
//!
//! ```toml
//! state_key = "presenter_state"
//! unknown_kind = "fallback"
//! kind_conflict = "token"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Default host-state key under which view adapters nest restoration tokens.
pub const DEFAULT_STATE_KEY: &str = "presenter_state";

/// What `provide` does with a token whose kind has no restoration routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownKindPolicy {
	/// Log a warning and construct the view's declared presenter instead.
	#[default]
	Fallback,
	/// Fail with [`crate::RegistryError::UnregisteredKind`].
	Reject,
}

/// What `provide` does when the token kind differs from the view's declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KindConflictPolicy {
	/// Restore the presenter named by the token.
	#[default]
	Token,
	/// Ignore the token and construct the declared presenter.
	Declaration,
}

/// Configuration for a [`crate::PresenterRegistry`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryConfig {
	/// Host-state key for the nested restoration token.
	pub state_key: String,
	pub unknown_kind: UnknownKindPolicy,
	pub kind_conflict: KindConflictPolicy,
}

impl Default for RegistryConfig {
	fn default() -> Self {
		Self {
			state_key: DEFAULT_STATE_KEY.to_string(),
			unknown_kind: UnknownKindPolicy::default(),
			kind_conflict: KindConflictPolicy::default(),
		}
	}
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("failed to read {}: {source}", path.display())]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("invalid registry config: {0}")]
	Parse(#[from] toml::de::Error),

	/// The state key must name a bundle entry.
	#[error("state_key must not be empty")]
	EmptyStateKey,
}

impl RegistryConfig {
	/// Parses a TOML document.
	pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
		let config: RegistryConfig = toml::from_str(content)?;
		if config.state_key.is_empty() {
			return Err(ConfigError::EmptyStateKey);
		}
		Ok(config)
	}

	/// Reads and parses a TOML file.
	pub fn load(path: &Path) -> Result<Self, ConfigError> {
		let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
			path: path.to_path_buf(),
			source,
		})?;
		Self::from_toml_str(&content)
	}
}
