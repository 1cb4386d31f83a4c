use crate::id::{PresenterId, ViewId};
use crate::token::TokenError;

/// Errors raised by [`crate::PresenterRegistry`] operations.
///
/// All of these are configuration or programming errors; none is transient
/// and the registry never retries.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
	/// The view declares no presenter and no usable token was supplied.
	#[error("view {view} declares no presenter and no restoration token names one")]
	NoPresenterDeclared { view: ViewId },

	/// The presenter's constructor or restoration routine failed.
	#[error("failed to construct presenter '{kind}': {source}")]
	Construction {
		kind: &'static str,
		#[source]
		source: Box<dyn std::error::Error + Send + Sync + 'static>,
	},

	/// The presenter is not (or no longer) registered.
	#[error("presenter {id} is not registered")]
	UnknownPresenter { id: PresenterId },

	/// The token names a kind the registry cannot restore.
	#[error("no restoration routine registered for presenter kind '{kind}'")]
	UnregisteredKind { kind: String },

	/// Another presenter type already uses this kind.
	#[error("presenter kind '{kind}' is already registered by another type")]
	DuplicateKind { kind: &'static str },

	/// The provided presenter is not of the expected type.
	#[error("expected presenter kind '{expected}', got '{found}'")]
	KindMismatch { expected: &'static str, found: &'static str },

	#[error(transparent)]
	Token(#[from] TokenError),
}

impl RegistryError {
	pub(crate) fn construction(kind: &'static str, source: anyhow::Error) -> Self {
		Self::Construction { kind, source: source.into() }
	}
}

pub type Result<T> = std::result::Result<T, RegistryError>;
