//! Identifiers for presenters, views and restoration lineages.

use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

static NEXT_PRESENTER: AtomicU64 = AtomicU64::new(0);
static NEXT_VIEW: AtomicU64 = AtomicU64::new(0);

fn next(clock: &AtomicU64) -> u64 {
	clock.fetch_add(1, Ordering::AcqRel).wrapping_add(1)
}

/// Process-unique identity of a live presenter instance.
///
/// Minted when the registry registers a presenter. Never persisted; a restored
/// presenter always receives a new id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PresenterId(u64);

impl PresenterId {
	pub(crate) fn next() -> Self {
		Self(next(&NEXT_PRESENTER))
	}

	pub const fn raw(self) -> u64 {
		self.0
	}
}

impl std::fmt::Display for PresenterId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "p#{}", self.0)
	}
}

/// Process-unique identity of a host view instance.
///
/// Hosts mint one per view object with [`ViewId::next`]. A recreated view is a
/// new object and gets a new id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ViewId(u64);

impl ViewId {
	/// Mints a fresh view id.
	pub fn next() -> Self {
		Self(next(&NEXT_VIEW))
	}

	/// Wraps an id allocated by the host itself.
	pub const fn from_raw(raw: u64) -> Self {
		Self(raw)
	}

	pub const fn raw(self) -> u64 {
		self.0
	}
}

impl std::fmt::Display for ViewId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "v#{}", self.0)
	}
}

/// Persisted identity shared by every incarnation of one logical presenter.
///
/// A fresh presenter starts a new lineage; a presenter restored from a token
/// continues the token's lineage. The registry keeps at most one live
/// presenter per lineage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Lineage(Uuid);

impl Lineage {
	/// Starts a new lineage.
	pub fn new() -> Self {
		Self(Uuid::new_v4())
	}

	/// Parses the textual form written by [`Lineage`]'s `Display`.
	pub fn parse(s: &str) -> Result<Self, uuid::Error> {
		Uuid::parse_str(s).map(Self)
	}
}

impl Default for Lineage {
	fn default() -> Self {
		Self::new()
	}
}

impl std::fmt::Display for Lineage {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.0.hyphenated())
	}
}
