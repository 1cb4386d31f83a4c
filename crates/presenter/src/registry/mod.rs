//! Presenter registry.
//!
//! Owns every live presenter, tracks which views are bound to which
//! presenter, and which restoration lineage each presenter continues.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap as HashMap;
use tracing::{debug, trace, warn};

use crate::config::{KindConflictPolicy, RegistryConfig, UnknownKindPolicy};
use crate::decl::{PresenterDecl, PresenterView};
use crate::error::{RegistryError, Result};
use crate::id::{Lineage, PresenterId, ViewId};
use crate::presenter::{ErasedPresenter, Presenter, PresenterHandle};
use crate::token::RestorationToken;

/// Snapshot of one live presenter for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenterRecord {
	pub id: PresenterId,
	pub kind: &'static str,
	pub lineage: Lineage,
	/// Views bound to the presenter, sorted.
	pub views: Vec<ViewId>,
	/// Whether the presenter currently delivers to a live view.
	pub attached: bool,
}

impl fmt::Display for PresenterRecord {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} {} lineage={} views=[", self.id, self.kind, self.lineage)?;
		for (i, view) in self.views.iter().enumerate() {
			if i > 0 {
				f.write_str(", ")?;
			}
			write!(f, "{view}")?;
		}
		f.write_str("]")?;
		if self.attached {
			f.write_str(" attached")?;
		}
		Ok(())
	}
}

struct Entry {
	handle: PresenterHandle,
	views: Vec<ViewId>,
}

/// Registry indices under a single lock.
///
/// `presenters`, `lineages` and `bindings` MUST be updated together so that a
/// lineage or binding never points at a removed presenter.
#[derive(Default)]
struct RegistryState {
	presenters: HashMap<PresenterId, Entry>,
	/// Live presenter per lineage.
	lineages: HashMap<Lineage, PresenterId>,
	/// Presenter per bound view.
	bindings: HashMap<ViewId, PresenterId>,
}

impl RegistryState {
	fn get(&self, id: PresenterId) -> Option<PresenterHandle> {
		self.presenters.get(&id).map(|e| e.handle.clone())
	}

	fn bound(&self, view: ViewId) -> Option<PresenterHandle> {
		self.bindings.get(&view).and_then(|id| self.get(*id))
	}

	fn live_lineage(&self, lineage: Lineage) -> Option<PresenterHandle> {
		self.lineages.get(&lineage).and_then(|id| self.get(*id))
	}

	fn insert(&mut self, handle: PresenterHandle) {
		self.lineages.insert(handle.lineage(), handle.id());
		self.presenters.insert(handle.id(), Entry { handle, views: Vec::new() });
	}

	fn bind(&mut self, view: ViewId, id: PresenterId) {
		if let Some(prev) = self.bindings.insert(view, id)
			&& prev != id
			&& let Some(entry) = self.presenters.get_mut(&prev)
		{
			entry.views.retain(|v| *v != view);
		}
		if let Some(entry) = self.presenters.get_mut(&id)
			&& !entry.views.contains(&view)
		{
			entry.views.push(view);
		}
	}

	fn unbind(&mut self, view: ViewId) -> Option<PresenterId> {
		let id = self.bindings.remove(&view)?;
		if let Some(entry) = self.presenters.get_mut(&id) {
			entry.views.retain(|v| *v != view);
		}
		Some(id)
	}

	fn remove(&mut self, id: PresenterId) -> Option<Entry> {
		let entry = self.presenters.remove(&id)?;
		if self.lineages.get(&entry.handle.lineage()) == Some(&id) {
			self.lineages.remove(&entry.handle.lineage());
		}
		for view in &entry.views {
			self.bindings.remove(view);
		}
		Some(entry)
	}
}

#[derive(Debug, Clone, Copy)]
enum Origin {
	Created,
	Restored,
}

/// A presenter built outside the lock, not yet registered.
struct Candidate {
	inner: Arc<dyn ErasedPresenter>,
	lineage: Lineage,
	origin: Origin,
}

/// Registry for presenters keyed by identity, view and lineage.
///
/// Guarantees at most one live presenter per lineage and per bound view.
///
/// # Concurrency
///
/// - `factories`: `RwLock`, written only by [`PresenterRegistry::register`]
/// - `state`: one `RwLock` over all indices; presenter code (constructors,
///   `save`, `on_destroy`) never runs while it is held
pub struct PresenterRegistry {
	config: RegistryConfig,
	factories: RwLock<HashMap<&'static str, PresenterDecl>>,
	state: RwLock<RegistryState>,
}

impl Default for PresenterRegistry {
	fn default() -> Self {
		Self::new()
	}
}

impl PresenterRegistry {
	/// Creates an empty registry with the default configuration.
	pub fn new() -> Self {
		Self::with_config(RegistryConfig::default())
	}

	pub fn with_config(config: RegistryConfig) -> Self {
		Self {
			config,
			factories: RwLock::new(HashMap::default()),
			state: RwLock::new(RegistryState::default()),
		}
	}

	pub fn config(&self) -> &RegistryConfig {
		&self.config
	}

	/// Adds presenter type `P` to the restoration table.
	pub fn register<P: Presenter>(&self) -> Result<()> {
		self.register_decl(PresenterDecl::of::<P>())
	}

	/// Adds a declaration to the restoration table.
	///
	/// Registering the same type twice is a no-op. A different type under an
	/// existing kind fails with [`RegistryError::DuplicateKind`].
	pub fn register_decl(&self, decl: PresenterDecl) -> Result<()> {
		let mut factories = self.factories.write();
		match factories.get(decl.kind()) {
			Some(existing) if existing.same_type(&decl) => Ok(()),
			Some(_) => Err(RegistryError::DuplicateKind { kind: decl.kind() }),
			None => {
				debug!(kind = decl.kind(), ty = decl.type_name(), "Registered presenter kind");
				factories.insert(decl.kind(), decl);
				Ok(())
			}
		}
	}

	/// Returns true if a restoration routine is registered for `kind`.
	pub fn is_registered(&self, kind: &str) -> bool {
		self.factories.read().contains_key(kind)
	}

	/// Finds, rebinds, restores or creates the presenter for `view`.
	///
	/// In order:
	/// 1. the presenter already bound to `view`;
	/// 2. the live presenter of the token's lineage, rebound to `view`;
	/// 3. a presenter restored from `saved`;
	/// 4. a fresh presenter of the view's declared kind.
	///
	/// # Errors
	///
	/// - [`RegistryError::NoPresenterDeclared`] if nothing names a presenter kind
	/// - [`RegistryError::Construction`] if the constructor or restoration fails
	/// - [`RegistryError::UnregisteredKind`] if the token kind is unknown and the
	///   policy is [`UnknownKindPolicy::Reject`]
	pub fn provide<V>(&self, view: &V, saved: Option<&RestorationToken>) -> Result<PresenterHandle>
	where
		V: PresenterView + ?Sized,
	{
		let view_id = view.view_id();

		if let Some(handle) = self.state.read().bound(view_id) {
			trace!(view = %view_id, presenter = %handle.id(), "View already bound");
			return Ok(handle);
		}

		let declared = view.presenter_decl();
		if let Some(token) = saved
			&& let Some(lineage) = token.lineage()
			&& !self.declaration_overrides(token.kind(), declared.as_ref())
		{
			let mut state = self.state.write();
			if let Some(handle) = state.bound(view_id) {
				return Ok(handle);
			}
			if let Some(handle) = state.live_lineage(lineage) {
				state.bind(view_id, handle.id());
				debug!(view = %view_id, presenter = %handle.id(), %lineage, "Rebound live presenter to recreated view");
				return Ok(handle);
			}
		}

		let candidate = self.build(view_id, declared, saved)?;
		Ok(self.install(view_id, candidate))
	}

	fn build(&self, view: ViewId, declared: Option<PresenterDecl>, saved: Option<&RestorationToken>) -> Result<Candidate> {
		if let Some(token) = saved
			&& let Some(decl) = self.restoration_decl(token.kind(), declared.as_ref())?
		{
			let inner = decl
				.restore(token.state())
				.map_err(|source| RegistryError::construction(decl.kind(), source))?;
			return Ok(Candidate {
				inner,
				lineage: token.lineage().unwrap_or_default(),
				origin: Origin::Restored,
			});
		}

		let decl = declared.ok_or(RegistryError::NoPresenterDeclared { view })?;
		let inner = decl.create().map_err(|source| RegistryError::construction(decl.kind(), source))?;
		Ok(Candidate {
			inner,
			lineage: Lineage::new(),
			origin: Origin::Created,
		})
	}

	/// Picks the routine that restores a token of `kind`, if any applies.
	fn restoration_decl(&self, kind: &str, declared: Option<&PresenterDecl>) -> Result<Option<PresenterDecl>> {
		if let Some(decl) = declared {
			if decl.kind() == kind {
				return Ok(Some(*decl));
			}
			if self.declaration_overrides(kind, Some(decl)) {
				debug!(token_kind = kind, declared = decl.kind(), "Ignoring token of another kind");
				return Ok(None);
			}
		}

		if let Some(decl) = self.factories.read().get(kind) {
			return Ok(Some(*decl));
		}

		match self.config.unknown_kind {
			UnknownKindPolicy::Fallback => {
				warn!(kind, "No restoration routine for saved presenter kind; falling back to declaration");
				Ok(None)
			}
			UnknownKindPolicy::Reject => Err(RegistryError::UnregisteredKind { kind: kind.to_string() }),
		}
	}

	/// Returns true if the view's declaration wins over a token of `kind`.
	fn declaration_overrides(&self, kind: &str, declared: Option<&PresenterDecl>) -> bool {
		self.config.kind_conflict == KindConflictPolicy::Declaration && declared.is_some_and(|decl| decl.kind() != kind)
	}

	/// Registers `candidate` and binds it, unless another caller bound the view
	/// or revived the lineage first, in which case the candidate is torn down.
	fn install(&self, view: ViewId, candidate: Candidate) -> PresenterHandle {
		let mut state = self.state.write();

		if let Some(existing) = state.bound(view).or_else(|| state.live_lineage(candidate.lineage)) {
			state.bind(view, existing.id());
			drop(state);
			warn!(view = %view, presenter = %existing.id(), kind = candidate.inner.presenter_kind(), "Discarding presenter built concurrently");
			candidate.inner.teardown();
			return existing;
		}

		let handle = PresenterHandle::new(PresenterId::next(), candidate.lineage, candidate.inner);
		state.insert(handle.clone());
		state.bind(view, handle.id());
		drop(state);

		debug!(
			view = %view,
			presenter = %handle.id(),
			kind = handle.kind(),
			lineage = %handle.lineage(),
			origin = ?candidate.origin,
			"Registered presenter"
		);
		handle
	}

	/// Captures a token that restores an equivalent presenter.
	///
	/// Does not change registry state.
	///
	/// # Errors
	///
	/// Returns [`RegistryError::UnknownPresenter`] if `presenter` is not registered here.
	pub fn save(&self, presenter: &PresenterHandle) -> Result<RestorationToken> {
		let handle = self
			.get(presenter.id())
			.ok_or(RegistryError::UnknownPresenter { id: presenter.id() })?;
		let state = handle.inner().save_state();
		trace!(presenter = %handle.id(), keys = state.len(), "Saved presenter");
		Ok(RestorationToken::with_lineage(handle.kind(), handle.lineage(), state))
	}

	/// Removes `presenter`, detaches its view and runs its teardown.
	///
	/// Destroying an unknown or already destroyed presenter does nothing.
	pub fn destroy(&self, presenter: &PresenterHandle) {
		let Some(entry) = self.state.write().remove(presenter.id()) else {
			trace!(presenter = %presenter.id(), "Destroy of unregistered presenter ignored");
			return;
		};
		teardown(entry);
	}

	/// Destroys every live presenter, returning their ids in ascending order.
	pub fn destroy_all(&self) -> Vec<PresenterId> {
		let mut entries: Vec<Entry> = {
			let mut state = self.state.write();
			let drained = std::mem::take(&mut *state);
			drained.presenters.into_values().collect()
		};
		entries.sort_by_key(|e| e.handle.id());

		let ids = entries.iter().map(|e| e.handle.id()).collect();
		for entry in entries {
			teardown(entry);
		}
		ids
	}

	/// Forgets the binding of `view` without touching its presenter.
	///
	/// Hosts call this when a view object goes away transiently; the
	/// presenter stays registered and reachable through its lineage.
	pub fn release(&self, view: ViewId) -> Option<PresenterId> {
		let id = self.state.write().unbind(view)?;
		trace!(view = %view, presenter = %id, "Released view binding");
		Some(id)
	}

	pub fn get(&self, id: PresenterId) -> Option<PresenterHandle> {
		self.state.read().get(id)
	}

	/// Returns the presenter bound to `view`.
	pub fn presenter_for(&self, view: ViewId) -> Option<PresenterHandle> {
		self.state.read().bound(view)
	}

	/// Returns the live presenter continuing `lineage`.
	pub fn presenter_of_lineage(&self, lineage: Lineage) -> Option<PresenterHandle> {
		self.state.read().live_lineage(lineage)
	}

	pub fn contains(&self, id: PresenterId) -> bool {
		self.state.read().presenters.contains_key(&id)
	}

	/// Number of live presenters.
	pub fn len(&self) -> usize {
		self.state.read().presenters.len()
	}

	pub fn is_empty(&self) -> bool {
		self.state.read().presenters.is_empty()
	}

	/// Returns records sorted by presenter id.
	pub fn snapshots(&self) -> Vec<PresenterRecord> {
		let mut entries: Vec<(PresenterHandle, Vec<ViewId>)> = {
			let state = self.state.read();
			state.presenters.values().map(|e| (e.handle.clone(), e.views.clone())).collect()
		};
		entries.sort_by_key(|(h, _)| h.id());

		entries
			.into_iter()
			.map(|(handle, mut views)| {
				views.sort();
				PresenterRecord {
					id: handle.id(),
					kind: handle.kind(),
					lineage: handle.lineage(),
					views,
					attached: handle.has_view(),
				}
			})
			.collect()
	}

	/// Writes one line per live presenter and its bound views.
	pub fn print(&self, sink: &mut dyn fmt::Write) -> fmt::Result {
		let records = self.snapshots();
		writeln!(sink, "{} live presenter(s)", records.len())?;
		for record in &records {
			writeln!(sink, "{record}")?;
		}
		Ok(())
	}
}

fn teardown(entry: Entry) {
	let inner = entry.handle.inner();
	inner.detach_view();
	inner.teardown();
	debug!(presenter = %entry.handle.id(), kind = entry.handle.kind(), "Destroyed presenter");
}

#[cfg(test)]
mod tests;
