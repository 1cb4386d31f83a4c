//! Presenter contract and the type-erased handle the registry stores.

use std::any::Any;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use perch_state::StateBundle;

use crate::id::{Lineage, PresenterId};

/// Holder for the single view a presenter currently delivers to.
///
/// Only a weak reference is kept, and [`Presenter::drop_view`] clears it, so
/// a presenter never keeps a destroyed view object alive.
pub struct ViewSlot<V: ?Sized> {
	view: Mutex<Option<Weak<V>>>,
}

impl<V: ?Sized> ViewSlot<V> {
	pub fn new() -> Self {
		Self { view: Mutex::new(None) }
	}

	/// Returns the active view if one is attached and still alive.
	pub fn get(&self) -> Option<Arc<V>> {
		self.view.lock().as_ref().and_then(Weak::upgrade)
	}

	pub fn is_attached(&self) -> bool {
		self.get().is_some()
	}

	pub(crate) fn set(&self, view: &Arc<V>) {
		*self.view.lock() = Some(Arc::downgrade(view));
	}

	/// Clears the slot, returning whether a view was set.
	pub(crate) fn clear(&self) -> bool {
		self.view.lock().take().is_some()
	}
}

impl<V: ?Sized> Default for ViewSlot<V> {
	fn default() -> Self {
		Self::new()
	}
}

impl<V: ?Sized> std::fmt::Debug for ViewSlot<V> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ViewSlot").field("attached", &self.is_attached()).finish()
	}
}

/// Business logic that outlives the views it is attached to.
///
/// Implementors are owned by a [`crate::PresenterRegistry`], which creates
/// them through [`Presenter::create`] or [`Presenter::restore`], asks them to
/// [`Presenter::save`] and tears them down with [`Presenter::on_destroy`].
/// Views attach and detach through [`Presenter::take_view`] and
/// [`Presenter::drop_view`].
pub trait Presenter: Sized + Send + Sync + 'static {
	/// Discriminator written into restoration tokens. Must be unique per registry.
	const KIND: &'static str;

	/// The view type this presenter delivers to.
	type View: ?Sized + Send + Sync + 'static;

	/// Builds a fresh presenter.
	fn create() -> anyhow::Result<Self>;

	/// Rebuilds a presenter from state written by [`Presenter::save`].
	fn restore(state: &StateBundle) -> anyhow::Result<Self> {
		let _ = state;
		Self::create()
	}

	/// Writes the state needed to restore an equivalent presenter.
	fn save(&self, state: &mut StateBundle) {
		let _ = state;
	}

	fn view_slot(&self) -> &ViewSlot<Self::View>;

	/// Called after `view` became the active view.
	fn on_take_view(&self, view: &Arc<Self::View>) {
		let _ = view;
	}

	/// Called after the active view was cleared.
	fn on_drop_view(&self) {}

	/// Releases resources. Called at most once, after the presenter left its registry.
	fn on_destroy(&self) {}

	/// Makes `view` the active view, replacing any previous one.
	fn take_view(&self, view: &Arc<Self::View>) {
		self.view_slot().set(view);
		self.on_take_view(view);
	}

	/// Stops delivering to the active view. Does nothing if none is attached.
	fn drop_view(&self) {
		if self.view_slot().clear() {
			self.on_drop_view();
		}
	}

	fn view(&self) -> Option<Arc<Self::View>> {
		self.view_slot().get()
	}
}

/// Object-safe projection of [`Presenter`] used for registry storage.
pub(crate) trait ErasedPresenter: Send + Sync {
	fn presenter_kind(&self) -> &'static str;
	fn save_state(&self) -> StateBundle;
	fn attached(&self) -> bool;
	fn detach_view(&self);
	fn teardown(&self);
	fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<P: Presenter> ErasedPresenter for P {
	fn presenter_kind(&self) -> &'static str {
		P::KIND
	}

	fn save_state(&self) -> StateBundle {
		let mut state = StateBundle::new();
		Presenter::save(self, &mut state);
		state
	}

	fn attached(&self) -> bool {
		self.view_slot().is_attached()
	}

	fn detach_view(&self) {
		Presenter::drop_view(self);
	}

	fn teardown(&self) {
		self.on_destroy();
	}

	fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
		self
	}
}

/// Shared reference to a presenter registered in a [`crate::PresenterRegistry`].
///
/// Cloning is cheap. Two handles are equal when they name the same
/// registered instance.
#[derive(Clone)]
pub struct PresenterHandle {
	id: PresenterId,
	lineage: Lineage,
	inner: Arc<dyn ErasedPresenter>,
}

impl PresenterHandle {
	pub(crate) fn new(id: PresenterId, lineage: Lineage, inner: Arc<dyn ErasedPresenter>) -> Self {
		Self { id, lineage, inner }
	}

	pub fn id(&self) -> PresenterId {
		self.id
	}

	pub fn lineage(&self) -> Lineage {
		self.lineage
	}

	pub fn kind(&self) -> &'static str {
		self.inner.presenter_kind()
	}

	/// Returns true while the presenter delivers to a live view.
	pub fn has_view(&self) -> bool {
		self.inner.attached()
	}

	/// Returns the concrete presenter if it is a `P`.
	pub fn downcast<P: Presenter>(&self) -> Option<Arc<P>> {
		Arc::clone(&self.inner).into_any().downcast::<P>().ok()
	}

	pub fn is<P: Presenter>(&self) -> bool {
		self.kind() == P::KIND && self.downcast::<P>().is_some()
	}

	pub(crate) fn inner(&self) -> &Arc<dyn ErasedPresenter> {
		&self.inner
	}
}

impl PartialEq for PresenterHandle {
	fn eq(&self, other: &Self) -> bool {
		self.id == other.id
	}
}

impl Eq for PresenterHandle {}

impl std::fmt::Debug for PresenterHandle {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("PresenterHandle")
			.field("id", &self.id)
			.field("kind", &self.kind())
			.field("lineage", &self.lineage)
			.finish()
	}
}
