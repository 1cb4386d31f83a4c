//! Per-view presenter slot driven by host lifecycle callbacks.

use std::marker::PhantomData;
use std::sync::Arc;

use perch_presenter::{
	Presenter, PresenterDecl, PresenterHandle, PresenterRegistry, PresenterView, RegistryError, RestorationToken, Result, ViewId,
};
use perch_state::StateBundle;
use tracing::{debug, trace, warn};

use crate::host::{read_token, write_token};

/// Why a view stopped being visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetachReason {
	/// The view will be recreated or shown again; keep the presenter.
	Transient,
	/// The view is going away for good; destroy the presenter.
	Finishing,
}

/// The identity a slot presents to the registry: its view id, declaring `P`.
struct Declared<P> {
	view: ViewId,
	_presenter: PhantomData<fn() -> P>,
}

impl<P: Presenter> PresenterView for Declared<P> {
	fn view_id(&self) -> ViewId {
		self.view
	}

	fn presenter_decl(&self) -> Option<PresenterDecl> {
		Some(PresenterDecl::of::<P>())
	}
}

/// Per-view presenter holder that host views embed.
///
/// The presenter is requested lazily on the first [`Self::on_create`] or
/// [`Self::on_resume`] and cached until [`Self::destroy_presenter`].
/// Dropping the slot releases the view's registry binding without
/// destroying the presenter.
pub struct PresenterSlot<P: Presenter> {
	registry: Arc<PresenterRegistry>,
	view: ViewId,
	handle: Option<PresenterHandle>,
	presenter: Option<Arc<P>>,
}

impl<P: Presenter> PresenterSlot<P> {
	/// Creates a slot backed by the process-wide registry.
	pub fn new(view: ViewId) -> Self {
		Self::with_registry(perch_presenter::global(), view)
	}

	pub fn with_registry(registry: Arc<PresenterRegistry>, view: ViewId) -> Self {
		Self { registry, view, handle: None, presenter: None }
	}

	pub fn view_id(&self) -> ViewId {
		self.view
	}

	pub fn registry(&self) -> &Arc<PresenterRegistry> {
		&self.registry
	}

	/// The cached presenter, if one was requested and not destroyed.
	pub fn presenter(&self) -> Option<&Arc<P>> {
		self.presenter.as_ref()
	}

	pub fn handle(&self) -> Option<&PresenterHandle> {
		self.handle.as_ref()
	}

	/// Requests the presenter, restoring from the token nested in `host_state`
	/// under the registry's configured state key.
	pub fn on_create(&mut self, host_state: Option<&StateBundle>) -> Result<Arc<P>> {
		let token = match host_state {
			Some(state) => read_token(state, &self.registry.config().state_key)?,
			None => None,
		};
		self.request(token.as_ref())
	}

	/// Nests the presenter's restoration token into `host_state`.
	///
	/// Does nothing while no presenter is held.
	pub fn on_save_state(&self, host_state: &mut StateBundle) -> Result<()> {
		let Some(handle) = &self.handle else {
			return Ok(());
		};
		let token = self.registry.save(handle)?;
		write_token(host_state, &self.registry.config().state_key, &token);
		Ok(())
	}

	/// Requests the presenter if needed and attaches `view` to it.
	pub fn on_resume(&mut self, view: &Arc<P::View>) -> Result<Arc<P>> {
		let presenter = self.request(None)?;
		presenter.take_view(view);
		Ok(presenter)
	}

	/// Detaches the active view; a finishing view also destroys the presenter.
	pub fn on_pause(&mut self, reason: DetachReason) {
		if let Some(presenter) = &self.presenter {
			presenter.drop_view();
		}
		if reason == DetachReason::Finishing {
			self.destroy_presenter();
		}
	}

	/// [`Self::on_create`] followed by [`Self::on_resume`], for hosts whose
	/// only lifecycle signal is attachment.
	pub fn on_attach(&mut self, view: &Arc<P::View>, host_state: Option<&StateBundle>) -> Result<Arc<P>> {
		self.on_create(host_state)?;
		self.on_resume(view)
	}

	/// Counterpart of [`Self::on_attach`].
	///
	/// A transient detach keeps the presenter and its binding, so attaching
	/// the same slot again delivers to the same presenter. The binding is
	/// released when the slot is dropped.
	pub fn on_detach(&mut self, reason: DetachReason) {
		self.on_pause(reason);
	}

	/// Destroys the held presenter. Does nothing if none is held.
	pub fn destroy_presenter(&mut self) {
		self.presenter = None;
		if let Some(handle) = self.handle.take() {
			debug!(view = %self.view, presenter = %handle.id(), "Destroying presenter");
			self.registry.destroy(&handle);
		}
	}

	/// Forgets the registry binding of this view, keeping the presenter alive.
	pub fn release(&mut self) {
		self.presenter = None;
		if self.handle.take().is_some() {
			self.registry.release(self.view);
		}
	}

	fn request(&mut self, token: Option<&RestorationToken>) -> Result<Arc<P>> {
		if let Some(presenter) = &self.presenter {
			return Ok(Arc::clone(presenter));
		}
		let declared = Declared::<P> { view: self.view, _presenter: PhantomData };
		let preexisting = self.registry.presenter_for(self.view).is_some()
			|| token
				.and_then(RestorationToken::lineage)
				.is_some_and(|lineage| self.registry.presenter_of_lineage(lineage).is_some());
		let handle = self.registry.provide(&declared, token)?;
		let Some(presenter) = handle.downcast::<P>() else {
			self.reject(&handle, preexisting);
			return Err(RegistryError::KindMismatch { expected: P::KIND, found: handle.kind() });
		};
		trace!(view = %self.view, presenter = %handle.id(), "Slot filled");
		self.handle = Some(handle);
		self.presenter = Some(Arc::clone(&presenter));
		Ok(presenter)
	}

	/// Undoes a `provide` that handed back a presenter of another type.
	///
	/// A presenter built for this request is destroyed; one that was already
	/// live only loses the binding to this view.
	fn reject(&self, handle: &PresenterHandle, preexisting: bool) {
		if preexisting {
			self.registry.release(self.view);
		} else {
			self.registry.destroy(handle);
		}
		warn!(view = %self.view, expected = P::KIND, found = handle.kind(), "Rejected presenter of another kind");
	}
}

impl<P: Presenter> Drop for PresenterSlot<P> {
	fn drop(&mut self) {
		self.release();
	}
}

impl<P: Presenter> std::fmt::Debug for PresenterSlot<P> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("PresenterSlot")
			.field("kind", &P::KIND)
			.field("view", &self.view)
			.field("presenter", &self.handle.as_ref().map(PresenterHandle::id))
			.finish()
	}
}
