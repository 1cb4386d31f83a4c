//! Presenter declarations: how a view names the presenter it needs.

use std::any::TypeId;
use std::sync::Arc;

use perch_state::StateBundle;

use crate::id::ViewId;
use crate::presenter::{ErasedPresenter, Presenter};

type CreateFn = fn() -> anyhow::Result<Arc<dyn ErasedPresenter>>;
type RestoreFn = fn(&StateBundle) -> anyhow::Result<Arc<dyn ErasedPresenter>>;

/// Constructor table for one presenter kind.
///
/// Built with [`PresenterDecl::of`], which captures the presenter's
/// [`Presenter::create`] and [`Presenter::restore`] at compile time. Views
/// return one from [`PresenterView::presenter_decl`]; registries keep them in
/// their restoration table.
#[derive(Clone, Copy)]
pub struct PresenterDecl {
	kind: &'static str,
	type_id: TypeId,
	type_name: &'static str,
	create: CreateFn,
	restore: RestoreFn,
}

impl PresenterDecl {
	/// Declares presenter type `P`.
	pub fn of<P: Presenter>() -> Self {
		Self {
			kind: P::KIND,
			type_id: TypeId::of::<P>(),
			type_name: std::any::type_name::<P>(),
			create: create_erased::<P>,
			restore: restore_erased::<P>,
		}
	}

	/// Returns the token discriminator of the declared presenter.
	pub fn kind(&self) -> &'static str {
		self.kind
	}

	/// Returns the Rust type name of the declared presenter.
	pub fn type_name(&self) -> &'static str {
		self.type_name
	}

	/// Returns true if both declarations name the same Rust type.
	pub fn same_type(&self, other: &PresenterDecl) -> bool {
		self.type_id == other.type_id
	}

	pub(crate) fn create(&self) -> anyhow::Result<Arc<dyn ErasedPresenter>> {
		(self.create)()
	}

	pub(crate) fn restore(&self, state: &StateBundle) -> anyhow::Result<Arc<dyn ErasedPresenter>> {
		(self.restore)(state)
	}
}

impl std::fmt::Debug for PresenterDecl {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("PresenterDecl")
			.field("kind", &self.kind)
			.field("type_name", &self.type_name)
			.finish()
	}
}

fn create_erased<P: Presenter>() -> anyhow::Result<Arc<dyn ErasedPresenter>> {
	let presenter: Arc<dyn ErasedPresenter> = Arc::new(P::create()?);
	Ok(presenter)
}

fn restore_erased<P: Presenter>(state: &StateBundle) -> anyhow::Result<Arc<dyn ErasedPresenter>> {
	let presenter: Arc<dyn ErasedPresenter> = Arc::new(P::restore(state)?);
	Ok(presenter)
}

/// A host view that can request a presenter.
pub trait PresenterView {
	/// Identity of this view object.
	fn view_id(&self) -> ViewId;

	/// The presenter this view needs, if it declares one.
	fn presenter_decl(&self) -> Option<PresenterDecl> {
		None
	}
}
