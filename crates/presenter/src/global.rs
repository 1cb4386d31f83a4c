//! Process-wide default registry.
//!
//! The default is only a convenience: every registry is an ordinary value and
//! hosts that want explicit wiring can ignore this module. Tests swap in their
//! own instance with [`set_global`].

use std::sync::{Arc, LazyLock};

use arc_swap::ArcSwap;

use crate::PresenterRegistry;

static GLOBAL: LazyLock<ArcSwap<PresenterRegistry>> = LazyLock::new(|| ArcSwap::from_pointee(PresenterRegistry::new()));

/// Returns the current default registry.
pub fn global() -> Arc<PresenterRegistry> {
	GLOBAL.load_full()
}

/// Replaces the default registry, returning the previous one.
///
/// Presenters held by the previous registry are not touched; callers that
/// discard it should [`PresenterRegistry::destroy_all`] first.
pub fn set_global(registry: Arc<PresenterRegistry>) -> Arc<PresenterRegistry> {
	let previous = GLOBAL.swap(registry);
	tracing::debug!(presenters = previous.len(), "Replaced default presenter registry");
	previous
}
