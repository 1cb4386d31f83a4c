//! Opaque state bundles.
//!
//! A [`StateBundle`] is the blob a presenter writes when it is asked to save
//! itself and reads back when it is restored. Hosts nest bundles inside their
//! own per-view state and hand them back unchanged, so the format is a plain
//! recursive mapping of string keys to [`StateValue`]s with a compact binary
//! encoding for hosts that need bytes.

mod bundle;
mod error;
mod value;

pub use bundle::StateBundle;
pub use error::{Result, StateError};
pub use value::{MAX_DEPTH, StateValue};
