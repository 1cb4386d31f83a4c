//! Presenter lifecycle management for Model-View-Presenter hosts.
//!
//! Host views are transient: they are recreated on configuration changes,
//! backgrounded, or killed with their process and restored later. Presenters
//! hold the business logic and must outlive those views. A
//! [`PresenterRegistry`] owns the presenters, hands the right one to each view
//! through [`PresenterRegistry::provide`], captures [`RestorationToken`]s that
//! survive process death, and tears presenters down exactly once.
//!
//! # Modules
//!
//! - [`presenter`] - the [`Presenter`] contract and [`PresenterHandle`]
//! - [`decl`] - [`PresenterDecl`] and the [`PresenterView`] trait views implement
//! - [`registry`] - the [`PresenterRegistry`] itself
//! - [`token`] - [`RestorationToken`] layout and codec
//! - [`config`] - [`RegistryConfig`] loaded from TOML
//! - [`global`] - the replaceable process-wide default registry

pub mod config;
pub mod decl;
mod error;
pub mod global;
mod id;
pub mod presenter;
pub mod registry;
pub mod token;

pub use config::{ConfigError, KindConflictPolicy, RegistryConfig, UnknownKindPolicy};
pub use decl::{PresenterDecl, PresenterView};
pub use error::{RegistryError, Result};
pub use global::{global, set_global};
pub use id::{Lineage, PresenterId, ViewId};
pub use perch_state::{StateBundle, StateValue};
pub use presenter::{Presenter, PresenterHandle, ViewSlot};
pub use registry::{PresenterRecord, PresenterRegistry};
pub use token::{RestorationToken, TokenError};
