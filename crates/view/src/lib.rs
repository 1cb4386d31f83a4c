//! Glue between host views and a [`perch_presenter::PresenterRegistry`].
//!
//! A host view embeds a [`PresenterSlot`] and forwards its lifecycle callbacks:
//!
//! | host callback              | slot method                          |
//! |----------------------------|--------------------------------------|
//! | create (with saved state)  | [`PresenterSlot::on_create`]         |
//! | save state                 | [`PresenterSlot::on_save_state`]     |
//! | resume / becomes visible   | [`PresenterSlot::on_resume`]         |
//! | pause / becomes invisible  | [`PresenterSlot::on_pause`]          |
//! | attached to a window       | [`PresenterSlot::on_attach`]         |
//! | detached from a window     | [`PresenterSlot::on_detach`]         |
//!
//! Dropping the slot (with its view object) releases the registry binding
//! but leaves the presenter alive for the next incarnation of the view.

mod host;
mod slot;

pub use host::{read_token, write_token};
pub use slot::{DetachReason, PresenterSlot};
