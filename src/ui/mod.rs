//! GUI panels and application state.

pub mod app;
pub mod components;
pub mod member_panel;
pub mod messaging_panel;
pub mod voucher_panel;

pub use app::{App, Panel};
