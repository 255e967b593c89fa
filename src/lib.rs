pub mod api;
pub mod config;
pub mod controllers;
pub mod error;
pub mod tasks;
pub mod ui;

pub use error::{AppError, Result};
