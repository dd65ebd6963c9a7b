//! Command-line interface module
//!
//! Provides the application type, command dispatch, error hooks and the
//! command set of the bundled binary.

pub mod app;
pub mod commands;
pub mod dispatch;
pub mod hooks;

pub use app::App;
pub use commands::build_app;
pub use dispatch::{Context, Dispatcher, Phase};
pub use hooks::{ErrorHandler, ErrorHooks};
