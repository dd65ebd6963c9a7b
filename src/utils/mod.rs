//! Utility modules for common functionality
//!
//! Naming rules shared by registration and configuration.

pub mod names;

pub use names::{NameRules, command_name_from_type, flag_from_key};
