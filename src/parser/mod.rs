//! Command-line parsing
//!
//! Resolves the command path and binds options and positional arguments.

pub mod arguments;
pub mod options;
pub mod resolver;

pub use arguments::bind_arguments;
pub use options::OptionBinder;
pub use resolver::{ParsedCommand, Resolver};
