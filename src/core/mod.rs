//! Command tree model
//!
//! Contains the value model, option/argument descriptors, command descriptors
//! and the registry that stores them.

pub mod accessor;
pub mod command;
pub mod descriptor;
pub mod registry;
pub mod value;

pub use accessor::Accessor;
pub use command::{Command, CommandDescriptor, CommandInfo, CommandSpec};
pub use descriptor::{ArgumentSpec, Arity, Definition, OptionSpec};
pub use registry::Registry;
pub use value::{Value, ValueType};
