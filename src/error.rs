//! Error types for the parsing engine
//!
//! Runtime errors produced while resolving and binding a command line are
//! collected in [`CliError`]. Mistakes in the command tree itself are reported
//! as [`RegistrationError`] and are meant to abort startup.

use crate::core::value::ValueType;
use std::fmt;
use thiserror::Error;

/// Error raised while parsing, binding or executing a command line
#[derive(Error, Debug)]
pub enum CliError {
    /// The leading tokens do not name a registered command
    #[error("unknown command `{command}`")]
    UnknownCommand { command: String },

    /// The argument vector did not contain a command at all
    #[error("no command given")]
    MissingCommand,

    /// A required positional argument was never filled
    #[error("missing required argument `{name}`")]
    MissingRequiredArgument { name: String },

    /// A positional arity could not be satisfied by the remaining tokens
    #[error("argument `{name}` expects {expected} value(s), got {found}")]
    InvalidArgumentValueCount {
        name: String,
        expected: String,
        found: usize,
    },

    /// Positional tokens were left over after every argument was bound
    #[error("unexpected arguments: {}", .arguments.join(" "))]
    UnexpectedArguments { arguments: Vec<String> },

    /// A required option was never given
    #[error("missing required option `{option}`")]
    MissingRequiredOption { option: String },

    /// A value-taking option appeared without its value
    #[error("option `{flag}` expects a value")]
    MissingOptionValue { flag: String },

    /// A token could not be coerced to its declared type
    #[error("cannot parse `{value}` as {expected} for `{name}`")]
    ValueParsing {
        name: String,
        value: String,
        expected: ValueType,
    },

    /// A value is not one of the declared choices
    #[error("invalid choice `{value}` for `{name}` (choose from {})", .choices.join(", "))]
    InvalidChoice {
        name: String,
        value: String,
        choices: Vec<String>,
    },

    /// The dispatched command itself reported an error
    #[error("command `{command}` failed: {source}")]
    CommandFailed {
        command: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Fieldless mirror of [`CliError`], used to key override hooks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorKind {
    UnknownCommand,
    MissingCommand,
    MissingRequiredArgument,
    InvalidArgumentValueCount,
    UnexpectedArguments,
    MissingRequiredOption,
    MissingOptionValue,
    ValueParsing,
    InvalidChoice,
    CommandFailed,
}

impl ErrorKind {
    /// Label printed in front of the message by the default handler
    pub const fn name(self) -> &'static str {
        match self {
            Self::UnknownCommand => "UnknownCommand",
            Self::MissingCommand => "MissingCommand",
            Self::MissingRequiredArgument => "MissingRequiredArgument",
            Self::InvalidArgumentValueCount => "InvalidArgumentValueCount",
            Self::UnexpectedArguments => "UnexpectedArguments",
            Self::MissingRequiredOption => "MissingRequiredOption",
            Self::MissingOptionValue => "MissingOptionValue",
            Self::ValueParsing => "ValueParsingError",
            Self::InvalidChoice => "InvalidChoice",
            Self::CommandFailed => "CommandFailed",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl CliError {
    /// Kind of this error, for hook lookup
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownCommand { .. } => ErrorKind::UnknownCommand,
            Self::MissingCommand => ErrorKind::MissingCommand,
            Self::MissingRequiredArgument { .. } => ErrorKind::MissingRequiredArgument,
            Self::InvalidArgumentValueCount { .. } => ErrorKind::InvalidArgumentValueCount,
            Self::UnexpectedArguments { .. } => ErrorKind::UnexpectedArguments,
            Self::MissingRequiredOption { .. } => ErrorKind::MissingRequiredOption,
            Self::MissingOptionValue { .. } => ErrorKind::MissingOptionValue,
            Self::ValueParsing { .. } => ErrorKind::ValueParsing,
            Self::InvalidChoice { .. } => ErrorKind::InvalidChoice,
            Self::CommandFailed { .. } => ErrorKind::CommandFailed,
        }
    }

    /// Create an unknown command error
    pub fn unknown_command(command: impl Into<String>) -> Self {
        Self::UnknownCommand {
            command: command.into(),
        }
    }

    /// Create a missing required argument error
    pub fn missing_argument(name: impl Into<String>) -> Self {
        Self::MissingRequiredArgument { name: name.into() }
    }

    /// Create an invalid argument value count error
    pub fn value_count(name: impl Into<String>, expected: impl Into<String>, found: usize) -> Self {
        Self::InvalidArgumentValueCount {
            name: name.into(),
            expected: expected.into(),
            found,
        }
    }

    /// Create a missing required option error
    pub fn missing_option(option: impl Into<String>) -> Self {
        Self::MissingRequiredOption {
            option: option.into(),
        }
    }

    /// Create a missing option value error
    pub fn missing_value(flag: impl Into<String>) -> Self {
        Self::MissingOptionValue { flag: flag.into() }
    }

    /// Create a value parsing error
    pub fn value_parsing(name: impl Into<String>, value: impl Into<String>, expected: ValueType) -> Self {
        Self::ValueParsing {
            name: name.into(),
            value: value.into(),
            expected,
        }
    }

    /// Wrap an error returned by a command implementation
    pub fn command_failed(command: impl Into<String>, source: anyhow::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source: source.into(),
        }
    }
}

/// Error raised while building the command tree
///
/// These are programming errors in the application, never caused by user input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    /// A command was registered without any path segment
    #[error("command path must have at least one segment")]
    EmptyPath,

    /// A path segment or alias does not follow the naming rules
    #[error("invalid command name `{name}`")]
    InvalidName { name: String },

    /// A flag spelling does not follow the naming rules
    #[error("invalid flag `{flag}` on `{owner}`")]
    InvalidFlag { flag: String, owner: String },

    /// Two commands share a path
    #[error("command `{path}` is already registered")]
    DuplicatePath { path: String },

    /// Two commands share an alias under the same parent
    #[error("alias `{alias}` is already taken under `{parent}`")]
    DuplicateAlias { alias: String, parent: String },

    /// Two options of one command share a flag spelling
    #[error("flag `{flag}` is defined twice for `{owner}`")]
    DuplicateFlag { flag: String, owner: String },

    /// An argument and an option of one command share a key
    #[error("`{name}` is both an argument and an option of `{owner}`")]
    NameConflict { name: String, owner: String },

    /// A variadic argument is followed by another argument
    #[error("variadic argument `{argument}` of `{owner}` must be the last argument")]
    VariadicNotLast { argument: String, owner: String },

    /// An exact arity of zero was declared
    #[error("argument `{argument}` of `{owner}` declares an arity of zero")]
    ZeroArity { argument: String, owner: String },

    /// A default value does not match its own declaration
    #[error("invalid default for `{name}` of `{owner}`: {reason}")]
    InvalidDefault {
        name: String,
        owner: String,
        reason: String,
    },

    /// Application metadata failed validation
    #[error("invalid application config: {message}")]
    InvalidConfig { message: String },
}

/// Result type alias for runtime parsing
pub type Result<T> = std::result::Result<T, CliError>;
