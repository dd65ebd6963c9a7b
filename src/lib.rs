//! # argtree
//!
//! Declarative command tree parsing and dispatch for command-line tools.
//! Commands are registered under (possibly nested) paths with typed options
//! and positional arguments; a raw argument vector is resolved to a command,
//! validated, coerced and dispatched to the command's lifecycle.
//!
//! ## Features
//!
//! - Greedy multi-segment command paths with aliases
//! - Global options accepted anywhere on the line
//! - Exact, optional and variadic positional arities
//! - Option inheritance through shared definitions
//! - Error kinds with per-kind status code hooks
//!
//! ## Example
//!
//! ```no_run
//! use argtree::{App, AppConfig, ArgumentSpec, CommandSpec, OptionSpec};
//! use std::io::Write;
//!
//! let mut app = App::new(AppConfig::new("tool"))?;
//! app.register(
//!     CommandSpec::from_fn(["build"], |ctx, args| {
//!         writeln!(ctx.stdout(), "building {}", args.get_str("target").unwrap_or_default())?;
//!         Ok(0)
//!     })
//!     .option(OptionSpec::switch("verbose"))
//!     .argument(ArgumentSpec::new("target")),
//! )?;
//! std::process::exit(app.run(std::env::args().skip(1)));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod parser;
pub mod utils;

pub use cli::{App, Context};
pub use config::AppConfig;
pub use core::{
    Accessor, ArgumentSpec, Arity, Command, CommandInfo, CommandSpec, Definition, OptionSpec,
    Registry, Value, ValueType,
};
pub use error::{CliError, ErrorKind, RegistrationError};
pub use parser::ParsedCommand;

use anyhow::Result;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging with appropriate verbosity
///
/// Logs go to stderr so they never mix with command output.
pub fn setup_logging(debug: bool) -> Result<()> {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_level(true)
                .compact(),
        )
        .with(filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}
