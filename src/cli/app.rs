//! Application entry point
//!
//! [`App`] owns the command registry, the global options and the error hooks.
//! Registration needs `&mut App`; parsing and running only need `&App`, so a
//! fully built app can be shared between threads.

use crate::{
    cli::{
        dispatch::{Dispatcher, Phase},
        hooks::ErrorHooks,
    },
    config::AppConfig,
    core::{command::CommandSpec, descriptor::OptionSpec, registry::Registry},
    error::{CliError, ErrorKind, RegistrationError, Result},
    parser::{ParsedCommand, Resolver},
};
use std::io::{self, BufRead, Write};
use tracing::{debug, instrument};

/// A command-line application
#[derive(Debug)]
pub struct App {
    config: AppConfig,
    registry: Registry,
    hooks: ErrorHooks,
}

impl App {
    /// Create an application with no commands
    pub fn new(config: AppConfig) -> std::result::Result<Self, RegistrationError> {
        config.validate()?;
        Ok(Self {
            config,
            registry: Registry::new(),
            hooks: ErrorHooks::new(),
        })
    }

    /// Add an option accepted before or after any command path
    pub fn global(&mut self, option: OptionSpec) -> std::result::Result<&mut Self, RegistrationError> {
        self.registry.register_global(option)?;
        Ok(self)
    }

    /// Register a command
    pub fn register(&mut self, spec: CommandSpec) -> std::result::Result<&mut Self, RegistrationError> {
        self.registry.register(spec)?;
        Ok(self)
    }

    /// Override the status for one error kind
    pub fn on_error<F>(&mut self, kind: ErrorKind, handler: F) -> &mut Self
    where
        F: Fn(&CliError, &mut dyn Write) -> i32 + Send + Sync + 'static,
    {
        self.hooks.on(kind, handler);
        self
    }

    /// Override the status for every kind without a specific handler
    pub fn on_any_error<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(&CliError, &mut dyn Write) -> i32 + Send + Sync + 'static,
    {
        self.hooks.on_any(handler);
        self
    }

    pub const fn config(&self) -> &AppConfig {
        &self.config
    }

    pub const fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Resolve and bind an argument vector (without the program name)
    pub fn parse<I, S>(&self, argv: I) -> Result<ParsedCommand>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let argv: Vec<String> = argv.into_iter().map(Into::into).collect();
        debug!("Phase: {}", Phase::Resolving);
        let parsed = Resolver::new(&self.registry).resolve(&argv)?;
        debug!("Phase: {} ({})", Phase::Bound, parsed.path().join(" "));
        Ok(parsed)
    }

    /// Run the lifecycle of an already parsed command
    pub fn dispatch(
        &self,
        parsed: &ParsedCommand,
        input: &mut dyn BufRead,
        out: &mut dyn Write,
        err: &mut dyn Write,
    ) -> Result<i32> {
        Dispatcher::new(&self.config, &self.registry).dispatch(parsed, input, out, err)
    }

    /// Turn an error into a status code through the hooks
    pub fn handle_error(&self, error: &CliError, stderr: &mut dyn Write) -> i32 {
        debug!("Phase: {} ({})", Phase::Failed, error.kind());
        self.hooks.handle(error, stderr)
    }

    /// Dispatch a parsed command and map any failure to a status code
    pub fn run_parsed(
        &self,
        parsed: &ParsedCommand,
        input: &mut dyn BufRead,
        out: &mut dyn Write,
        err: &mut dyn Write,
    ) -> i32 {
        match self.dispatch(parsed, input, &mut *out, &mut *err) {
            Ok(status) => status,
            Err(error) => self.handle_error(&error, err),
        }
    }

    /// Parse and run against the process's standard streams
    pub fn run<I, S>(&self, argv: I) -> i32
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let stdin = io::stdin();
        let stdout = io::stdout();
        let stderr = io::stderr();
        self.run_with_io(argv, &mut stdin.lock(), &mut stdout.lock(), &mut stderr.lock())
    }

    /// Parse and run, writing to the given streams
    #[instrument(skip_all, fields(app = %self.config.name))]
    pub fn run_with_io<I, S>(
        &self,
        argv: I,
        input: &mut dyn BufRead,
        out: &mut dyn Write,
        err: &mut dyn Write,
    ) -> i32
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        debug!("Phase: {}", Phase::Idle);
        match self.parse(argv) {
            Ok(parsed) => self.run_parsed(&parsed, input, out, err),
            Err(error) => self.handle_error(&error, err),
        }
    }
}
