//! Tokenizer and command-path resolver
//!
//! Turns a raw argument vector into a [`ParsedCommand`]:
//!
//! 1. global options are pulled out of the whole stream;
//! 2. the longest registered command path is matched greedily;
//! 3. the rest is split into command options and positionals;
//! 4. options get their defaults and arguments are bound by arity.

use crate::{
    core::{
        accessor::Accessor, command::CommandDescriptor, registry::Registry, value::Value,
    },
    error::{CliError, Result},
    parser::{
        arguments::bind_arguments,
        options::{OptionBinder, OptionMatch, Scope, Terminator, finalize},
    },
};
use std::{collections::BTreeMap, sync::Arc};
use tracing::{debug, instrument};

/// Outcome of parsing one command line
#[derive(Debug, Clone)]
pub struct ParsedCommand {
    path: Vec<String>,
    descriptor: Arc<CommandDescriptor>,
    arguments: BTreeMap<String, Value>,
    options: BTreeMap<String, Value>,
    globals: BTreeMap<String, Value>,
}

impl ParsedCommand {
    /// Canonical path of the resolved command (aliases are resolved)
    pub fn path(&self) -> &[String] {
        &self.path
    }

    pub fn descriptor(&self) -> &Arc<CommandDescriptor> {
        &self.descriptor
    }

    pub const fn arguments(&self) -> &BTreeMap<String, Value> {
        &self.arguments
    }

    pub const fn options(&self) -> &BTreeMap<String, Value> {
        &self.options
    }

    pub const fn globals(&self) -> &BTreeMap<String, Value> {
        &self.globals
    }

    /// Arguments and command options in one view
    pub fn accessor(&self) -> Accessor {
        let mut merged = self.options.clone();
        merged.extend(self.arguments.clone());
        Accessor::new(merged)
    }

    pub fn global_accessor(&self) -> Accessor {
        Accessor::new(self.globals.clone())
    }
}

impl PartialEq for ParsedCommand {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
            && self.arguments == other.arguments
            && self.options == other.options
            && self.globals == other.globals
    }
}

/// Resolves command lines against a registry
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    registry: &'a Registry,
}

impl<'a> Resolver<'a> {
    pub const fn new(registry: &'a Registry) -> Self {
        Self { registry }
    }

    /// Parse an argument vector (without the program name)
    #[instrument(skip(self))]
    pub fn resolve(&self, argv: &[String]) -> Result<ParsedCommand> {
        let globals = self.registry.globals();

        let first = OptionBinder::new(globals, &[]).scan(argv, Terminator::Keep)?;
        let mut global_matches = first.matches;
        let remainder = first.rest;

        let (descriptor, consumed) = self.resolve_path(&remainder)?;
        debug!("Resolved command `{}`", descriptor.path().join(" "));

        let local = &remainder[consumed..];
        let second = OptionBinder::new(globals, descriptor.options()).scan(local, Terminator::Consume)?;
        let (later_globals, command_matches): (Vec<OptionMatch>, Vec<OptionMatch>) = second
            .matches
            .into_iter()
            .partition(|m| m.scope == Scope::Global);
        global_matches.extend(later_globals);

        let globals = finalize(globals, &global_matches)?;
        let options = finalize(descriptor.options(), &command_matches)?;
        let arguments = bind_arguments(descriptor.arguments(), &second.rest)?;

        Ok(ParsedCommand {
            path: descriptor.path().to_vec(),
            descriptor: Arc::clone(descriptor),
            arguments,
            options,
            globals,
        })
    }

    /// Longest registered command at the head of `tokens`, and its length
    fn resolve_path(&self, tokens: &[String]) -> Result<(&'a Arc<CommandDescriptor>, usize)> {
        let Some(first) = tokens.first() else {
            return Err(CliError::MissingCommand);
        };

        let mut candidate: Vec<&str> = Vec::new();
        let mut best = None;
        let mut stopped_at = None;

        for token in tokens {
            if token.starts_with('-') {
                break;
            }
            candidate.push(token);
            if !self.registry.prefix_exists(&candidate) {
                candidate.pop();
                stopped_at = Some(token.as_str());
                break;
            }
            if let Some(descriptor) = self.registry.lookup(&candidate) {
                best = Some((descriptor, candidate.len()));
            }
        }

        best.ok_or_else(|| {
            let mut shown = candidate;
            shown.extend(stopped_at);
            if shown.is_empty() {
                shown.push(first);
            }
            CliError::unknown_command(shown.join(" "))
        })
    }
}
