//! Command descriptors and the executable command trait

use crate::{
    cli::dispatch::Context,
    core::{
        accessor::Accessor,
        descriptor::{ArgumentSpec, Definition, OptionSpec},
    },
    utils::names::command_name_from_type,
};
use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc};

/// Behavior of a registered command
///
/// A fresh instance is created for every dispatch. Errors returned from any
/// of the hooks abort the lifecycle and are reported as a failed command.
pub trait Command {
    /// Runs before [`Command::run`]
    fn pre_run(&mut self, _ctx: &mut Context<'_>, _args: &Accessor) -> anyhow::Result<()> {
        Ok(())
    }

    /// Main body; the returned value becomes the process status
    fn run(&mut self, ctx: &mut Context<'_>, args: &Accessor) -> anyhow::Result<i32>;

    /// Runs after a successful [`Command::run`]
    fn post_run(&mut self, _ctx: &mut Context<'_>, _args: &Accessor) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Produces a new command instance per dispatch
pub type CommandFactory = Arc<dyn Fn() -> Box<dyn Command> + Send + Sync>;

type RunFn = dyn Fn(&mut Context<'_>, &Accessor) -> anyhow::Result<i32> + Send + Sync;

/// Adapter turning a closure into a [`Command`]
struct FnCommand(Arc<RunFn>);

impl Command for FnCommand {
    fn run(&mut self, ctx: &mut Context<'_>, args: &Accessor) -> anyhow::Result<i32> {
        (self.0)(ctx, args)
    }
}

/// Registration input for one command
pub struct CommandSpec {
    path: Vec<String>,
    aliases: Vec<String>,
    description: String,
    doc: Option<String>,
    definition: Definition,
    factory: CommandFactory,
}

impl CommandSpec {
    /// Create a command at `path` built by `factory`
    pub fn new<I, S, F>(path: I, factory: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn() -> Box<dyn Command> + Send + Sync + 'static,
    {
        let path: Vec<String> = path.into_iter().map(Into::into).collect();
        Self {
            definition: Definition::new(path.join("-")),
            path,
            aliases: Vec::new(),
            description: String::new(),
            doc: None,
            factory: Arc::new(factory),
        }
    }

    /// Create a command at `path` instantiated through `Default`
    pub fn of<C, I, S>(path: I) -> Self
    where
        C: Command + Default + 'static,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(path, || -> Box<dyn Command> { Box::new(C::default()) })
    }

    /// Create a single-segment command named after its type
    ///
    /// `DbMigrateCommand` registers as `db-migrate`.
    pub fn derived<C>() -> Self
    where
        C: Command + Default + 'static,
    {
        Self::of::<C, _, _>([command_name_from_type(std::any::type_name::<C>())])
    }

    /// Create a command whose body is a closure
    pub fn from_fn<I, S, F>(path: I, run: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&mut Context<'_>, &Accessor) -> anyhow::Result<i32> + Send + Sync + 'static,
    {
        let run: Arc<RunFn> = Arc::new(run);
        Self::new(path, move || -> Box<dyn Command> {
            Box::new(FnCommand(Arc::clone(&run)))
        })
    }

    /// Add an alternate spelling for the last path segment
    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// One-line description
    #[must_use]
    pub fn about(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Long documentation; its first line doubles as the description
    #[must_use]
    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Inherit options and arguments from a shared definition
    #[must_use]
    pub fn extends(mut self, parent: Arc<Definition>) -> Self {
        self.definition = self.definition.extends(parent);
        self
    }

    #[must_use]
    pub fn option(mut self, option: OptionSpec) -> Self {
        self.definition = self.definition.option(option);
        self
    }

    #[must_use]
    pub fn argument(mut self, argument: ArgumentSpec) -> Self {
        self.definition = self.definition.argument(argument);
        self
    }

    pub fn path(&self) -> &[String] {
        &self.path
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// Flatten the definition chain into an immutable descriptor
    pub(crate) fn into_descriptor(self) -> CommandDescriptor {
        let (options, arguments) = self.definition.flatten();
        let description = if self.description.is_empty() {
            self.doc
                .as_deref()
                .and_then(|doc| doc.lines().map(str::trim).find(|line| !line.is_empty()))
                .unwrap_or_default()
                .to_string()
        } else {
            self.description
        };

        CommandDescriptor {
            path: self.path,
            aliases: self.aliases,
            description,
            doc: self.doc,
            options: options.into_iter().map(OptionSpec::normalized).collect(),
            arguments: arguments.into_iter().map(ArgumentSpec::normalized).collect(),
            factory: self.factory,
        }
    }
}

impl fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandSpec")
            .field("path", &self.path)
            .field("aliases", &self.aliases)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// A registered command with its flattened options and arguments
pub struct CommandDescriptor {
    path: Vec<String>,
    aliases: Vec<String>,
    description: String,
    doc: Option<String>,
    options: Vec<OptionSpec>,
    arguments: Vec<ArgumentSpec>,
    factory: CommandFactory,
}

impl CommandDescriptor {
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Path segments joined with `-`
    pub fn name(&self) -> String {
        self.path.join("-")
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    pub fn options(&self) -> &[OptionSpec] {
        &self.options
    }

    pub fn arguments(&self) -> &[ArgumentSpec] {
        &self.arguments
    }

    /// Create a fresh command instance
    pub fn instantiate(&self) -> Box<dyn Command> {
        (self.factory)()
    }

    /// Documentation snapshot of this command
    pub fn info(&self) -> CommandInfo {
        CommandInfo {
            name: self.name(),
            path: self.path.clone(),
            description: self.description.clone(),
            aliases: self.aliases.clone(),
            doc: self.doc.clone(),
        }
    }
}

impl fmt::Debug for CommandDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDescriptor")
            .field("path", &self.path)
            .field("aliases", &self.aliases)
            .field("description", &self.description)
            .field("options", &self.options)
            .field("arguments", &self.arguments)
            .finish_non_exhaustive()
    }
}

/// Documentation data about a registered command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandInfo {
    /// Path segments joined with `-`
    pub name: String,
    pub path: Vec<String>,
    pub description: String,
    pub aliases: Vec<String>,
    pub doc: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct DbMigrateCommand;

    impl Command for DbMigrateCommand {
        fn run(&mut self, _ctx: &mut Context<'_>, _args: &Accessor) -> anyhow::Result<i32> {
            Ok(0)
        }
    }

    #[test]
    fn test_derived_name() {
        let spec = CommandSpec::derived::<DbMigrateCommand>();
        assert_eq!(spec.path(), ["db-migrate"]);
    }

    #[test]
    fn test_description_from_doc() {
        let descriptor = CommandSpec::of::<DbMigrateCommand, _, _>(["db", "migrate"])
            .doc("\n  Apply pending migrations.\n\n  Runs every step in order.")
            .alias("m")
            .into_descriptor();
        assert_eq!(descriptor.description(), "Apply pending migrations.");
        assert_eq!(descriptor.name(), "db-migrate");

        let info = descriptor.info();
        assert_eq!(info.path, ["db", "migrate"]);
        assert_eq!(info.aliases, ["m"]);
    }

    #[test]
    fn test_descriptor_normalizes_options() {
        let descriptor = CommandSpec::of::<DbMigrateCommand, _, _>(["build"])
            .option(OptionSpec::switch("dry_run"))
            .argument(ArgumentSpec::new("target").default("app"))
            .into_descriptor();
        assert_eq!(descriptor.options()[0].flags(), ["--dry-run"]);
        assert!(!descriptor.arguments()[0].is_required());
    }
}
