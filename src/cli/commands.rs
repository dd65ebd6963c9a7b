//! Command set of the bundled `argtree` binary
//!
//! A small demonstration tree: a build command, a `db` group sharing options,
//! a variadic greeter and a command listing the tree itself.

use crate::{
    cli::{app::App, dispatch::Context},
    config::AppConfig,
    core::{Accessor, ArgumentSpec, Arity, Command, CommandSpec, Definition, OptionSpec},
    error::{ErrorKind, RegistrationError},
};
use anyhow::ensure;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Build the demo application
pub fn build_app() -> Result<App, RegistrationError> {
    let config = AppConfig::new("argtree")
        .version(env!("CARGO_PKG_VERSION"))
        .description(env!("CARGO_PKG_DESCRIPTION"));
    let mut app = App::new(config)?;

    app.global(OptionSpec::switch("debug").help("Enable debug output"))?
        .global(
            OptionSpec::new("color")
                .help("When to use colors")
                .default("auto")
                .choices(["auto", "always", "never"]),
        )?;

    let common = Definition::new("common")
        .option(
            OptionSpec::switch("verbose")
                .flag("-v")
                .flag("--verbose")
                .help("Print more details"),
        )
        .shared();
    let db = Definition::new("db")
        .extends(Arc::clone(&common))
        .option(
            OptionSpec::new("database")
                .flag("-D")
                .flag("--database")
                .default("main")
                .help("Database to operate on"),
        )
        .shared();

    app.register(
        CommandSpec::of::<BuildCommand, _, _>(["build"])
            .about("Build a target")
            .extends(common)
            .option(
                OptionSpec::new("jobs")
                    .flag("-j")
                    .flag("--jobs")
                    .default(1)
                    .help("Parallel jobs"),
            )
            .argument(ArgumentSpec::new("target").help("What to build")),
    )?
    .register(
        CommandSpec::of::<MigrateCommand, _, _>(["db", "migrate"])
            .about("Apply pending migrations")
            .alias("m")
            .extends(Arc::clone(&db))
            .option(OptionSpec::new("steps").default(1).help("Number of steps"))
            .option(OptionSpec::switch("dry_run").help("Only show what would run")),
    )?
    .register(
        CommandSpec::of::<StatusCommand, _, _>(["db", "status"])
            .about("Show migration status")
            .extends(db),
    )?
    .register(
        CommandSpec::of::<GreetCommand, _, _>(["greet"])
            .about("Greet people")
            .option(OptionSpec::switch("shout").flag("-s").flag("--shout"))
            .argument(
                ArgumentSpec::new("names")
                    .arity(Arity::AtLeastOne)
                    .help("Names to greet, `-` reads them from stdin"),
            ),
    )?
    .register(
        CommandSpec::derived::<CommandsCommand>()
            .alias("ls")
            .doc("List registered commands.\n\nPrints one line per command with its aliases."),
    )?;

    app.on_error(ErrorKind::UnknownCommand, |error, stderr| {
        if let Err(e) = writeln!(stderr, "{error}. Run `argtree commands` to list commands.") {
            warn!("Could not write error report: {e}");
        }
        2
    });

    Ok(app)
}

/// `build <target>`
#[derive(Debug, Default)]
pub struct BuildCommand;

impl Command for BuildCommand {
    #[instrument(skip_all)]
    fn run(&mut self, ctx: &mut Context<'_>, args: &Accessor) -> anyhow::Result<i32> {
        let target = args.get_str("target").unwrap_or_default();
        let jobs = args.get_int("jobs").unwrap_or(1);
        info!("Building {target} with {jobs} job(s)");

        writeln!(ctx.stdout(), "building {target} (jobs: {jobs})")?;
        if args.flag("verbose") {
            let color = ctx.globals().get_str("color").unwrap_or("auto").to_string();
            writeln!(ctx.stdout(), "color: {color}")?;
        }
        Ok(0)
    }
}

/// `db migrate [--steps N] [--dry-run]`
#[derive(Debug, Default)]
pub struct MigrateCommand;

impl Command for MigrateCommand {
    fn pre_run(&mut self, _ctx: &mut Context<'_>, args: &Accessor) -> anyhow::Result<()> {
        let steps = args.get_int("steps").unwrap_or(1);
        ensure!(steps > 0, "--steps must be positive, got {steps}");
        Ok(())
    }

    fn run(&mut self, ctx: &mut Context<'_>, args: &Accessor) -> anyhow::Result<i32> {
        let database = args.get_str("database").unwrap_or("main");
        let steps = args.get_int("steps").unwrap_or(1);
        let prefix = if args.flag("dry_run") { "[dry run] " } else { "" };

        writeln!(ctx.stdout(), "{prefix}migrating {database} by {steps} step(s)")?;
        Ok(0)
    }
}

/// `db status`
#[derive(Debug, Default)]
pub struct StatusCommand;

impl Command for StatusCommand {
    fn run(&mut self, ctx: &mut Context<'_>, args: &Accessor) -> anyhow::Result<i32> {
        let database = args.get_str("database").unwrap_or("main");
        writeln!(ctx.stdout(), "{database}: up to date")?;
        Ok(0)
    }
}

/// `greet <names>...`; a `-` name reads one name per line from stdin
#[derive(Debug, Default)]
pub struct GreetCommand {
    greeted: usize,
}

impl Command for GreetCommand {
    fn run(&mut self, ctx: &mut Context<'_>, args: &Accessor) -> anyhow::Result<i32> {
        let mut names = Vec::new();
        for name in args.get_strings("names") {
            if name == "-" {
                let mut line = String::new();
                while ctx.stdin().read_line(&mut line)? > 0 {
                    let trimmed = line.trim();
                    if !trimmed.is_empty() {
                        names.push(trimmed.to_string());
                    }
                    line.clear();
                }
            } else {
                names.push(name.to_string());
            }
        }

        let shout = args.flag("shout");
        for name in names {
            let line = format!("Hello, {name}!");
            let line = if shout { line.to_uppercase() } else { line };
            writeln!(ctx.stdout(), "{line}")?;
            self.greeted += 1;
        }
        Ok(0)
    }

    fn post_run(&mut self, _ctx: &mut Context<'_>, _args: &Accessor) -> anyhow::Result<()> {
        info!("Greeted {} people", self.greeted);
        Ok(())
    }
}

/// `commands`: list the command tree
#[derive(Debug, Default)]
pub struct CommandsCommand;

impl Command for CommandsCommand {
    fn run(&mut self, ctx: &mut Context<'_>, _args: &Accessor) -> anyhow::Result<i32> {
        for command in ctx.list_commands() {
            let mut line = command.path.join(" ");
            if !command.aliases.is_empty() {
                line.push_str(&format!(" ({})", command.aliases.join(", ")));
            }
            writeln!(ctx.stdout(), "{line:<24}{}", command.description)?;
        }
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Value;

    fn run(argv: &[&str]) -> (i32, String, String) {
        let app = build_app().unwrap();
        let (mut out, mut err) = (Vec::new(), Vec::new());
        let status = app.run_with_io(argv.iter().copied(), &mut std::io::empty(), &mut out, &mut err);
        (
            status,
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
        )
    }

    #[test]
    fn test_build_app_registers_tree() {
        let app = build_app().unwrap();
        assert_eq!(app.registry().len(), 5);
        assert!(app.registry().get("commands").is_some());
    }

    #[test]
    fn test_inherited_options() {
        let app = build_app().unwrap();
        let parsed = app.parse(["db", "m", "-v", "-D", "replica", "--steps=2"]).unwrap();
        assert_eq!(parsed.path(), ["db", "migrate"]);
        assert_eq!(parsed.options()["verbose"], Value::Bool(true));
        assert_eq!(parsed.options()["database"], Value::from("replica"));
        assert_eq!(parsed.options()["steps"], Value::Int(2));
    }

    #[test]
    fn test_migrate_pre_run_rejects_zero_steps() {
        let (status, out, err) = run(&["db", "migrate", "--steps", "0"]);
        assert_eq!(status, 1);
        assert!(out.is_empty());
        assert!(err.starts_with("CommandFailed: "));
    }

    #[test]
    fn test_unknown_command_hook() {
        let (status, _, err) = run(&["frobnicate"]);
        assert_eq!(status, 2);
        assert!(err.contains("unknown command `frobnicate`"));
    }

    #[test]
    fn test_greet_shout() {
        let (status, out, _) = run(&["greet", "-s", "ada", "linus"]);
        assert_eq!(status, 0);
        assert_eq!(out, "HELLO, ADA!\nHELLO, LINUS!\n");
    }

    #[test]
    fn test_greet_reads_stdin() {
        let app = build_app().unwrap();
        let mut input = std::io::Cursor::new("ada\n\nlinus\n");
        let mut out = Vec::new();
        let status = app.run_with_io(["greet", "grace", "-"], &mut input, &mut out, &mut Vec::<u8>::new());
        assert_eq!(status, 0);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Hello, grace!\nHello, ada!\nHello, linus!\n"
        );
    }

    #[test]
    fn test_commands_listing() {
        let (_, out, _) = run(&["ls"]);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("build"));
        assert!(out.contains("db migrate (m)"));
        assert!(out.contains("List registered commands."));
    }
}
