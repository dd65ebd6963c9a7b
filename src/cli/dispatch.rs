//! Command dispatch and lifecycle

use crate::{
    config::AppConfig,
    core::{accessor::Accessor, command::CommandInfo, registry::Registry},
    error::{CliError, Result},
    parser::ParsedCommand,
};
use std::{
    fmt,
    io::{BufRead, Write},
};
use tracing::{debug, instrument};

/// Stage of one `run` invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Resolving,
    Bound,
    Executing,
    Completed,
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Resolving => "resolving",
            Self::Bound => "bound",
            Self::Executing => "executing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// What a running command can see of the application
pub struct Context<'a> {
    config: &'a AppConfig,
    globals: &'a Accessor,
    registry: &'a Registry,
    path: &'a [String],
    input: &'a mut dyn BufRead,
    out: &'a mut dyn Write,
    err: &'a mut dyn Write,
}

impl<'a> Context<'a> {
    pub fn new(
        config: &'a AppConfig,
        globals: &'a Accessor,
        registry: &'a Registry,
        path: &'a [String],
        input: &'a mut dyn BufRead,
        out: &'a mut dyn Write,
        err: &'a mut dyn Write,
    ) -> Self {
        Self {
            config,
            globals,
            registry,
            path,
            input,
            out,
            err,
        }
    }

    pub const fn config(&self) -> &AppConfig {
        self.config
    }

    /// Values of the global options
    pub const fn globals(&self) -> &Accessor {
        self.globals
    }

    pub const fn registry(&self) -> &Registry {
        self.registry
    }

    /// Canonical path of the running command
    pub const fn path(&self) -> &[String] {
        self.path
    }

    pub fn stdin(&mut self) -> &mut dyn BufRead {
        &mut *self.input
    }

    pub fn stdout(&mut self) -> &mut dyn Write {
        &mut *self.out
    }

    pub fn stderr(&mut self) -> &mut dyn Write {
        &mut *self.err
    }

    /// Look up a command by joined name (`db-migrate`) or path (`db migrate`)
    pub fn get_command(&self, name: &str) -> Option<CommandInfo> {
        self.registry.get(name).map(|c| c.info())
    }

    /// Every registered command in path order
    pub fn list_commands(&self) -> Vec<CommandInfo> {
        self.registry.commands().map(|c| c.info()).collect()
    }

    /// Commands one level below the running one
    pub fn children(&self) -> Vec<CommandInfo> {
        self.registry
            .children(self.path)
            .into_iter()
            .map(|c| c.info())
            .collect()
    }
}

/// Runs the lifecycle of a parsed command
#[derive(Debug, Clone, Copy)]
pub struct Dispatcher<'a> {
    config: &'a AppConfig,
    registry: &'a Registry,
}

impl<'a> Dispatcher<'a> {
    pub const fn new(config: &'a AppConfig, registry: &'a Registry) -> Self {
        Self { config, registry }
    }

    /// Instantiate the command and run pre-run, run and post-run in order
    #[instrument(skip_all, fields(command = %parsed.descriptor().name()))]
    pub fn dispatch(
        &self,
        parsed: &ParsedCommand,
        input: &mut dyn BufRead,
        out: &mut dyn Write,
        err: &mut dyn Write,
    ) -> Result<i32> {
        let name = parsed.descriptor().name();
        let args = parsed.accessor();
        let globals = parsed.global_accessor();
        let mut ctx = Context::new(
            self.config,
            &globals,
            self.registry,
            parsed.path(),
            input,
            out,
            err,
        );
        let mut command = parsed.descriptor().instantiate();
        let failed = |e: anyhow::Error| CliError::command_failed(&name, e);

        debug!("Phase: {}", Phase::Executing);
        command.pre_run(&mut ctx, &args).map_err(failed)?;
        let status = command.run(&mut ctx, &args).map_err(failed)?;
        command.post_run(&mut ctx, &args).map_err(failed)?;

        if let Err(e) = ctx.stdout().flush() {
            debug!("Could not flush output: {e}");
        }
        debug!("Phase: {} (status {})", Phase::Completed, status);
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core::{Command, CommandSpec},
        parser::Resolver,
    };
    use std::{
        io::Cursor,
        sync::{Arc, Mutex},
    };

    #[derive(Default)]
    struct Recorder {
        log: Arc<Mutex<Vec<&'static str>>>,
        fail_pre_run: bool,
    }

    impl Command for Recorder {
        fn pre_run(&mut self, _ctx: &mut Context<'_>, _args: &Accessor) -> anyhow::Result<()> {
            self.log.lock().unwrap().push("pre");
            if self.fail_pre_run {
                anyhow::bail!("not ready");
            }
            Ok(())
        }

        fn run(&mut self, ctx: &mut Context<'_>, _args: &Accessor) -> anyhow::Result<i32> {
            self.log.lock().unwrap().push("run");
            let path = ctx.path().join(" ");
            let mut line = String::new();
            ctx.stdin().read_line(&mut line)?;
            writeln!(ctx.stdout(), "running {path} with {}", line.trim())?;
            Ok(7)
        }

        fn post_run(&mut self, _ctx: &mut Context<'_>, _args: &Accessor) -> anyhow::Result<()> {
            self.log.lock().unwrap().push("post");
            Ok(())
        }
    }

    fn dispatch(fail_pre_run: bool) -> (Result<i32>, Vec<&'static str>, String) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let shared = Arc::clone(&log);
        let mut registry = Registry::new();
        registry
            .register(CommandSpec::new(["job"], move || -> Box<dyn Command> {
                Box::new(Recorder {
                    log: Arc::clone(&shared),
                    fail_pre_run,
                })
            }))
            .unwrap();

        let config = AppConfig::new("tool");
        let parsed = Resolver::new(&registry).resolve(&["job".to_string()]).unwrap();
        let mut input = Cursor::new("payload\n");
        let (mut out, mut err) = (Vec::new(), Vec::new());
        let result =
            Dispatcher::new(&config, &registry).dispatch(&parsed, &mut input, &mut out, &mut err);
        let entries = log.lock().unwrap().clone();
        (result, entries, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_lifecycle_order() {
        let (result, log, out) = dispatch(false);
        assert_eq!(result.unwrap(), 7);
        assert_eq!(log, ["pre", "run", "post"]);
        assert_eq!(out, "running job with payload\n");
    }

    #[test]
    fn test_pre_run_failure_skips_run() {
        let (result, log, _) = dispatch(true);
        let err = result.unwrap_err();
        assert!(matches!(err, CliError::CommandFailed { ref command, .. } if command == "job"));
        assert_eq!(log, ["pre"]);
    }

    #[test]
    fn test_context_introspection() {
        let mut registry = Registry::new();
        registry
            .register(CommandSpec::from_fn(["db", "migrate"], |_, _| Ok(0)).about("Apply migrations"))
            .unwrap();
        registry
            .register(CommandSpec::from_fn(["db", "status"], |_, _| Ok(0)))
            .unwrap();

        let config = AppConfig::new("tool");
        let globals = Accessor::default();
        let path = vec!["db".to_string()];
        let mut input = std::io::empty();
        let (mut out, mut err) = (Vec::new(), Vec::new());
        let ctx = Context::new(&config, &globals, &registry, &path, &mut input, &mut out, &mut err);

        assert_eq!(ctx.list_commands().len(), 2);
        assert_eq!(ctx.children().len(), 2);
        let info = ctx.get_command("db-migrate").unwrap();
        assert_eq!(info.description, "Apply migrations");
        assert!(ctx.get_command("db-drop").is_none());
    }
}
