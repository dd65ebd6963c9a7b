//! Command registry
//!
//! Maps command paths to descriptors. Every structural check on the command
//! tree happens here, at registration time, so that parsing never has to
//! second-guess the descriptors it is given.

use crate::{
    core::{
        command::{CommandDescriptor, CommandSpec},
        descriptor::{Arity, OptionSpec},
    },
    error::RegistrationError,
    utils::names::NameRules,
};
use std::{
    collections::{BTreeMap, HashSet},
    sync::Arc,
};
use tracing::{debug, instrument};

/// Registered commands, their aliases and the global options
#[derive(Debug, Default)]
pub struct Registry {
    commands: BTreeMap<Vec<String>, Arc<CommandDescriptor>>,
    /// `parent path + alias` to canonical path
    aliases: BTreeMap<Vec<String>, Vec<String>>,
    globals: Vec<OptionSpec>,
    rules: NameRules,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an option recognized anywhere on the command line
    pub fn register_global(&mut self, option: OptionSpec) -> Result<(), RegistrationError> {
        let option = option.normalized();
        let owner = "<global>";
        self.rules.check_key(option.key())?;
        check_option_default(&option, owner)?;

        for flag in option.flags() {
            self.rules.check_flag(flag, owner)?;
            let taken_by_global = self.globals.iter().any(|g| g.matches(flag));
            let taken_by_command = self
                .commands
                .values()
                .find(|c| c.options().iter().any(|o| o.matches(flag)));
            if taken_by_global {
                return Err(RegistrationError::DuplicateFlag {
                    flag: flag.clone(),
                    owner: owner.to_string(),
                });
            }
            if let Some(command) = taken_by_command {
                return Err(RegistrationError::DuplicateFlag {
                    flag: flag.clone(),
                    owner: command.name(),
                });
            }
        }
        if self.globals.iter().any(|g| g.key() == option.key()) {
            return Err(RegistrationError::NameConflict {
                name: option.key().to_string(),
                owner: owner.to_string(),
            });
        }

        debug!("Registered global option {}", option.display_flag());
        self.globals.push(option);
        Ok(())
    }

    /// Flatten, validate and insert a command
    #[instrument(skip(self, spec), fields(path = ?spec.path()))]
    pub fn register(&mut self, spec: CommandSpec) -> Result<(), RegistrationError> {
        if spec.path().is_empty() {
            return Err(RegistrationError::EmptyPath);
        }
        for segment in spec.path().iter().chain(spec.aliases()) {
            self.rules.check_segment(segment)?;
        }

        let descriptor = spec.into_descriptor();
        self.validate(&descriptor)?;

        let path = descriptor.path().to_vec();
        if self.commands.contains_key(&path) || self.aliases.contains_key(&path) {
            return Err(RegistrationError::DuplicatePath {
                path: path.join(" "),
            });
        }

        // `db migrate` and `db-migrate` share a joined name
        let name = descriptor.name();
        if self.commands.values().any(|c| c.name() == name) {
            return Err(RegistrationError::DuplicatePath { path: name });
        }

        let parent = &path[..path.len() - 1];
        let mut alias_paths = Vec::with_capacity(descriptor.aliases().len());
        for alias in descriptor.aliases() {
            let mut alias_path = parent.to_vec();
            alias_path.push(alias.clone());
            if self.commands.contains_key(&alias_path)
                || self.aliases.contains_key(&alias_path)
                || alias_path == path
                || alias_paths.contains(&alias_path)
            {
                return Err(RegistrationError::DuplicateAlias {
                    alias: alias.clone(),
                    parent: parent.join(" "),
                });
            }
            alias_paths.push(alias_path);
        }

        debug!(
            "Registered command `{}` with {} option(s), {} argument(s)",
            path.join(" "),
            descriptor.options().len(),
            descriptor.arguments().len()
        );
        for alias_path in alias_paths {
            self.aliases.insert(alias_path, path.clone());
        }
        self.commands.insert(path, Arc::new(descriptor));
        Ok(())
    }

    /// Structural checks on a flattened descriptor
    fn validate(&self, descriptor: &CommandDescriptor) -> Result<(), RegistrationError> {
        let owner = descriptor.name();
        let mut flags = HashSet::new();

        for option in descriptor.options() {
            self.rules.check_key(option.key())?;
            check_option_default(option, &owner)?;
            if option.arity_override() == Some(Arity::Exact(0)) {
                return Err(RegistrationError::ZeroArity {
                    argument: option.key().to_string(),
                    owner: owner.clone(),
                });
            }
            for flag in option.flags() {
                self.rules.check_flag(flag, &owner)?;
                if !flags.insert(flag.as_str()) || self.globals.iter().any(|g| g.matches(flag)) {
                    return Err(RegistrationError::DuplicateFlag {
                        flag: flag.clone(),
                        owner: owner.clone(),
                    });
                }
            }
        }

        let arguments = descriptor.arguments();
        for (i, argument) in arguments.iter().enumerate() {
            let name = argument.name();
            self.rules.check_key(name)?;

            if descriptor.options().iter().any(|o| o.key() == name) {
                return Err(RegistrationError::NameConflict {
                    name: name.to_string(),
                    owner: owner.clone(),
                });
            }

            let arity = argument.arity_rule();
            if arity == Arity::Exact(0) {
                return Err(RegistrationError::ZeroArity {
                    argument: name.to_string(),
                    owner: owner.clone(),
                });
            }
            if arity.is_variadic() && i + 1 < arguments.len() {
                return Err(RegistrationError::VariadicNotLast {
                    argument: name.to_string(),
                    owner: owner.clone(),
                });
            }

            if let Some(default) = argument.default_value() {
                let invalid = |reason: String| RegistrationError::InvalidDefault {
                    name: name.to_string(),
                    owner: owner.clone(),
                    reason,
                };
                if !argument.kind().accepts(default) {
                    return Err(invalid(format!("expected a {} value", argument.kind())));
                }
                argument.check_choice(default).map_err(|e| invalid(e.to_string()))?;
            }
        }

        Ok(())
    }

    /// Find a command by exact path, or by alias at the last segment
    pub fn lookup<S: AsRef<str>>(&self, path: &[S]) -> Option<&Arc<CommandDescriptor>> {
        let key: Vec<String> = path.iter().map(|s| s.as_ref().to_string()).collect();
        self.commands.get(&key).or_else(|| {
            self.aliases
                .get(&key)
                .and_then(|canonical| self.commands.get(canonical))
        })
    }

    /// Whether any registered path or alias path starts with `prefix`
    pub fn prefix_exists<S: AsRef<str>>(&self, prefix: &[S]) -> bool {
        let starts_with = |key: &Vec<String>| {
            key.len() >= prefix.len()
                && key.iter().zip(prefix).all(|(a, b)| a.as_str() == b.as_ref())
        };
        self.commands.keys().any(starts_with) || self.aliases.keys().any(starts_with)
    }

    /// Find a command by joined name (`db-migrate`) or spaced path (`db migrate`)
    pub fn get(&self, name: &str) -> Option<&Arc<CommandDescriptor>> {
        self.commands
            .values()
            .find(|c| c.name() == name || c.path().join(" ") == name)
    }

    /// All commands in path order
    pub fn commands(&self) -> impl Iterator<Item = &Arc<CommandDescriptor>> {
        self.commands.values()
    }

    /// Commands exactly one segment below `prefix`
    pub fn children<S: AsRef<str>>(&self, prefix: &[S]) -> Vec<&Arc<CommandDescriptor>> {
        self.commands
            .iter()
            .filter(|(path, _)| {
                path.len() == prefix.len() + 1
                    && path.iter().zip(prefix).all(|(a, b)| a.as_str() == b.as_ref())
            })
            .map(|(_, command)| command)
            .collect()
    }

    pub fn globals(&self) -> &[OptionSpec] {
        &self.globals
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

fn check_option_default(option: &OptionSpec, owner: &str) -> Result<(), RegistrationError> {
    let Some(default) = option.default_value() else {
        return Ok(());
    };
    let invalid = |reason: String| RegistrationError::InvalidDefault {
        name: option.key().to_string(),
        owner: owner.to_string(),
        reason,
    };
    if !option.kind().accepts(&default) {
        return Err(invalid(format!("expected a {} value", option.kind())));
    }
    option.check_choice(&default).map_err(|e| invalid(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ArgumentSpec, CommandSpec};

    fn noop(path: &[&str]) -> CommandSpec {
        CommandSpec::from_fn(path.to_vec(), |_, _| Ok(0))
    }

    #[test]
    fn test_lookup_and_alias() {
        let mut registry = Registry::new();
        registry.register(noop(&["db", "migrate"]).alias("m")).unwrap();

        assert!(registry.lookup(&["db", "migrate"]).is_some());
        let via_alias = registry.lookup(&["db", "m"]).unwrap();
        assert_eq!(via_alias.path(), ["db", "migrate"]);
        assert!(registry.lookup(&["db"]).is_none());
        assert!(registry.lookup(&["m"]).is_none());
    }

    #[test]
    fn test_prefix_exists() {
        let mut registry = Registry::new();
        registry.register(noop(&["db", "migrate"]).alias("m")).unwrap();

        assert!(registry.prefix_exists(&["db"]));
        assert!(registry.prefix_exists(&["db", "migrate"]));
        assert!(registry.prefix_exists(&["db", "m"]));
        assert!(!registry.prefix_exists(&["db", "status"]));
        assert!(!registry.prefix_exists(&["migrate"]));
    }

    #[test]
    fn test_duplicate_path_and_alias() {
        let mut registry = Registry::new();
        registry.register(noop(&["build"]).alias("b")).unwrap();

        assert_eq!(
            registry.register(noop(&["build"])),
            Err(RegistrationError::DuplicatePath {
                path: "build".to_string()
            })
        );
        assert!(matches!(
            registry.register(noop(&["bundle"]).alias("b")),
            Err(RegistrationError::DuplicateAlias { .. })
        ));
        assert!(matches!(
            registry.register(noop(&["b"])),
            Err(RegistrationError::DuplicatePath { .. })
        ));
        // Same alias under a different parent is fine
        registry.register(noop(&["db", "bench"]).alias("b")).unwrap();
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_variadic_must_be_last() {
        let mut registry = Registry::new();
        let spec = noop(&["copy"])
            .argument(ArgumentSpec::new("sources").arity(Arity::AtLeastOne))
            .argument(ArgumentSpec::new("dest"));
        assert!(matches!(
            registry.register(spec),
            Err(RegistrationError::VariadicNotLast { .. })
        ));
    }

    #[test]
    fn test_flag_conflicts() {
        let mut registry = Registry::new();
        registry
            .register_global(OptionSpec::switch("debug").flag("-d").flag("--debug"))
            .unwrap();

        let spec = noop(&["build"]).option(OptionSpec::new("dir").flag("-d"));
        assert!(matches!(
            registry.register(spec),
            Err(RegistrationError::DuplicateFlag { .. })
        ));

        let spec = noop(&["build"])
            .option(OptionSpec::new("out").flag("-o"))
            .option(OptionSpec::new("output").flag("-o"));
        assert!(matches!(
            registry.register(spec),
            Err(RegistrationError::DuplicateFlag { .. })
        ));
    }

    #[test]
    fn test_invalid_names_and_defaults() {
        let mut registry = Registry::new();
        assert!(matches!(
            registry.register(noop(&["Bad Name"])),
            Err(RegistrationError::InvalidName { .. })
        ));
        assert_eq!(
            registry.register(CommandSpec::from_fn(Vec::<String>::new(), |_, _| Ok(0))),
            Err(RegistrationError::EmptyPath)
        );
        let spec = noop(&["paint"])
            .option(OptionSpec::new("color").default("pink").choices(["red", "blue"]));
        assert!(matches!(
            registry.register(spec),
            Err(RegistrationError::InvalidDefault { .. })
        ));
        let spec = noop(&["paint"]).argument(
            ArgumentSpec::new("count")
                .value_type(crate::core::ValueType::Int)
                .default("many"),
        );
        assert!(matches!(
            registry.register(spec),
            Err(RegistrationError::InvalidDefault { .. })
        ));
    }

    #[test]
    fn test_joined_name_collision() {
        let mut registry = Registry::new();
        registry.register(noop(&["db", "migrate"])).unwrap();
        assert_eq!(
            registry.register(noop(&["db-migrate"])),
            Err(RegistrationError::DuplicatePath {
                path: "db-migrate".to_string()
            })
        );
        assert_eq!(registry.get("db-migrate").unwrap().path(), ["db", "migrate"]);
    }

    #[test]
    fn test_children_and_get() {
        let mut registry = Registry::new();
        registry.register(noop(&["db", "migrate"])).unwrap();
        registry.register(noop(&["db", "status"])).unwrap();
        registry.register(noop(&["build"])).unwrap();

        registry.register(noop(&["db", "replica", "sync"])).unwrap();

        assert_eq!(registry.children(&["db"]).len(), 2);
        assert_eq!(registry.children::<&str>(&[]).len(), 1);
        assert_eq!(registry.children(&["db", "replica"]).len(), 1);
        assert!(registry.get("db-migrate").is_some());
        assert!(registry.get("db status").is_some());
        assert!(registry.get("db").is_none());
    }
}
