//! Option and argument descriptors
//!
//! Descriptors are built with small builder methods and become immutable once
//! a command is registered. A [`Definition`] groups descriptors and can extend
//! a parent definition, which is how commands share options.

use crate::{
    core::value::{Value, ValueType},
    error::{CliError, Result},
    utils::names::flag_from_key,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// How many tokens an argument (or an option with an override) consumes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Arity {
    /// Exactly `n` tokens; `Exact(1)` binds a scalar, more bind a list
    Exact(usize),
    /// Zero or one token
    Optional,
    /// Zero or more tokens
    Any,
    /// One or more tokens
    AtLeastOne,
}

impl Arity {
    /// Whether this arity swallows the rest of the stream
    pub const fn is_variadic(self) -> bool {
        matches!(self, Self::Any | Self::AtLeastOne)
    }

    /// Whether the bound value is a list
    pub const fn is_list(self) -> bool {
        match self {
            Self::Exact(n) => n > 1,
            Self::Optional => false,
            Self::Any | Self::AtLeastOne => true,
        }
    }

    /// Human readable count for error messages
    pub fn describe(self) -> String {
        match self {
            Self::Exact(n) => n.to_string(),
            Self::Optional => "at most 1".to_string(),
            Self::Any => "any number of".to_string(),
            Self::AtLeastOne => "at least 1".to_string(),
        }
    }
}

/// A flagged option such as `--steps 3` or `-v`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionSpec {
    key: String,
    flags: Vec<String>,
    help: String,
    required: bool,
    default: Option<Value>,
    choices: Option<Vec<Value>>,
    value_type: Option<ValueType>,
    arity: Option<Arity>,
    counting: bool,
}

impl OptionSpec {
    /// Create an option bound under `key`
    ///
    /// Without explicit flags the option answers to `--<key>` in kebab-case.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            flags: Vec::new(),
            help: String::new(),
            required: false,
            default: None,
            choices: None,
            value_type: None,
            arity: None,
            counting: false,
        }
    }

    /// Create a boolean switch defaulting to `false`
    pub fn switch(key: impl Into<String>) -> Self {
        Self::new(key).default(false)
    }

    /// Create an option counting its occurrences (`-vvv` binds 3), starting at 0
    pub fn count(key: impl Into<String>) -> Self {
        Self {
            counting: true,
            ..Self::new(key).value_type(ValueType::Int).default(0)
        }
    }

    /// Add a flag spelling (`-v`, `--verbose`)
    #[must_use]
    pub fn flag(mut self, flag: impl Into<String>) -> Self {
        self.flags.push(flag.into());
        self
    }

    #[must_use]
    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Set the default; also fixes the type unless one was declared
    #[must_use]
    pub fn default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    #[must_use]
    pub fn choices<I, V>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.choices = Some(choices.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn value_type(mut self, value_type: ValueType) -> Self {
        self.value_type = Some(value_type);
        self
    }

    /// Make the option take a number of values other than one
    #[must_use]
    pub fn arity(mut self, arity: Arity) -> Self {
        self.arity = Some(arity);
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn help_text(&self) -> &str {
        &self.help
    }

    pub fn flags(&self) -> &[String] {
        &self.flags
    }

    pub const fn is_required(&self) -> bool {
        self.required
    }

    pub fn choice_list(&self) -> Option<&[Value]> {
        self.choices.as_deref()
    }

    pub fn arity_override(&self) -> Option<Arity> {
        if self.is_switch() || self.counting { None } else { self.arity }
    }

    /// Whether each occurrence adds one to the bound integer
    pub const fn is_count(&self) -> bool {
        self.counting
    }

    /// Effective type: declared, else inferred from the default
    pub fn kind(&self) -> ValueType {
        self.value_type.unwrap_or_else(|| {
            self.default
                .as_ref()
                .map_or(ValueType::Str, ValueType::infer)
        })
    }

    /// A boolean option takes no value on the command line
    pub fn is_switch(&self) -> bool {
        self.kind() == ValueType::Bool
    }

    /// Default used when the option is absent; switches fall back to `false`
    pub fn default_value(&self) -> Option<Value> {
        match &self.default {
            Some(value) => Some(value.clone()),
            None if self.is_switch() => Some(Value::Bool(false)),
            None => None,
        }
    }

    /// Whether `flag` is one of this option's spellings
    pub fn matches(&self, flag: &str) -> bool {
        self.flags.iter().any(|f| f == flag)
    }

    /// Spelling used in error messages
    pub fn display_flag(&self) -> &str {
        self.flags
            .iter()
            .find(|f| f.starts_with("--"))
            .or_else(|| self.flags.first())
            .map_or(self.key.as_str(), String::as_str)
    }

    /// Fill in the default flag spelling and freeze the type
    pub(crate) fn normalized(mut self) -> Self {
        if self.flags.is_empty() {
            self.flags.push(flag_from_key(&self.key));
        }
        self.value_type = Some(self.kind());
        self
    }

    pub(crate) fn check_choice(&self, value: &Value) -> Result<()> {
        check_choice(&self.key, self.choices.as_deref(), value)
    }
}

/// A positional argument slot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArgumentSpec {
    name: String,
    help: String,
    default: Option<Value>,
    choices: Option<Vec<Value>>,
    value_type: Option<ValueType>,
    arity: Option<Arity>,
    required: Option<bool>,
}

impl ArgumentSpec {
    /// Create an argument bound under `name`, taking exactly one token
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            help: String::new(),
            default: None,
            choices: None,
            value_type: None,
            arity: None,
            required: None,
        }
    }

    #[must_use]
    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }

    /// Set the default; without a declared arity the argument becomes optional
    #[must_use]
    pub fn default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    #[must_use]
    pub fn choices<I, V>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.choices = Some(choices.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn value_type(mut self, value_type: ValueType) -> Self {
        self.value_type = Some(value_type);
        self
    }

    #[must_use]
    pub fn arity(mut self, arity: Arity) -> Self {
        self.arity = Some(arity);
        self
    }

    #[must_use]
    pub fn required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn help_text(&self) -> &str {
        &self.help
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn choice_list(&self) -> Option<&[Value]> {
        self.choices.as_deref()
    }

    pub fn kind(&self) -> ValueType {
        self.value_type.unwrap_or_else(|| {
            self.default
                .as_ref()
                .map_or(ValueType::Str, ValueType::infer)
        })
    }

    pub fn arity_rule(&self) -> Arity {
        self.arity.unwrap_or(if self.default.is_some() {
            Arity::Optional
        } else {
            Arity::Exact(1)
        })
    }

    pub fn is_required(&self) -> bool {
        self.required.unwrap_or_else(|| match self.arity_rule() {
            Arity::Exact(_) | Arity::AtLeastOne => self.default.is_none(),
            Arity::Optional | Arity::Any => false,
        })
    }

    pub(crate) fn normalized(mut self) -> Self {
        self.value_type = Some(self.kind());
        self.arity = Some(self.arity_rule());
        self.required = Some(self.is_required());
        self
    }

    pub(crate) fn check_choice(&self, value: &Value) -> Result<()> {
        check_choice(&self.name, self.choices.as_deref(), value)
    }
}

fn check_choice(name: &str, choices: Option<&[Value]>, value: &Value) -> Result<()> {
    let Some(choices) = choices else {
        return Ok(());
    };
    match value {
        Value::Null => Ok(()),
        Value::List(items) => items
            .iter()
            .try_for_each(|item| check_choice(name, Some(choices), item)),
        scalar if choices.contains(scalar) => Ok(()),
        scalar => Err(CliError::InvalidChoice {
            name: name.to_string(),
            value: scalar.to_string(),
            choices: choices.iter().map(ToString::to_string).collect(),
        }),
    }
}

/// A named group of descriptors with an optional parent group
///
/// Commands list definitions root first; a descriptor redefined further down
/// the chain replaces the inherited one at the inherited position.
#[derive(Debug, Clone, Default)]
pub struct Definition {
    name: String,
    parent: Option<Arc<Definition>>,
    options: Vec<OptionSpec>,
    arguments: Vec<ArgumentSpec>,
}

impl Definition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Inherit every descriptor of `parent`
    #[must_use]
    pub fn extends(mut self, parent: Arc<Definition>) -> Self {
        self.parent = Some(parent);
        self
    }

    #[must_use]
    pub fn option(mut self, option: OptionSpec) -> Self {
        self.options.push(option);
        self
    }

    #[must_use]
    pub fn argument(mut self, argument: ArgumentSpec) -> Self {
        self.arguments.push(argument);
        self
    }

    /// Wrap for sharing between several commands
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<&Arc<Definition>> {
        self.parent.as_ref()
    }

    /// This definition and its ancestors, root first
    pub fn lineage(&self) -> Vec<&Definition> {
        let mut chain = vec![self];
        let mut current = self;
        while let Some(parent) = current.parent.as_deref() {
            chain.push(parent);
            current = parent;
        }
        chain.reverse();
        chain
    }

    /// Merge the lineage into one option list and one argument list
    pub fn flatten(&self) -> (Vec<OptionSpec>, Vec<ArgumentSpec>) {
        let mut options: Vec<OptionSpec> = Vec::new();
        let mut arguments: Vec<ArgumentSpec> = Vec::new();

        for definition in self.lineage() {
            for option in &definition.options {
                match options.iter_mut().find(|o| o.key == option.key) {
                    Some(slot) => *slot = option.clone(),
                    None => options.push(option.clone()),
                }
            }
            for argument in &definition.arguments {
                match arguments.iter_mut().find(|a| a.name == argument.name) {
                    Some(slot) => *slot = argument.clone(),
                    None => arguments.push(argument.clone()),
                }
            }
        }

        (options, arguments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_switch_and_value_options() {
        let verbose = OptionSpec::switch("verbose").normalized();
        assert!(verbose.is_switch());
        assert_eq!(verbose.flags(), ["--verbose"]);
        assert_eq!(verbose.default_value(), Some(Value::Bool(false)));

        let steps = OptionSpec::new("steps").default(1).flag("-n").normalized();
        assert!(!steps.is_switch());
        assert_eq!(steps.kind(), ValueType::Int);
        assert_eq!(steps.flags(), ["-n"]);
        assert_eq!(steps.display_flag(), "-n");
    }

    #[test]
    fn test_argument_defaults_shape_arity() {
        let target = ArgumentSpec::new("target");
        assert_eq!(target.arity_rule(), Arity::Exact(1));
        assert!(target.is_required());

        let mode = ArgumentSpec::new("mode").default("fast");
        assert_eq!(mode.arity_rule(), Arity::Optional);
        assert!(!mode.is_required());

        let files = ArgumentSpec::new("files").arity(Arity::Any);
        assert!(!files.is_required());
        assert!(files.arity_rule().is_list());
    }

    #[test]
    fn test_choice_check() {
        let color = OptionSpec::new("color").choices(["auto", "never"]);
        assert!(color.check_choice(&Value::from("auto")).is_ok());
        assert!(matches!(
            color.check_choice(&Value::from("sometimes")),
            Err(CliError::InvalidChoice { .. })
        ));
        assert!(color.check_choice(&Value::from(vec!["auto", "never"])).is_ok());
    }

    #[test]
    fn test_flatten_overrides_in_place() {
        let base = Definition::new("base")
            .option(OptionSpec::switch("verbose"))
            .option(OptionSpec::new("database").default("main"))
            .argument(ArgumentSpec::new("target"))
            .shared();
        let child = Definition::new("child")
            .extends(base)
            .option(OptionSpec::new("steps").default(1))
            .option(OptionSpec::new("database").default("replica"));

        let (options, arguments) = child.flatten();
        let keys: Vec<&str> = options.iter().map(OptionSpec::key).collect();
        assert_eq!(keys, ["verbose", "database", "steps"]);
        assert_eq!(options[1].default_value(), Some(Value::from("replica")));
        assert_eq!(arguments.len(), 1);
        assert_eq!(child.lineage().len(), 2);
    }
}
