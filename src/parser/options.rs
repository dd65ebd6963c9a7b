//! Option binder
//!
//! Scans a token stream for known flags. Recognized flags and their values
//! are bound; every other token is handed back, in order, as a positional.

use crate::{
    core::{
        descriptor::{Arity, OptionSpec},
        value::{Value, ValueType, coerce, coerce_many, parse_bool},
    },
    error::{CliError, Result},
};
use std::collections::BTreeMap;
use tracing::debug;

/// Which option set a bound flag came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Global,
    Command,
}

/// What to do when a bare `--` is met
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminator {
    /// Leave `--` and everything after it in the remainder untouched
    Keep,
    /// Drop `--`; everything after it becomes positional
    Consume,
}

/// One recognized flag and its coerced value
#[derive(Debug, Clone, PartialEq)]
pub struct OptionMatch {
    pub scope: Scope,
    pub key: String,
    pub value: Value,
}

/// Result of scanning a stream
#[derive(Debug, Default)]
pub struct Scan {
    /// Recognized options in stream order
    pub matches: Vec<OptionMatch>,
    /// Unrecognized tokens in stream order
    pub rest: Vec<String>,
}

/// Matches tokens against a set of global and command options
#[derive(Debug)]
pub struct OptionBinder<'a> {
    globals: &'a [OptionSpec],
    locals: &'a [OptionSpec],
}

impl<'a> OptionBinder<'a> {
    pub const fn new(globals: &'a [OptionSpec], locals: &'a [OptionSpec]) -> Self {
        Self { globals, locals }
    }

    fn find(&self, flag: &str) -> Option<(Scope, &'a OptionSpec)> {
        let globals = self.globals.iter().map(|o| (Scope::Global, o));
        let locals = self.locals.iter().map(|o| (Scope::Command, o));
        globals.chain(locals).find(|(_, o)| o.matches(flag))
    }

    /// Bind every recognized flag in `tokens`
    pub fn scan(&self, tokens: &[String], terminator: Terminator) -> Result<Scan> {
        let mut scan = Scan::default();
        let mut i = 0;

        while i < tokens.len() {
            let token = &tokens[i];
            i += 1;

            if token == "--" {
                match terminator {
                    Terminator::Keep => scan.rest.extend_from_slice(&tokens[i - 1..]),
                    Terminator::Consume => scan.rest.extend_from_slice(&tokens[i..]),
                }
                break;
            }

            if !token.starts_with('-') {
                scan.rest.push(token.clone());
                continue;
            }

            if let Some((flag, raw)) = token.split_once('=') {
                match self.find(flag) {
                    Some((scope, option)) => {
                        let value = inline_value(option, raw)?;
                        debug!("Bound {} = {:?}", flag, value);
                        scan.matches.push(OptionMatch {
                            scope,
                            key: option.key().to_string(),
                            value,
                        });
                    }
                    None => scan.rest.push(token.clone()),
                }
                continue;
            }

            match self.find(token) {
                Some((scope, option)) => {
                    let value = take_value(option, token, tokens, &mut i)?;
                    debug!("Bound {} = {:?}", token, value);
                    scan.matches.push(OptionMatch {
                        scope,
                        key: option.key().to_string(),
                        value,
                    });
                }
                None => match self.find_bundled_count(token) {
                    Some((scope, option, times)) => {
                        debug!("Counted {} x{}", option.key(), times);
                        scan.matches.push(OptionMatch {
                            scope,
                            key: option.key().to_string(),
                            value: Value::Int(times),
                        });
                    }
                    None => scan.rest.push(token.clone()),
                },
            }
        }

        Ok(scan)
    }

    /// A repeated short counting flag such as `-vvv`
    fn find_bundled_count(&self, token: &str) -> Option<(Scope, &'a OptionSpec, i64)> {
        let letters = token.strip_prefix('-').filter(|rest| !rest.starts_with('-'))?;
        let first = letters.chars().next()?;
        if letters.len() < 2 || letters.chars().any(|c| c != first) {
            return None;
        }
        let (scope, option) = self.find(&format!("-{first}"))?;
        let times = i64::try_from(letters.chars().count()).ok()?;
        option.is_count().then_some((scope, option, times))
    }
}

/// Value given as `--flag=value`
fn inline_value(option: &OptionSpec, raw: &str) -> Result<Value> {
    if option.is_count() {
        return coerce(raw, ValueType::Int, option.key());
    }
    if option.is_switch() {
        return Ok(Value::Bool(parse_bool(raw)));
    }
    match option.arity_override() {
        Some(arity) if arity.is_list() => coerce_many(&[raw.to_string()], option.kind(), option.key()),
        _ => coerce(raw, option.kind(), option.key()),
    }
}

/// Value following a bare flag; advances `cursor` past consumed tokens
fn take_value(option: &OptionSpec, flag: &str, tokens: &[String], cursor: &mut usize) -> Result<Value> {
    if option.is_count() {
        return Ok(Value::Int(1));
    }
    if option.is_switch() {
        return Ok(Value::Bool(true));
    }

    let available = tokens[*cursor..]
        .iter()
        .take_while(|t| !t.starts_with('-'))
        .count();
    let absent = || -> Result<Value> {
        if option.is_required() {
            Err(CliError::missing_value(flag))
        } else {
            Ok(option.default_value().unwrap_or_default())
        }
    };

    let Some(arity) = option.arity_override() else {
        if available == 0 {
            return absent();
        }
        let value = coerce(&tokens[*cursor], option.kind(), option.key())?;
        *cursor += 1;
        return Ok(value);
    };

    let take = match arity {
        Arity::Exact(n) => n.min(available),
        Arity::Optional => available.min(1),
        Arity::Any | Arity::AtLeastOne => available,
    };
    match arity {
        Arity::Exact(0) => return Ok(Value::List(Vec::new())),
        _ if take == 0 && arity == Arity::AtLeastOne => return Err(CliError::missing_value(flag)),
        Arity::Exact(n) if take == 0 && n > 0 => return absent(),
        Arity::Exact(n) if take < n => return Err(CliError::missing_value(flag)),
        Arity::Optional if take == 0 => return absent(),
        Arity::Any if take == 0 => {
            return Ok(option
                .default_value()
                .unwrap_or_else(|| Value::List(Vec::new())));
        }
        _ => {}
    }

    let values = &tokens[*cursor..*cursor + take];
    *cursor += take;
    if arity.is_list() {
        coerce_many(values, option.kind(), option.key())
    } else {
        coerce(&values[0], option.kind(), option.key())
    }
}

/// Fill defaults and enforce requiredness for one option set
pub fn finalize(options: &[OptionSpec], matches: &[OptionMatch]) -> Result<BTreeMap<String, Value>> {
    let mut bound = BTreeMap::new();

    for option in options {
        if option.is_count() {
            let value = count_occurrences(option, matches);
            option.check_choice(&value)?;
            bound.insert(option.key().to_string(), value);
            continue;
        }

        // Last occurrence wins
        let given = matches.iter().rev().find(|m| m.key == option.key());
        let value = match given {
            Some(m) => {
                option.check_choice(&m.value)?;
                m.value.clone()
            }
            None => match option.default_value() {
                Some(default) => default,
                None if option.is_required() => {
                    return Err(CliError::missing_option(option.display_flag()));
                }
                None => Value::Null,
            },
        };
        bound.insert(option.key().to_string(), value);
    }

    Ok(bound)
}

/// Default plus every occurrence of a counting option
fn count_occurrences(option: &OptionSpec, matches: &[OptionMatch]) -> Value {
    let start = option.default_value().and_then(|v| v.as_int()).unwrap_or(0);
    let total = matches
        .iter()
        .filter(|m| m.key == option.key())
        .filter_map(|m| m.value.as_int())
        .fold(start, i64::saturating_add);
    Value::Int(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    fn options() -> Vec<OptionSpec> {
        vec![
            OptionSpec::switch("verbose").flag("-v").flag("--verbose").normalized(),
            OptionSpec::new("steps").default(1).normalized(),
            OptionSpec::new("name").normalized(),
        ]
    }

    fn bind(raw: &[&str]) -> Result<(BTreeMap<String, Value>, Vec<String>)> {
        let opts = options();
        let binder = OptionBinder::new(&[], &opts);
        let scan = binder.scan(&tokens(raw), Terminator::Consume)?;
        Ok((finalize(&opts, &scan.matches)?, scan.rest))
    }

    #[test]
    fn test_bool_switch_values() {
        for (raw, expected) in [
            ("--verbose=no", false),
            ("--verbose=NO", false),
            ("--verbose=0", false),
            ("--verbose=yes", true),
            ("--verbose=Y", true),
            ("--verbose=1", true),
            ("--verbose=true", true),
            ("--verbose", true),
            ("-v", true),
        ] {
            let (bound, _) = bind(&[raw]).unwrap();
            assert_eq!(bound["verbose"], Value::Bool(expected), "{raw}");
        }
    }

    #[test]
    fn test_value_options_and_defaults() {
        let (bound, rest) = bind(&["--steps", "3", "target"]).unwrap();
        assert_eq!(bound["steps"], Value::Int(3));
        assert_eq!(bound["verbose"], Value::Bool(false));
        assert_eq!(bound["name"], Value::Null);
        assert_eq!(rest, ["target"]);

        let (bound, _) = bind(&["--steps=7", "--steps=9"]).unwrap();
        assert_eq!(bound["steps"], Value::Int(9));
    }

    #[test]
    fn test_missing_value_falls_back_to_default() {
        let (bound, rest) = bind(&["--steps", "--verbose"]).unwrap();
        assert_eq!(bound["steps"], Value::Int(1));
        assert_eq!(bound["verbose"], Value::Bool(true));
        assert!(rest.is_empty());
    }

    #[test]
    fn test_required_option_without_value() {
        let opts = vec![OptionSpec::new("out").required().normalized()];
        let binder = OptionBinder::new(&[], &opts);
        let err = binder.scan(&tokens(&["--out"]), Terminator::Consume).unwrap_err();
        assert!(matches!(err, CliError::MissingOptionValue { ref flag } if flag == "--out"));

        let scan = binder.scan(&tokens(&[]), Terminator::Consume).unwrap();
        let err = finalize(&opts, &scan.matches).unwrap_err();
        assert!(matches!(err, CliError::MissingRequiredOption { ref option } if option == "--out"));
    }

    #[test]
    fn test_unknown_flags_are_positional() {
        let (_, rest) = bind(&["-x", "--nope=1", "-"]).unwrap();
        assert_eq!(rest, ["-x", "--nope=1", "-"]);
    }

    #[test]
    fn test_terminator_modes() {
        let opts = options();
        let binder = OptionBinder::new(&[], &opts);
        let raw = tokens(&["a", "--", "--verbose", "-v"]);

        let scan = binder.scan(&raw, Terminator::Consume).unwrap();
        assert!(scan.matches.is_empty());
        assert_eq!(scan.rest, ["a", "--verbose", "-v"]);

        let scan = binder.scan(&raw, Terminator::Keep).unwrap();
        assert_eq!(scan.rest, ["a", "--", "--verbose", "-v"]);
    }

    #[test]
    fn test_bad_number() {
        let err = bind(&["--steps", "many"]).unwrap_err();
        assert!(matches!(err, CliError::ValueParsing { .. }));
    }

    #[test]
    fn test_arity_override() {
        let opts = vec![
            OptionSpec::new("pair").arity(Arity::Exact(2)).value_type(crate::core::ValueType::Int).normalized(),
            OptionSpec::new("tags").arity(Arity::Any).normalized(),
        ];
        let binder = OptionBinder::new(&[], &opts);

        let scan = binder
            .scan(&tokens(&["--pair", "1", "2", "--tags", "a", "b", "--", "c"]), Terminator::Consume)
            .unwrap();
        let bound = finalize(&opts, &scan.matches).unwrap();
        assert_eq!(bound["pair"], Value::from(vec![1, 2]));
        assert_eq!(bound["tags"], Value::from(vec!["a", "b"]));
        assert_eq!(scan.rest, ["c"]);

        let err = binder.scan(&tokens(&["--pair", "1"]), Terminator::Consume).unwrap_err();
        assert!(matches!(err, CliError::MissingOptionValue { .. }));
    }

    #[test]
    fn test_choices_checked_on_bound_values() {
        let opts = vec![OptionSpec::new("color").choices(["auto", "never"]).normalized()];
        let binder = OptionBinder::new(&[], &opts);
        let scan = binder.scan(&tokens(&["--color=pink"]), Terminator::Consume).unwrap();
        assert!(matches!(
            finalize(&opts, &scan.matches),
            Err(CliError::InvalidChoice { .. })
        ));
    }

    #[test]
    fn test_global_scope_reported() {
        let globals = vec![OptionSpec::switch("debug").normalized()];
        let locals = options();
        let binder = OptionBinder::new(&globals, &locals);
        let scan = binder.scan(&tokens(&["--debug", "-v"]), Terminator::Consume).unwrap();
        assert_eq!(scan.matches[0].scope, Scope::Global);
        assert_eq!(scan.matches[1].scope, Scope::Command);
    }

    #[test]
    fn test_count_option() {
        let opts = vec![
            OptionSpec::count("verbosity").flag("-v").flag("--verbose").normalized(),
            OptionSpec::switch("quiet").flag("-q").normalized(),
        ];
        let binder = OptionBinder::new(&[], &opts);
        let count = |raw: &[&str]| {
            let scan = binder.scan(&tokens(raw), Terminator::Consume).unwrap();
            (finalize(&opts, &scan.matches).unwrap()["verbosity"].clone(), scan.rest)
        };

        assert_eq!(count(&[]).0, Value::Int(0));
        assert_eq!(count(&["-v"]).0, Value::Int(1));
        assert_eq!(count(&["-v", "x", "--verbose", "-v"]), (Value::Int(3), tokens(&["x"])));
        assert_eq!(count(&["-vvv"]).0, Value::Int(3));
        assert_eq!(count(&["-vv", "-v"]).0, Value::Int(3));
        assert_eq!(count(&["--verbose=2"]).0, Value::Int(2));
        // Only counting flags bundle
        assert_eq!(count(&["-qq"]), (Value::Int(0), tokens(&["-qq"])));
    }
}
