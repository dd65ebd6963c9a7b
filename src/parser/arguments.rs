//! Arity binder
//!
//! Walks the argument descriptors in declaration order with a single forward
//! cursor over the positional stream. Variadic arities take everything that is
//! left, which is why registration only allows them last.

use crate::{
    core::{
        descriptor::{ArgumentSpec, Arity},
        value::{Value, coerce, coerce_many},
    },
    error::{CliError, Result},
};
use std::collections::BTreeMap;
use tracing::debug;

/// Bind positional tokens to argument descriptors
pub fn bind_arguments(arguments: &[ArgumentSpec], tokens: &[String]) -> Result<BTreeMap<String, Value>> {
    let mut bound = BTreeMap::new();
    let mut cursor = 0;

    for argument in arguments {
        let remaining = &tokens[cursor..];
        let (value, consumed) = bind_one(argument, remaining)?;
        argument.check_choice(&value)?;
        debug!("Bound argument {} = {:?}", argument.name(), value);

        cursor += consumed;
        bound.insert(argument.name().to_string(), value);
    }

    if cursor < tokens.len() {
        return Err(CliError::UnexpectedArguments {
            arguments: tokens[cursor..].to_vec(),
        });
    }

    Ok(bound)
}

/// Value for one descriptor and the number of tokens it consumed
fn bind_one(argument: &ArgumentSpec, remaining: &[String]) -> Result<(Value, usize)> {
    let name = argument.name();
    let kind = argument.kind();
    let arity = argument.arity_rule();

    match arity {
        Arity::Exact(1) | Arity::Optional => match remaining.first() {
            Some(token) => Ok((coerce(token, kind, name)?, 1)),
            None => Ok((fallback(argument)?, 0)),
        },
        Arity::Exact(n) => {
            if remaining.is_empty() && (argument.default_value().is_some() || !argument.is_required()) {
                return Ok((fallback(argument)?, 0));
            }
            if remaining.len() < n {
                return Err(CliError::value_count(name, arity.describe(), remaining.len()));
            }
            Ok((coerce_many(&remaining[..n], kind, name)?, n))
        }
        Arity::Any => {
            if remaining.is_empty() {
                let value = argument
                    .default_value()
                    .cloned()
                    .unwrap_or_else(|| Value::List(Vec::new()));
                return Ok((value, 0));
            }
            Ok((coerce_many(remaining, kind, name)?, remaining.len()))
        }
        Arity::AtLeastOne => {
            if remaining.is_empty() {
                return Err(CliError::value_count(name, arity.describe(), 0));
            }
            Ok((coerce_many(remaining, kind, name)?, remaining.len()))
        }
    }
}

/// Value of an argument that received no token
fn fallback(argument: &ArgumentSpec) -> Result<Value> {
    match argument.default_value() {
        Some(default) => Ok(default.clone()),
        None if argument.is_required() => Err(CliError::missing_argument(argument.name())),
        None => Ok(Value::Null),
    }
}
