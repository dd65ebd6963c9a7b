//! Naming rules for commands, flags and value keys

use crate::error::RegistrationError;
use regex::Regex;

/// Compiled patterns used to validate names at registration time
#[derive(Debug, Clone)]
pub struct NameRules {
    /// Command path segments and aliases
    re_segment: Regex,
    /// Flag spellings such as `-v`, `--dry-run`
    re_flag: Regex,
    /// Keys of bound values
    re_key: Regex,
}

impl NameRules {
    /// Compile the naming rules
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            re_segment: Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.-]*$")?,
            re_flag: Regex::new(r"^--?[A-Za-z0-9][A-Za-z0-9_.-]*$")?,
            re_key: Regex::new(r"^[A-Za-z_][A-Za-z0-9_-]*$")?,
        })
    }

    /// Check a command path segment or alias
    pub fn check_segment(&self, segment: &str) -> Result<(), RegistrationError> {
        if self.re_segment.is_match(segment) {
            Ok(())
        } else {
            Err(RegistrationError::InvalidName {
                name: segment.to_string(),
            })
        }
    }

    /// Check a flag spelling
    pub fn check_flag(&self, flag: &str, owner: &str) -> Result<(), RegistrationError> {
        if self.re_flag.is_match(flag) {
            Ok(())
        } else {
            Err(RegistrationError::InvalidFlag {
                flag: flag.to_string(),
                owner: owner.to_string(),
            })
        }
    }

    /// Check the key of an option or argument
    pub fn check_key(&self, key: &str) -> Result<(), RegistrationError> {
        if self.re_key.is_match(key) {
            Ok(())
        } else {
            Err(RegistrationError::InvalidName {
                name: key.to_string(),
            })
        }
    }
}

impl Default for NameRules {
    fn default() -> Self {
        Self::new().expect("Failed to compile naming rules")
    }
}

/// Default long flag for a value key: `dry_run` becomes `--dry-run`
pub fn flag_from_key(key: &str) -> String {
    format!("--{}", key.replace('_', "-"))
}

/// Derive a command name from a Rust type name
///
/// The module path and a trailing `Command` are dropped and the rest is
/// converted to kebab-case, so `app::cmd::DbMigrateCommand` becomes
/// `db-migrate` and `HTTPServeCommand` becomes `http-serve`.
pub fn command_name_from_type(type_name: &str) -> String {
    let base = type_name.split('<').next().unwrap_or(type_name);
    let base = base.rsplit("::").next().unwrap_or(base);
    let base = base.strip_suffix("Command").unwrap_or(base);

    let chars: Vec<char> = base.chars().collect();
    let mut name = String::with_capacity(base.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower) {
                name.push('-');
            }
        }
        name.extend(c.to_lowercase());
    }
    name
}
