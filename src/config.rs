//! Application metadata
//!
//! Describes the program a command tree belongs to. Commands can read it
//! through their context.

use crate::{error::RegistrationError, utils::names::NameRules};
use serde::{Deserialize, Serialize};

/// Program name, version and description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Program name as invoked
    pub name: String,
    /// Version string
    pub version: String,
    /// One-paragraph description
    pub description: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            description: String::new(),
        }
    }
}

impl AppConfig {
    /// Create a config for the named program
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: String::new(),
            description: String::new(),
        }
    }

    #[must_use]
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), RegistrationError> {
        if self.name.is_empty() {
            return Err(RegistrationError::InvalidConfig {
                message: "program name is empty".to_string(),
            });
        }

        NameRules::default()
            .check_segment(&self.name)
            .map_err(|_| RegistrationError::InvalidConfig {
                message: format!("invalid program name: {}", self.name),
            })
    }

    /// `name version`, or just the name when no version is set
    pub fn display_name(&self) -> String {
        if self.version.is_empty() {
            self.name.clone()
        } else {
            format!("{} {}", self.name, self.version)
        }
    }
}
