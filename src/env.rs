//! Environment variable abstraction for testability.
//!
//! Production code reads the process environment through [`Env::real()`];
//! tests build an [`Env::mock()`] from literal pairs so no test has to call
//! the `unsafe` [`std::env::set_var`].
//!
//! Besides plain lookups it understands the conventions of GitHub Action
//! inputs: empty values mean "not provided", numbers arrive as strings,
//! and booleans are the literal `true` / `false`.

use std::collections::HashMap;
use std::str::FromStr;

/// A value was present but could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidVar {
    pub name: String,
    pub value: String,
}

impl std::fmt::Display for InvalidVar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ignoring invalid {} value: {:?}", self.name, self.value)
    }
}

/// Environment variable reader.
#[derive(Clone, Debug, Default)]
pub struct Env {
    overrides: Option<HashMap<String, String>>,
}

impl Env {
    /// Read from the real process environment.
    pub fn real() -> Self {
        Self { overrides: None }
    }

    /// Read from explicit key-value pairs only.
    pub fn mock(vars: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>) -> Self {
        Self {
            overrides: Some(
                vars.into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    /// Look up a variable by name.
    pub fn var(&self, name: &str) -> Result<String, std::env::VarError> {
        match &self.overrides {
            Some(map) => map.get(name).cloned().ok_or(std::env::VarError::NotPresent),
            None => std::env::var(name),
        }
    }

    /// Look up a variable, treating blank values as unset.
    pub fn non_empty(&self, name: &str) -> Option<String> {
        self.var(name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Parse a non-empty variable.
    ///
    /// `Ok(None)` when unset or blank, `Err` when present but unparseable.
    pub fn parsed<T: FromStr>(&self, name: &str) -> Result<Option<T>, InvalidVar> {
        match self.non_empty(name) {
            None => Ok(None),
            Some(value) => value.parse().map(Some).map_err(|_| InvalidVar {
                name: name.to_string(),
                value,
            }),
        }
    }

    /// Parse a boolean flag (`true/false`, `1/0`, `yes/no`, `on/off`).
    pub fn flag(&self, name: &str) -> Result<Option<bool>, InvalidVar> {
        match self.non_empty(name) {
            None => Ok(None),
            Some(value) => match value.to_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Ok(Some(true)),
                "false" | "0" | "no" | "off" => Ok(Some(false)),
                _ => Err(InvalidVar {
                    name: name.to_string(),
                    value,
                }),
            },
        }
    }
}
