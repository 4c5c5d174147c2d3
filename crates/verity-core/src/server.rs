//! Server catalog: parameterized base URLs and their resolution.
//!
//! An operation targets one entry of an ordered list of servers. Each entry
//! is a URL template such as `{scheme}://{host}/api` whose variables carry a
//! default and, optionally, an enumeration of permitted values.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Variable overrides keyed by variable name.
pub type ServerVariables = BTreeMap<String, String>;

/// A single templated variable of a [`ServerConfiguration`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerVariable {
    /// Human readable description
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Value used when no override is supplied
    pub default_value: String,
    /// Permitted values; empty means any value is accepted
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<String>,
}

impl ServerVariable {
    /// Create a free-form variable with a default value.
    #[must_use]
    pub fn new(default_value: impl Into<String>) -> Self {
        Self {
            description: String::new(),
            default_value: default_value.into(),
            enum_values: Vec::new(),
        }
    }

    /// Restrict the variable to an enumeration of values.
    #[must_use]
    pub fn with_enum_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enum_values = values.into_iter().map(Into::into).collect();
        self
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    fn allows(&self, value: &str) -> bool {
        self.enum_values.is_empty() || self.enum_values.iter().any(|v| v == value)
    }
}

/// A base URL template with its variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfiguration {
    /// URL template, e.g. `https://{host}/api`
    pub url: String,
    /// Human readable description
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Variables referenced by the template
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub variables: BTreeMap<String, ServerVariable>,
}

impl ServerConfiguration {
    /// Create a server entry from a URL template.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            description: String::new(),
            variables: BTreeMap::new(),
        }
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Declare a template variable.
    #[must_use]
    pub fn with_variable(mut self, name: impl Into<String>, variable: ServerVariable) -> Self {
        self.variables.insert(name.into(), variable);
        self
    }

    /// Names of the `{var}` placeholders in template order.
    ///
    /// # Errors
    ///
    /// Returns an error if a placeholder is unterminated or empty.
    pub fn template_variables(&self) -> Result<Vec<&str>> {
        let mut names = Vec::new();
        let mut rest = self.url.as_str();
        while let Some(open) = rest.find('{') {
            let after = &rest[open + 1..];
            let close = after.find('}').ok_or_else(|| {
                Error::InvalidArgument(format!("unterminated variable in server URL `{}`", self.url))
            })?;
            let name = &after[..close];
            if name.is_empty() {
                return Err(Error::InvalidArgument(format!(
                    "empty variable in server URL `{}`",
                    self.url
                )));
            }
            names.push(name);
            rest = &after[close + 1..];
        }
        Ok(names)
    }

    /// Check that every placeholder is declared and every default is allowed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] describing the first inconsistency.
    pub fn validate(&self) -> Result<()> {
        for name in self.template_variables()? {
            if !self.variables.contains_key(name) {
                return Err(Error::ConfigError(format!(
                    "server URL `{}` references undeclared variable `{name}`",
                    self.url
                )));
            }
        }
        for (name, variable) in &self.variables {
            if !variable.allows(&variable.default_value) {
                return Err(Error::ConfigError(format!(
                    "default `{}` of server variable `{name}` is not among its allowed values",
                    variable.default_value
                )));
            }
        }
        Ok(())
    }

    /// Resolve the template into an absolute base URL.
    ///
    /// `overrides` are consulted in order for each variable before falling
    /// back to the declared default.
    ///
    /// # Errors
    ///
    /// Returns [`Error::VariableNotAllowed`] when the chosen value is outside
    /// the variable's enumeration, or [`Error::InvalidArgument`] when the
    /// template references an undeclared variable.
    pub fn url(&self, overrides: &[&ServerVariables]) -> Result<String> {
        let mut resolved = String::with_capacity(self.url.len());
        let mut rest = self.url.as_str();

        while let Some(open) = rest.find('{') {
            resolved.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let close = after.find('}').ok_or_else(|| {
                Error::InvalidArgument(format!("unterminated variable in server URL `{}`", self.url))
            })?;
            let name = &after[..close];
            let variable = self.variables.get(name).ok_or_else(|| {
                Error::InvalidArgument(format!(
                    "server URL `{}` references undeclared variable `{name}`",
                    self.url
                ))
            })?;

            let value = overrides
                .iter()
                .find_map(|layer| layer.get(name))
                .map_or(variable.default_value.as_str(), String::as_str);

            if !variable.allows(value) {
                return Err(Error::VariableNotAllowed {
                    name: name.to_string(),
                    value: value.to_string(),
                    allowed: variable.enum_values.clone(),
                });
            }

            resolved.push_str(value);
            rest = &after[close + 1..];
        }

        resolved.push_str(rest);
        Ok(resolved)
    }
}

/// Resolve the server at `index` of a catalog.
///
/// # Errors
///
/// Returns an error if the index is out of range or resolution fails.
pub fn resolve(
    servers: &[ServerConfiguration],
    index: usize,
    overrides: &[&ServerVariables],
) -> Result<String> {
    let server = servers.get(index).ok_or_else(|| {
        Error::InvalidArgument(format!(
            "server index {index} out of range (catalog has {} entries)",
            servers.len()
        ))
    })?;
    server.url(overrides)
}
