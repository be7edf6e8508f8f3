//! Environment data models.
//!
//! An environment is a named set of variables (dev, staging, production...)
//! that the resolver substitutes into `{{name}}` placeholders. The core only
//! ever reads environments; editing happens in the client UI.

use crate::models::OrderedMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single environment variable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Variable {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub value: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Secret values are masked by the UI and never written to logs.
    #[serde(default)]
    pub secure: bool,
}

fn default_enabled() -> bool {
    true
}

impl Variable {
    /// Creates an enabled, non-secure variable.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: name.clone(),
            name,
            value: value.into(),
            enabled: true,
            secure: false,
        }
    }
}

/// Represents a single environment with its variables
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Environment {
    #[serde(default)]
    pub id: String,

    /// Environment name (e.g., "dev", "staging", "production")
    pub name: String,

    /// Variables keyed by synthetic id
    #[serde(default)]
    pub variables: OrderedMap<Variable>,
}

impl Environment {
    /// Creates a new environment with the given name
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: name.clone(),
            name,
            variables: OrderedMap::new(),
        }
    }

    /// Adds a variable, keyed by its id
    pub fn with_variable(mut self, variable: Variable) -> Self {
        self.variables.insert(variable.id.clone(), variable);
        self
    }

    /// Returns the name→value map of enabled variables.
    ///
    /// When two enabled variables share a name the later one wins.
    pub fn enabled_variables(&self) -> HashMap<String, String> {
        self.variables
            .values()
            .filter(|v| v.enabled)
            .map(|v| (v.name.clone(), v.value.clone()))
            .collect()
    }

    /// Gets the value of an enabled variable by name
    pub fn get(&self, name: &str) -> Option<&str> {
        self.variables
            .values()
            .filter(|v| v.enabled && v.name == name)
            .last()
            .map(|v| v.value.as_str())
    }

    /// Returns the number of variables, enabled or not
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    /// Checks if the environment has no variables
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_new() {
        let env = Environment::new("dev");
        assert_eq!(env.name, "dev");
        assert!(env.is_empty());
    }

    #[test]
    fn test_enabled_variables_skip_disabled() {
        let mut token = Variable::new("token", "secret");
        token.enabled = false;
        let env = Environment::new("dev")
            .with_variable(Variable::new("baseUrl", "https://api.dev"))
            .with_variable(token);

        let vars = env.enabled_variables();
        assert_eq!(vars.len(), 1);
        assert_eq!(vars.get("baseUrl").map(String::as_str), Some("https://api.dev"));
        assert_eq!(env.get("token"), None);
        assert_eq!(env.len(), 2);
    }

    #[test]
    fn test_deserialize_environment() {
        let json = r#"{
            "id": "env-1",
            "name": "staging",
            "variables": {
                "v1": {"id": "v1", "name": "host", "value": "staging.example.com", "secure": false},
                "v2": {"id": "v2", "name": "apiKey", "value": "k", "secure": true, "enabled": true}
            }
        }"#;
        let env: Environment = serde_json::from_str(json).unwrap();
        assert_eq!(env.id, "env-1");
        assert_eq!(env.get("host"), Some("staging.example.com"));
        assert!(env.variables.get("v2").unwrap().secure);
    }
}
