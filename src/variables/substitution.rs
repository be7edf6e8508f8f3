//! Variable substitution engine
//!
//! This module provides the core substitution logic that replaces `{{variable}}`
//! patterns with values from an environment. Values that themselves contain
//! placeholders are expanded recursively, and a placeholder is only replaced
//! when its whole expansion succeeds. Unknown names, names that take part in
//! or lead to a cycle, and chains deeper than [`MAX_RECURSION_DEPTH`] are left
//! in the output verbatim. The output is therefore a fixed point: resolving
//! it again with the same variables changes nothing.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashMap;

/// Maximum recursion depth for nested variable substitution
pub const MAX_RECURSION_DEPTH: usize = 10;

/// Cached regex pattern for matching {{variableName}} with optional whitespace.
/// This is compiled once and reused to avoid repeated regex compilation overhead.
pub(crate) static VARIABLE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{([^}]+)\}\}").expect("Failed to compile variable regex"));

/// Substitutes all {{variable}} patterns in the input text with their values
///
/// This function:
/// - Finds all {{variableName}} patterns (the name is trimmed)
/// - Replaces each with `variables[name]`, itself fully expanded
/// - Leaves undefined names as the literal `{{name}}`
/// - Leaves a name literal when its expansion hits a cycle or the depth limit
///
/// # Arguments
///
/// * `input` - The text containing {{variable}} patterns
/// * `variables` - Enabled variables of the active environment, by name
///
/// # Examples
///
/// ```
/// use rest_pipeline::variables::resolve;
/// use std::collections::HashMap;
///
/// let mut vars = HashMap::new();
/// vars.insert("baseUrl".to_string(), "https://api.example.com".to_string());
/// vars.insert("usersUrl".to_string(), "{{baseUrl}}/users".to_string());
///
/// assert_eq!(resolve("{{usersUrl}}", &vars), "https://api.example.com/users");
/// assert_eq!(resolve("{{missing}}", &vars), "{{missing}}");
/// ```
pub fn resolve(input: &str, variables: &HashMap<String, String>) -> String {
    // Fast path: if there are no variable markers at all, return original text
    if !input.contains("{{") {
        return input.to_string();
    }

    VARIABLE_REGEX
        .replace_all(input, |caps: &Captures| {
            expand(caps[1].trim(), variables, &mut Vec::new())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Fully expands the value of `name`.
///
/// Returns `None` when `name` is undefined, or when its expansion revisits a
/// name already on `stack` or goes deeper than [`MAX_RECURSION_DEPTH`].
/// Undefined names nested inside the value stay literal and do not fail it.
fn expand(name: &str, variables: &HashMap<String, String>, stack: &mut Vec<String>) -> Option<String> {
    let value = variables.get(name)?;
    if !value.contains("{{") {
        return Some(value.clone());
    }
    if stack.len() >= MAX_RECURSION_DEPTH || stack.iter().any(|n| n == name) {
        return None;
    }

    stack.push(name.to_string());
    let mut out = String::with_capacity(value.len());
    let mut last = 0;
    let mut failed = false;
    for caps in VARIABLE_REGEX.captures_iter(value) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        out.push_str(&value[last..whole.start()]);
        let inner_name = inner.as_str().trim();
        if variables.contains_key(inner_name) {
            match expand(inner_name, variables, stack) {
                Some(expanded) => out.push_str(&expanded),
                None => {
                    failed = true;
                    break;
                }
            }
        } else {
            out.push_str(whole.as_str());
        }
        last = whole.end();
    }
    stack.pop();

    if failed {
        return None;
    }
    out.push_str(&value[last..]);
    Some(out)
}

/// Returns the trimmed names of all placeholders in `text`, in order of appearance.
pub fn placeholder_names(text: &str) -> Vec<String> {
    VARIABLE_REGEX
        .captures_iter(text)
        .map(|cap| cap[1].trim().to_string())
        .collect()
}
