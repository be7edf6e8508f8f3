//! Variable resolution for request definitions
//!
//! `{{name}}` placeholders in URLs, parameters, headers, cookies, bodies and
//! auth configs are replaced with values from the active environment.
//! Unresolved placeholders are left untouched.

pub mod request;
pub mod substitution;

pub use request::{resolve_auth_config, resolve_request};
pub use substitution::{placeholder_names, resolve, MAX_RECURSION_DEPTH};
