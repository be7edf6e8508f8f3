//! Environments: named sets of variables substituted into requests.
//!
//! # Example
//!
//! ```
//! use rest_pipeline::environment::{Environment, Variable};
//!
//! let env = Environment::new("dev").with_variable(Variable::new("baseUrl", "https://api.dev"));
//! assert_eq!(env.get("baseUrl"), Some("https://api.dev"));
//! ```

pub mod models;

pub use models::{Environment, Variable};
