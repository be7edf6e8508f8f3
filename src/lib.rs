//! Request execution pipeline for a desktop HTTP client.
//!
//! Takes a saved request definition plus an optional active environment and
//! produces a classified response, handling everything in between.
//!
//! # Architecture
//!
//! The crate is organized into several modules, leaves first:
//!
//! - **models**: Request, auth and response data structures
//! - **environment**: Environments and their variables
//! - **variables**: `{{name}}` substitution over requests and auth configs
//! - **store**: Versioned JSON documents with a migration hook
//! - **cache**: AES-256-GCM encrypted, time-bounded credentials cache
//! - **assembler**: Merges a resolved request and an auth result into a wire request
//! - **classifier**: Text/binary handling, preview gating and output validation
//! - **auth**: Basic, bearer, API key and OAuth 2.0 credential providers
//! - **transport**: The network seam, with a reqwest implementation behind `native`
//! - **pipeline**: Orchestrates all of the above for one execution
//! - **config**: Pipeline settings, in memory and persisted
//!
//! # Control Flow
//!
//! [`pipeline::RequestPipeline::execute`]:
//! 1. Resolves variables against the active environment
//! 2. Looks up cached credentials, or runs the auth provider
//! 3. Assembles the request (URL, query, headers, cookies, body)
//! 4. Sends it through the transport
//! 5. Classifies the response
//! 6. Caches freshly obtained credentials when the scheme allows it
//!
//! # Features
//!
//! - `native`: reqwest transport, filesystem blob store and the
//!   `rest-pipeline` command-line binary. Hosts that bring their own transport
//!   and storage do not need it.

pub mod assembler;
pub mod auth;
pub mod cache;
pub mod classifier;
pub mod config;
pub mod content_type;
pub mod environment;
pub mod logging;
pub mod models;
pub mod pipeline;
pub mod store;
pub mod transport;
pub mod variables;

pub use pipeline::{CollectionContext, ExecutionContext, PipelineError, RequestPipeline};
