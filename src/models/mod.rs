//! Data models shared by the pipeline stages.
//!
//! Requests, auth configuration and results, and raw/classified responses.
//! Everything here derives serde with camelCase field names so documents
//! saved by the desktop client deserialize directly.

pub mod auth;
pub mod ordered;
pub mod request;
pub mod response;

pub use auth::{
    AuthConfig, AuthPlacement, AuthResult, ClientAuth, OidcDiscovery, TokenCachingPolicy,
};
pub use ordered::OrderedMap;
pub use request::{
    FormEncoding, FormField, FormFieldKind, HttpMethod, HttpVersionPref, MultipartPart, Param, ParamMap,
    RequestBody, RequestDefinition, RequestOptions, TextLanguage,
};
pub use response::{ClassifiedResponse, RawResponse, ResponseCookie};
