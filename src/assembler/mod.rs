//! Request assembly
//!
//! Merges a resolved [`RequestDefinition`] and an [`AuthResult`] into a single
//! wire-ready [`AssembledRequest`]. The precedence rules differ per channel:
//!
//! - Query: request params in document order, then auth query entries with
//!   set semantics (auth wins).
//! - Headers: request headers, then request cookies, then auth headers only
//!   where the request did not set the name (request wins), then auth cookies.
//! - Body: one branch per body variant; auth body fields are only accepted by
//!   `url` and `multipart` forms.
//!
//! Placeholders must already be resolved; see [`crate::variables`].

pub mod body;
pub mod error;
pub mod headers;

pub use body::AssembledBody;
pub use error::AssembleError;

use crate::models::{AuthResult, HttpMethod, ParamMap, RequestDefinition};
use url::Url;

/// A request ready to hand to a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledRequest {
    pub url: String,
    pub method: HttpMethod,
    pub headers: Vec<(String, String)>,
    pub body: AssembledBody,
}

impl AssembledRequest {
    /// Gets the first header value matching `name` case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        crate::content_type::find_header(&self.headers, name)
    }
}

/// Assembles a wire-ready request.
///
/// # Arguments
///
/// * `request` - The request with all placeholders resolved
/// * `auth` - Credentials to merge in; pass `AuthResult::default()` for none
///
/// # Returns
///
/// The assembled request, or a validation error when the URL does not parse
/// or the body cannot carry the requested fields. No partial request is
/// produced on error.
///
/// # Examples
///
/// ```
/// use rest_pipeline::assembler::assemble;
/// use rest_pipeline::models::{AuthResult, HttpMethod, RequestDefinition};
///
/// let request = RequestDefinition::new("r1", HttpMethod::GET, "https://api.example.com/items?a=1");
/// let mut auth = AuthResult::default();
/// auth.query = Some([("a".to_string(), "2".to_string())].into_iter().collect());
///
/// let assembled = assemble(&request, &auth).unwrap();
/// assert_eq!(assembled.url, "https://api.example.com/items?a=2");
/// ```
pub fn assemble(
    request: &RequestDefinition,
    auth: &AuthResult,
) -> Result<AssembledRequest, AssembleError> {
    let url = build_url(&request.url, &request.query_params, auth)?;
    let mut headers = headers::build_headers(&request.headers, &request.cookie_params, auth);
    let body = body::build_body(&request.body, auth, &mut headers)?;

    Ok(AssembledRequest {
        url,
        method: request.method,
        headers,
        body,
    })
}

/// Parses the URL, appends enabled query params and overlays auth query entries.
fn build_url(raw: &str, query_params: &ParamMap, auth: &AuthResult) -> Result<String, AssembleError> {
    let mut url = Url::parse(raw.trim())?;

    let enabled: Vec<(&str, &str)> = query_params
        .values()
        .filter(|p| p.enabled && !p.name.is_empty())
        .map(|p| (p.name.as_str(), p.value.as_str()))
        .collect();
    if !enabled.is_empty() {
        url.query_pairs_mut().extend_pairs(enabled);
    }

    if let Some(auth_query) = auth.query.as_ref().filter(|q| !q.is_empty()) {
        let mut pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        for (key, value) in auth_query {
            body::set_pair(&mut pairs, key, value.clone());
        }
        url.set_query(None);
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
    }

    Ok(url.to_string())
}
