//! Request definition data models.
//!
//! A [`RequestDefinition`] is the declarative description the editor saves:
//! a URL template, parameter collections keyed by synthetic ids, a tagged
//! body variant, an authentication config and per-request transport options.
//! Nothing here is wire-ready; see [`crate::assembler`] for that.

use super::auth::AuthConfig;
use super::ordered::OrderedMap;
use serde::{Deserialize, Serialize};

/// HTTP request method.
///
/// Represents all standard HTTP methods as defined in RFC 7231 and RFC 5789.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum HttpMethod {
    /// HTTP GET method - retrieve a resource
    #[default]
    GET,
    /// HTTP POST method - submit data to create a resource
    POST,
    /// HTTP PUT method - replace a resource
    PUT,
    /// HTTP DELETE method - remove a resource
    DELETE,
    /// HTTP PATCH method - partially modify a resource
    PATCH,
    /// HTTP OPTIONS method - describe communication options
    OPTIONS,
    /// HTTP HEAD method - retrieve headers only
    HEAD,
    /// HTTP TRACE method - perform a message loop-back test
    TRACE,
    /// HTTP CONNECT method - establish a tunnel to the server
    CONNECT,
}

impl HttpMethod {
    /// Returns the string representation of the HTTP method.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::GET => "GET",
            HttpMethod::POST => "POST",
            HttpMethod::PUT => "PUT",
            HttpMethod::DELETE => "DELETE",
            HttpMethod::PATCH => "PATCH",
            HttpMethod::OPTIONS => "OPTIONS",
            HttpMethod::HEAD => "HEAD",
            HttpMethod::TRACE => "TRACE",
            HttpMethod::CONNECT => "CONNECT",
        }
    }

    /// Parses a method name case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "GET" => Some(HttpMethod::GET),
            "POST" => Some(HttpMethod::POST),
            "PUT" => Some(HttpMethod::PUT),
            "DELETE" => Some(HttpMethod::DELETE),
            "PATCH" => Some(HttpMethod::PATCH),
            "OPTIONS" => Some(HttpMethod::OPTIONS),
            "HEAD" => Some(HttpMethod::HEAD),
            "TRACE" => Some(HttpMethod::TRACE),
            "CONNECT" => Some(HttpMethod::CONNECT),
            _ => None,
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single named value in a parameter collection (path, query, header, cookie).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Param {
    pub name: String,
    #[serde(default)]
    pub value: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Marks the value as a secret for storage; has no effect on assembly.
    #[serde(default)]
    pub secure: bool,
}

impl Param {
    /// Creates an enabled, non-secure parameter.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            enabled: true,
            secure: false,
        }
    }

    /// Returns a disabled copy of this parameter.
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

fn default_enabled() -> bool {
    true
}

/// Parameter collection keyed by synthetic id.
pub type ParamMap = OrderedMap<Param>;

/// A typed part of a multipart body. File contents are read by the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum MultipartPart {
    Text {
        name: String,
        value: String,
    },
    #[serde(rename_all = "camelCase")]
    File {
        name: String,
        file_path: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        file_name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content_type: Option<String>,
    },
}

/// Declared language of a text body, used to infer a Content-Type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TextLanguage {
    Json,
    Xml,
    Html,
    Javascript,
    Yaml,
    Graphql,
    Css,
    Csv,
    #[default]
    #[serde(other)]
    Plaintext,
}

/// How a form body is encoded on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormEncoding {
    /// `application/x-www-form-urlencoded`
    Url,
    /// `multipart/form-data`, assembled by the transport
    Multipart,
    /// Newline separated `key=value` pairs as `text/plain`
    Plain,
}

/// Kind of a form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FormFieldKind {
    #[default]
    Text,
    File,
}

/// A single field of a form body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormField {
    pub key: String,
    #[serde(default)]
    pub value: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub kind: FormFieldKind,
    /// Resolved path of the file to upload (file fields only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

impl FormField {
    /// Creates an enabled text field.
    pub fn text(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            enabled: true,
            kind: FormFieldKind::Text,
            file_path: None,
            file_name: None,
            content_type: None,
        }
    }

    /// Creates an enabled file field.
    pub fn file(key: impl Into<String>, file_path: Option<String>) -> Self {
        Self {
            key: key.into(),
            value: String::new(),
            enabled: true,
            kind: FormFieldKind::File,
            file_path,
            file_name: None,
            content_type: None,
        }
    }

    pub fn is_file(&self) -> bool {
        self.kind == FormFieldKind::File
    }
}

/// Request body variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RequestBody {
    #[default]
    None,
    Text {
        #[serde(default)]
        content: String,
        #[serde(default)]
        language: TextLanguage,
    },
    Form {
        encoding: FormEncoding,
        #[serde(default)]
        fields: OrderedMap<FormField>,
    },
    #[serde(rename_all = "camelCase")]
    Binary {
        #[serde(default)]
        path: Option<String>,
        #[serde(default)]
        content_type: Option<String>,
    },
}

/// Preferred HTTP version negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HttpVersionPref {
    #[default]
    Auto,
    Http1,
    Http2,
}

/// Per-request transport options, passed through to the transport unmodified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RequestOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disable_ssl: Option<bool>,
    /// Path to a custom root CA bundle (PEM).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_path: Option<String>,
    /// Hostname to pin to `ip_override`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_override: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_override: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_version: Option<HttpVersionPref>,
    /// Maximum redirects to follow. 0 disables.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_redirects: Option<u32>,
}

/// A saved request as authored in the editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestDefinition {
    /// Stable identifier; also used to derive the credentials cache key.
    pub id: String,

    /// URL template. May contain `{{variable}}` and `{{pathParam}}` placeholders.
    pub url: String,

    #[serde(default)]
    pub method: HttpMethod,

    #[serde(default)]
    pub path_params: ParamMap,

    #[serde(default)]
    pub query_params: ParamMap,

    #[serde(default)]
    pub headers: ParamMap,

    #[serde(default)]
    pub cookie_params: ParamMap,

    #[serde(default)]
    pub body: RequestBody,

    #[serde(default)]
    pub authentication: AuthConfig,

    #[serde(default)]
    pub options: RequestOptions,
}

impl RequestDefinition {
    /// Creates a request with no parameters, body or authentication.
    pub fn new(id: impl Into<String>, method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            method,
            path_params: ParamMap::new(),
            query_params: ParamMap::new(),
            headers: ParamMap::new(),
            cookie_params: ParamMap::new(),
            body: RequestBody::None,
            authentication: AuthConfig::None,
            options: RequestOptions::default(),
        }
    }
}
