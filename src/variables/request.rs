//! Resolution of whole request definitions and auth configs.
//!
//! Both functions build new values from the input and never modify the
//! caller's request.

use super::substitution::{resolve, VARIABLE_REGEX};
use crate::environment::Environment;
use crate::models::{AuthConfig, AuthPlacement, FormField, Param, ParamMap, RequestBody, RequestDefinition};
use regex::Captures;
use std::collections::HashMap;

/// Resolves every templated string in `request` against `environment`.
///
/// Order of operations:
/// 1. Environment variables in the URL.
/// 2. Environment variables in path and query parameter values.
/// 3. `{{paramName}}` placeholders still present in the URL that name an
///    enabled path or query parameter are replaced by that parameter's
///    resolved value, unless the value still contains `{{`.
/// 4. Header values, cookie parameter values, text body content and form
///    text field values.
///
/// A parameter value may therefore reference an environment variable, but an
/// environment variable cannot reference a parameter.
///
/// # Arguments
///
/// * `request` - The saved request definition
/// * `environment` - Active environment, if any
///
/// # Returns
///
/// A new `RequestDefinition` with placeholders substituted.
pub fn resolve_request(
    request: &RequestDefinition,
    environment: Option<&Environment>,
) -> RequestDefinition {
    let variables = environment
        .map(Environment::enabled_variables)
        .unwrap_or_default();

    let url = resolve(&request.url, &variables);
    let path_params = resolve_params(&request.path_params, &variables);
    let query_params = resolve_params(&request.query_params, &variables);
    let url = substitute_param_placeholders(&url, &path_params, &query_params);

    RequestDefinition {
        id: request.id.clone(),
        url,
        method: request.method,
        path_params,
        query_params,
        headers: resolve_params(&request.headers, &variables),
        cookie_params: resolve_params(&request.cookie_params, &variables),
        body: resolve_body(&request.body, &variables),
        authentication: request.authentication.clone(),
        options: request.options.clone(),
    }
}

fn resolve_params(params: &ParamMap, variables: &HashMap<String, String>) -> ParamMap {
    params.map_values(|param| Param {
        value: resolve(&param.value, variables),
        ..param.clone()
    })
}

/// Replaces `{{name}}` in `url` with the value of the enabled path or query
/// parameter called `name`. Path parameters take precedence on a name clash.
fn substitute_param_placeholders(url: &str, path_params: &ParamMap, query_params: &ParamMap) -> String {
    if !url.contains("{{") {
        return url.to_string();
    }

    let mut by_name: HashMap<&str, &str> = HashMap::new();
    for param in query_params.values().chain(path_params.values()) {
        if param.enabled && !param.name.is_empty() {
            by_name.insert(param.name.as_str(), param.value.as_str());
        }
    }

    VARIABLE_REGEX
        .replace_all(url, |caps: &Captures| match by_name.get(caps[1].trim()) {
            Some(value) if !value.contains("{{") => value.to_string(),
            _ => caps[0].to_string(),
        })
        .into_owned()
}

fn resolve_body(body: &RequestBody, variables: &HashMap<String, String>) -> RequestBody {
    match body {
        RequestBody::None => RequestBody::None,
        RequestBody::Text { content, language } => RequestBody::Text {
            content: resolve(content, variables),
            language: *language,
        },
        RequestBody::Form { encoding, fields } => RequestBody::Form {
            encoding: *encoding,
            fields: fields.map_values(|field| {
                if field.is_file() {
                    field.clone()
                } else {
                    FormField {
                        value: resolve(&field.value, variables),
                        ..field.clone()
                    }
                }
            }),
        },
        RequestBody::Binary { path, content_type } => RequestBody::Binary {
            path: path.clone(),
            content_type: content_type.clone(),
        },
    }
}

/// Resolves every string field of an auth config.
///
/// Credentials are commonly stored as `{{token}}`-style references to
/// secure environment variables.
pub fn resolve_auth_config(config: &AuthConfig, variables: &HashMap<String, String>) -> AuthConfig {
    let r = |value: &Option<String>| value.as_ref().map(|v| resolve(v, variables));

    match config {
        AuthConfig::None => AuthConfig::None,
        AuthConfig::Inherit => AuthConfig::Inherit,
        AuthConfig::Basic { username, password } => AuthConfig::Basic {
            username: r(username),
            password: r(password),
        },
        AuthConfig::Bearer {
            token,
            scheme,
            placement,
        } => AuthConfig::Bearer {
            token: r(token),
            scheme: r(scheme),
            placement: placement.as_ref().map(|p| resolve_placement(p, variables)),
        },
        AuthConfig::ApiKey {
            key,
            value,
            placement,
        } => AuthConfig::ApiKey {
            key: r(key),
            value: r(value),
            placement: placement.as_ref().map(|p| resolve_placement(p, variables)),
        },
        AuthConfig::Oauth2 {
            grant_type,
            auth_url,
            token_url,
            client_id,
            client_secret,
            scope,
            refresh_token,
            token_caching,
            client_auth,
            token_extra_params,
        } => AuthConfig::Oauth2 {
            grant_type: grant_type.clone(),
            auth_url: r(auth_url),
            token_url: r(token_url),
            client_id: r(client_id),
            client_secret: r(client_secret),
            scope: r(scope),
            refresh_token: r(refresh_token),
            token_caching: *token_caching,
            client_auth: *client_auth,
            token_extra_params: token_extra_params.as_ref().map(|extra| {
                extra
                    .iter()
                    .map(|(k, v)| (k.clone(), resolve(v, variables)))
                    .collect()
            }),
        },
    }
}

fn resolve_placement(placement: &AuthPlacement, variables: &HashMap<String, String>) -> AuthPlacement {
    let r = |value: &Option<String>| value.as_ref().map(|v| resolve(v, variables));
    match placement {
        AuthPlacement::Header { name } => AuthPlacement::Header { name: r(name) },
        AuthPlacement::Query { name } => AuthPlacement::Query { name: r(name) },
        AuthPlacement::Cookie { name } => AuthPlacement::Cookie { name: r(name) },
        AuthPlacement::Body { field_name } => AuthPlacement::Body {
            field_name: r(field_name),
        },
    }
}
