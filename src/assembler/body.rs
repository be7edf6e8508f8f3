//! Body construction per body variant.

use super::error::AssembleError;
use crate::content_type::{has_content_type, mime_for_language};
use crate::models::{AuthResult, FormEncoding, FormField, MultipartPart, OrderedMap, RequestBody};
use serde_json::Value;

/// Body ready for a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssembledBody {
    None,
    Text(String),
    /// Raw body streamed from a file by the transport.
    File { path: String },
    /// Parts assembled into `multipart/form-data` by the transport.
    Multipart(Vec<MultipartPart>),
}

/// Builds the body, adding a Content-Type header when one is implied and none is set.
pub fn build_body(
    body: &RequestBody,
    auth: &AuthResult,
    headers: &mut Vec<(String, String)>,
) -> Result<AssembledBody, AssembleError> {
    match body {
        RequestBody::None => {
            reject_auth_body(auth)?;
            Ok(AssembledBody::None)
        }
        RequestBody::Text { content, language } => {
            reject_auth_body(auth)?;
            set_default_content_type(headers, mime_for_language(*language));
            Ok(AssembledBody::Text(content.clone()))
        }
        RequestBody::Binary { path, content_type } => {
            reject_auth_body(auth)?;
            if let Some(hint) = content_type.as_deref().filter(|ct| !ct.trim().is_empty()) {
                set_default_content_type(headers, hint);
            }
            Ok(match path.as_deref().filter(|p| !p.is_empty()) {
                Some(path) => AssembledBody::File {
                    path: path.to_string(),
                },
                None => AssembledBody::None,
            })
        }
        RequestBody::Form { encoding, fields } => match encoding {
            FormEncoding::Url => {
                reject_file_fields(fields, *encoding)?;
                let mut pairs = enabled_pairs(fields);
                if let Some(auth_body) = &auth.body {
                    for (key, value) in auth_body {
                        set_pair(&mut pairs, key, json_to_field(value));
                    }
                }
                set_default_content_type(headers, "application/x-www-form-urlencoded");
                let encoded = url::form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
                    .finish();
                Ok(AssembledBody::Text(encoded))
            }
            FormEncoding::Plain => {
                reject_file_fields(fields, *encoding)?;
                if auth.has_body_fields() {
                    return Err(AssembleError::AuthBodyUnsupportedEncoding(*encoding));
                }
                set_default_content_type(headers, "text/plain");
                let text = enabled_pairs(fields)
                    .into_iter()
                    .map(|(k, v)| format!("{}={}", k, v))
                    .collect::<Vec<_>>()
                    .join("\n");
                Ok(AssembledBody::Text(text))
            }
            FormEncoding::Multipart => {
                let mut parts = multipart_parts(fields);
                if let Some(auth_body) = &auth.body {
                    for (key, value) in auth_body {
                        parts.push(MultipartPart::Text {
                            name: key.clone(),
                            value: json_to_field(value),
                        });
                    }
                }
                Ok(AssembledBody::Multipart(parts))
            }
        },
    }
}

fn reject_auth_body(auth: &AuthResult) -> Result<(), AssembleError> {
    if auth.has_body_fields() {
        return Err(AssembleError::AuthBodyRequiresForm);
    }
    Ok(())
}

fn reject_file_fields(
    fields: &OrderedMap<FormField>,
    encoding: FormEncoding,
) -> Result<(), AssembleError> {
    match fields.values().find(|f| f.enabled && f.is_file()) {
        Some(field) => Err(AssembleError::FileFieldNotAllowed {
            encoding,
            field: field.key.clone(),
        }),
        None => Ok(()),
    }
}

fn set_default_content_type(headers: &mut Vec<(String, String)>, value: &str) {
    if !has_content_type(headers) {
        headers.push(("Content-Type".to_string(), value.to_string()));
    }
}

fn enabled_pairs(fields: &OrderedMap<FormField>) -> Vec<(String, String)> {
    fields
        .values()
        .filter(|f| f.enabled && !f.is_file())
        .map(|f| (f.key.clone(), f.value.clone()))
        .collect()
}

/// Sets `key` to `value`: replaces the first occurrence in place and drops
/// later duplicates, or appends when absent.
pub(crate) fn set_pair(pairs: &mut Vec<(String, String)>, key: &str, value: String) {
    match pairs.iter().position(|(k, _)| k == key) {
        Some(first) => {
            pairs[first].1 = value;
            let mut index = 0;
            pairs.retain(|(k, _)| {
                let keep = index <= first || k != key;
                index += 1;
                keep
            });
        }
        None => pairs.push((key.to_string(), value)),
    }
}

/// Renders an auth body value as a form field string. Strings are used raw.
fn json_to_field(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn multipart_parts(fields: &OrderedMap<FormField>) -> Vec<MultipartPart> {
    let mut parts = Vec::new();
    for field in fields.values().filter(|f| f.enabled) {
        if !field.is_file() {
            parts.push(MultipartPart::Text {
                name: field.key.clone(),
                value: field.value.clone(),
            });
            continue;
        }
        match field.file_path.as_deref().filter(|p| !p.is_empty()) {
            Some(path) => parts.push(MultipartPart::File {
                name: field.key.clone(),
                file_path: path.to_string(),
                file_name: field.file_name.clone(),
                content_type: field.content_type.clone(),
            }),
            None => log::warn!(
                target: "rest_pipeline::assembler",
                "Skipping multipart file field '{}': no file selected",
                field.key
            ),
        }
    }
    parts
}
