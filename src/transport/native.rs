//! Native HTTP transport using reqwest.
//!
//! A client is built per request so that TLS, resolver and redirect options
//! can differ between requests. Responses larger than the preview threshold
//! are streamed to a temp file and returned by path.

use super::cancellation::RequestTracker;
use super::error::{CancelError, ErrorKind, TransportError};
use super::{Transport, TransportRequest};
use crate::classifier::parse_set_cookie;
use crate::config::get_config;
use crate::logging::redact_query;
use crate::models::{HttpMethod, HttpVersionPref, MultipartPart, RawResponse, ResponseCookie};
use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use std::net::{IpAddr, SocketAddr};
use std::time::{Duration, Instant};
use url::Url;

const LOG_TARGET: &str = "rest_pipeline::transport";

/// [`Transport`] backed by reqwest.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    tracker: RequestTracker,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of requests currently in flight.
    pub fn active_count(&self) -> usize {
        self.tracker.active_count()
    }

    async fn execute(request: TransportRequest) -> Result<RawResponse, TransportError> {
        let start = Instant::now();
        let url = Url::parse(&request.url)?;
        let client = build_client(&request, &url).await?;

        let mut builder = client.request(to_reqwest_method(request.method), url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }

        if let Some(parts) = &request.multipart_parts {
            builder = builder.multipart(build_multipart(parts).await?);
        } else if let Some(path) = &request.body_file_path {
            let bytes = tokio::fs::read(path)
                .await
                .map_err(|e| TransportError::io(&format!("Failed to read body file '{}'", path), e))?;
            builder = builder.body(bytes);
        } else if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let mut response = builder.send().await?;

        let status = response.status();
        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let cookies = cookies_from_headers(&headers);

        let threshold = request.preview_max_bytes;
        let mut spill = response
            .content_length()
            .map(|len| len > threshold)
            .unwrap_or(false);
        let mut size: u64 = 0;
        let mut buffer: Vec<u8> = Vec::new();
        let mut spill_file: Option<(tokio::fs::File, tempfile::TempPath)> = None;

        while let Some(chunk) = response.chunk().await? {
            size += chunk.len() as u64;
            if spill || size > threshold {
                spill = true;
                if spill_file.is_none() {
                    let (file, path) = tempfile::Builder::new()
                        .prefix("rest-pipeline-")
                        .tempfile()
                        .map_err(|e| TransportError::io("Failed to create spill file", e))?
                        .into_parts();
                    let mut file = tokio::fs::File::from_std(file);
                    file.write_all(&buffer)
                        .await
                        .map_err(|e| TransportError::io("Failed to write spill file", e))?;
                    buffer.clear();
                    spill_file = Some((file, path));
                }
                if let Some((file, _)) = spill_file.as_mut() {
                    file.write_all(&chunk)
                        .await
                        .map_err(|e| TransportError::io("Failed to write spill file", e))?;
                }
            } else {
                buffer.extend_from_slice(&chunk);
            }
        }

        let file_path = match spill_file {
            Some((mut file, temp_path)) => {
                file.flush()
                    .await
                    .map_err(|e| TransportError::io("Failed to write spill file", e))?;
                drop(file);
                let path = temp_path
                    .keep()
                    .map_err(|e| TransportError::io("Failed to keep spill file", e.error))?;
                log::debug!(
                    target: LOG_TARGET,
                    "[{}] Body of {} bytes written to {}",
                    request.request_id,
                    size,
                    path.display()
                );
                Some(path.to_string_lossy().into_owned())
            }
            None => None,
        };

        Ok(RawResponse {
            request_id: request.request_id,
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or("").to_string(),
            headers,
            cookies,
            body: buffer,
            size,
            duration: start.elapsed().as_millis() as u64,
            timestamp: chrono::Utc::now().to_rfc3339(),
            file_path,
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: TransportRequest) -> Result<RawResponse, TransportError> {
        let request_id = request.request_id.clone();
        let handle = self.tracker.register(&request_id);
        log::info!(
            target: LOG_TARGET,
            "[{}] {} {}",
            request_id,
            request.method,
            log_url(&request.url, get_config().redact_sensitive_logs)
        );

        let result = tokio::select! {
            result = Self::execute(request) => result,
            _ = handle.cancelled() => Err(TransportError::cancelled(&request_id)),
        };
        self.tracker.unregister(&handle);

        match &result {
            Ok(response) => log::info!(
                target: LOG_TARGET,
                "[{}] {} {} in {} ms",
                request_id,
                response.status,
                response.status_text,
                response.duration
            ),
            Err(err) => log::warn!(target: LOG_TARGET, "[{}] {}", request_id, err),
        }
        result
    }

    async fn cancel(&self, request_id: &str) -> Result<(), CancelError> {
        self.tracker.cancel(request_id)?;
        log::info!(target: LOG_TARGET, "[{}] Cancelled", request_id);
        Ok(())
    }
}

fn to_reqwest_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::GET => reqwest::Method::GET,
        HttpMethod::POST => reqwest::Method::POST,
        HttpMethod::PUT => reqwest::Method::PUT,
        HttpMethod::DELETE => reqwest::Method::DELETE,
        HttpMethod::PATCH => reqwest::Method::PATCH,
        HttpMethod::HEAD => reqwest::Method::HEAD,
        HttpMethod::OPTIONS => reqwest::Method::OPTIONS,
        HttpMethod::TRACE => reqwest::Method::TRACE,
        HttpMethod::CONNECT => reqwest::Method::CONNECT,
    }
}

async fn build_client(
    request: &TransportRequest,
    url: &Url,
) -> Result<reqwest::Client, TransportError> {
    let options = &request.options;
    let mut builder = reqwest::Client::builder();

    if let Some(secs) = options.timeout_secs.filter(|secs| *secs > 0) {
        builder = builder.timeout(Duration::from_secs(secs));
    }

    if options.disable_ssl.unwrap_or(false) {
        builder = builder.danger_accept_invalid_certs(true);
    }

    if let Some(ca_path) = options.ca_path.as_deref().filter(|p| !p.is_empty()) {
        let pem = tokio::fs::read(ca_path)
            .await
            .map_err(|e| TransportError::io(&format!("Failed to read CA bundle '{}'", ca_path), e))?;
        let cert = reqwest::Certificate::from_pem(&pem).map_err(|e| {
            TransportError::new(ErrorKind::Tls, format!("Invalid CA bundle '{}': {}", ca_path, e))
        })?;
        builder = builder.add_root_certificate(cert);
    }

    if let Some((host, addr)) = resolve_override(request, url)? {
        builder = builder.resolve(&host, addr);
    }

    if let Some(agent) = &options.user_agent {
        builder = builder.user_agent(agent.as_str());
    }

    match options.http_version.unwrap_or_default() {
        HttpVersionPref::Auto => {}
        HttpVersionPref::Http1 => builder = builder.http1_only(),
        HttpVersionPref::Http2 => builder = builder.http2_prior_knowledge(),
    }

    let policy = match options.max_redirects {
        Some(0) => reqwest::redirect::Policy::none(),
        Some(max) => reqwest::redirect::Policy::limited(max as usize),
        None => reqwest::redirect::Policy::default(),
    };
    builder = builder.redirect(policy);

    builder
        .build()
        .map_err(|e| TransportError::new(ErrorKind::InvalidRequest, e.to_string()))
}

/// Resolves the host pin, if any, to a socket address.
///
/// The host defaults to the URL host; the port is the URL's effective port.
fn resolve_override(
    request: &TransportRequest,
    url: &Url,
) -> Result<Option<(String, SocketAddr)>, TransportError> {
    let ip = match request.options.ip_override.as_deref().map(str::trim) {
        Some(ip) if !ip.is_empty() => ip,
        _ => return Ok(None),
    };
    let ip: IpAddr = ip.parse().map_err(|_| {
        TransportError::new(ErrorKind::InvalidRequest, format!("Invalid IP override: {}", ip))
    })?;

    let host = match request.options.host_override.as_deref().map(str::trim) {
        Some(host) if !host.is_empty() => host.to_string(),
        _ => url.host_str().unwrap_or_default().to_string(),
    };
    let port = url.port_or_known_default().unwrap_or(80);

    Ok(Some((host, SocketAddr::new(ip, port))))
}

async fn build_multipart(parts: &[MultipartPart]) -> Result<reqwest::multipart::Form, TransportError> {
    let mut form = reqwest::multipart::Form::new();
    for part in parts {
        match part {
            MultipartPart::Text { name, value } => {
                form = form.text(name.clone(), value.clone());
            }
            MultipartPart::File {
                name,
                file_path,
                file_name,
                content_type,
            } => {
                let bytes = tokio::fs::read(file_path).await.map_err(|e| {
                    TransportError::io(&format!("Failed to read file '{}'", file_path), e)
                })?;
                let file_name = file_name.clone().unwrap_or_else(|| {
                    std::path::Path::new(file_path)
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_else(|| "file".to_string())
                });
                let mut file_part = reqwest::multipart::Part::bytes(bytes).file_name(file_name);
                if let Some(content_type) = content_type {
                    file_part = file_part.mime_str(content_type).map_err(|e| {
                        TransportError::new(
                            ErrorKind::InvalidRequest,
                            format!("Invalid content type '{}': {}", content_type, e),
                        )
                    })?;
                }
                form = form.part(name.clone(), file_part);
            }
        }
    }
    Ok(form)
}

fn cookies_from_headers(headers: &[(String, String)]) -> Vec<ResponseCookie> {
    headers
        .iter()
        .filter(|(name, _)| name.eq_ignore_ascii_case("set-cookie"))
        .filter_map(|(_, value)| parse_set_cookie(value))
        .collect()
}

/// The transport does not know which parameters carry credentials, so
/// every query value is masked when redaction is on.
fn log_url(url: &str, redact: bool) -> String {
    if redact {
        redact_query(url, |_| true)
    } else {
        url.to_string()
    }
}
