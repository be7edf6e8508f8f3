//! HTTP transport seam.
//!
//! The pipeline never talks to the network itself: it hands a
//! [`TransportRequest`] to a [`Transport`] and gets a [`RawResponse`] back.
//! Hosts embed their own implementation; the `native` feature ships
//! [`native::ReqwestTransport`].

pub mod error;

#[cfg(feature = "native")]
pub mod cancellation;
#[cfg(feature = "native")]
pub mod native;

pub use error::{CancelError, ErrorKind, TransportError};

#[cfg(feature = "native")]
pub use cancellation::{RequestHandle, RequestTracker};
#[cfg(feature = "native")]
pub use native::ReqwestTransport;

use crate::assembler::{AssembledBody, AssembledRequest};
use crate::models::{HttpMethod, MultipartPart, RawResponse, RequestOptions};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Everything a transport needs to send one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransportRequest {
    /// Correlation id; also the key for [`Transport::cancel`].
    pub request_id: String,
    pub url: String,
    pub method: HttpMethod,
    pub headers: Vec<(String, String)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_file_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multipart_parts: Option<Vec<MultipartPart>>,
    #[serde(flatten)]
    pub options: RequestOptions,
    /// Bodies larger than this are spilled to a file instead of returned inline.
    pub preview_max_bytes: u64,
}

impl TransportRequest {
    /// Builds a transport request from an assembled request.
    ///
    /// # Arguments
    ///
    /// * `request_id` - Correlation id for logging and cancellation
    /// * `assembled` - The wire-ready request
    /// * `options` - Per-request transport options
    /// * `preview_max_bytes` - Inline body threshold
    pub fn from_assembled(
        request_id: impl Into<String>,
        assembled: AssembledRequest,
        options: RequestOptions,
        preview_max_bytes: u64,
    ) -> Self {
        let mut request = Self {
            request_id: request_id.into(),
            url: assembled.url,
            method: assembled.method,
            headers: assembled.headers,
            body: None,
            body_file_path: None,
            multipart_parts: None,
            options,
            preview_max_bytes,
        };

        match assembled.body {
            AssembledBody::None => {}
            AssembledBody::Text(text) => request.body = Some(text.into_bytes()),
            AssembledBody::File { path } => request.body_file_path = Some(path),
            AssembledBody::Multipart(parts) => request.multipart_parts = Some(parts),
        }

        request
    }

    /// Gets the first header value matching `name` case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        crate::content_type::find_header(&self.headers, name)
    }
}

/// Sends requests over the network.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends `request` and returns the raw response.
    ///
    /// Non-2xx statuses are responses, not errors.
    async fn send(&self, request: TransportRequest) -> Result<RawResponse, TransportError>;

    /// Cancels the in-flight request with this correlation id.
    async fn cancel(&self, request_id: &str) -> Result<(), CancelError>;
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted transport for unit tests.

    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct ScriptedTransport {
        responses: Mutex<VecDeque<Result<RawResponse, TransportError>>>,
        pub sent: Mutex<Vec<TransportRequest>>,
    }

    impl ScriptedTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn push(&self, response: Result<RawResponse, TransportError>) -> &Self {
            self.responses.lock().unwrap().push_back(response);
            self
        }

        pub fn push_json(&self, status: u16, body: &str) -> &Self {
            self.push(Ok(RawResponse::new("", status, "")
                .with_body("application/json", body.as_bytes().to_vec())))
        }

        pub fn sent(&self) -> Vec<TransportRequest> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send(&self, request: TransportRequest) -> Result<RawResponse, TransportError> {
            let id = request.request_id.clone();
            self.sent.lock().unwrap().push(request);
            let next = self.responses.lock().unwrap().pop_front();
            match next {
                Some(Ok(mut response)) => {
                    response.request_id = id;
                    Ok(response)
                }
                Some(Err(err)) => Err(err),
                None => Err(TransportError::new(ErrorKind::Connection, "no scripted response")),
            }
        }

        async fn cancel(&self, request_id: &str) -> Result<(), CancelError> {
            Err(CancelError::NotFound(request_id.to_string()))
        }
    }
}
