//! Integration tests module for the request pipeline
//!
//! Provides a scripted transport shared by the pipeline tests and one-time
//! logger setup.

pub mod pipeline_test;
pub mod store_migration_test;

#[cfg(feature = "native")]
pub mod native_transport_test;

use async_trait::async_trait;
use rest_pipeline::models::RawResponse;
use rest_pipeline::transport::{CancelError, ErrorKind, Transport, TransportError, TransportRequest};
use std::collections::VecDeque;
use std::sync::{Mutex, Once};

static INIT: Once = Once::new();

/// Initialize test environment (run once)
pub fn init_test_env() {
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

/// Transport that replays queued responses and records what was sent.
#[derive(Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<Result<RawResponse, TransportError>>>,
    sent: Mutex<Vec<TransportRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a response with the given status and JSON body.
    pub fn respond_json(&self, status: u16, body: &str) -> &Self {
        let response = RawResponse::new("", status, "").with_body("application/json", body.as_bytes().to_vec());
        self.respond(Ok(response))
    }

    pub fn respond(&self, response: Result<RawResponse, TransportError>) -> &Self {
        self.responses.lock().unwrap().push_back(response);
        self
    }

    pub fn sent(&self) -> Vec<TransportRequest> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: TransportRequest) -> Result<RawResponse, TransportError> {
        let request_id = request.request_id.clone();
        self.sent.lock().unwrap().push(request);
        let next = self.responses.lock().unwrap().pop_front();
        match next {
            Some(Ok(mut response)) => {
                response.request_id = request_id;
                Ok(response)
            }
            Some(Err(err)) => Err(err),
            None => Err(TransportError::new(ErrorKind::Connection, "no response queued")),
        }
    }

    async fn cancel(&self, request_id: &str) -> Result<(), CancelError> {
        Err(CancelError::NotFound(request_id.to_string()))
    }
}
