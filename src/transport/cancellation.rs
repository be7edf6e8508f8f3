//! In-flight request tracking and cancellation.
//!
//! Each send registers a [`RequestHandle`] under its correlation id. Cancelling
//! sets the handle's flag and wakes whoever is awaiting
//! [`RequestHandle::cancelled`], which lets a transport race the network call
//! against the cancel signal.

use super::error::CancelError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// A handle to a running request that can be cancelled.
#[derive(Debug, Clone)]
pub struct RequestHandle {
    pub request_id: String,
    state: Arc<HandleState>,
}

#[derive(Debug, Default)]
struct HandleState {
    cancelled: AtomicBool,
    notify: Notify,
}

impl RequestHandle {
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            state: Arc::new(HandleState::default()),
        }
    }

    /// Checks if cancellation has been requested for this request.
    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::SeqCst)
    }

    /// Marks this request as cancelled and wakes any waiter.
    pub fn mark_cancelled(&self) {
        self.state.cancelled.store(true, Ordering::SeqCst);
        self.state.notify.notify_waiters();
    }

    /// Resolves once the request is cancelled.
    pub async fn cancelled(&self) {
        loop {
            let notified = self.state.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

/// Thread-safe registry of in-flight requests.
#[derive(Debug, Clone, Default)]
pub struct RequestTracker {
    active: Arc<Mutex<HashMap<String, RequestHandle>>>,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a request and returns its handle.
    ///
    /// Registering an id that is already in flight replaces the older entry;
    /// the older handle can then no longer be cancelled by id.
    pub fn register(&self, request_id: &str) -> RequestHandle {
        let handle = RequestHandle::new(request_id);
        if let Ok(mut active) = self.active.lock() {
            active.insert(request_id.to_string(), handle.clone());
        }
        handle
    }

    /// Removes a finished request.
    ///
    /// Only removes the entry if it still belongs to `handle`.
    pub fn unregister(&self, handle: &RequestHandle) -> bool {
        match self.active.lock() {
            Ok(mut active) => {
                let owned = active
                    .get(&handle.request_id)
                    .map(|current| Arc::ptr_eq(&current.state, &handle.state))
                    .unwrap_or(false);
                if owned {
                    active.remove(&handle.request_id);
                }
                owned
            }
            Err(_) => false,
        }
    }

    /// Cancels a specific request by ID.
    ///
    /// # Arguments
    ///
    /// * `request_id` - Correlation id the request was sent with
    ///
    /// # Returns
    ///
    /// `Ok(())` if the request was in flight, `Err(CancelError::NotFound)`
    /// otherwise.
    pub fn cancel(&self, request_id: &str) -> Result<(), CancelError> {
        let handle = self
            .active
            .lock()
            .ok()
            .and_then(|mut active| active.remove(request_id))
            .ok_or_else(|| CancelError::NotFound(request_id.to_string()))?;
        handle.mark_cancelled();
        Ok(())
    }

    pub fn active_count(&self) -> usize {
        self.active.lock().map(|active| active.len()).unwrap_or(0)
    }

    pub fn is_active(&self, request_id: &str) -> bool {
        self.active
            .lock()
            .map(|active| active.contains_key(request_id))
            .unwrap_or(false)
    }
}
