//! A scripted in-memory [`WalletProvider`] for tests.

use crate::{
    error::{ProviderError, ProviderRpcError},
    provider::{ProviderEvent, WalletProvider},
};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::{
    collections::{HashMap, VecDeque},
    sync::atomic::{AtomicBool, Ordering},
    time::Duration,
};
use tokio::sync::broadcast;

/// A request observed by [`MockProvider`].
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedRequest {
    pub method: String,
    pub params: Value,
}

type Scripted = Result<Value, ProviderRpcError>;

/// Deterministic fake wallet.
///
/// Responses are scripted per method. Each call pops the next scripted response; the last one is
/// repeated once the queue is down to a single entry. Unscripted methods fail with a
/// `method not found` RPC error.
#[derive(Debug)]
pub struct MockProvider {
    available: AtomicBool,
    responses: Mutex<HashMap<String, VecDeque<Scripted>>>,
    delays: Mutex<HashMap<String, Duration>>,
    requests: Mutex<Vec<RecordedRequest>>,
    events: broadcast::Sender<ProviderEvent>,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            available: AtomicBool::new(true),
            responses: Default::default(),
            delays: Default::default(),
            requests: Default::default(),
            events: broadcast::channel(16).0,
        }
    }

    /// A provider that reports no wallet, like a browser without an extension.
    pub fn unavailable() -> Self {
        let provider = Self::new();
        provider.set_available(false);
        provider
    }

    pub fn with_response(self, method: &str, value: Value) -> Self {
        self.push_response(method, value);
        self
    }

    pub fn with_error(self, method: &str, error: ProviderRpcError) -> Self {
        self.push_error(method, error);
        self
    }

    /// Delays every answer to `method`.
    pub fn with_delay(self, method: &str, delay: Duration) -> Self {
        self.delays.lock().insert(method.to_string(), delay);
        self
    }

    pub fn push_response(&self, method: &str, value: Value) {
        self.script(method, Ok(value));
    }

    pub fn push_error(&self, method: &str, error: ProviderRpcError) {
        self.script(method, Err(error));
    }

    fn script(&self, method: &str, response: Scripted) {
        self.responses.lock().entry(method.to_string()).or_default().push_back(response);
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::Relaxed);
    }

    /// Pushes a wallet notification to all subscribers.
    pub fn emit(&self, event: ProviderEvent) {
        let _ = self.events.send(event);
    }

    /// All requests received so far, in order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    pub fn requests_for(&self, method: &str) -> Vec<RecordedRequest> {
        self.requests.lock().iter().filter(|r| r.method == method).cloned().collect()
    }

    pub fn clear_requests(&self) {
        self.requests.lock().clear();
    }

    fn next_response(&self, method: &str) -> Scripted {
        let mut responses = self.responses.lock();
        let next = responses.get_mut(method).and_then(|queue| {
            if queue.len() > 1 { queue.pop_front() } else { queue.front().cloned() }
        });
        next.unwrap_or_else(|| {
            Err(ProviderRpcError::new(-32601, format!("method {method} not found")))
        })
    }
}

#[async_trait]
impl WalletProvider for MockProvider {
    async fn is_available(&self) -> bool {
        self.available.load(Ordering::Relaxed)
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        if !self.is_available().await {
            return Err(ProviderError::Unavailable);
        }
        self.requests.lock().push(RecordedRequest { method: method.to_string(), params });

        let delay = self.delays.lock().get(method).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.next_response(method)?)
    }

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }
}
