use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use parking_lot::Mutex;
use tokio::sync::{Notify, broadcast, watch};
use uuid::Uuid;

use crate::{
    browser::{
        queue::RequestQueue,
        types::{ProviderRequest, ProviderResponse, ProviderStatus},
    },
    provider::ProviderEvent,
};

#[derive(Debug)]
pub(crate) struct BrowserWalletState {
    /// Token the page must present on every API call.
    session_token: String,
    /// What the attached page reported about `window.ethereum`. `None` until a page loads.
    status: watch::Sender<Option<ProviderStatus>>,
    /// Request/response queue for provider calls.
    requests: Mutex<RequestQueue>,
    /// Woken whenever a response arrives or the bridge closes.
    responded: Notify,
    events: broadcast::Sender<ProviderEvent>,
    closed: AtomicBool,
}

impl BrowserWalletState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            session_token: Uuid::new_v4().to_string(),
            status: watch::Sender::new(None),
            requests: Mutex::new(RequestQueue::default()),
            responded: Notify::new(),
            events: broadcast::channel(64).0,
            closed: AtomicBool::new(false),
        })
    }

    pub fn session_token(&self) -> &str {
        &self.session_token
    }

    pub fn status(&self) -> Option<ProviderStatus> {
        self.status.borrow().clone()
    }

    pub fn watch_status(&self) -> watch::Receiver<Option<ProviderStatus>> {
        self.status.subscribe()
    }

    /// Records a (re)attached page. Requests dispatched to a previous page are offered again.
    pub fn set_status(&self, status: ProviderStatus) {
        self.requests.lock().redispatch_all();
        self.status.send_replace(Some(status));
    }

    pub fn is_available(&self) -> bool {
        !self.is_closed() && self.status.borrow().as_ref().is_some_and(|s| s.available)
    }

    pub fn add_request(&self, request: ProviderRequest) {
        self.requests.lock().add_request(request);
    }

    pub fn has_request(&self, id: &Uuid) -> bool {
        self.requests.lock().has_request(id)
    }

    pub fn dispatch_next_request(&self) -> Option<ProviderRequest> {
        self.requests.lock().dispatch_next()
    }

    pub fn remove_request(&self, id: &Uuid) {
        self.requests.lock().remove_request(id);
    }

    pub fn add_response(&self, response: ProviderResponse) {
        self.requests.lock().add_response(response);
        self.responded.notify_waiters();
    }

    pub fn take_response(&self, id: &Uuid) -> Option<ProviderResponse> {
        self.requests.lock().take_response(id)
    }

    pub fn responded(&self) -> &Notify {
        &self.responded
    }

    pub fn events(&self) -> &broadcast::Sender<ProviderEvent> {
        &self.events
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Fails every pending and future request.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.responded.notify_waiters();
    }
}
