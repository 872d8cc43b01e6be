use std::collections::{HashMap, VecDeque};

use uuid::Uuid;

use crate::browser::types::{ProviderRequest, ProviderResponse};

/// Requests waiting on the page, and responses waiting on their caller.
///
/// A request is handed to the page once. It stays queued until its response arrives, so a
/// reloaded page can pick up requests that were in flight on the previous one.
#[derive(Debug, Default)]
pub(crate) struct RequestQueue {
    requests: VecDeque<(ProviderRequest, bool)>,
    responses: HashMap<Uuid, ProviderResponse>,
}

impl RequestQueue {
    pub fn add_request(&mut self, request: ProviderRequest) {
        self.requests.push_back((request, false));
    }

    pub fn has_request(&self, id: &Uuid) -> bool {
        self.requests.iter().any(|(req, _)| req.id == *id)
    }

    /// Returns the oldest request not yet handed to the page and marks it dispatched.
    pub fn dispatch_next(&mut self) -> Option<ProviderRequest> {
        let (request, dispatched) = self.requests.iter_mut().find(|(_, dispatched)| !dispatched)?;
        *dispatched = true;
        Some(request.clone())
    }

    /// Makes every queued request available to the page again.
    pub fn redispatch_all(&mut self) {
        for (_, dispatched) in &mut self.requests {
            *dispatched = false;
        }
    }

    pub fn remove_request(&mut self, id: &Uuid) {
        self.requests.retain(|(req, _)| req.id != *id);
    }

    /// Stores the response of a queued request, dropping the request.
    pub fn add_response(&mut self, response: ProviderResponse) {
        self.remove_request(&response.id);
        self.responses.insert(response.id, response);
    }

    /// Takes the response for `id`, if it has arrived.
    pub fn take_response(&mut self, id: &Uuid) -> Option<ProviderResponse> {
        self.responses.remove(id)
    }
}
