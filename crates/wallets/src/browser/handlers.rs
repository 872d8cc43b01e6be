use std::sync::Arc;

use axum::{Json, extract::State, response::Html};

use crate::{
    browser::{
        app,
        state::BrowserWalletState,
        types::{BridgeEvent, BrowserApiResponse, ProviderRequest, ProviderResponse, ProviderStatus},
    },
    provider::ProviderEvent,
};

pub(crate) async fn serve_index(State(state): State<Arc<BrowserWalletState>>) -> Html<String> {
    Html(app::render_index(state.session_token()))
}

pub(crate) async fn post_provider_status(
    State(state): State<Arc<BrowserWalletState>>,
    Json(status): Json<ProviderStatus>,
) -> Json<BrowserApiResponse> {
    info!(available = status.available, wallet = ?status.wallet_name, "bridge page attached");
    state.set_status(status);
    Json(BrowserApiResponse::ok())
}

pub(crate) async fn get_next_request(
    State(state): State<Arc<BrowserWalletState>>,
) -> Json<BrowserApiResponse<ProviderRequest>> {
    match state.dispatch_next_request() {
        Some(request) => {
            trace!(id = %request.id, method = %request.method, "dispatching request to page");
            Json(BrowserApiResponse::Ok(request))
        }
        None => Json(BrowserApiResponse::error("No pending request")),
    }
}

pub(crate) async fn post_response(
    State(state): State<Arc<BrowserWalletState>>,
    Json(response): Json<ProviderResponse>,
) -> Json<BrowserApiResponse> {
    if !state.has_request(&response.id) {
        return Json(BrowserApiResponse::error("Unknown request id"));
    }
    state.add_response(response);
    Json(BrowserApiResponse::ok())
}

pub(crate) async fn post_event(
    State(state): State<Arc<BrowserWalletState>>,
    Json(event): Json<BridgeEvent>,
) -> Json<BrowserApiResponse> {
    let event = ProviderEvent::from(event);
    debug!(?event, "wallet notification");
    let _ = state.events().send(event);
    Json(BrowserApiResponse::ok())
}
