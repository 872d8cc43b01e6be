use std::{net::SocketAddr, sync::Arc, time::Duration};

use parking_lot::Mutex;
use serde_json::Value;
use tokio::{net::TcpListener, sync::oneshot};
use uuid::Uuid;

use crate::{
    browser::{
        router::build_router,
        state::BrowserWalletState,
        types::{ProviderRequest, ProviderStatus},
    },
    error::{BrowserWalletError, ProviderError},
    provider::ProviderEvent,
};

/// Local HTTP server bridging requests to a wallet injected into a browser page.
#[derive(Debug, Clone)]
pub struct BrowserWalletServer {
    port: u16,
    open_browser: bool,
    state: Arc<BrowserWalletState>,
    shutdown_tx: Arc<Mutex<Option<oneshot::Sender<()>>>>,
}

impl BrowserWalletServer {
    /// Creates a server for `port`. `0` binds an ephemeral port on [`start`](Self::start).
    pub fn new(port: u16, open_browser: bool) -> Self {
        Self {
            port,
            open_browser,
            state: BrowserWalletState::new(),
            shutdown_tx: Arc::new(Mutex::new(None)),
        }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn open_browser(&self) -> bool {
        self.open_browser
    }

    /// URL of the bridge page.
    pub fn url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    pub fn session_token(&self) -> &str {
        self.state.session_token()
    }

    pub fn is_running(&self) -> bool {
        self.shutdown_tx.lock().is_some()
    }

    /// Whether a page has attached and reported its wallet.
    pub fn is_attached(&self) -> bool {
        self.state.status().is_some()
    }

    pub fn provider_status(&self) -> Option<ProviderStatus> {
        self.state.status()
    }

    pub fn is_available(&self) -> bool {
        self.state.is_available()
    }

    /// Binds the listener, serves the bridge and optionally opens it in the system browser.
    pub async fn start(&mut self) -> Result<(), BrowserWalletError> {
        let addr = SocketAddr::from(([127, 0, 0, 1], self.port));
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| BrowserWalletError::Bind { port: self.port, source })?;
        self.port = listener
            .local_addr()
            .map_err(|source| BrowserWalletError::Bind { port: self.port, source })?
            .port();

        let router = build_router(self.state.clone());
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        *self.shutdown_tx.lock() = Some(shutdown_tx);

        tokio::spawn(async move {
            let server = axum::serve(listener, router).with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            });
            if let Err(err) = server.await {
                error!(%err, "browser bridge server failed");
            }
        });

        let url = self.url();
        info!(%url, "browser bridge listening");
        if self.open_browser
            && let Err(err) = open::that(&url)
        {
            warn!(%err, %url, "failed to open browser, open the URL manually");
        }

        Ok(())
    }

    /// Stops the server. Pending requests fail with [`ProviderError::Closed`].
    pub async fn stop(&self) -> Result<(), BrowserWalletError> {
        let tx = self.shutdown_tx.lock().take().ok_or(BrowserWalletError::NotRunning)?;
        self.state.close();
        let _ = tx.send(());
        debug!("browser bridge stopped");
        Ok(())
    }

    /// Waits until a page attaches to the bridge.
    pub async fn wait_for_page(
        &self,
        timeout: Duration,
    ) -> Result<ProviderStatus, BrowserWalletError> {
        let mut status = self.state.watch_status();
        let attached = tokio::time::timeout(timeout, status.wait_for(Option::is_some))
            .await
            .map_err(|_| BrowserWalletError::AttachTimeout(timeout))?
            .map_err(|err| BrowserWalletError::Server(err.to_string()))?
            .clone();
        attached.ok_or(BrowserWalletError::NotRunning)
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<ProviderEvent> {
        self.state.events().subscribe()
    }

    /// Queues `method` for the page and waits for the wallet's answer.
    ///
    /// There is no timeout: the call resolves when the wallet answers or the bridge stops.
    pub async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        if !self.state.is_available() {
            return Err(ProviderError::Unavailable);
        }

        let id = Uuid::new_v4();
        trace!(%id, method, "queueing provider request");
        self.state.add_request(ProviderRequest { id, method: method.to_string(), params });

        loop {
            let notified = self.state.responded().notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(response) = self.state.take_response(&id) {
                return match response.error {
                    Some(err) => {
                        debug!(
                            %id,
                            method,
                            code = err.code,
                            message = %err.message,
                            "wallet returned an error"
                        );
                        Err(err.into())
                    }
                    None => Ok(response.result.unwrap_or(Value::Null)),
                };
            }
            if self.state.is_closed() {
                self.state.remove_request(&id);
                return Err(ProviderError::Closed(method.to_string()));
            }

            notified.await;
        }
    }
}
