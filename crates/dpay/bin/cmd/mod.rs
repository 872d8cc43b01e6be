//! Subcommands of the `dpay` binary.

use crate::utils::ShellNotifier;
use dpay::Dashboard;
use dpay_config::Config;
use dpay_wallets::{BrowserProvider, BrowserWalletServer};
use eyre::{Result, WrapErr};
use std::sync::Arc;

pub mod balance;
pub mod history;
pub mod send;
pub mod send_token;
pub mod session;

/// A dashboard over a running wallet bridge.
pub struct Page {
    pub dashboard: Arc<Dashboard>,
    provider: BrowserProvider,
}

impl Page {
    /// Starts the wallet bridge and waits for the page to attach.
    ///
    /// With `interactive` set, failures are printed as they happen; otherwise they are left to
    /// the command's result.
    pub async fn open(config: Config, interactive: bool) -> Result<Self> {
        let mut server = BrowserWalletServer::new(config.port, config.open_browser);
        server.start().await?;
        anstream::println!("Wallet bridge running at {} for {}", server.url(), config.chain());
        if !config.open_browser {
            anstream::println!("Open it in a browser with your wallet extension to continue.");
        }

        let status = server.wait_for_page(config.attach_timeout()).await?;
        if !status.available {
            warn!("bridge page reported no injected wallet");
        }

        let provider = BrowserProvider::new(server);
        let notifier = Arc::new(ShellNotifier { errors: interactive });
        let dashboard = Arc::new(Dashboard::new(config, Arc::new(provider.clone()), notifier));
        dashboard.spawn_event_listener();
        Ok(Self { dashboard, provider })
    }

    /// Opens the page and connects the wallet.
    pub async fn connect(config: Config) -> Result<Self> {
        let page = Self::open(config, false).await?;
        if let Err(err) = page.dashboard.connect().await {
            page.close().await?;
            return Err(err).wrap_err("failed to connect wallet");
        }
        Ok(page)
    }

    pub async fn close(&self) -> Result<()> {
        Ok(self.provider.shutdown().await?)
    }
}
