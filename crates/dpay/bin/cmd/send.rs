use crate::cmd::Page;
use clap::Parser;
use dpay::TransferForm;
use dpay_config::Config;
use eyre::Result;

/// CLI arguments for `dpay send`.
#[derive(Clone, Debug, Parser)]
pub struct SendArgs {
    /// The recipient address.
    pub recipient: String,

    /// The amount of ETH to send, e.g. `0.1`.
    pub amount: String,
}

impl SendArgs {
    pub async fn run(self, config: Config) -> Result<()> {
        let page = Page::connect(config).await?;
        let dashboard = &page.dashboard;
        dashboard.native().set_form(TransferForm::native(self.recipient, self.amount));
        let outcome = dashboard.send_native().await;
        page.close().await?;

        let outcome = outcome?;
        if let Some(hash) = outcome.tx_hash {
            anstream::println!("{}", dashboard.config().tx_url(&hash));
        }
        Ok(())
    }
}
