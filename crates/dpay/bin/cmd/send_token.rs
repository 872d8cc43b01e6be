use crate::cmd::Page;
use clap::Parser;
use dpay::TransferForm;
use dpay_config::Config;
use eyre::Result;

/// CLI arguments for `dpay send-token`.
#[derive(Clone, Debug, Parser)]
pub struct SendTokenArgs {
    /// The token contract address.
    pub token: String,

    /// The recipient address.
    pub recipient: String,

    /// The amount of tokens to send, in whole tokens.
    pub amount: String,

    /// Decimals of the token. Read from the token contract when omitted.
    #[arg(long)]
    pub decimals: Option<u8>,
}

impl SendTokenArgs {
    pub async fn run(self, mut config: Config) -> Result<()> {
        if self.decimals.is_some() {
            config.token_decimals = self.decimals;
        }
        let page = Page::connect(config).await?;
        let dashboard = &page.dashboard;
        dashboard.token().set_form(TransferForm::token(self.token, self.recipient, self.amount));
        let outcome = dashboard.send_token().await;
        page.close().await?;

        let outcome = outcome?;
        if let Some(hash) = outcome.tx_hash {
            anstream::println!("{}", dashboard.config().tx_url(&hash));
        }
        Ok(())
    }
}
