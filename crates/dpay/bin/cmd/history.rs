use crate::cmd::Page;
use chrono::Utc;
use dpay_config::Config;
use eyre::Result;

/// `dpay history`: connects and prints the transfer history.
pub async fn run(config: Config) -> Result<()> {
    if config.contract_address.is_none() {
        warn!("no payment contract configured, history will be empty");
    }
    let page = Page::connect(config).await?;
    anstream::println!("{}", page.dashboard.history().render(Utc::now()));
    page.close().await
}
