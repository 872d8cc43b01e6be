use crate::cmd::Page;
use dpay_common::{NATIVE_SYMBOL, units::format_native_balance};
use dpay_config::Config;
use eyre::{OptionExt, Result};

/// `dpay balance`: prints the connected account's balance and the contract's balance.
pub async fn run(config: Config) -> Result<()> {
    let page = Page::connect(config).await?;
    let dashboard = &page.dashboard;
    let session = dashboard.session().ok_or_eyre("wallet disconnected")?;
    anstream::println!("Account:  {}", session.address);
    anstream::println!("Balance:  {} {NATIVE_SYMBOL}", session.display_balance());

    if dashboard.config().contract_address.is_some() {
        let balance = dashboard.contract_balance().await;
        page.close().await?;
        anstream::println!("Contract: {} {NATIVE_SYMBOL}", format_native_balance(balance?));
        return Ok(());
    }
    page.close().await
}
