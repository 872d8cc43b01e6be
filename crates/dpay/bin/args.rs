use crate::cmd::{send::SendArgs, send_token::SendTokenArgs};
use alloy_primitives::Address;
use clap::{Parser, Subcommand};
use dpay_common::parse_address;
use dpay_config::{
    Config,
    figment::{
        Metadata, Profile, Provider,
        value::{Dict, Map, Value},
    },
};

/// Send ETH and tokens through a payment contract with your browser wallet.
#[derive(Parser)]
#[command(name = "dpay", version, next_display_order = None)]
pub struct Dpay {
    #[command(flatten)]
    pub bridge: BridgeArgs,

    #[command(subcommand)]
    pub cmd: DpaySubcommand,
}

#[derive(Subcommand)]
pub enum DpaySubcommand {
    /// Send ETH to a recipient through the payment contract.
    Send(SendArgs),

    /// Send ERC-20 tokens to a recipient through the payment contract.
    #[command(visible_alias = "st")]
    SendToken(SendTokenArgs),

    /// Show recent transfers of the connected account.
    #[command(visible_alias = "h")]
    History,

    /// Print the balances of the connected account and the payment contract.
    #[command(visible_alias = "b")]
    Balance,

    /// Start an interactive payment session.
    #[command(visible_alias = "i")]
    Session,
}

/// Options overriding the wallet bridge configuration.
#[derive(Clone, Debug, Default, Parser)]
#[command(next_help_heading = "Bridge options")]
pub struct BridgeArgs {
    /// Address of the payment contract.
    #[arg(long, global = true, value_name = "ADDRESS", value_parser = parse_contract)]
    pub contract: Option<Address>,

    /// Local port of the wallet bridge. `0` picks a free port.
    #[arg(long, global = true, value_name = "PORT")]
    pub port: Option<u16>,

    /// Print the bridge URL instead of opening it in the browser.
    #[arg(long, global = true)]
    pub no_browser: bool,
}

impl BridgeArgs {
    /// Loads the config with these options merged on top.
    pub fn load_config(&self) -> eyre::Result<Config> {
        Ok(Config::from_provider(Config::figment().merge(self))?)
    }
}

impl Provider for BridgeArgs {
    fn metadata(&self) -> Metadata {
        Metadata::named("Bridge Args Provider")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, dpay_config::figment::Error> {
        let mut dict = Dict::new();
        if let Some(contract) = self.contract {
            dict.insert("contract_address".to_string(), Value::from(contract.to_string()));
        }
        if let Some(port) = self.port {
            dict.insert("port".to_string(), Value::from(port));
        }
        if self.no_browser {
            dict.insert("open_browser".to_string(), Value::from(false));
        }
        Ok(Map::from([(Profile::Default, dict)]))
    }
}

fn parse_contract(s: &str) -> Result<Address, String> {
    parse_address(s).ok_or_else(|| format!("invalid address: {s}"))
}
