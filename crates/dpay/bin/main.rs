//! The `dpay` command line.

#[macro_use]
extern crate tracing;

use args::{Dpay, DpaySubcommand};
use clap::Parser;
use eyre::Result;

mod args;
mod cmd;
mod handler;
mod utils;

fn main() {
    if let Err(err) = run() {
        anstream::eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    handler::install();
    utils::subscriber();
    utils::enable_paint();

    let args = Dpay::parse();
    main_args(args)
}

#[tokio::main]
async fn main_args(args: Dpay) -> Result<()> {
    let config = args.bridge.load_config()?;
    debug!(?config, "loaded config");
    match args.cmd {
        DpaySubcommand::Send(cmd) => cmd.run(config).await,
        DpaySubcommand::SendToken(cmd) => cmd.run(config).await,
        DpaySubcommand::History => cmd::history::run(config).await,
        DpaySubcommand::Balance => cmd::balance::run(config).await,
        DpaySubcommand::Session => cmd::session::run(config).await,
    }
}
