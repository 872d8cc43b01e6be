use crate::cmd::Page;
use chrono::Utc;
use dpay::{Dashboard, TransferForm};
use dpay_common::{AssetKind, NATIVE_SYMBOL, units::format_native_balance};
use dpay_config::Config;
use eyre::Result;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use yansi::Paint;

const HELP: &str = "\
Commands:
  connect                               connect the browser wallet
  disconnect                            forget the connected wallet
  send <recipient> <amount>             send ETH
  token <token> <recipient> <amount>    send ERC-20 tokens
  history                               show recent transfers
  status                                show the connected account
  balance                               show the payment contract balance
  help                                  show this message
  quit                                  end the session";

/// A parsed line of session input.
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Connect,
    Disconnect,
    Send { recipient: String, amount: String },
    Token { token: String, recipient: String, amount: String },
    History,
    Status,
    Balance,
    Help,
    Quit,
}

impl Command {
    fn parse(line: &str) -> Result<Option<Self>, String> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((&name, args)) = words.split_first() else { return Ok(None) };
        let cmd = match (name, args) {
            ("connect" | "c", []) => Self::Connect,
            ("disconnect" | "d", []) => Self::Disconnect,
            ("send" | "s", [recipient, amount]) => {
                Self::Send { recipient: recipient.to_string(), amount: amount.to_string() }
            }
            ("token" | "t", [token, recipient, amount]) => Self::Token {
                token: token.to_string(),
                recipient: recipient.to_string(),
                amount: amount.to_string(),
            },
            ("history" | "h", []) => Self::History,
            ("status", []) => Self::Status,
            ("balance" | "b", []) => Self::Balance,
            ("help" | "?", []) => Self::Help,
            ("quit" | "exit" | "q", []) => Self::Quit,
            _ => return Err(format!("unknown command `{}`, type `help`", line.trim())),
        };
        Ok(Some(cmd))
    }
}

/// `dpay session`: drives the page from stdin until `quit`, end of input or Ctrl-C.
pub async fn run(config: Config) -> Result<()> {
    let page = Page::open(config, true).await?;
    anstream::println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else { break };
        match Command::parse(&line) {
            Ok(Some(Command::Quit)) => break,
            Ok(Some(cmd)) => execute(&page.dashboard, cmd).await,
            Ok(None) => {}
            Err(err) => anstream::eprintln!("{}", err.red()),
        }
    }

    page.close().await
}

async fn execute(dashboard: &Arc<Dashboard>, cmd: Command) {
    match cmd {
        Command::Connect => {
            // Failures are already shown as notifications.
            let _ = dashboard.connect().await;
        }
        Command::Disconnect => dashboard.disconnect(),
        Command::Send { recipient, amount } => {
            spawn_transfer(dashboard, AssetKind::Native, TransferForm::native(recipient, amount))
        }
        Command::Token { token, recipient, amount } => spawn_transfer(
            dashboard,
            AssetKind::Token,
            TransferForm::token(token, recipient, amount),
        ),
        Command::History => {
            dashboard.refresh_history().await;
            anstream::println!("{}", dashboard.history().render(Utc::now()));
        }
        Command::Status => match dashboard.session() {
            Some(session) => anstream::println!(
                "{} on chain {}, balance {} {NATIVE_SYMBOL}",
                session.address,
                session.chain_id,
                session.display_balance()
            ),
            None => anstream::println!("Not connected"),
        },
        Command::Balance => match dashboard.contract_balance().await {
            Ok(balance) => {
                anstream::println!("Contract: {} {NATIVE_SYMBOL}", format_native_balance(balance))
            }
            Err(err) => anstream::eprintln!("{}", err.red()),
        },
        Command::Help => anstream::println!("{HELP}"),
        Command::Quit => {}
    }
}

/// Runs a transfer in the background so the prompt stays usable while it confirms.
fn spawn_transfer(dashboard: &Arc<Dashboard>, kind: AssetKind, form: TransferForm) {
    if dashboard.spawn_transfer(kind, form).is_none() {
        anstream::eprintln!("{}", format!("{kind} transfer already in progress").red());
    }
}
