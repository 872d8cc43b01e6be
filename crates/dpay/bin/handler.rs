use dpay::{Notification, TransferError};
use dpay_common::errors::dedup_chain_with;
use dpay_wallets::WalletError;
use eyre::EyreHandler;
use itertools::Itertools;
use std::{error::Error, fmt};

/// Reports errors through `eyre`, showing transfer and wallet failures with the same title and
/// description the page notifies them with.
pub struct Handler {
    debug_handler: Option<Box<dyn EyreHandler>>,
}

impl Default for Handler {
    fn default() -> Self {
        Self::new()
    }
}

impl Handler {
    /// Create a new instance of the `Handler`.
    pub fn new() -> Self {
        Self { debug_handler: None }
    }

    /// Override the debug handler with a custom one.
    pub fn debug_handler(mut self, debug_handler: Option<Box<dyn EyreHandler>>) -> Self {
        self.debug_handler = debug_handler;
        self
    }
}

impl EyreHandler for Handler {
    fn display(&self, error: &(dyn Error + 'static), f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use fmt::Display;
        causes(error).into_iter().format("; ").fmt(f)
    }

    fn debug(&self, error: &(dyn Error + 'static), f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(debug_handler) = &self.debug_handler {
            return debug_handler.debug(error, f);
        }

        if f.alternate() {
            return fmt::Debug::fmt(error, f);
        }
        let errors = causes(error);
        let Some((error, sources)) = errors.split_first() else { return Ok(()) };
        write!(f, "{error}")?;

        if !sources.is_empty() {
            write!(f, "\n\nContext:")?;

            let multiple = sources.len() > 1;
            for (n, error) in sources.iter().enumerate() {
                writeln!(f)?;
                if multiple {
                    write!(f, "- Error #{n}: {error}")?;
                } else {
                    write!(f, "- {error}")?;
                }
            }
        }

        Ok(())
    }

    fn track_caller(&mut self, location: &'static std::panic::Location<'static>) {
        if let Some(debug_handler) = &mut self.debug_handler {
            debug_handler.track_caller(location);
        }
    }
}

fn causes(error: &(dyn Error + 'static)) -> Vec<String> {
    dedup_chain_with(error, render)
}

fn render(cause: &(dyn Error + 'static)) -> String {
    if let Some(err) = cause.downcast_ref::<TransferError>() {
        return match err {
            TransferError::SubmissionFailed { hash: Some(hash), .. } => {
                format!("{} (tx {hash})", err.notification())
            }
            err => err.notification().to_string(),
        };
    }
    match cause.downcast_ref::<WalletError>().and_then(Notification::for_wallet_error) {
        Some(notification) => notification.to_string(),
        None => cause.to_string(),
    }
}

/// Installs the dpay [`eyre`] and [`panic`](mod@std::panic) hooks as the global ones.
///
/// A short user-centric handler is installed unless `DPAY_DEBUG` is set, in which case the
/// `color-eyre` report with span traces is used instead. Panics always get the verbose report.
pub fn install() {
    if std::env::var_os("RUST_BACKTRACE").is_none() {
        unsafe {
            std::env::set_var("RUST_BACKTRACE", "1");
        }
    }

    let (panic_hook, debug_hook) = color_eyre::config::HookBuilder::default()
        .panic_section("This is a bug. Please report it with the output above.")
        .into_hooks();
    panic_hook.install();
    let debug_hook = debug_hook.into_eyre_hook();
    let debug = std::env::var_os("DPAY_DEBUG").is_some();
    if let Err(e) = eyre::set_hook(Box::new(move |e| {
        Box::new(Handler::new().debug_handler(debug.then(|| debug_hook(e))))
    })) {
        debug!("failed to install eyre error hook: {e}");
    }
}
