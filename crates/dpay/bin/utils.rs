use dpay::{Notification, Notifier};
use tracing_subscriber::EnvFilter;
use yansi::Paint;

/// Initializes a tracing subscriber filtered by `RUST_LOG`, writing to stderr.
pub fn subscriber() {
    tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
}

/// Enables colored output when the terminal supports it.
pub fn enable_paint() {
    let enable = yansi::Condition::os_support() && yansi::Condition::tty_and_color_live();
    yansi::whenever(yansi::Condition::cached(enable));
}

/// Prints notifications to the terminal.
#[derive(Clone, Copy, Debug)]
pub struct ShellNotifier {
    /// Whether failures are printed. One-shot commands report them as the command error instead.
    pub errors: bool,
}

impl Notifier for ShellNotifier {
    fn notify(&self, notification: Notification) {
        let Notification { title, description, .. } = &notification;
        if notification.is_error() {
            if self.errors {
                anstream::eprintln!("{} {description}", title.red().bold());
            }
        } else {
            anstream::println!("{} {description}", title.green().bold());
        }
    }
}
