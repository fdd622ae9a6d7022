use is_terminal::IsTerminal;
use std::io;
use tracing_subscriber::{fmt, EnvFilter};

/// Default filter for a `-v` count; `RUST_LOG` always wins when set.
pub fn default_directive(verbosity: u8, quiet: bool) -> &'static str {
    match (quiet, verbosity) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    }
}

/// Install the global stderr subscriber.
///
/// ANSI colors are used only when stderr is a terminal and `NO_COLOR` is unset.
/// Calling this twice is harmless; the second subscriber is discarded.
pub fn init_logging(verbosity: u8, quiet: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity, quiet)));
    let ansi = io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none();

    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(ansi)
        .with_target(false)
        .try_init();
}
