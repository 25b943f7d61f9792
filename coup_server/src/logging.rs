//! Structured logging configuration.
//!
//! The engine logs through the `log` facade; the subscriber installed here
//! picks those records up alongside the server's own `tracing` events.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured logging
///
/// Log levels come from the RUST_LOG env var and default to `info`.
///
/// # Example
///
/// ```no_run
/// coup_server::logging::init();
/// tracing::info!("Server starting");
/// ```
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Replies go to stdout, so logs stay on stderr.
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Structured logging initialized");
}

/// Log a reply that only its requester sees: a refusal or a private view
pub fn log_private_reply(room: &str, username: &str) {
    tracing::debug!(room = room, username = username, "Private reply");
}

/// Log an input line that could not be parsed
pub fn log_unparsed_line(line: &str, reason: &str) {
    tracing::warn!(line = line, reason = reason, "Unparsed input line");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_helpers_do_not_panic() {
        log_private_reply("general", "alice");
        log_unparsed_line("general", "missing command");
    }
}
