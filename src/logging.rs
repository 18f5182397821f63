//! Tracing subscriber setup for the host binary.
//!
//! `RUST_LOG` picks the filter (default `info`). `TWINCHAIN_LOG_JSON=1`
//! switches to JSON lines for log shippers.

use tracing_subscriber::{fmt, EnvFilter};

pub const LOG_JSON_ENV: &str = "TWINCHAIN_LOG_JSON";

pub fn init_logging() {
    init_logging_with("info");
}

pub fn init_logging_with(default_filter: &str) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let use_json = std::env::var(LOG_JSON_ENV)
        .map(|value| value == "1")
        .unwrap_or(false);

    // try_init: a second call (tests, embedding hosts) keeps the first subscriber.
    if use_json {
        let _ = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .json()
            .with_writer(std::io::stderr)
            .try_init();
    } else {
        let _ = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init();
    }
}
