use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs the global subscriber. `CADENCE_LOG` wins over `RUST_LOG`; events
/// go to stderr so stdout stays clean for tables and JSON.
pub fn init_cli_logger(verbose: bool) {
    let fallback = if verbose { "cadence=debug" } else { "cadence=warn" };
    let filter = EnvFilter::try_from_env("CADENCE_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();
}
