use tracing_subscriber::{EnvFilter, fmt};

/// Install the stderr subscriber.
///
/// `SPENDKIT_LOG` holds the filter directives, `-v` forces `debug` and
/// `SPENDKIT_LOG_JSON=1` switches to JSON lines.
pub fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("SPENDKIT_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let use_json = std::env::var("SPENDKIT_LOG_JSON")
        .map(|value| value == "1")
        .unwrap_or(false);

    if use_json {
        let _ = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .json()
            .with_writer(std::io::stderr)
            .try_init();
    } else {
        let _ = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .pretty()
            .with_writer(std::io::stderr)
            .try_init();
    }
}
