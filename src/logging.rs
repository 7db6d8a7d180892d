use std::sync::Once;

use tracing_subscriber::{EnvFilter, fmt};

static TRACING_INIT: Once = Once::new();

/// Install the global subscriber. Logs go to stderr so command output stays clean.
///
/// The filter comes from `RECURRA_LOG`, then `RUST_LOG`; without either, `recurra` logs at
/// `info`, or `debug` when `verbose` is set.
pub fn init_tracing(verbose: bool) {
    TRACING_INIT.call_once(|| {
        let default = if verbose { "recurra=debug" } else { "recurra=info" };
        let filter = EnvFilter::try_from_env("RECURRA_LOG")
            .or_else(|_| EnvFilter::try_from_default_env())
            .unwrap_or_else(|_| EnvFilter::new(default));

        let _ = fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    });
}
