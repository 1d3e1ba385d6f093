//! Logging initialization utilities.

use env_logger::Env;

/// Initialize logging with a default filter level.
///
/// `RUST_LOG` overrides the default. `verbose` lowers the crate's own filter to `debug`.
pub fn init(verbose: bool) {
    let default_filter = if verbose { "info,estate=debug" } else { "info" };
    let env = Env::default().default_filter_or(default_filter);
    let _ = env_logger::Builder::from_env(env)
        .format_target(verbose)
        .try_init();
}
