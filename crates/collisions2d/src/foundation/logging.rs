//! Logging setup for binaries and tests

use log::LevelFilter;

/// Initialize the logging system
///
/// `RUST_LOG` takes precedence over `default_level` when set. Later calls
/// keep the logger installed by the first one.
pub fn init(default_level: LevelFilter) {
    let env = env_logger::Env::default().default_filter_or(default_level.as_str());
    if env_logger::Builder::from_env(env).try_init().is_err() {
        log::debug!("Logger already initialized");
    }
}

/// Initialize logging for unit and integration tests
///
/// Safe to call from every test; only the first call installs the logger.
pub fn init_for_tests() {
    let _ = env_logger::builder().is_test(true).try_init();
}
