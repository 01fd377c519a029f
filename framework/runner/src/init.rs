use crate::cli::GaleScenarioCli;
use clap::Parser;
use env_logger::Env;

/// Initialise logging and the CLI for a scenario binary.
///
/// The log filter defaults to `info` so the resolved configuration and the
/// completion marker are visible without setting `RUST_LOG`.
pub fn init() -> GaleScenarioCli {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    GaleScenarioCli::parse()
}
