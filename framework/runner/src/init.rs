use crate::cli::BreezeScenarioCli;
use clap::Parser;

/// Initialise the CLI and logging for the Breeze runner.
pub fn init() -> BreezeScenarioCli {
    env_logger::init();

    BreezeScenarioCli::parse()
}
