mod cli;
mod config;
mod context;
mod definition;
mod executor;
mod init;
mod monitor;
mod progress;
mod run;
mod shutdown;
mod types;

pub mod prelude {
    pub use crate::cli::BreezeScenarioCli;
    pub use crate::config::{RunConfig, DEFAULT_REQUEST_TIMEOUT};
    pub use crate::context::UserValuesConstraint;
    pub use crate::context::{AgentContext, RunnerContext};
    pub use crate::definition::{HookResult, ScenarioDefinitionBuilder, DEFAULT_BEHAVIOUR};
    pub use crate::executor::Executor;
    pub use crate::init::init;
    pub use crate::run::run;
    pub use crate::shutdown::{DelegatedShutdownListener, ShutdownSignalError};
    pub use crate::types::BreezeResult;

    pub use breeze_core::prelude::AgentBailError;
    pub use breeze_instruments::{CheckRecord, CheckTally, Reporter};
}
