mod check;
mod common;
mod context;
mod runner_context;

pub mod prelude {
    /// Common operations for HTTP scenarios.
    ///
    /// This is a good place to start if you are getting started writing scenarios.
    pub use crate::common::*;

    pub use crate::check::{Check, CheckPredicate};
    pub use crate::context::HttpAgentContext;
    pub use crate::runner_context::HttpRunnerContext;

    /// Re-export of the `breeze_runner` prelude.
    ///
    /// This is for convenience so that you can depend on a single crate for the runner in your scenarios.
    pub use breeze_runner::prelude::*;

    /// Re-export of the instrumented client for convenience.
    pub use http_client_instrumented::prelude::*;
}
