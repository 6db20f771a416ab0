use breeze_runner::prelude::UserValuesConstraint;

/// Scenario wide values for HTTP scenarios.
///
/// Empty because virtual users share nothing but the run configuration, which lives on the
/// [breeze_runner::prelude::RunnerContext] itself.
#[derive(Default, Debug)]
pub struct HttpRunnerContext {}

impl UserValuesConstraint for HttpRunnerContext {}
