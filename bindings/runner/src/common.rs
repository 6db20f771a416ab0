use anyhow::Context;
use breeze_runner::prelude::{
    AgentBailError, AgentContext, CheckRecord, HookResult, ShutdownSignalError,
};
use http_client_instrumented::prelude::{handle_http_err, HttpClient};

use crate::check::Check;
use crate::context::HttpAgentContext;
use crate::runner_context::HttpRunnerContext;

/// Agent setup hook that gives the virtual user its own HTTP client.
///
/// The client uses the run's request timeout and reports every request to the run's reporter.
pub fn configure_http_client(
    ctx: &mut AgentContext<HttpRunnerContext, HttpAgentContext>,
) -> HookResult {
    let request_timeout = ctx.runner_context().run_config().request_timeout;
    let reporter = ctx.runner_context().reporter();
    let client = HttpClient::new(request_timeout, reporter)
        .with_context(|| format!("Failed to create HTTP client for {}", ctx.agent_id()))?;

    ctx.get_mut().client = Some(client);

    Ok(())
}

/// Run one iteration: GET `path` from the target, evaluate `check` on the response and wait for
/// the configured pacing.
///
/// The check outcome is always recorded. A failed request counts as a failed check. The iteration
/// returns an error when the request or the check failed so that the runner can count it, the
/// error is never fatal to the run.
pub fn get_and_check(
    ctx: &mut AgentContext<HttpRunnerContext, HttpAgentContext>,
    path: &str,
    check: &Check,
) -> HookResult {
    let url = ctx
        .runner_context()
        .run_config()
        .resolve(path)
        .map_err(|e| AgentBailError::new(format!("Cannot resolve request path [{path}]: {e}")))?;
    let client = ctx
        .get()
        .client()
        .map_err(|e| AgentBailError::new(e.to_string()))?
        .clone();
    let reporter = ctx.runner_context().reporter();

    let result = ctx
        .runner_context()
        .executor()
        .execute_in_place(async move { client.get(url.as_str()).await.map_err(handle_http_err) });

    let outcome = match result {
        Err(e) if e.is::<ShutdownSignalError>() || e.is::<AgentBailError>() => return Err(e),
        Err(e) => {
            reporter.add_check(CheckRecord::new(check.name(), false));
            Err(e)
        }
        Ok(response) => {
            let passed = check.evaluate(&response);
            reporter.add_check(CheckRecord::new(check.name(), passed));
            if passed {
                Ok(())
            } else {
                log::trace!("Check [{}] failed for body {:?}", check.name(), response.text());
                Err(anyhow::anyhow!("Check [{}] failed", check.name()))
            }
        }
    };

    // Pacing applies whatever the outcome. Being cut short by shutdown does not change the
    // outcome of this iteration.
    if let Err(e) = ctx.pace() {
        if !e.is::<ShutdownSignalError>() {
            return Err(e);
        }
    }

    outcome
}
