use http_breeze_runner::prelude::*;
use std::time::Duration;

const PATH: &str = "/api/user/1";
const CHECK_NAME: &str = "Query ads successfully";
const EXPECTED_BODY: &str = "测试";

fn agent_behaviour(ctx: &mut AgentContext<HttpRunnerContext, HttpAgentContext>) -> HookResult {
    get_and_check(ctx, PATH, &Check::body_equals(CHECK_NAME, EXPECTED_BODY))
}

fn main() -> BreezeResult<()> {
    // No pacing by default, iterations run back to back. Use `--pacing 1s` to add think time.
    let builder =
        ScenarioDefinitionBuilder::<HttpRunnerContext, HttpAgentContext>::new_with_init(
            env!("CARGO_PKG_NAME"),
        )
        .with_default_target_url("http://127.0.0.1:10000")
        .with_default_vus(1000)
        .with_default_duration(Duration::from_secs(5 * 60))
        .use_agent_setup(configure_http_client)
        .use_agent_behaviour(agent_behaviour);

    run(builder)?;

    Ok(())
}
