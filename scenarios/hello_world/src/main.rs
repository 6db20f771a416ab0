use http_breeze_runner::prelude::*;
use std::time::Duration;

const PATH: &str = "/hello";
const CHECK_NAME: &str = "Query successfully";
const EXPECTED_BODY: &str = "hello world!";

fn agent_behaviour(ctx: &mut AgentContext<HttpRunnerContext, HttpAgentContext>) -> HookResult {
    get_and_check(ctx, PATH, &Check::body_equals(CHECK_NAME, EXPECTED_BODY))
}

fn main() -> BreezeResult<()> {
    let builder =
        ScenarioDefinitionBuilder::<HttpRunnerContext, HttpAgentContext>::new_with_init(
            env!("CARGO_PKG_NAME"),
        )
        .with_default_target_url("http://127.0.0.1:10000")
        .with_default_vus(1000)
        .with_default_duration(Duration::from_secs(5 * 60))
        .with_default_pacing(Duration::from_secs(10))
        .use_agent_setup(configure_http_client)
        .use_agent_behaviour(agent_behaviour);

    run(builder)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn response(body: &'static str) -> HttpResponse {
        HttpResponse {
            status: 200,
            headers: HashMap::new(),
            body: Bytes::from_static(body.as_bytes()),
        }
    }

    #[test]
    fn check_matches_expected_body_only() {
        let check = Check::body_equals(CHECK_NAME, EXPECTED_BODY);
        assert!(check.evaluate(&response("hello world!")));
        assert!(!check.evaluate(&response("Hello world!")));
        assert!(!check.evaluate(&response("")));
    }
}
