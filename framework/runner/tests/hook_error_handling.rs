use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use breeze_runner::prelude::{
    run, AgentBailError, AgentContext, BreezeScenarioCli, HookResult, RunnerContext,
    ScenarioDefinitionBuilder, UserValuesConstraint,
};
use breeze_summary_model::load_summary_runs;

#[derive(Default, Debug)]
struct RunnerContextValue {}

impl UserValuesConstraint for RunnerContextValue {}

#[derive(Default, Debug)]
struct AgentContextValue {
    value: i32,
}

impl UserValuesConstraint for AgentContextValue {}

fn sample_cli_cfg() -> BreezeScenarioCli {
    BreezeScenarioCli {
        target_url: Some("http://127.0.0.1:10000".to_string()),
        vus: None,
        behaviour: vec![],
        duration: None,
        soak: false,
        pacing: None,
        no_pacing: false,
        request_timeout: None,
        no_progress: true,
        no_summary: true,
        run_id: None,
        summary_path: None,
    }
}

fn noop_behaviour(_ctx: &mut AgentContext<RunnerContextValue, AgentContextValue>) -> HookResult {
    Ok(())
}

#[test]
fn propagate_error_in_setup_hook() {
    fn setup(_ctx: &mut RunnerContext<RunnerContextValue>) -> HookResult {
        Err(anyhow::anyhow!("Error in setup hook"))
    }

    let scenario = ScenarioDefinitionBuilder::<RunnerContextValue, AgentContextValue>::new(
        "propagate_error_in_setup_hook",
        sample_cli_cfg(),
    )
    .with_default_duration_s(5)
    .use_setup(setup)
    .use_agent_behaviour(noop_behaviour);

    let result = run(scenario);

    assert!(result.is_err());
    assert_eq!(result.unwrap_err().to_string(), "Error in setup hook");
}

#[test]
fn invalid_config_fails_before_setup() {
    static SETUP_RAN: AtomicBool = AtomicBool::new(false);

    fn setup(_ctx: &mut RunnerContext<RunnerContextValue>) -> HookResult {
        SETUP_RAN.store(true, Ordering::SeqCst);
        Ok(())
    }

    let mut cfg = sample_cli_cfg();
    cfg.vus = Some(0);
    let scenario = ScenarioDefinitionBuilder::<RunnerContextValue, AgentContextValue>::new(
        "invalid_config_fails_before_setup",
        cfg,
    )
    .with_default_duration_s(5)
    .use_setup(setup)
    .use_agent_behaviour(noop_behaviour);

    let result = run(scenario);

    assert!(result.is_err());
    assert!(!SETUP_RAN.load(Ordering::SeqCst));
}

#[test]
fn capture_error_in_agent_setup() {
    fn agent_setup(_ctx: &mut AgentContext<RunnerContextValue, AgentContextValue>) -> HookResult {
        Err(anyhow::anyhow!("Error in agent setup hook"))
    }

    let scenario = ScenarioDefinitionBuilder::<RunnerContextValue, AgentContextValue>::new(
        "capture_error_in_agent_setup",
        sample_cli_cfg(),
    )
    .with_default_duration_s(5)
    .use_agent_setup(agent_setup)
    .use_agent_behaviour(noop_behaviour);

    let result = run(scenario);

    assert!(result.is_ok());
    assert_eq!(0, result.unwrap());
}

#[test]
fn capture_panic_in_agent_setup() {
    fn agent_setup(ctx: &mut AgentContext<RunnerContextValue, AgentContextValue>) -> HookResult {
        if ctx.agent_id() == "agent-0" {
            panic!("Panic in agent setup hook");
        }
        Ok(())
    }

    let mut cfg = sample_cli_cfg();
    cfg.vus = Some(2);
    let scenario = ScenarioDefinitionBuilder::<RunnerContextValue, AgentContextValue>::new(
        "capture_panic_in_agent_setup",
        cfg,
    )
    .with_default_duration_s(1)
    .use_agent_setup(agent_setup)
    .use_agent_behaviour(noop_behaviour);

    let started = Instant::now();
    let result = run(scenario);

    assert_eq!(1, result.unwrap());
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[test]
fn record_sub_second_duration() {
    let dir = tempfile::tempdir().unwrap();
    let summary_path = dir.path().join("run_summary.jsonl");

    let mut cfg = sample_cli_cfg();
    cfg.duration = Some(Duration::from_millis(250));
    cfg.summary_path = Some(summary_path.clone());
    let scenario = ScenarioDefinitionBuilder::<RunnerContextValue, AgentContextValue>::new(
        "record_sub_second_duration",
        cfg,
    )
    .use_agent_behaviour(noop_behaviour);

    run(scenario).unwrap();

    let runs = load_summary_runs(&summary_path).unwrap();
    assert_eq!(Some(250), runs[0].run_duration_ms);
}

#[test]
fn capture_error_in_agent_behaviour_and_continue() {
    fn agent_behaviour(
        ctx: &mut AgentContext<RunnerContextValue, AgentContextValue>,
    ) -> HookResult {
        if ctx.get().value < 5 {
            ctx.get_mut().value += 1;
        } else {
            // Save time running this test by shutting down once this has run a few times.
            ctx.runner_context().force_stop_scenario();
        }

        Err(anyhow::anyhow!("Error in agent behaviour hook"))
    }

    let scenario = ScenarioDefinitionBuilder::<RunnerContextValue, AgentContextValue>::new(
        "capture_error_in_agent_behaviour_and_continue",
        sample_cli_cfg(),
    )
    .with_default_duration_s(5)
    .use_agent_behaviour(agent_behaviour);

    let result = run(scenario);

    assert!(result.is_ok());
    assert_eq!(1, result.unwrap());
}

#[test]
fn bail_error_stops_agent_behaviour() {
    fn agent_behaviour_1(
        _ctx: &mut AgentContext<RunnerContextValue, AgentContextValue>,
    ) -> HookResult {
        Err(AgentBailError::default().into())
    }

    let mut cfg = sample_cli_cfg();
    cfg.vus = Some(2);
    cfg.behaviour = vec![("bail".to_string(), 1), ("continue".to_string(), 1)];
    let scenario = ScenarioDefinitionBuilder::<RunnerContextValue, AgentContextValue>::new(
        "bail_error_stops_agent_behaviour",
        cfg,
    )
    .with_default_duration_s(1)
    .use_named_agent_behaviour("bail", agent_behaviour_1)
    .use_named_agent_behaviour("continue", noop_behaviour);

    let result = run(scenario);

    assert!(result.is_ok());
    assert_eq!(1, result.unwrap());
}

#[test]
fn capture_error_in_agent_teardown() {
    fn agent_teardown(
        _ctx: &mut AgentContext<RunnerContextValue, AgentContextValue>,
    ) -> HookResult {
        Err(anyhow::anyhow!("Error in agent teardown hook"))
    }

    let scenario = ScenarioDefinitionBuilder::<RunnerContextValue, AgentContextValue>::new(
        "capture_error_in_agent_teardown",
        sample_cli_cfg(),
    )
    .with_default_duration_s(1)
    .use_agent_behaviour(noop_behaviour)
    .use_agent_teardown(agent_teardown);

    let result = run(scenario);

    assert!(result.is_ok());
}

#[test]
fn capture_error_in_teardown() {
    fn teardown(_ctx: Arc<RunnerContext<RunnerContextValue>>) -> HookResult {
        Err(anyhow::anyhow!("Error in teardown hook"))
    }

    let scenario = ScenarioDefinitionBuilder::<RunnerContextValue, AgentContextValue>::new(
        "capture_error_in_teardown",
        sample_cli_cfg(),
    )
    .with_default_duration_s(1)
    .use_agent_behaviour(noop_behaviour)
    .use_teardown(teardown);

    let result = run(scenario);

    assert!(result.is_ok());
}

#[test]
fn pacing_is_cut_short_at_the_deadline() {
    fn paced_behaviour(
        ctx: &mut AgentContext<RunnerContextValue, AgentContextValue>,
    ) -> HookResult {
        ctx.pace()
    }

    let mut cfg = sample_cli_cfg();
    cfg.vus = Some(3);
    let scenario = ScenarioDefinitionBuilder::<RunnerContextValue, AgentContextValue>::new(
        "pacing_is_cut_short_at_the_deadline",
        cfg,
    )
    .with_default_duration_s(1)
    .with_default_pacing(Duration::from_secs(30))
    .use_agent_behaviour(paced_behaviour);

    let started = Instant::now();
    let result = run(scenario);

    assert_eq!(3, result.unwrap());
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[test]
fn write_run_summary() {
    fn failing_behaviour(
        _ctx: &mut AgentContext<RunnerContextValue, AgentContextValue>,
    ) -> HookResult {
        std::thread::sleep(Duration::from_millis(10));
        Err(anyhow::anyhow!("always fails"))
    }

    let dir = tempfile::tempdir().unwrap();
    let summary_path = dir.path().join("run_summary.jsonl");

    let mut cfg = sample_cli_cfg();
    cfg.vus = Some(2);
    cfg.run_id = Some("test-run".to_string());
    cfg.summary_path = Some(summary_path.clone());
    let scenario = ScenarioDefinitionBuilder::<RunnerContextValue, AgentContextValue>::new(
        "write_run_summary",
        cfg,
    )
    .with_default_duration_s(1)
    .use_agent_behaviour(failing_behaviour);

    run(scenario).unwrap();

    let runs = load_summary_runs(&summary_path).unwrap();
    assert_eq!(1, runs.len());
    let summary = &runs[0];
    assert_eq!("test-run", summary.run_id);
    assert_eq!("write_run_summary", summary.scenario_name);
    assert_eq!(Some(1000), summary.run_duration_ms);
    assert_eq!(2, summary.vu_count);
    assert_eq!(2, summary.vu_end_count);
    assert!(summary.iterations > 0);
    assert_eq!(summary.iterations, summary.failed_iterations);
    assert_eq!(Some(&2), summary.assigned_behaviours.get("default"));
}
