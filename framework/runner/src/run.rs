use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Barrier};

use anyhow::Context;
use breeze_core::prelude::{format_duration, AgentBailError};
use breeze_instruments::ReportConfig;
use breeze_summary_model::{append_run_summary, CheckSummary, RunSummary};

use crate::monitor::start_monitor;
use crate::progress::start_progress;
use crate::{
    context::{AgentContext, RunnerContext, UserValuesConstraint},
    definition::{ScenarioDefinition, ScenarioDefinitionBuilder},
    executor::Executor,
    shutdown::{start_shutdown_listener, ShutdownHandle, ShutdownSignalError},
};

/// Counts shared by every agent thread.
#[derive(Default)]
struct IterationCounters {
    total: AtomicU64,
    failed: AtomicU64,
}

/// Validate the scenario definition and run it to completion.
///
/// Returns the number of virtual users that were still running when the scenario ended. Agents
/// that fail their setup or bail are not counted.
pub fn run<RV: UserValuesConstraint, V: UserValuesConstraint>(
    definition: ScenarioDefinitionBuilder<RV, V>,
) -> anyhow::Result<usize> {
    let definition = definition.build()?;

    log::info!(
        "Running scenario [{}] against {} with {} virtual users for {}",
        definition.name,
        definition.config.target_url,
        definition.config.concurrency,
        definition
            .config
            .duration
            .map(format_duration)
            .unwrap_or_else(|| "ever (soak)".to_string()),
    );

    let run_id = definition
        .run_id
        .clone()
        .unwrap_or_else(|| nanoid::nanoid!());
    let started_at = chrono::Utc::now().timestamp();

    let runtime = tokio::runtime::Runtime::new().context("Failed to create Tokio runtime")?;
    let shutdown_handle = ShutdownHandle::default();
    start_shutdown_listener(&runtime, shutdown_handle.clone());

    let executor = Arc::new(Executor::new(runtime, shutdown_handle.clone()));
    let mut report_config = ReportConfig::default();
    if !definition.no_summary {
        report_config = report_config.enable_summary();
    }
    let reporter = Arc::new(report_config.init());
    let mut runner_context = RunnerContext::new(
        executor,
        reporter.clone(),
        shutdown_handle.clone(),
        Arc::new(definition.config.clone()),
    );

    if let Some(setup_fn) = &definition.setup_fn {
        setup_fn(&mut runner_context)?;
    }

    // After the setup has run, and if this is a time bounded scenario, then we need to take additional actions
    if let Some(duration) = definition.config.duration {
        if !definition.no_progress {
            // If the scenario is time bounded then start the progress monitor to show the user how long is left
            start_progress(duration, shutdown_handle.new_listener());
        }

        // Set a timer to shut down the test after the duration has elapsed
        let shutdown_handle = shutdown_handle.clone();
        runner_context.executor().spawn(async move {
            tokio::time::sleep(duration).await;
            log::debug!("Scenario duration elapsed");
            shutdown_handle.shutdown();
        });
    }

    let runner_context = Arc::new(runner_context);

    // Ready to start spawning agents so start the resource monitor to report high usage by agents
    // which might lead to a misleading outcome.
    start_monitor(shutdown_handle.new_listener());

    let counters = Arc::new(IterationCounters::default());
    let assigned_behaviours = definition.assigned_behaviours_flat();
    let setup_barrier = Arc::new(Barrier::new(assigned_behaviours.len()));

    let mut handles = Vec::with_capacity(assigned_behaviours.len());
    for (agent_index, assigned_behaviour) in assigned_behaviours.iter().enumerate() {
        let runner_context = runner_context.clone();
        let counters = counters.clone();
        let setup_barrier = setup_barrier.clone();

        let setup_agent_fn = definition.setup_agent_fn;
        let agent_behaviour_fn = definition.agent_behaviour.get(assigned_behaviour).copied();
        let teardown_agent_fn = definition.teardown_agent_fn;

        // For us to check if the agent should shut down between iterations
        let mut cycle_shutdown_receiver = shutdown_handle.new_listener();
        // For the behaviour implementation to listen for shutdown and respond appropriately
        let delegated_shutdown_listener = shutdown_handle.new_listener();

        let agent_id = format!("agent-{}", agent_index);

        handles.push(
            std::thread::Builder::new()
                .name(agent_id.clone())
                .spawn(move || -> bool {
                    let mut context =
                        AgentContext::new(agent_id.clone(), runner_context, delegated_shutdown_listener);

                    // A panicking setup must still reach the barrier or every other agent waits forever.
                    let setup_result = match setup_agent_fn {
                        Some(setup_agent_fn) => std::panic::catch_unwind(AssertUnwindSafe(|| {
                            setup_agent_fn(&mut context)
                        }))
                        .unwrap_or_else(|panic| {
                            Err(anyhow::anyhow!(
                                "Agent setup panicked: {}",
                                panic_message(panic.as_ref())
                            ))
                        }),
                        None => Ok(()),
                    };

                    // Every agent finishes setup before any of them start iterating.
                    setup_barrier.wait();

                    if let Err(e) = setup_result {
                        log::error!("Agent setup failed for agent {}: {:?}", agent_id, e);
                        return false;
                    }

                    let mut ran_to_end = true;
                    if let Some(behaviour) = agent_behaviour_fn {
                        loop {
                            if cycle_shutdown_receiver.should_shutdown() {
                                log::debug!("Stopping agent {}", agent_id);
                                break;
                            }

                            match behaviour(&mut context) {
                                Ok(()) => {
                                    counters.total.fetch_add(1, Ordering::Relaxed);
                                }
                                Err(e) if e.is::<ShutdownSignalError>() => {
                                    // Expected if the agent is being shutdown mid iteration. The
                                    // check at the top of the loop will catch this and break out.
                                }
                                Err(e) if e.is::<AgentBailError>() => {
                                    log::warn!("Agent {} is bailing: {}", agent_id, e);
                                    ran_to_end = false;
                                    break;
                                }
                                Err(e) => {
                                    counters.total.fetch_add(1, Ordering::Relaxed);
                                    counters.failed.fetch_add(1, Ordering::Relaxed);
                                    log::debug!("Agent {} iteration failed: {:?}", agent_id, e);
                                }
                            }
                        }
                    }

                    if let Some(teardown_agent_fn) = teardown_agent_fn {
                        if let Err(e) = teardown_agent_fn(&mut context) {
                            log::error!("Agent teardown failed for agent {}: {:?}", agent_id, e);
                        }
                    }

                    ran_to_end
                })
                .context("Failed to spawn thread for virtual user")?,
        );
    }

    let mut vu_end_count = 0;
    for handle in handles {
        let ran_to_end = handle
            .join()
            .map_err(|e| anyhow::anyhow!("Error joining thread for virtual user: {:?}", e))?;
        if ran_to_end {
            vu_end_count += 1;
        }
    }

    // Make sure the helper threads stop, even if all agents bailed before the duration elapsed.
    shutdown_handle.shutdown();

    if let Some(teardown_fn) = definition.teardown_fn {
        // Don't crash the runner if the teardown fails. We still want the reporting and runner
        // shutdown to happen cleanly. The hook is documented as 'best effort'
        if let Err(e) = teardown_fn(runner_context.clone()) {
            log::error!("Teardown failed: {:?}", e);
        }
    }

    let iterations = counters.total.load(Ordering::Relaxed);
    let failed_iterations = counters.failed.load(Ordering::Relaxed);
    log::info!(
        "Scenario [{}] finished: {} iterations, {} failed, {}/{} virtual users ran to the end",
        definition.name,
        iterations,
        failed_iterations,
        vu_end_count,
        definition.config.concurrency,
    );

    reporter.finalize();

    if let Some(summary_path) = &definition.summary_path {
        let mut summary = build_run_summary(&definition, run_id, started_at);
        summary.set_vu_end_count(vu_end_count);
        summary.set_iterations(iterations, failed_iterations);
        for (name, tally) in reporter.check_tallies() {
            summary.add_check(
                name,
                CheckSummary {
                    passed: tally.passed,
                    failed: tally.failed,
                },
            );
        }

        append_run_summary(&summary, summary_path).with_context(|| {
            format!("Failed to write run summary to {}", summary_path.display())
        })?;
        log::info!("Run summary {} written to {}", summary.fingerprint(), summary_path.display());
    }

    Ok(vu_end_count)
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}

fn build_run_summary<RV: UserValuesConstraint, V: UserValuesConstraint>(
    definition: &ScenarioDefinition<RV, V>,
    run_id: String,
    started_at: i64,
) -> RunSummary {
    let mut assigned_behaviours = HashMap::new();
    for (name, count) in &definition.assigned_behaviours {
        *assigned_behaviours.entry(name.clone()).or_insert(0) += count;
    }

    let mut summary = RunSummary::new(
        run_id,
        definition.name.clone(),
        definition.config.target_url.to_string(),
        started_at,
        definition.config.duration.map(|d| d.as_millis() as u64),
        definition.config.pacing.map(|p| p.as_millis() as u64),
        definition.config.concurrency,
        assigned_behaviours,
        env!("CARGO_PKG_VERSION").to_string(),
    );

    for (key, value) in std::env::vars().filter(|(key, _)| key.starts_with("BREEZE_")) {
        summary.add_env(key, value);
    }

    summary
}
