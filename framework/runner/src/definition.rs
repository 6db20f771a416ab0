use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::cli::BreezeScenarioCli;
use crate::config::{parse_target_url, RunConfig, DEFAULT_REQUEST_TIMEOUT};
use crate::context::{AgentContext, RunnerContext, UserValuesConstraint};
use crate::init::init;

pub type HookResult = anyhow::Result<()>;

pub type GlobalHookMut<RV> = fn(&mut RunnerContext<RV>) -> HookResult;
pub type GlobalHook<RV> = fn(Arc<RunnerContext<RV>>) -> HookResult;
pub type AgentHookMut<RV, V> = fn(&mut AgentContext<RV, V>) -> HookResult;

/// The name used for the behaviour registered with [ScenarioDefinitionBuilder::use_agent_behaviour].
pub const DEFAULT_BEHAVIOUR: &str = "default";

/// The builder for a scenario definition.
///
/// This must be used at the start of a scenario binary to define the workload that you want to
/// run. Values given on the command line take precedence over the defaults set here.
pub struct ScenarioDefinitionBuilder<RV: UserValuesConstraint, V: UserValuesConstraint> {
    /// The name of the scenario.
    ///
    /// Recommended value is `env!("CARGO_PKG_NAME")`.
    name: String,
    cli: BreezeScenarioCli,
    default_vus: Option<usize>,
    default_duration: Option<Duration>,
    default_pacing: Option<Duration>,
    default_target_url: Option<String>,
    default_request_timeout: Option<Duration>,
    /// Global setup hook for this scenario. It will be run once, before any agents are started.
    setup_fn: Option<GlobalHookMut<RV>>,
    /// Setup hook for an agent, which will be run once for each agent as it starts.
    ///
    /// All agents finish their setup before any of them start their behaviour.
    setup_agent_fn: Option<AgentHookMut<RV, V>>,
    /// The agent behaviours for this scenario, keyed by name.
    agent_behaviour: HashMap<String, AgentHookMut<RV, V>>,
    /// Teardown hook for an agent, run once per agent after it stops. Best effort.
    teardown_agent_fn: Option<AgentHookMut<RV, V>>,
    /// Global teardown hook, run once after every agent has stopped. Best effort.
    teardown_fn: Option<GlobalHook<RV>>,
}

/// A validated scenario, ready to be run.
pub struct ScenarioDefinition<RV: UserValuesConstraint, V: UserValuesConstraint> {
    pub name: String,
    pub config: RunConfig,
    pub assigned_behaviours: Vec<(String, usize)>,
    pub no_progress: bool,
    pub no_summary: bool,
    pub run_id: Option<String>,
    pub summary_path: Option<PathBuf>,
    pub setup_fn: Option<GlobalHookMut<RV>>,
    pub setup_agent_fn: Option<AgentHookMut<RV, V>>,
    pub agent_behaviour: HashMap<String, AgentHookMut<RV, V>>,
    pub teardown_agent_fn: Option<AgentHookMut<RV, V>>,
    pub teardown_fn: Option<GlobalHook<RV>>,
}

impl<RV: UserValuesConstraint, V: UserValuesConstraint> ScenarioDefinitionBuilder<RV, V> {
    /// Initialise a new scenario definition from the scenario name and parsed command line
    /// arguments.
    pub fn new(name: &str, cli: BreezeScenarioCli) -> Self {
        Self {
            name: name.to_string(),
            cli,
            default_vus: None,
            default_duration: None,
            default_pacing: None,
            default_target_url: None,
            default_request_timeout: None,
            setup_fn: None,
            setup_agent_fn: None,
            agent_behaviour: HashMap::new(),
            teardown_agent_fn: None,
            teardown_fn: None,
        }
    }

    /// Initialise logging, parse the command line and create a new scenario definition.
    pub fn new_with_init(name: &str) -> Self {
        Self::new(name, init())
    }

    /// The number of virtual users to run if `--vus` is not given.
    pub fn with_default_vus(mut self, vus: usize) -> Self {
        self.default_vus = Some(vus);
        self
    }

    /// How long to run for if `--duration` is not given.
    pub fn with_default_duration(mut self, duration: Duration) -> Self {
        self.default_duration = Some(duration);
        self
    }

    /// Same as [ScenarioDefinitionBuilder::with_default_duration] in whole seconds.
    pub fn with_default_duration_s(self, duration_s: u64) -> Self {
        self.with_default_duration(Duration::from_secs(duration_s))
    }

    /// Think time after each iteration if `--pacing` is not given. Disabled with `--no-pacing`.
    pub fn with_default_pacing(mut self, pacing: Duration) -> Self {
        self.default_pacing = Some(pacing);
        self
    }

    /// The base URL to send requests to if `--target-url` is not given.
    pub fn with_default_target_url(mut self, target_url: &str) -> Self {
        self.default_target_url = Some(target_url.to_string());
        self
    }

    /// Per request timeout if `--request-timeout` is not given.
    pub fn with_default_request_timeout(mut self, timeout: Duration) -> Self {
        self.default_request_timeout = Some(timeout);
        self
    }

    /// Set the global setup hook [ScenarioDefinitionBuilder::setup_fn] for this scenario.
    pub fn use_setup(mut self, setup_fn: GlobalHookMut<RV>) -> Self {
        self.setup_fn = Some(setup_fn);
        self
    }

    /// Set the agent setup hook [ScenarioDefinitionBuilder::setup_agent_fn] for this scenario.
    pub fn use_agent_setup(mut self, setup_agent_fn: AgentHookMut<RV, V>) -> Self {
        self.setup_agent_fn = Some(setup_agent_fn);
        self
    }

    /// Set the default agent behaviour, run by every agent that is not assigned a named behaviour.
    pub fn use_agent_behaviour(self, behaviour: AgentHookMut<RV, V>) -> Self {
        self.use_named_agent_behaviour(DEFAULT_BEHAVIOUR, behaviour)
    }

    /// Set a named agent behaviour. Agents are assigned to it with `--behaviour name:count`.
    pub fn use_named_agent_behaviour(mut self, name: &str, behaviour: AgentHookMut<RV, V>) -> Self {
        let previous = self.agent_behaviour.insert(name.to_string(), behaviour);

        if previous.is_some() {
            panic!("Behaviour [{}] is already defined", name);
        }

        self
    }

    /// Set the agent teardown hook [ScenarioDefinitionBuilder::teardown_agent_fn] for this scenario.
    pub fn use_agent_teardown(mut self, teardown_agent_fn: AgentHookMut<RV, V>) -> Self {
        self.teardown_agent_fn = Some(teardown_agent_fn);
        self
    }

    /// Set the global teardown hook [ScenarioDefinitionBuilder::teardown_fn] for this scenario.
    pub fn use_teardown(mut self, teardown_fn: GlobalHook<RV>) -> Self {
        self.teardown_fn = Some(teardown_fn);
        self
    }

    /// Merge command line values over the defaults and validate the result.
    pub(crate) fn build(self) -> anyhow::Result<ScenarioDefinition<RV, V>> {
        if self.agent_behaviour.is_empty() {
            anyhow::bail!("Scenario [{}] has no agent behaviour", self.name);
        }

        let assigned_total = self.cli.behaviour.iter().map(|(_, count)| count).sum::<usize>();
        for (name, _) in &self.cli.behaviour {
            if !self.agent_behaviour.contains_key(name) {
                anyhow::bail!("Behaviour [{name}] is assigned but not defined by the scenario");
            }
        }

        let concurrency = self
            .cli
            .vus
            .or(self.default_vus)
            .unwrap_or_else(|| assigned_total.max(1));
        if concurrency == 0 {
            anyhow::bail!("The number of virtual users must be at least 1");
        }
        if assigned_total > concurrency {
            anyhow::bail!(
                "{assigned_total} virtual users were assigned behaviours but only {concurrency} are configured"
            );
        }

        let mut assigned_behaviours = self.cli.behaviour.clone();
        let remaining = concurrency - assigned_total;
        if remaining > 0 {
            if !self.agent_behaviour.contains_key(DEFAULT_BEHAVIOUR) {
                anyhow::bail!(
                    "{remaining} virtual users have no assigned behaviour and the scenario has no default behaviour"
                );
            }
            assigned_behaviours.push((DEFAULT_BEHAVIOUR.to_string(), remaining));
        }

        let duration = if self.cli.soak {
            None
        } else {
            let duration = self
                .cli
                .duration
                .or(self.default_duration)
                .ok_or_else(|| anyhow::anyhow!("No duration configured, use --duration or --soak"))?;
            if duration.is_zero() {
                anyhow::bail!("The duration must be greater than zero");
            }
            Some(duration)
        };

        let pacing = if self.cli.no_pacing {
            None
        } else {
            self.cli.pacing.or(self.default_pacing)
        };
        if pacing.is_some_and(|p| p.is_zero()) {
            anyhow::bail!("The pacing must be greater than zero, use --no-pacing to disable it");
        }

        let target_url = self
            .cli
            .target_url
            .as_deref()
            .or(self.default_target_url.as_deref())
            .ok_or_else(|| anyhow::anyhow!("No target URL configured, use --target-url"))?;
        let target_url = parse_target_url(target_url)?;

        let request_timeout = self
            .cli
            .request_timeout
            .or(self.default_request_timeout)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT);
        if request_timeout.is_zero() {
            anyhow::bail!("The request timeout must be greater than zero");
        }

        Ok(ScenarioDefinition {
            name: self.name,
            config: RunConfig {
                concurrency,
                duration,
                pacing,
                target_url,
                request_timeout,
            },
            assigned_behaviours,
            no_progress: self.cli.no_progress,
            no_summary: self.cli.no_summary,
            run_id: self.cli.run_id,
            summary_path: self.cli.summary_path,
            setup_fn: self.setup_fn,
            setup_agent_fn: self.setup_agent_fn,
            agent_behaviour: self.agent_behaviour,
            teardown_agent_fn: self.teardown_agent_fn,
            teardown_fn: self.teardown_fn,
        })
    }
}

impl<RV: UserValuesConstraint, V: UserValuesConstraint> ScenarioDefinition<RV, V> {
    /// One behaviour name per virtual user, in the order the virtual users are started.
    pub(crate) fn assigned_behaviours_flat(&self) -> Vec<String> {
        self.assigned_behaviours
            .iter()
            .flat_map(|(name, count)| std::iter::repeat(name.clone()).take(*count))
            .collect()
    }
}
