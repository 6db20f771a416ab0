use std::path::PathBuf;
use std::time::Duration;

use breeze_core::prelude::parse_duration;
use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(about, long_about = None)]
pub struct BreezeScenarioCli {
    /// The base URL of the service to test, for example `http://127.0.0.1:10000`.
    ///
    /// Scenarios resolve their request paths against this URL. If not given, the scenario's
    /// default target is used.
    #[clap(short, long, env = "BREEZE_TARGET_URL")]
    pub target_url: Option<String>,

    /// The number of virtual users to run concurrently
    #[clap(long, env = "BREEZE_VUS")]
    pub vus: Option<usize>,

    /// Assign a behaviour to a number of virtual users. Specify the behaviour and count in the
    /// format `behaviour:count`. For example `--behaviour=hello:5`.
    ///
    /// Specifying the count is optional and will default to 1.
    ///
    /// You can specify multiple behaviours by using the flag multiple times.
    ///
    /// The total assigned must be less than or equal to the number of virtual users. Any remaining
    /// virtual users run the default behaviour.
    ///
    /// If the configuration is invalid then the scenario will fail to start.
    #[clap(long, short, value_parser = parse_agent_behaviour)]
    pub behaviour: Vec<(String, usize)>,

    /// How long to run the scenario for, for example `5m`, `30s` or `1h 30m`
    #[clap(long, env = "BREEZE_DURATION", value_parser = parse_duration)]
    pub duration: Option<Duration>,

    /// Run this test as a soak test, ignoring any configured duration and continuing to run until stopped
    #[clap(long, default_value = "false")]
    pub soak: bool,

    /// Think time to wait after each iteration, for example `10s`
    #[clap(long, env = "BREEZE_PACING", value_parser = parse_duration)]
    pub pacing: Option<Duration>,

    /// Disable pacing so that iterations run back to back
    ///
    /// Takes precedence over `--pacing` and `BREEZE_PACING`.
    #[clap(long, default_value = "false")]
    pub no_pacing: bool,

    /// How long to wait for a single request before counting it as failed
    #[clap(long, env = "BREEZE_REQUEST_TIMEOUT", value_parser = parse_duration)]
    pub request_timeout: Option<Duration>,

    /// Do not show a progress bar on the CLI.
    ///
    /// This is recommended for CI/CD environments where the progress bar isn't being looked at by anyone and is just adding noise to the logs.
    #[clap(long, default_value = "false")]
    pub no_progress: bool,

    /// Do not print the summary tables at the end of the run
    #[clap(long, default_value = "false")]
    pub no_summary: bool,

    /// Identifier for this run, generated if not given
    #[clap(long)]
    pub run_id: Option<String>,

    /// Append a JSON summary of the run to this file
    #[clap(long, env = "BREEZE_SUMMARY_PATH")]
    pub summary_path: Option<PathBuf>,
}

fn parse_agent_behaviour(s: &str) -> anyhow::Result<(String, usize)> {
    let mut parts = s.split(':');
    let name = parts
        .next()
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .ok_or(anyhow::anyhow!("No name specified for behaviour"))?;

    let count = match parts.next() {
        Some(count) => count
            .parse::<usize>()
            .map_err(|e| anyhow::anyhow!("Invalid count for behaviour [{name}]: {e}"))?,
        None => 1,
    };

    Ok((name, count))
}
