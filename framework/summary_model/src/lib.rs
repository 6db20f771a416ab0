use itertools::Itertools;
use serde::{Deserialize, Serialize};
use sha3::Digest;
use std::collections::{BTreeMap, HashMap};
use std::io::{BufRead, Read, Write};
use std::path::Path;

/// Pass and fail counts of one named check over a whole run
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckSummary {
    pub passed: u64,
    pub failed: u64,
}

/// Summary of a run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunSummary {
    /// The unique run id
    ///
    /// Chosen by the runner unless given on the command line.
    pub run_id: String,
    /// The name of the scenario that was run
    pub scenario_name: String,
    /// The URL that requests were sent to
    pub target_url: String,
    /// The time the run started
    ///
    /// This is a Unix timestamp in seconds.
    pub started_at: i64,
    /// The duration that the run was configured with, in milliseconds
    ///
    /// If the run was configured for soak testing, then this will not be set.
    pub run_duration_ms: Option<u64>,
    /// The pacing delay between iterations, in milliseconds, if any
    pub pacing_ms: Option<u64>,
    /// The number of virtual users configured
    pub vu_count: usize,
    /// The number of virtual users still running at the end of the test
    ///
    /// Virtual users that bail, or fail their setup, are not counted.
    pub vu_end_count: usize,
    /// The number of iterations completed by all virtual users
    pub iterations: u64,
    /// The number of iterations whose request or check failed
    pub failed_iterations: u64,
    /// The number of virtual users that were assigned to each behaviour.
    pub assigned_behaviours: HashMap<String, usize>,
    /// Pass and fail counts for each check, keyed by check name
    pub checks: BTreeMap<String, CheckSummary>,
    /// Environment variables set for the run
    ///
    /// This won't capture all environment variables. Just the ones that the runner is aware of.
    pub env: HashMap<String, String>,
    /// The version of Breeze that was used for this run
    pub breeze_version: String,
}

impl RunSummary {
    /// Create a new run summary
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        run_id: String,
        scenario_name: String,
        target_url: String,
        started_at: i64,
        run_duration_ms: Option<u64>,
        pacing_ms: Option<u64>,
        vu_count: usize,
        assigned_behaviours: HashMap<String, usize>,
        breeze_version: String,
    ) -> Self {
        Self {
            run_id,
            scenario_name,
            target_url,
            started_at,
            run_duration_ms,
            pacing_ms,
            vu_count,
            vu_end_count: 0,
            iterations: 0,
            failed_iterations: 0,
            assigned_behaviours,
            checks: BTreeMap::new(),
            env: HashMap::with_capacity(0),
            breeze_version,
        }
    }

    /// Set the number of virtual users that ran until the end
    pub fn set_vu_end_count(&mut self, vu_end_count: usize) {
        self.vu_end_count = vu_end_count;
    }

    /// Set the iteration counts at the end of the run
    pub fn set_iterations(&mut self, iterations: u64, failed_iterations: u64) {
        self.iterations = iterations;
        self.failed_iterations = failed_iterations;
    }

    /// Record the final counts for a check
    pub fn add_check(&mut self, name: String, summary: CheckSummary) {
        self.checks.insert(name, summary);
    }

    /// Add an environment variable
    pub fn add_env(&mut self, key: String, value: String) {
        self.env.insert(key, value);
    }

    /// Compute a fingerprint for this run summary
    ///
    /// The fingerprint is intended to identify the configuration used to run the scenario, so
    /// two runs of the same workload can be compared. It uses the
    ///     - Scenario name
    ///     - Target URL
    ///     - Run duration
    ///     - Pacing
    ///     - Assigned behaviours
    ///     - Selected environment variables
    ///     - Breeze version
    ///
    /// The fingerprint is computed using [sha3::Sha3_256].
    pub fn fingerprint(&self) -> String {
        let mut hasher = sha3::Sha3_256::new();
        Digest::update(&mut hasher, self.scenario_name.as_bytes());
        Digest::update(&mut hasher, self.target_url.as_bytes());
        if let Some(run_duration_ms) = self.run_duration_ms {
            Digest::update(&mut hasher, run_duration_ms.to_le_bytes());
        }
        if let Some(pacing_ms) = self.pacing_ms {
            Digest::update(&mut hasher, pacing_ms.to_le_bytes());
        }
        self.assigned_behaviours
            .iter()
            .sorted_by_key(|(k, _)| k.to_owned())
            .for_each(|(k, v)| {
                Digest::update(&mut hasher, k.as_bytes());
                Digest::update(&mut hasher, v.to_le_bytes());
            });
        self.env
            .iter()
            .sorted_by_key(|(k, _)| k.to_owned())
            .for_each(|(k, v)| {
                Digest::update(&mut hasher, k.as_bytes());
                Digest::update(&mut hasher, v.as_bytes());
            });
        Digest::update(&mut hasher, self.breeze_version.as_bytes());

        format!("{:x}", hasher.finalize())
    }
}

/// Append the run summary to a file
///
/// The summary will be serialized to JSON and output as a single line followed by a newline. The
/// recommended file extension is `.jsonl`.
pub fn append_run_summary(run_summary: &RunSummary, path: &Path) -> anyhow::Result<()> {
    let mut file = std::fs::OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)?;
    store_run_summary(run_summary, &mut file)?;
    file.write_all(b"\n")?;
    Ok(())
}

/// Serialize the run summary to a writer
pub fn store_run_summary<W: Write>(run_summary: &RunSummary, writer: &mut W) -> anyhow::Result<()> {
    serde_json::to_writer(writer, run_summary)?;
    Ok(())
}

/// Load a run summary from a reader
pub fn load_run_summary<R: Read>(reader: R) -> anyhow::Result<RunSummary> {
    let reader = std::io::BufReader::new(reader);
    let run_summary: RunSummary = serde_json::from_reader(reader)?;
    Ok(run_summary)
}

/// Load run summaries from a file
///
/// The file should contain one JSON object per line. This is the format produced by
/// [append_run_summary].
pub fn load_summary_runs(path: &Path) -> anyhow::Result<Vec<RunSummary>> {
    let file = std::fs::File::open(path)?;
    let reader = std::io::BufReader::new(file);
    let mut runs = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let run: RunSummary = serde_json::from_str(&line)?;
        runs.push(run);
    }
    Ok(runs)
}
