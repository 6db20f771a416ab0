use std::time::Duration;

use url::Url;

/// Request timeout used when neither the scenario nor the command line sets one.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// The validated execution parameters of a run.
///
/// Built once by [crate::prelude::ScenarioDefinitionBuilder] before any virtual user starts and
/// only read after that.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    /// Number of virtual users running iterations concurrently. Always at least 1.
    pub concurrency: usize,
    /// How long iterations are started for. `None` for soak runs.
    pub duration: Option<Duration>,
    /// Think time after every iteration.
    pub pacing: Option<Duration>,
    /// Base URL that scenario paths are resolved against.
    pub target_url: Url,
    /// Upper bound for a single request.
    pub request_timeout: Duration,
}

impl RunConfig {
    /// Resolve a scenario path, such as `/hello`, against the target URL.
    pub fn resolve(&self, path: &str) -> Result<Url, url::ParseError> {
        self.target_url.join(path)
    }
}

/// Parse and check the base URL for a run.
pub(crate) fn parse_target_url(raw: &str) -> anyhow::Result<Url> {
    let url = Url::parse(raw).map_err(|e| anyhow::anyhow!("Invalid target URL [{raw}]: {e}"))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => anyhow::bail!("Unsupported scheme [{scheme}] in target URL [{raw}]"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(target_url: &str) -> RunConfig {
        RunConfig {
            concurrency: 1,
            duration: Some(Duration::from_secs(1)),
            pacing: None,
            target_url: parse_target_url(target_url).unwrap(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    #[test]
    fn resolve_absolute_path() {
        let config = config("http://127.0.0.1:10000");
        assert_eq!(
            "http://127.0.0.1:10000/api/user/1",
            config.resolve("/api/user/1").unwrap().as_str()
        );
    }

    #[test]
    fn resolve_path_replaces_target_path() {
        let config = config("http://127.0.0.1:10000/ignored");
        assert_eq!(
            "http://127.0.0.1:10000/hello",
            config.resolve("/hello").unwrap().as_str()
        );
    }

    #[test]
    fn reject_non_http_target() {
        assert!(parse_target_url("ftp://127.0.0.1").is_err());
        assert!(parse_target_url("not a url").is_err());
    }
}
