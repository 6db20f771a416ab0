use std::time::Duration;

/// Parse a human readable duration such as `5m`, `10s`, `250ms` or `1h 30m`.
///
/// A bare number is rejected rather than guessing a unit.
pub fn parse_duration(s: &str) -> Result<Duration, humantime::DurationError> {
    humantime::parse_duration(s.trim())
}

/// Format a duration the same way [parse_duration] accepts it.
pub fn format_duration(duration: Duration) -> String {
    humantime::format_duration(duration).to_string()
}
