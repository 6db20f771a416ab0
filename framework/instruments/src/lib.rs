mod report;

use std::sync::Arc;
use std::time::{Duration, Instant};

pub use report::{CheckTally, InMemoryReporter, OperationStats, ReportConfig, Reporter};

/// Timing of a single instrumented operation, such as one HTTP request.
#[derive(Debug, Clone)]
pub struct OperationRecord {
    pub operation_id: String,
    started: Instant,
    pub elapsed: Option<Duration>,
    pub is_error: bool,
}

impl OperationRecord {
    pub fn new(operation_id: impl Into<String>) -> Self {
        Self {
            operation_id: operation_id.into(),
            started: Instant::now(),
            elapsed: None,
            is_error: false,
        }
    }

    pub fn duration(&self) -> Option<Duration> {
        self.elapsed
    }

    fn finish(&mut self, is_error: bool) {
        self.elapsed = Some(self.started.elapsed());
        self.is_error = is_error;
    }
}

/// The outcome of evaluating one named check against one response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckRecord {
    pub name: String,
    pub passed: bool,
}

impl CheckRecord {
    pub fn new(name: impl Into<String>, passed: bool) -> Self {
        Self {
            name: name.into(),
            passed,
        }
    }
}

/// Stop the clock on an operation and hand it to the reporter.
///
/// Used by the code generated for `#[breeze_instrument]`.
pub fn report_operation<T, E>(
    reporter: Arc<Reporter>,
    mut operation_record: OperationRecord,
    response: &Result<T, E>,
) {
    operation_record.finish(response.is_err());
    log::trace!(
        "Operation {} took {:?}, error: {}",
        operation_record.operation_id,
        operation_record.elapsed,
        operation_record.is_error
    );
    reporter.add_operation(&operation_record);
}
