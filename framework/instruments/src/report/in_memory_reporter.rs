mod checks_table;
mod operations_table;

use std::collections::BTreeMap;
use std::time::Duration;

use tabled::settings::Style;
use tabled::Table;

use crate::report::in_memory_reporter::checks_table::CheckRow;
use crate::report::in_memory_reporter::operations_table::OperationRow;
use crate::{CheckRecord, OperationRecord};

/// Running totals for one operation id.
///
/// Min and max only consider successful operations, errors usually return early and would skew
/// them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperationStats {
    pub count: u64,
    pub errors: u64,
    pub total: Duration,
    pub min_success: Option<Duration>,
    pub max_success: Option<Duration>,
}

impl OperationStats {
    fn record(&mut self, elapsed: Duration, is_error: bool) {
        self.count += 1;
        self.total += elapsed;
        if is_error {
            self.errors += 1;
            return;
        }

        self.min_success = Some(self.min_success.map_or(elapsed, |m| m.min(elapsed)));
        self.max_success = Some(self.max_success.map_or(elapsed, |m| m.max(elapsed)));
    }

    pub fn average(&self) -> Option<Duration> {
        if self.count == 0 {
            return None;
        }

        let nanos = self.total.as_nanos() / self.count as u128;
        Some(Duration::from_nanos(nanos as u64))
    }
}

/// Pass and fail counts for one named check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckTally {
    pub passed: u64,
    pub failed: u64,
}

impl CheckTally {
    pub fn total(&self) -> u64 {
        self.passed + self.failed
    }

    /// Fraction of evaluations that passed, `0.0` when the check never ran.
    pub fn pass_rate(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.passed as f64 / total as f64,
        }
    }
}

/// Keeps aggregates of every operation and check in memory and prints them as tables at the end
/// of the run.
#[derive(Debug, Default)]
pub struct InMemoryReporter {
    operations: BTreeMap<String, OperationStats>,
    checks: BTreeMap<String, CheckTally>,
}

impl InMemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_operation(&mut self, operation_record: &OperationRecord) {
        let Some(elapsed) = operation_record.duration() else {
            log::warn!(
                "Operation {} was reported without being finished",
                operation_record.operation_id
            );
            return;
        };

        self.operations
            .entry(operation_record.operation_id.clone())
            .or_default()
            .record(elapsed, operation_record.is_error);
    }

    pub fn add_check(&mut self, check_record: &CheckRecord) {
        let tally = self.checks.entry(check_record.name.clone()).or_default();
        if check_record.passed {
            tally.passed += 1;
        } else {
            tally.failed += 1;
        }
    }

    pub fn operation_stats(&self) -> &BTreeMap<String, OperationStats> {
        &self.operations
    }

    pub fn check_tallies(&self) -> &BTreeMap<String, CheckTally> {
        &self.checks
    }

    pub(crate) fn print_summary(&self) {
        self.print_summary_of_operations();
        self.print_summary_of_checks();
    }

    fn print_summary_of_operations(&self) {
        println!("\nSummary of operations");
        let rows = self
            .operations
            .iter()
            .map(|(operation_id, stats)| OperationRow {
                operation_id: operation_id.clone(),
                avg_time_ms: as_ms(stats.average()),
                min_time_ms: as_ms(stats.min_success),
                max_time_ms: as_ms(stats.max_success),
                total_operations: stats.count,
                errors: stats.errors,
            })
            .collect::<Vec<_>>();

        let mut table = Table::new(rows);
        table.with(Style::modern());

        println!("{table}");
    }

    fn print_summary_of_checks(&self) {
        println!("\nSummary of checks");
        let rows = self
            .checks
            .iter()
            .map(|(name, tally)| CheckRow {
                check: name.clone(),
                passed: tally.passed,
                failed: tally.failed,
                pass_rate: tally.pass_rate(),
            })
            .collect::<Vec<_>>();

        let mut table = Table::new(rows);
        table.with(Style::modern());

        println!("{table}");
    }
}

fn as_ms(duration: Option<Duration>) -> f64 {
    duration.map_or(0.0, |d| d.as_micros() as f64 / 1000.0)
}
