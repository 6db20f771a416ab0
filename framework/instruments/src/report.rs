mod in_memory_reporter;

use std::collections::BTreeMap;

use parking_lot::Mutex;

use crate::{CheckRecord, OperationRecord};

pub use in_memory_reporter::{CheckTally, InMemoryReporter, OperationStats};

/// Choose what the [Reporter] does at the end of a run.
#[derive(Debug, Default, Clone)]
pub struct ReportConfig {
    summary: bool,
}

impl ReportConfig {
    /// Print summary tables of operations and checks when the reporter is finalized.
    pub fn enable_summary(mut self) -> Self {
        self.summary = true;
        self
    }

    pub fn init(self) -> Reporter {
        Reporter {
            in_memory: Mutex::new(InMemoryReporter::new()),
            print_summary: self.summary,
        }
    }
}

/// Collects operation timings and check outcomes from every agent.
///
/// Shared between agents behind an `Arc`; all methods take `&self`.
#[derive(Debug)]
pub struct Reporter {
    in_memory: Mutex<InMemoryReporter>,
    print_summary: bool,
}

impl Reporter {
    pub fn add_operation(&self, operation_record: &OperationRecord) {
        self.in_memory.lock().add_operation(operation_record);
    }

    pub fn add_check(&self, check_record: CheckRecord) {
        self.in_memory.lock().add_check(&check_record);
    }

    pub fn operation_stats(&self) -> BTreeMap<String, OperationStats> {
        self.in_memory.lock().operation_stats().clone()
    }

    pub fn check_tallies(&self) -> BTreeMap<String, CheckTally> {
        self.in_memory.lock().check_tallies().clone()
    }

    pub fn finalize(&self) {
        if self.print_summary {
            self.in_memory.lock().print_summary();
        }
    }
}
