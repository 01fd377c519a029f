mod metrics;
mod report;
mod threshold;

pub use metrics::{
    CheckCounts, CheckSummary, CounterSummary, MetricStore, OperationSummary, RateSnapshot,
    RateSummary, RunSummary, TrendSnapshot, TrendSummary,
};
pub use report::{ReportCollector, SummaryReportCollector};
pub use threshold::{RunVerdict, Threshold, ThresholdOutcome, ThresholdSet};

use std::time::{Duration, Instant};

/// Name of the built-in duration trend fed by every completed operation.
pub const REQUEST_DURATION_METRIC: &str = "request_duration";

/// Name of the built-in failure rate fed by every completed operation.
pub const REQUEST_FAILED_METRIC: &str = "request_failed";

/// One timed call against the target, created by an instrumented client when
/// the request goes out and finished when the last byte arrives.
#[derive(Debug, Clone)]
pub struct OperationRecord {
    operation_id: String,
    started: Instant,
    elapsed: Option<Duration>,
    is_error: bool,
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

    /// Stop the clock. `is_error` marks transport failures and error statuses,
    /// which feed the built-in failure rate.
    pub fn finish(mut self, is_error: bool) -> Self {
        self.elapsed = Some(self.started.elapsed());
        self.is_error = is_error;
        self
    }

    pub fn operation_id(&self) -> &str {
        &self.operation_id
    }

    pub fn is_error(&self) -> bool {
        self.is_error
    }

    /// Elapsed time in milliseconds. A record that was never finished answers
    /// with the time since it was created.
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed
            .unwrap_or_else(|| self.started.elapsed())
            .as_secs_f64()
            * 1000.0
    }
}

/// Builds a [Reporter] with the selected output collectors.
#[derive(Default)]
pub struct ReportConfig {
    summary: bool,
}

impl ReportConfig {
    /// Print summary tables on stdout when the run finishes.
    pub fn enable_summary(mut self) -> Self {
        self.summary = true;
        self
    }

    pub fn init(self) -> Reporter {
        let mut collectors: Vec<Box<dyn ReportCollector>> = Vec::new();
        if self.summary {
            collectors.push(Box::new(SummaryReportCollector::new()));
        }

        Reporter {
            store: MetricStore::default(),
            collectors: parking_lot::Mutex::new(collectors),
        }
    }
}

/// The sink agents report into.
///
/// Operations, checks and custom metrics aggregate in the metric store as they
/// arrive; the collectors render the aggregates once at the end of the run.
pub struct Reporter {
    store: MetricStore,
    collectors: parking_lot::Mutex<Vec<Box<dyn ReportCollector>>>,
}

impl Reporter {
    pub fn add_operation(&self, record: OperationRecord) {
        self.store.add_operation(&record);
    }

    /// Record a named boolean assertion. Returns `passed` so call sites can
    /// fold several checks into one outcome.
    pub fn add_check(&self, name: &str, passed: bool) -> bool {
        self.store.add_check(name, passed);
        passed
    }

    /// Record one sample of a rate metric. The rate is the fraction of `true`
    /// samples, so feed it failure flags to build an error rate.
    pub fn add_rate(&self, name: &str, hit: bool) {
        self.store.add_rate(name, hit);
    }

    pub fn add_trend_ms(&self, name: &str, value_ms: f64) {
        self.store.add_trend_ms(name, value_ms);
    }

    pub fn add_counter(&self, name: &str, delta: u64) {
        self.store.add_counter(name, delta);
    }

    pub fn store(&self) -> &MetricStore {
        &self.store
    }

    /// Render the end-of-run report. Call once, after every agent has stopped.
    pub fn finalize(&self) {
        let summary = self.store.summary();
        for collector in self.collectors.lock().iter_mut() {
            collector.finalize(&summary);
        }
    }
}
