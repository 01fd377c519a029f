use crate::{OperationRecord, REQUEST_DURATION_METRIC, REQUEST_FAILED_METRIC};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Run-scoped metric aggregation.
///
/// Agents contribute samples concurrently for the whole run; thresholds and
/// reporters read the aggregates after the agents have stopped. Cloning
/// shares the underlying store.
#[derive(Debug, Default, Clone)]
pub struct MetricStore {
    inner: Arc<Mutex<StoreInner>>,
}

#[derive(Debug, Default)]
struct StoreInner {
    operations: BTreeMap<String, OperationAggregate>,
    trends: BTreeMap<String, Vec<f64>>,
    rates: BTreeMap<String, RateSnapshot>,
    counters: BTreeMap<String, u64>,
    checks: BTreeMap<String, CheckCounts>,
}

#[derive(Debug, Default)]
struct OperationAggregate {
    durations_ms: Vec<f64>,
    failed: u64,
}

impl MetricStore {
    /// Absorb a completed operation. Besides the per-operation aggregate this
    /// feeds the built-in [REQUEST_DURATION_METRIC] and
    /// [REQUEST_FAILED_METRIC], failed requests included, so latency
    /// thresholds see timeouts rather than ignoring them.
    pub(crate) fn add_operation(&self, record: &OperationRecord) {
        let elapsed_ms = record.elapsed_ms();

        let mut inner = self.inner.lock();
        let aggregate = inner
            .operations
            .entry(record.operation_id().to_string())
            .or_default();
        aggregate.durations_ms.push(elapsed_ms);
        if record.is_error() {
            aggregate.failed += 1;
        }

        inner
            .trends
            .entry(REQUEST_DURATION_METRIC.to_string())
            .or_default()
            .push(elapsed_ms);
        let failed = inner.rates.entry(REQUEST_FAILED_METRIC.to_string()).or_default();
        failed.total += 1;
        if record.is_error() {
            failed.hits += 1;
        }
    }

    pub fn add_trend_ms(&self, name: &str, value_ms: f64) {
        self.inner
            .lock()
            .trends
            .entry(name.to_string())
            .or_default()
            .push(value_ms);
    }

    pub fn add_rate(&self, name: &str, hit: bool) {
        let mut inner = self.inner.lock();
        let rate = inner.rates.entry(name.to_string()).or_default();
        rate.total += 1;
        if hit {
            rate.hits += 1;
        }
    }

    pub fn add_counter(&self, name: &str, delta: u64) {
        let mut inner = self.inner.lock();
        *inner.counters.entry(name.to_string()).or_default() += delta;
    }

    pub fn add_check(&self, name: &str, passed: bool) {
        let mut inner = self.inner.lock();
        let counts = inner.checks.entry(name.to_string()).or_default();
        if passed {
            counts.passes += 1;
        } else {
            counts.fails += 1;
        }
    }

    pub fn trend(&self, name: &str) -> Option<TrendSnapshot> {
        let inner = self.inner.lock();
        inner
            .trends
            .get(name)
            .map(|samples| TrendSnapshot::from_samples(samples.clone()))
    }

    pub fn rate(&self, name: &str) -> Option<RateSnapshot> {
        self.inner.lock().rates.get(name).copied()
    }

    pub fn counter(&self, name: &str) -> Option<u64> {
        self.inner.lock().counters.get(name).copied()
    }

    /// Snapshot every aggregate for reporting.
    pub fn summary(&self) -> RunSummary {
        let inner = self.inner.lock();

        RunSummary {
            operations: inner
                .operations
                .iter()
                .map(|(operation_id, aggregate)| OperationSummary {
                    operation_id: operation_id.clone(),
                    requests: aggregate.durations_ms.len() as u64,
                    failed: aggregate.failed,
                    stats: TrendSnapshot::from_samples(aggregate.durations_ms.clone()),
                })
                .collect(),
            checks: inner
                .checks
                .iter()
                .map(|(name, counts)| CheckSummary {
                    name: name.clone(),
                    counts: *counts,
                })
                .collect(),
            trends: inner
                .trends
                .iter()
                .map(|(name, samples)| TrendSummary {
                    name: name.clone(),
                    stats: TrendSnapshot::from_samples(samples.clone()),
                })
                .collect(),
            rates: inner
                .rates
                .iter()
                .map(|(name, counts)| RateSummary {
                    name: name.clone(),
                    counts: *counts,
                })
                .collect(),
            counters: inner
                .counters
                .iter()
                .map(|(name, count)| CounterSummary {
                    name: name.clone(),
                    count: *count,
                })
                .collect(),
        }
    }
}

/// Aggregate of a boolean rate metric.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RateSnapshot {
    pub hits: u64,
    pub total: u64,
}

impl RateSnapshot {
    /// Fraction of samples that were `true`; 0.0 when no samples arrived.
    pub fn rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.hits as f64 / self.total as f64
        }
    }
}

/// Aggregate of a named check.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CheckCounts {
    pub passes: u64,
    pub fails: u64,
}

impl CheckCounts {
    pub fn total(&self) -> u64 {
        self.passes + self.fails
    }

    pub fn pass_rate(&self) -> f64 {
        if self.total() == 0 {
            0.0
        } else {
            self.passes as f64 / self.total() as f64
        }
    }
}

/// Distribution summary over the samples of one trend metric.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendSnapshot {
    samples: Vec<f64>,
}

impl TrendSnapshot {
    fn from_samples(mut samples: Vec<f64>) -> Self {
        samples.sort_by(f64::total_cmp);
        Self { samples }
    }

    pub fn count(&self) -> usize {
        self.samples.len()
    }

    pub fn min(&self) -> f64 {
        self.samples.first().copied().unwrap_or_default()
    }

    pub fn max(&self) -> f64 {
        self.samples.last().copied().unwrap_or_default()
    }

    pub fn mean(&self) -> f64 {
        if self.samples.is_empty() {
            0.0
        } else {
            self.samples.iter().sum::<f64>() / self.samples.len() as f64
        }
    }

    /// Nearest-rank percentile: the smallest sample such that at least `p`
    /// percent of samples are less than or equal to it.
    pub fn percentile(&self, p: f64) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }

        let rank = ((p / 100.0) * self.samples.len() as f64).ceil() as usize;
        let index = rank.saturating_sub(1).min(self.samples.len() - 1);
        self.samples[index]
    }
}

/// Everything the run aggregated, snapshotted for the report collectors.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub operations: Vec<OperationSummary>,
    pub checks: Vec<CheckSummary>,
    pub trends: Vec<TrendSummary>,
    pub rates: Vec<RateSummary>,
    pub counters: Vec<CounterSummary>,
}

#[derive(Debug, Clone)]
pub struct OperationSummary {
    pub operation_id: String,
    pub requests: u64,
    pub failed: u64,
    pub stats: TrendSnapshot,
}

#[derive(Debug, Clone)]
pub struct CheckSummary {
    pub name: String,
    pub counts: CheckCounts,
}

#[derive(Debug, Clone)]
pub struct TrendSummary {
    pub name: String,
    pub stats: TrendSnapshot,
}

#[derive(Debug, Clone)]
pub struct RateSummary {
    pub name: String,
    pub counts: RateSnapshot,
}

#[derive(Debug, Clone)]
pub struct CounterSummary {
    pub name: String,
    pub count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn nearest_rank_percentiles() {
        let store = MetricStore::default();
        for value in 1..=100 {
            store.add_trend_ms("latency", value as f64);
        }

        let trend = store.trend("latency").unwrap();
        assert_eq!(trend.percentile(50.0), 50.0);
        assert_eq!(trend.percentile(95.0), 95.0);
        assert_eq!(trend.percentile(99.0), 99.0);
        assert_eq!(trend.percentile(100.0), 100.0);
        assert_eq!(trend.min(), 1.0);
        assert_eq!(trend.max(), 100.0);
    }

    #[test]
    fn single_sample_answers_every_percentile() {
        let store = MetricStore::default();
        store.add_trend_ms("latency", 42.0);

        let trend = store.trend("latency").unwrap();
        assert_eq!(trend.percentile(0.0), 42.0);
        assert_eq!(trend.percentile(50.0), 42.0);
        assert_eq!(trend.percentile(99.0), 42.0);
        assert_eq!(trend.mean(), 42.0);
    }

    #[test]
    fn rate_is_the_fraction_of_true_samples() {
        let store = MetricStore::default();
        store.add_rate("errors", true);
        store.add_rate("errors", false);
        store.add_rate("errors", false);
        store.add_rate("errors", false);

        assert_eq!(store.rate("errors").unwrap().rate(), 0.25);
        assert_eq!(store.rate("missing"), None);
    }

    #[test]
    fn counters_sum_their_deltas() {
        let store = MetricStore::default();
        store.add_counter("total_requests", 1);
        store.add_counter("total_requests", 1);
        store.add_counter("total_requests", 3);

        assert_eq!(store.counter("total_requests"), Some(5));
        assert_eq!(store.counter("missing"), None);
    }

    #[test]
    fn checks_aggregate_per_name() {
        let store = MetricStore::default();
        store.add_check("health: status 200", true);
        store.add_check("health: status 200", true);
        store.add_check("health: status 200", false);
        store.add_check("enqueue: status 200 or 202", true);

        let summary = store.summary();
        assert_eq!(summary.checks.len(), 2);

        let health = summary
            .checks
            .iter()
            .find(|check| check.name == "health: status 200")
            .unwrap();
        assert_eq!(health.counts.passes, 2);
        assert_eq!(health.counts.fails, 1);
    }

    #[test]
    fn operations_feed_the_built_in_metrics() {
        let store = MetricStore::default();
        store.add_operation(&OperationRecord::new("/health").finish(false));
        store.add_operation(&OperationRecord::new("/health").finish(true));
        store.add_operation(&OperationRecord::new("/api/enqueue").finish(false));

        assert_eq!(store.trend(REQUEST_DURATION_METRIC).unwrap().count(), 3);
        let failed = store.rate(REQUEST_FAILED_METRIC).unwrap();
        assert_eq!(failed.hits, 1);
        assert_eq!(failed.total, 3);

        let summary = store.summary();
        assert_eq!(summary.operations.len(), 2);
        let health = summary
            .operations
            .iter()
            .find(|op| op.operation_id == "/health")
            .unwrap();
        assert_eq!(health.requests, 2);
        assert_eq!(health.failed, 1);
    }
}
