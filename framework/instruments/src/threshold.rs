use crate::metrics::MetricStore;
use std::fmt;
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// A pass/fail bound over one aggregated metric, checked once at run end.
#[derive(Debug, Clone, PartialEq)]
pub struct Threshold {
    metric: String,
    criterion: Criterion,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Criterion {
    P95Below(f64),
    P99Below(f64),
    RateBelow(f64),
    CountAtLeast(u64),
}

impl Threshold {
    /// The trend's 95th percentile must stay below `bound_ms`.
    pub fn p95_below(metric: &str, bound_ms: f64) -> Self {
        Self {
            metric: metric.to_string(),
            criterion: Criterion::P95Below(bound_ms),
        }
    }

    /// The trend's 99th percentile must stay below `bound_ms`.
    pub fn p99_below(metric: &str, bound_ms: f64) -> Self {
        Self {
            metric: metric.to_string(),
            criterion: Criterion::P99Below(bound_ms),
        }
    }

    /// The fraction of `true` samples must stay below `bound`.
    pub fn rate_below(metric: &str, bound: f64) -> Self {
        Self {
            metric: metric.to_string(),
            criterion: Criterion::RateBelow(bound),
        }
    }

    /// The counter must reach at least `bound` by the end of the run.
    pub fn count_at_least(metric: &str, bound: u64) -> Self {
        Self {
            metric: metric.to_string(),
            criterion: Criterion::CountAtLeast(bound),
        }
    }

    fn evaluate(&self, store: &MetricStore) -> ThresholdOutcome {
        // A bound over a trend or rate that never saw a sample holds by
        // definition. Counters have a natural zero instead.
        let (observed, passed) = match self.criterion {
            Criterion::P95Below(bound) => match store.trend(&self.metric) {
                Some(trend) => {
                    let p95 = trend.percentile(95.0);
                    (Some(format!("{p95:.2}ms")), p95 < bound)
                }
                None => (None, true),
            },
            Criterion::P99Below(bound) => match store.trend(&self.metric) {
                Some(trend) => {
                    let p99 = trend.percentile(99.0);
                    (Some(format!("{p99:.2}ms")), p99 < bound)
                }
                None => (None, true),
            },
            Criterion::RateBelow(bound) => match store.rate(&self.metric) {
                Some(counts) => (Some(format!("{:.4}", counts.rate())), counts.rate() < bound),
                None => (None, true),
            },
            Criterion::CountAtLeast(bound) => {
                let count = store.counter(&self.metric).unwrap_or(0);
                (Some(count.to_string()), count >= bound)
            }
        };

        ThresholdOutcome {
            threshold: self.to_string(),
            observed,
            passed,
        }
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.criterion {
            Criterion::P95Below(bound) => write!(f, "{}: p(95) < {bound}ms", self.metric),
            Criterion::P99Below(bound) => write!(f, "{}: p(99) < {bound}ms", self.metric),
            Criterion::RateBelow(bound) => write!(f, "{}: rate < {bound}", self.metric),
            Criterion::CountAtLeast(bound) => write!(f, "{}: count >= {bound}", self.metric),
        }
    }
}

/// The thresholds a scenario declares for itself.
#[derive(Debug, Clone, Default)]
pub struct ThresholdSet {
    thresholds: Vec<Threshold>,
}

impl ThresholdSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, threshold: Threshold) -> Self {
        self.thresholds.push(threshold);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.thresholds.is_empty()
    }

    pub fn evaluate(&self, store: &MetricStore) -> RunVerdict {
        RunVerdict {
            outcomes: self
                .thresholds
                .iter()
                .map(|threshold| threshold.evaluate(store))
                .collect(),
        }
    }
}

/// The result of one threshold check.
#[derive(Debug, Clone)]
pub struct ThresholdOutcome {
    pub threshold: String,
    pub observed: Option<String>,
    pub passed: bool,
}

/// Overall result of a run: every declared threshold with its outcome. A run
/// with no thresholds passes trivially.
#[derive(Debug, Clone, Default)]
pub struct RunVerdict {
    outcomes: Vec<ThresholdOutcome>,
}

impl RunVerdict {
    pub fn outcomes(&self) -> &[ThresholdOutcome] {
        &self.outcomes
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn passed(&self) -> bool {
        self.outcomes.iter().all(|outcome| outcome.passed)
    }

    /// Convert into a process exit decision: an error naming every violated
    /// threshold, or Ok when the run held all of its bounds.
    pub fn into_result(self) -> anyhow::Result<()> {
        let failures: Vec<String> = self
            .outcomes
            .iter()
            .filter(|outcome| !outcome.passed)
            .map(|outcome| outcome.threshold.clone())
            .collect();

        if failures.is_empty() {
            Ok(())
        } else {
            anyhow::bail!(
                "{} threshold(s) violated: {}",
                failures.len(),
                failures.join("; ")
            )
        }
    }
}

#[derive(Tabled)]
struct VerdictRow {
    #[tabled(rename = "Threshold")]
    threshold: String,
    #[tabled(rename = "Observed")]
    observed: String,
    #[tabled(rename = "Result")]
    result: String,
}

impl fmt::Display for RunVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows: Vec<VerdictRow> = self
            .outcomes
            .iter()
            .map(|outcome| VerdictRow {
                threshold: outcome.threshold.clone(),
                observed: outcome.observed.clone().unwrap_or_else(|| "-".to_string()),
                result: if outcome.passed { "pass" } else { "FAIL" }.to_string(),
            })
            .collect();

        let mut table = Table::new(rows);
        table.with(Style::modern());
        write!(f, "{table}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn store_with_latencies(latencies_ms: &[f64]) -> MetricStore {
        let store = MetricStore::default();
        for latency in latencies_ms {
            store.add_trend_ms("request_duration", *latency);
        }
        store
    }

    #[test]
    fn all_bounds_holding_passes_the_run() {
        let store = store_with_latencies(&[100.0, 200.0, 300.0]);
        store.add_rate("errors", false);

        let verdict = ThresholdSet::new()
            .with(Threshold::p95_below("request_duration", 500.0))
            .with(Threshold::p99_below("request_duration", 1000.0))
            .with(Threshold::rate_below("errors", 0.05))
            .evaluate(&store);

        assert!(verdict.passed());
        assert!(verdict.into_result().is_ok());
    }

    #[test]
    fn one_violated_bound_fails_the_run() {
        let store = store_with_latencies(&[100.0, 200.0, 900.0]);
        store.add_rate("errors", false);

        let verdict = ThresholdSet::new()
            .with(Threshold::p95_below("request_duration", 500.0))
            .with(Threshold::rate_below("errors", 0.05))
            .evaluate(&store);

        assert!(!verdict.passed());
        let failures: Vec<&ThresholdOutcome> = verdict
            .outcomes()
            .iter()
            .filter(|outcome| !outcome.passed)
            .collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].threshold, "request_duration: p(95) < 500ms");

        let error = verdict.into_result().unwrap_err();
        assert!(error.to_string().contains("request_duration: p(95) < 500ms"));
    }

    #[test]
    fn rate_bound_is_exclusive() {
        let store = MetricStore::default();
        for index in 0..100 {
            store.add_rate("errors", index < 5);
        }

        // Exactly 5% is not below 5%.
        let verdict = ThresholdSet::new()
            .with(Threshold::rate_below("errors", 0.05))
            .evaluate(&store);

        assert!(!verdict.passed());
    }

    #[test]
    fn unsampled_metrics_hold_their_bounds() {
        let store = MetricStore::default();

        let verdict = ThresholdSet::new()
            .with(Threshold::p95_below("request_duration", 500.0))
            .with(Threshold::rate_below("errors", 0.05))
            .evaluate(&store);

        assert!(verdict.passed());
        assert_eq!(verdict.outcomes()[0].observed, None);
    }

    #[test]
    fn missing_counter_counts_as_zero() {
        let store = MetricStore::default();

        let verdict = ThresholdSet::new()
            .with(Threshold::count_at_least("dropped_iterations", 1))
            .evaluate(&store);

        assert!(!verdict.passed());

        let satisfied = ThresholdSet::new()
            .with(Threshold::count_at_least("dropped_iterations", 0))
            .evaluate(&store);
        assert!(satisfied.passed());
    }

    #[test]
    fn empty_threshold_set_passes() {
        let verdict = ThresholdSet::new().evaluate(&MetricStore::default());

        assert!(verdict.is_empty());
        assert!(verdict.passed());
    }
}
