use crate::{CheckSummary, CounterSummary, OperationSummary, RateSummary, TrendSummary};
use tabled::Tabled;

#[derive(Tabled)]
pub(crate) struct OperationRow {
    #[tabled(rename = "Operation")]
    operation: String,
    #[tabled(rename = "Requests")]
    requests: u64,
    #[tabled(rename = "Failed")]
    failed: u64,
    #[tabled(rename = "Avg (ms)")]
    avg_ms: String,
    #[tabled(rename = "Min (ms)")]
    min_ms: String,
    #[tabled(rename = "Max (ms)")]
    max_ms: String,
    #[tabled(rename = "p95 (ms)")]
    p95_ms: String,
}

pub(crate) fn operation_rows(operations: &[OperationSummary]) -> Vec<OperationRow> {
    operations
        .iter()
        .map(|op| OperationRow {
            operation: op.operation_id.clone(),
            requests: op.requests,
            failed: op.failed,
            avg_ms: float2(op.stats.mean()),
            min_ms: float2(op.stats.min()),
            max_ms: float2(op.stats.max()),
            p95_ms: float2(op.stats.percentile(95.0)),
        })
        .collect()
}

#[derive(Tabled)]
pub(crate) struct CheckRow {
    #[tabled(rename = "Check")]
    name: String,
    #[tabled(rename = "Passes")]
    passes: u64,
    #[tabled(rename = "Fails")]
    fails: u64,
    #[tabled(rename = "Pass rate")]
    pass_rate: String,
}

pub(crate) fn check_rows(checks: &[CheckSummary]) -> Vec<CheckRow> {
    checks
        .iter()
        .map(|check| CheckRow {
            name: check.name.clone(),
            passes: check.counts.passes,
            fails: check.counts.fails,
            pass_rate: percent(check.counts.pass_rate()),
        })
        .collect()
}

#[derive(Tabled)]
pub(crate) struct TrendRow {
    #[tabled(rename = "Metric")]
    name: String,
    #[tabled(rename = "Samples")]
    samples: usize,
    #[tabled(rename = "Avg (ms)")]
    avg_ms: String,
    #[tabled(rename = "Min (ms)")]
    min_ms: String,
    #[tabled(rename = "Max (ms)")]
    max_ms: String,
    #[tabled(rename = "p95 (ms)")]
    p95_ms: String,
    #[tabled(rename = "p99 (ms)")]
    p99_ms: String,
}

pub(crate) fn trend_rows(trends: &[TrendSummary]) -> Vec<TrendRow> {
    trends
        .iter()
        .map(|trend| TrendRow {
            name: trend.name.clone(),
            samples: trend.stats.count(),
            avg_ms: float2(trend.stats.mean()),
            min_ms: float2(trend.stats.min()),
            max_ms: float2(trend.stats.max()),
            p95_ms: float2(trend.stats.percentile(95.0)),
            p99_ms: float2(trend.stats.percentile(99.0)),
        })
        .collect()
}

#[derive(Tabled)]
pub(crate) struct RateRow {
    #[tabled(rename = "Metric")]
    name: String,
    #[tabled(rename = "Hits")]
    hits: u64,
    #[tabled(rename = "Samples")]
    samples: u64,
    #[tabled(rename = "Rate")]
    rate: String,
}

pub(crate) fn rate_rows(rates: &[RateSummary]) -> Vec<RateRow> {
    rates
        .iter()
        .map(|rate| RateRow {
            name: rate.name.clone(),
            hits: rate.counts.hits,
            samples: rate.counts.total,
            rate: percent(rate.counts.rate()),
        })
        .collect()
}

#[derive(Tabled)]
pub(crate) struct CounterRow {
    #[tabled(rename = "Metric")]
    name: String,
    #[tabled(rename = "Count")]
    count: u64,
}

pub(crate) fn counter_rows(counters: &[CounterSummary]) -> Vec<CounterRow> {
    counters
        .iter()
        .map(|counter| CounterRow {
            name: counter.name.clone(),
            count: counter.count,
        })
        .collect()
}

fn float2(value: f64) -> String {
    format!("{value:.2}")
}

fn percent(fraction: f64) -> String {
    format!("{:.2}%", fraction * 100.0)
}
