mod tables;

use crate::report::ReportCollector;
use crate::RunSummary;
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// Prints human-readable summary tables on stdout. This is the default
/// collector for interactive runs.
#[derive(Default)]
pub struct SummaryReportCollector;

impl SummaryReportCollector {
    pub fn new() -> Self {
        Self
    }
}

impl ReportCollector for SummaryReportCollector {
    fn finalize(&mut self, summary: &RunSummary) {
        if !summary.operations.is_empty() {
            println!("\nSummary of operations");
            print_table(tables::operation_rows(&summary.operations));
        }

        if !summary.checks.is_empty() {
            println!("\nSummary of checks");
            print_table(tables::check_rows(&summary.checks));
        }

        if !summary.trends.is_empty() {
            println!("\nTrends");
            print_table(tables::trend_rows(&summary.trends));
        }

        if !summary.rates.is_empty() {
            println!("\nRates");
            print_table(tables::rate_rows(&summary.rates));
        }

        if !summary.counters.is_empty() {
            println!("\nCounters");
            print_table(tables::counter_rows(&summary.counters));
        }
    }
}

fn print_table<R: Tabled>(rows: Vec<R>) {
    let mut table = Table::new(rows);
    table.with(Style::modern());
    println!("{table}");
}
