use clap::Parser;

/// Command line options shared by every scenario binary.
///
/// The workload parameters themselves (target, credential, duration, rate)
/// come from the environment so that the same invocation works across
/// environments; these flags only shape how the runner behaves.
#[derive(Parser, Debug, Clone)]
#[command(about, long_about = None)]
pub struct GaleScenarioCli {
    /// Do not show a progress bar while the scenario runs.
    ///
    /// Recommended for CI/CD environments where the progress bar isn't being
    /// looked at by anyone and is just adding noise to the logs.
    #[clap(long, default_value = "false")]
    pub no_progress: bool,

    /// Seconds to wait after setup before starting any agents.
    ///
    /// Useful when staging several profiles against the same target one after
    /// another.
    #[clap(long)]
    pub start_delay: Option<u64>,

    /// Override the scenario duration, in seconds.
    #[clap(long)]
    pub duration: Option<u64>,

    /// Where the end-of-run report goes.
    #[clap(long, value_enum, default_value_t = ReporterOpt::Summary)]
    pub reporter: ReporterOpt,

    /// Identifier for this run, used in log output. Generated when not set.
    #[clap(long)]
    pub run_id: Option<String>,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReporterOpt {
    /// Print summary tables when the run completes.
    Summary,
    /// Discard the report, keeping only the threshold verdict.
    Noop,
}
