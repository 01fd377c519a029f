mod cli;
mod context;
mod definition;
mod executor;
mod init;
mod monitor;
mod progress;
mod run;
mod schedule;
mod shutdown;
mod types;

pub mod prelude {
    pub use crate::cli::{GaleScenarioCli, ReporterOpt};
    pub use crate::context::{AgentContext, RunnerContext, UserValuesConstraint};
    pub use crate::definition::{HookResult, ScenarioDefinitionBuilder};
    pub use crate::init::init;
    pub use crate::run::run;
    pub use crate::schedule::{Schedule, DROPPED_ITERATIONS_METRIC};
    pub use crate::types::GaleResult;

    pub use gale_core::prelude::*;
    pub use gale_instruments::{
        OperationRecord, ReportConfig, Reporter, RunVerdict, Threshold, ThresholdSet,
        REQUEST_DURATION_METRIC, REQUEST_FAILED_METRIC,
    };
}
