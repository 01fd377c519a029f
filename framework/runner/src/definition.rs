use crate::cli::{GaleScenarioCli, ReporterOpt};
use crate::context::{AgentContext, RunnerContext, UserValuesConstraint};
use crate::schedule::Schedule;
use gale_instruments::ThresholdSet;
use std::sync::Arc;
use std::time::Duration;

pub type HookResult = anyhow::Result<()>;

pub type GlobalHookMut<RV> = fn(&mut RunnerContext<RV>) -> HookResult;
pub type GlobalHook<RV> = fn(Arc<RunnerContext<RV>>) -> HookResult;
pub type AgentHookMut<RV, V> = fn(&mut AgentContext<RV, V>) -> HookResult;

/// The builder for a scenario definition.
///
/// Every profile starts here: pick a schedule, a duration and a threshold
/// set, attach the hooks, then hand the builder to [crate::run::run].
pub struct ScenarioDefinitionBuilder<RV: UserValuesConstraint, V: UserValuesConstraint> {
    /// The name of the scenario. Recommended value is `env!("CARGO_PKG_NAME")`.
    name: String,
    cli: GaleScenarioCli,
    schedule: Schedule,
    duration: Option<Duration>,
    start_delay: Option<Duration>,
    thresholds: ThresholdSet,
    /// Run once before any agents are started. A failure here aborts the run.
    setup_fn: Option<GlobalHookMut<RV>>,
    /// Run once per agent as it starts. A failure stops that agent only.
    setup_agent_fn: Option<AgentHookMut<RV, V>>,
    /// The workload, invoked repeatedly according to the schedule.
    agent_behaviour_fn: Option<AgentHookMut<RV, V>>,
    /// Run once per agent as it stops. Best effort.
    teardown_agent_fn: Option<AgentHookMut<RV, V>>,
    /// Run once after all agents have stopped. Best effort.
    teardown_fn: Option<GlobalHook<RV>>,
}

pub(crate) struct ScenarioDefinition<RV: UserValuesConstraint, V: UserValuesConstraint> {
    pub(crate) name: String,
    pub(crate) run_id: String,
    pub(crate) schedule: Schedule,
    pub(crate) duration: Duration,
    pub(crate) start_delay: Duration,
    pub(crate) no_progress: bool,
    pub(crate) reporter: ReporterOpt,
    pub(crate) thresholds: ThresholdSet,
    pub(crate) setup_fn: Option<GlobalHookMut<RV>>,
    pub(crate) setup_agent_fn: Option<AgentHookMut<RV, V>>,
    pub(crate) agent_behaviour_fn: Option<AgentHookMut<RV, V>>,
    pub(crate) teardown_agent_fn: Option<AgentHookMut<RV, V>>,
    pub(crate) teardown_fn: Option<GlobalHook<RV>>,
}

impl<RV: UserValuesConstraint, V: UserValuesConstraint> ScenarioDefinitionBuilder<RV, V> {
    pub fn new(name: &str, cli: GaleScenarioCli) -> Self {
        Self {
            name: name.to_string(),
            cli,
            schedule: Schedule::ConstantAgents { agents: 1 },
            duration: None,
            start_delay: None,
            thresholds: ThresholdSet::new(),
            setup_fn: None,
            setup_agent_fn: None,
            agent_behaviour_fn: None,
            teardown_agent_fn: None,
            teardown_fn: None,
        }
    }

    /// Initialise logging and parse the command line, then create the
    /// builder. This is the entry point for scenario binaries.
    pub fn new_with_init(name: &str) -> Self {
        Self::new(name, crate::init::init())
    }

    pub fn with_schedule(mut self, schedule: Schedule) -> Self {
        self.schedule = schedule;
        self
    }

    /// Set the run duration. The `--duration` flag overrides this.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Delay the start of the agents after global setup. The `--start-delay`
    /// flag overrides this.
    pub fn with_start_delay(mut self, delay: Duration) -> Self {
        self.start_delay = Some(delay);
        self
    }

    pub fn with_thresholds(mut self, thresholds: ThresholdSet) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn use_setup(mut self, setup_fn: GlobalHookMut<RV>) -> Self {
        self.setup_fn = Some(setup_fn);
        self
    }

    pub fn use_agent_setup(mut self, setup_agent_fn: AgentHookMut<RV, V>) -> Self {
        self.setup_agent_fn = Some(setup_agent_fn);
        self
    }

    pub fn use_agent_behaviour(mut self, behaviour_fn: AgentHookMut<RV, V>) -> Self {
        self.agent_behaviour_fn = Some(behaviour_fn);
        self
    }

    pub fn use_agent_teardown(mut self, teardown_agent_fn: AgentHookMut<RV, V>) -> Self {
        self.teardown_agent_fn = Some(teardown_agent_fn);
        self
    }

    pub fn use_teardown(mut self, teardown_fn: GlobalHook<RV>) -> Self {
        self.teardown_fn = Some(teardown_fn);
        self
    }

    pub(crate) fn build(self) -> anyhow::Result<ScenarioDefinition<RV, V>> {
        let duration = self.cli.duration.map(Duration::from_secs).or(self.duration);
        let Some(duration) = duration else {
            anyhow::bail!("Scenario duration is not set; call with_duration or pass --duration");
        };

        let start_delay = self
            .cli
            .start_delay
            .map(Duration::from_secs)
            .or(self.start_delay)
            .unwrap_or(Duration::ZERO);

        let run_id = self.cli.run_id.unwrap_or_else(|| nanoid::nanoid!(8));

        Ok(ScenarioDefinition {
            name: self.name,
            run_id,
            schedule: self.schedule,
            duration,
            start_delay,
            no_progress: self.cli.no_progress,
            reporter: self.cli.reporter,
            thresholds: self.thresholds,
            setup_fn: self.setup_fn,
            setup_agent_fn: self.setup_agent_fn,
            agent_behaviour_fn: self.agent_behaviour_fn,
            teardown_agent_fn: self.teardown_agent_fn,
            teardown_fn: self.teardown_fn,
        })
    }
}
