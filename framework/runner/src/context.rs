use crate::executor::Executor;
use gale_core::prelude::{ShutdownHandle, ShutdownListener};
use gale_instruments::Reporter;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

/// Values that scenarios hang off the runner and agent contexts must be
/// plain data that every agent thread can see.
pub trait UserValuesConstraint: Default + Debug + Send + Sync + 'static {}

impl UserValuesConstraint for () {}

/// Run-wide state shared by all agents.
///
/// `RV` is the scenario's own shared state, populated in the global setup
/// hook and read-only from then on.
pub struct RunnerContext<RV: UserValuesConstraint> {
    executor: Arc<Executor>,
    reporter: Arc<Reporter>,
    shutdown_handle: ShutdownHandle,
    run_id: String,
    value: RV,
}

impl<RV: UserValuesConstraint> RunnerContext<RV> {
    pub(crate) fn new(
        executor: Arc<Executor>,
        reporter: Arc<Reporter>,
        shutdown_handle: ShutdownHandle,
        run_id: String,
    ) -> Self {
        Self {
            executor,
            reporter,
            shutdown_handle,
            run_id,
            value: Default::default(),
        }
    }

    pub fn executor(&self) -> &Arc<Executor> {
        &self.executor
    }

    pub fn reporter(&self) -> Arc<Reporter> {
        self.reporter.clone()
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// End the whole run early, for example when the target is clearly down
    /// and there is no point loading it further.
    pub fn force_stop_scenario(&self) {
        self.shutdown_handle.shutdown();
    }

    pub fn get(&self) -> &RV {
        &self.value
    }

    pub fn get_mut(&mut self) -> &mut RV {
        &mut self.value
    }
}

/// Per-agent state, owned by a single agent thread.
pub struct AgentContext<RV: UserValuesConstraint, V: UserValuesConstraint> {
    agent_id: String,
    runner_context: Arc<RunnerContext<RV>>,
    shutdown_listener: ShutdownListener,
    value: V,
}

impl<RV: UserValuesConstraint, V: UserValuesConstraint> AgentContext<RV, V> {
    pub(crate) fn new(
        agent_id: String,
        runner_context: Arc<RunnerContext<RV>>,
        shutdown_listener: ShutdownListener,
    ) -> Self {
        Self {
            agent_id,
            runner_context,
            shutdown_listener,
            value: Default::default(),
        }
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    pub fn runner_context(&self) -> &Arc<RunnerContext<RV>> {
        &self.runner_context
    }

    /// For behaviour implementations that want to react to shutdown
    /// themselves rather than relying on the behaviour loop.
    pub fn shutdown_listener(&mut self) -> &mut ShutdownListener {
        &mut self.shutdown_listener
    }

    /// Hold this agent for `duration`. Wakes early with a shutdown error when
    /// the run stops, so a paused agent does not outlive the duration timer.
    pub fn pause(&self, duration: Duration) -> anyhow::Result<()> {
        self.runner_context.executor().execute_in_place(async move {
            tokio::time::sleep(duration).await;
            Ok(())
        })
    }

    pub fn get(&self) -> &V {
        &self.value
    }

    pub fn get_mut(&mut self) -> &mut V {
        &mut self.value
    }
}
