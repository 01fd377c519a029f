use crate::cli::ReporterOpt;
use crate::context::{AgentContext, RunnerContext, UserValuesConstraint};
use crate::definition::{AgentHookMut, ScenarioDefinition, ScenarioDefinitionBuilder};
use crate::executor::Executor;
use crate::monitor::start_monitor;
use crate::progress::start_progress;
use crate::schedule::{
    ArrivalSchedule, Schedule, DROPPED_ITERATIONS_METRIC, PERMIT_POLL_INTERVAL,
};
use crate::shutdown::start_shutdown_listener;
use anyhow::Context as _;
use gale_core::prelude::{AgentBailError, ShutdownHandle, ShutdownSignalError};
use gale_instruments::{ReportConfig, Reporter, RunVerdict};
use parking_lot::Mutex;
use std::sync::mpsc::{Receiver, RecvTimeoutError, TrySendError};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Execute a scenario to completion and evaluate its thresholds.
///
/// Returns the verdict rather than an error on threshold violations so the
/// caller decides how to exit; see [RunVerdict::into_result].
pub fn run<RV: UserValuesConstraint, V: UserValuesConstraint>(
    builder: ScenarioDefinitionBuilder<RV, V>,
) -> anyhow::Result<RunVerdict> {
    let definition = builder.build()?;

    log::info!(
        "Running scenario {} (run id {})",
        definition.name,
        definition.run_id
    );

    let runtime = tokio::runtime::Runtime::new().context("Failed to create Tokio runtime")?;
    let shutdown_handle = start_shutdown_listener(&runtime);
    let executor = Arc::new(Executor::new(runtime, shutdown_handle.clone()));
    let reporter = Arc::new(match definition.reporter {
        ReporterOpt::Summary => ReportConfig::default().enable_summary().init(),
        ReporterOpt::Noop => ReportConfig::default().init(),
    });

    let mut runner_context = RunnerContext::new(
        executor,
        reporter.clone(),
        shutdown_handle.clone(),
        definition.run_id.clone(),
    );

    if let Some(setup_fn) = definition.setup_fn {
        setup_fn(&mut runner_context)?;
    }

    if !definition.start_delay.is_zero() {
        log::info!(
            "Waiting {}s before starting agents",
            definition.start_delay.as_secs()
        );
        // A Ctrl-C during the delay cancels the sleep; the agents then see
        // the shutdown flag immediately and exit without working.
        let delay = definition.start_delay;
        let _ = runner_context.executor().execute_in_place(async move {
            tokio::time::sleep(delay).await;
            Ok(())
        });
    }

    if !definition.no_progress {
        start_progress(definition.duration, shutdown_handle.new_listener());
    }

    // The duration timer is armed only now so a start delay does not eat into
    // the run itself.
    {
        let timer_handle = shutdown_handle.clone();
        let duration = definition.duration;
        runner_context.executor().spawn(async move {
            tokio::time::sleep(duration).await;
            timer_handle.shutdown();
        });
    }

    // Agents are about to start; watch for the runner itself becoming the
    // bottleneck.
    start_monitor(shutdown_handle.new_listener());

    let runner_context = Arc::new(runner_context);

    let handles = match definition.schedule {
        Schedule::ConstantAgents { agents } => {
            spawn_constant_agents(agents, &definition, &runner_context, &shutdown_handle)?
        }
        Schedule::ConstantArrivalRate {
            rate_per_sec,
            preallocated_agents,
            max_agents,
        } => spawn_arrival_rate_agents(
            rate_per_sec,
            preallocated_agents,
            max_agents,
            &definition,
            &runner_context,
            &shutdown_handle,
            reporter.clone(),
        )?,
    };

    for handle in handles {
        handle
            .join()
            .map_err(|e| anyhow::anyhow!("Error joining agent thread: {e:?}"))?;
    }

    // Every agent is done, which may be well before the duration timer when
    // they all bailed. Release the support threads before reporting.
    shutdown_handle.shutdown();

    if let Some(teardown_fn) = definition.teardown_fn {
        // The teardown hook is best effort; reporting still has to happen.
        if let Err(e) = teardown_fn(runner_context.clone()) {
            log::error!("Teardown failed: {e:?}");
        }
    }

    reporter.finalize();

    let verdict = definition.thresholds.evaluate(reporter.store());
    if !verdict.is_empty() && matches!(definition.reporter, ReporterOpt::Summary) {
        println!("\nThresholds\n{verdict}");
    }

    Ok(verdict)
}

fn spawn_constant_agents<RV: UserValuesConstraint, V: UserValuesConstraint>(
    agents: usize,
    definition: &ScenarioDefinition<RV, V>,
    runner_context: &Arc<RunnerContext<RV>>,
    shutdown_handle: &ShutdownHandle,
) -> anyhow::Result<Vec<JoinHandle<()>>> {
    (0..agents)
        .map(|agent_index| {
            let runner_context = runner_context.clone();
            let setup_agent_fn = definition.setup_agent_fn;
            let behaviour_fn = definition.agent_behaviour_fn;
            let teardown_agent_fn = definition.teardown_agent_fn;
            let cycle_shutdown = shutdown_handle.new_listener();
            let delegated_listener = shutdown_handle.new_listener();
            let agent_id = format!("agent-{agent_index}");

            std::thread::Builder::new()
                .name(agent_id.clone())
                .spawn(move || {
                    let mut context =
                        AgentContext::new(agent_id, runner_context, delegated_listener);

                    if !run_agent_setup(&mut context, setup_agent_fn) {
                        return;
                    }

                    if let Some(behaviour_fn) = behaviour_fn {
                        loop {
                            if cycle_shutdown.should_shutdown() {
                                log::debug!("Stopping agent {}", context.agent_id());
                                break;
                            }

                            if !run_behaviour_cycle(&mut context, behaviour_fn) {
                                break;
                            }
                        }
                    }

                    run_agent_teardown(&mut context, teardown_agent_fn);
                })
                .context("Failed to spawn agent thread")
        })
        .collect()
}

#[allow(clippy::too_many_arguments)]
fn spawn_arrival_rate_agents<RV: UserValuesConstraint, V: UserValuesConstraint>(
    rate_per_sec: u32,
    preallocated_agents: usize,
    max_agents: usize,
    definition: &ScenarioDefinition<RV, V>,
    runner_context: &Arc<RunnerContext<RV>>,
    shutdown_handle: &ShutdownHandle,
    reporter: Arc<Reporter>,
) -> anyhow::Result<Vec<JoinHandle<()>>> {
    let max_agents = max_agents.max(1);
    let preallocated_agents = preallocated_agents.clamp(1, max_agents);

    // Permits rendezvous with an idle agent: a zero-capacity channel makes
    // "is anyone idle" observable through try_send.
    let (permit_tx, permit_rx) = std::sync::mpsc::sync_channel::<()>(0);
    let permit_rx = Arc::new(Mutex::new(permit_rx));

    let setup_agent_fn = definition.setup_agent_fn;
    let behaviour_fn = definition.agent_behaviour_fn;
    let teardown_agent_fn = definition.teardown_agent_fn;

    let mut handles = Vec::with_capacity(preallocated_agents + 1);
    for agent_index in 0..preallocated_agents {
        handles.push(spawn_permit_worker(
            agent_index,
            runner_context.clone(),
            shutdown_handle,
            setup_agent_fn,
            behaviour_fn,
            teardown_agent_fn,
            permit_rx.clone(),
        )?);
    }

    // The pacer owns the sending side and grows the pool when every agent is
    // busy at tick time.
    let pacer = {
        let runner_context = runner_context.clone();
        let shutdown_handle = shutdown_handle.clone();
        let shutdown = shutdown_handle.new_listener();

        std::thread::Builder::new()
            .name("pacer".to_string())
            .spawn(move || {
                const GROWTH_HANDOFF_INTERVAL: Duration = Duration::from_millis(5);
                const GROWTH_HANDOFF_ATTEMPTS: usize = 20;

                let mut pool_size = preallocated_agents;
                let mut grown: Vec<JoinHandle<()>> = Vec::new();
                let mut schedule = ArrivalSchedule::new(Instant::now(), rate_per_sec);

                'pacing: loop {
                    schedule.wait_for_next_tick();

                    if shutdown.should_shutdown() {
                        break;
                    }

                    match permit_tx.try_send(()) {
                        Ok(()) => {}
                        Err(TrySendError::Disconnected(())) => break,
                        Err(TrySendError::Full(())) => {
                            if pool_size >= max_agents {
                                reporter.add_counter(DROPPED_ITERATIONS_METRIC, 1);
                                log::warn!(
                                    "All {max_agents} agents are busy, dropping an iteration"
                                );
                                continue;
                            }

                            match spawn_permit_worker(
                                pool_size,
                                runner_context.clone(),
                                &shutdown_handle,
                                setup_agent_fn,
                                behaviour_fn,
                                teardown_agent_fn,
                                permit_rx.clone(),
                            ) {
                                Ok(handle) => {
                                    grown.push(handle);
                                    pool_size += 1;
                                }
                                Err(e) => {
                                    log::error!("Failed to grow agent pool: {e:?}");
                                    continue;
                                }
                            }

                            // Hand the permit over once the fresh agent
                            // reaches the channel; give up rather than
                            // stalling the tick schedule.
                            let mut delivered = false;
                            for _ in 0..GROWTH_HANDOFF_ATTEMPTS {
                                match permit_tx.try_send(()) {
                                    Ok(()) => {
                                        delivered = true;
                                        break;
                                    }
                                    Err(TrySendError::Full(())) => {
                                        std::thread::sleep(GROWTH_HANDOFF_INTERVAL)
                                    }
                                    Err(TrySendError::Disconnected(())) => break 'pacing,
                                }
                            }
                            if !delivered {
                                reporter.add_counter(DROPPED_ITERATIONS_METRIC, 1);
                            }
                        }
                    }
                }

                // Dropping the sender releases any agent still waiting for a
                // permit.
                drop(permit_tx);
                for handle in grown {
                    let _ = handle.join();
                }
            })
            .context("Failed to spawn pacer thread")?
    };
    handles.push(pacer);

    Ok(handles)
}

fn spawn_permit_worker<RV: UserValuesConstraint, V: UserValuesConstraint>(
    agent_index: usize,
    runner_context: Arc<RunnerContext<RV>>,
    shutdown_handle: &ShutdownHandle,
    setup_agent_fn: Option<AgentHookMut<RV, V>>,
    behaviour_fn: Option<AgentHookMut<RV, V>>,
    teardown_agent_fn: Option<AgentHookMut<RV, V>>,
    permit_rx: Arc<Mutex<Receiver<()>>>,
) -> anyhow::Result<JoinHandle<()>> {
    let cycle_shutdown = shutdown_handle.new_listener();
    let delegated_listener = shutdown_handle.new_listener();
    let agent_id = format!("agent-{agent_index}");

    std::thread::Builder::new()
        .name(agent_id.clone())
        .spawn(move || {
            let mut context = AgentContext::new(agent_id, runner_context, delegated_listener);

            if !run_agent_setup(&mut context, setup_agent_fn) {
                return;
            }

            loop {
                if cycle_shutdown.should_shutdown() {
                    log::debug!("Stopping agent {}", context.agent_id());
                    break;
                }

                let permit = permit_rx.lock().recv_timeout(PERMIT_POLL_INTERVAL);
                match permit {
                    Ok(()) => {
                        if let Some(behaviour_fn) = behaviour_fn {
                            if !run_behaviour_cycle(&mut context, behaviour_fn) {
                                break;
                            }
                        }
                    }
                    Err(RecvTimeoutError::Timeout) => {}
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }

            run_agent_teardown(&mut context, teardown_agent_fn);
        })
        .context("Failed to spawn agent thread")
}

/// Returns false when the agent must not proceed to its behaviour.
fn run_agent_setup<RV: UserValuesConstraint, V: UserValuesConstraint>(
    context: &mut AgentContext<RV, V>,
    setup_agent_fn: Option<AgentHookMut<RV, V>>,
) -> bool {
    if let Some(setup_agent_fn) = setup_agent_fn {
        if let Err(e) = setup_agent_fn(context) {
            log::error!("Agent setup failed for {}: {e:?}", context.agent_id());
            return false;
        }
    }

    true
}

/// Runs one behaviour cycle. Returns false when the agent should stop
/// looping.
fn run_behaviour_cycle<RV: UserValuesConstraint, V: UserValuesConstraint>(
    context: &mut AgentContext<RV, V>,
    behaviour_fn: AgentHookMut<RV, V>,
) -> bool {
    match behaviour_fn(context) {
        Ok(()) => true,
        // Expected when the run stops mid-call; the shutdown check at the top
        // of the loop ends the agent.
        Err(e) if e.is::<ShutdownSignalError>() => true,
        Err(e) if e.is::<AgentBailError>() => {
            log::info!("Agent {} is bailing out", context.agent_id());
            false
        }
        Err(e) => {
            log::error!("Agent behaviour failed: {e:?}");
            true
        }
    }
}

fn run_agent_teardown<RV: UserValuesConstraint, V: UserValuesConstraint>(
    context: &mut AgentContext<RV, V>,
    teardown_agent_fn: Option<AgentHookMut<RV, V>>,
) {
    if let Some(teardown_agent_fn) = teardown_agent_fn {
        if let Err(e) = teardown_agent_fn(context) {
            log::error!("Agent teardown failed for {}: {e:?}", context.agent_id());
        }
    }
}
