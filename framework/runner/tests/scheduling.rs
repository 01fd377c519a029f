use gale_runner::prelude::{
    run, AgentContext, GaleScenarioCli, HookResult, ReporterOpt, ScenarioDefinitionBuilder,
    Schedule, Threshold, ThresholdSet, UserValuesConstraint, DROPPED_ITERATIONS_METRIC,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Default, Debug)]
struct NoValues {}

impl UserValuesConstraint for NoValues {}

fn sample_cli_cfg() -> GaleScenarioCli {
    GaleScenarioCli {
        no_progress: true,
        start_delay: None,
        duration: None,
        reporter: ReporterOpt::Noop,
        run_id: None,
    }
}

static CONSTANT_ITERATIONS: AtomicUsize = AtomicUsize::new(0);

#[test]
fn constant_agents_loop_the_behaviour_back_to_back() {
    fn behaviour(ctx: &mut AgentContext<NoValues, NoValues>) -> HookResult {
        CONSTANT_ITERATIONS.fetch_add(1, Ordering::Relaxed);
        ctx.pause(Duration::from_millis(50))
    }

    let scenario =
        ScenarioDefinitionBuilder::<NoValues, NoValues>::new("constant_agents", sample_cli_cfg())
            .with_schedule(Schedule::ConstantAgents { agents: 4 })
            .with_duration(Duration::from_secs(1))
            .use_agent_behaviour(behaviour);

    let verdict = run(scenario).unwrap();
    assert!(verdict.passed());

    // 4 agents cycling every ~50ms for 1s: comfortably more than two cycles
    // per agent, even on a slow machine.
    let iterations = CONSTANT_ITERATIONS.load(Ordering::Relaxed);
    assert!(iterations >= 8, "only {iterations} iterations ran");
}

static PACED_ITERATIONS: AtomicUsize = AtomicUsize::new(0);

#[test]
fn arrival_rate_paces_iteration_starts() {
    fn behaviour(_ctx: &mut AgentContext<NoValues, NoValues>) -> HookResult {
        PACED_ITERATIONS.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    let scenario =
        ScenarioDefinitionBuilder::<NoValues, NoValues>::new("arrival_rate", sample_cli_cfg())
            .with_schedule(Schedule::ConstantArrivalRate {
                rate_per_sec: 20,
                preallocated_agents: 4,
                max_agents: 8,
            })
            .with_duration(Duration::from_secs(2))
            .use_agent_behaviour(behaviour);

    let verdict = run(scenario).unwrap();
    assert!(verdict.passed());

    // 20 starts per second for 2s. Wide margins: the schedule self-corrects
    // but test machines stall.
    let iterations = PACED_ITERATIONS.load(Ordering::Relaxed);
    assert!(
        (20..=60).contains(&iterations),
        "{iterations} iterations for a 20/s rate over 2s"
    );
}

static SLOW_ITERATIONS: AtomicUsize = AtomicUsize::new(0);

#[test]
fn arrival_rate_drops_iterations_past_the_pool_ceiling() {
    fn behaviour(_ctx: &mut AgentContext<NoValues, NoValues>) -> HookResult {
        SLOW_ITERATIONS.fetch_add(1, Ordering::Relaxed);
        std::thread::sleep(Duration::from_millis(400));
        Ok(())
    }

    // 50 starts per second against two agents that each take 400ms per
    // iteration: the pool saturates immediately and the pacer has to shed
    // almost every tick.
    let scenario =
        ScenarioDefinitionBuilder::<NoValues, NoValues>::new("ceiling", sample_cli_cfg())
            .with_schedule(Schedule::ConstantArrivalRate {
                rate_per_sec: 50,
                preallocated_agents: 1,
                max_agents: 2,
            })
            .with_duration(Duration::from_secs(1))
            .with_thresholds(
                ThresholdSet::new().with(Threshold::count_at_least(DROPPED_ITERATIONS_METRIC, 1)),
            )
            .use_agent_behaviour(behaviour);

    let verdict = run(scenario).unwrap();
    assert!(verdict.passed(), "no dropped iterations were recorded");

    let iterations = SLOW_ITERATIONS.load(Ordering::Relaxed);
    assert!(iterations <= 10, "{iterations} iterations from 2 slow agents");
}

#[test]
fn threshold_violation_fails_the_verdict() {
    fn behaviour(ctx: &mut AgentContext<NoValues, NoValues>) -> HookResult {
        let reporter = ctx.runner_context().reporter();
        reporter.add_rate("errors", true);

        // One sample is enough to decide the verdict.
        ctx.runner_context().force_stop_scenario();
        Ok(())
    }

    let scenario =
        ScenarioDefinitionBuilder::<NoValues, NoValues>::new("violation", sample_cli_cfg())
            .with_duration(Duration::from_secs(5))
            .with_thresholds(ThresholdSet::new().with(Threshold::rate_below("errors", 0.05)))
            .use_agent_behaviour(behaviour);

    let verdict = run(scenario).unwrap();

    assert!(!verdict.passed());
    assert!(verdict.into_result().is_err());
}
