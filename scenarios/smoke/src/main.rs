use proxy_gale_runner::prelude::*;
use std::sync::Arc;
use std::time::Duration;

/// A small fixed pool is enough to prove the deployment answers at all.
const SMOKE_AGENTS: usize = 10;
const DEFAULT_DURATION: Duration = Duration::from_secs(60);

const PROMPT: &str = "Hello, this is a load test message.";
const MAX_TOKENS: u32 = 100;

fn profile_config() -> ProxyConfig {
    ProxyConfig::resolve(DEFAULT_DURATION)
}

fn setup(ctx: &mut RunnerContext<ProxyRunnerContext>) -> HookResult {
    setup_proxy_client(ctx, profile_config())
}

fn agent_behaviour(ctx: &mut AgentContext<ProxyRunnerContext, ProxyAgentContext>) -> HookResult {
    check_health(ctx, true)?;

    ctx.pause(Duration::from_millis(500))?;

    let outcome = enqueue_prompt(ctx, PROMPT, MAX_TOKENS, true)?;

    let reporter = ctx.runner_context().reporter();
    reporter.add_rate(ERRORS_METRIC, !outcome.accepted);
    reporter.add_trend_ms(
        ENQUEUE_DURATION_METRIC,
        outcome.latency.as_secs_f64() * 1000.0,
    );

    ctx.pause(Duration::from_secs(1))
}

fn teardown(_ctx: Arc<RunnerContext<ProxyRunnerContext>>) -> HookResult {
    log::info!("Load test completed.");
    Ok(())
}

fn thresholds() -> ThresholdSet {
    ThresholdSet::new()
        .with(Threshold::p95_below(REQUEST_DURATION_METRIC, 500.0))
        .with(Threshold::p99_below(REQUEST_DURATION_METRIC, 1000.0))
        .with(Threshold::rate_below(REQUEST_FAILED_METRIC, 0.01))
        .with(Threshold::rate_below(ERRORS_METRIC, 0.05))
}

fn main() -> GaleResult<()> {
    let config = profile_config();

    let builder = ScenarioDefinitionBuilder::<ProxyRunnerContext, ProxyAgentContext>::new_with_init(
        env!("CARGO_PKG_NAME"),
    )
    .with_schedule(Schedule::ConstantAgents {
        agents: SMOKE_AGENTS,
    })
    .with_duration(config.duration)
    .with_thresholds(thresholds())
    .use_setup(setup)
    .use_agent_behaviour(agent_behaviour)
    .use_teardown(teardown);

    run(builder)?.into_result()
}
