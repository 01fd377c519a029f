//! Long-duration steady-rate profile for surfacing leaks and slow
//! degradation: memory growth, connection exhaustion, widening latency.

use proxy_gale_runner::prelude::*;
use std::sync::Arc;
use std::time::Duration;

/// A soak sustains its rate through latency spikes, so the pool bounds are
/// double those of the rps profile.
const PREALLOCATED_AGENTS: usize = 100;
const MAX_AGENTS: usize = 200;

const DEFAULT_DURATION: Duration = Duration::from_secs(2 * 60 * 60);

const MAX_TOKENS: u32 = 50;

fn profile_config() -> ProxyConfig {
    ProxyConfig::resolve(DEFAULT_DURATION)
}

fn setup(ctx: &mut RunnerContext<ProxyRunnerContext>) -> HookResult {
    log::info!("=== SOAK TEST STARTING ===");
    setup_proxy_client(ctx, profile_config())
}

fn agent_behaviour(ctx: &mut AgentContext<ProxyRunnerContext, ProxyAgentContext>) -> HookResult {
    let reporter = ctx.runner_context().reporter();
    reporter.add_counter(TOTAL_REQUESTS_METRIC, 1);

    // Status-only health check; over hours the body shape matters less than
    // whether the endpoint keeps answering.
    let health_ok = check_health(ctx, false)?;
    reporter.add_rate(ERRORS_METRIC, !health_ok);

    ctx.pause(Duration::from_millis(100))?;

    let prompt = format!(
        "Soak test request at {}",
        chrono::Utc::now().timestamp_millis()
    );
    let outcome = enqueue_prompt(ctx, &prompt, MAX_TOKENS, false)?;
    reporter.add_rate(ERRORS_METRIC, !outcome.accepted);

    ctx.pause(Duration::from_millis(500))
}

fn teardown(_ctx: Arc<RunnerContext<ProxyRunnerContext>>) -> HookResult {
    log::info!("=== SOAK TEST COMPLETE ===");
    Ok(())
}

fn thresholds() -> ThresholdSet {
    // Latency and failure bounds are relaxed relative to the short profiles
    // to absorb long-duration variance.
    ThresholdSet::new()
        .with(Threshold::p95_below(REQUEST_DURATION_METRIC, 1000.0))
        .with(Threshold::rate_below(REQUEST_FAILED_METRIC, 0.02))
        .with(Threshold::rate_below(ERRORS_METRIC, 0.05))
}

fn main() -> GaleResult<()> {
    let config = profile_config();

    let builder = ScenarioDefinitionBuilder::<ProxyRunnerContext, ProxyAgentContext>::new_with_init(
        env!("CARGO_PKG_NAME"),
    )
    .with_schedule(Schedule::ConstantArrivalRate {
        rate_per_sec: config.rate_per_sec,
        preallocated_agents: PREALLOCATED_AGENTS,
        max_agents: MAX_AGENTS,
    })
    .with_duration(config.duration)
    .with_thresholds(thresholds())
    .use_setup(setup)
    .use_agent_behaviour(agent_behaviour)
    .use_teardown(teardown);

    run(builder)?.into_result()
}
