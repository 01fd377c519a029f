//! Simulates a typical API user: check the service, submit a prompt, then
//! poll for the result before thinking about the next request.

use proxy_gale_runner::prelude::*;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_DURATION: Duration = Duration::from_secs(60);

const PROMPT: &str = "Load test prompt";
const MAX_TOKENS: u32 = 50;
const POLL_ATTEMPTS: usize = 3;

fn profile_config() -> ProxyConfig {
    ProxyConfig::resolve(DEFAULT_DURATION)
}

fn setup(ctx: &mut RunnerContext<ProxyRunnerContext>) -> HookResult {
    setup_proxy_client(ctx, profile_config())
}

fn agent_behaviour(ctx: &mut AgentContext<ProxyRunnerContext, ProxyAgentContext>) -> HookResult {
    check_health(ctx, true)?;

    let outcome = enqueue_prompt(ctx, PROMPT, MAX_TOKENS, true)?;

    let reporter = ctx.runner_context().reporter();
    reporter.add_rate(ERRORS_METRIC, !outcome.accepted);

    if let Some(request_id) = outcome.request_id.as_deref() {
        poll_request_status(ctx, request_id, POLL_ATTEMPTS)?;
    }

    // Think time between user actions.
    let wait = rand::thread_rng().gen_range(1.0..3.0);
    ctx.pause(Duration::from_secs_f64(wait))
}

fn teardown(_ctx: Arc<RunnerContext<ProxyRunnerContext>>) -> HookResult {
    log::info!("Load test completed.");
    Ok(())
}

fn thresholds() -> ThresholdSet {
    ThresholdSet::new()
        .with(Threshold::rate_below(REQUEST_FAILED_METRIC, 0.05))
        .with(Threshold::rate_below(ERRORS_METRIC, 0.05))
}

fn main() -> GaleResult<()> {
    let config = profile_config();

    let builder = ScenarioDefinitionBuilder::<ProxyRunnerContext, ProxyAgentContext>::new_with_init(
        env!("CARGO_PKG_NAME"),
    )
    .with_schedule(Schedule::ConstantAgents {
        agents: config.users,
    })
    .with_duration(config.duration)
    .with_thresholds(thresholds())
    .use_setup(setup)
    .use_agent_behaviour(agent_behaviour)
    .use_teardown(teardown);

    run(builder)?.into_result()
}
