use crate::config::ProxyConfig;
use crate::context::ProxyAgentContext;
use crate::runner_context::ProxyRunnerContext;
use anyhow::Context as _;
use gale_runner::prelude::{
    AgentContext, GaleResult, HookResult, RunnerContext, ShutdownSignalError,
    UserValuesConstraint,
};
use proxy_client_instrumented::prelude::{ApiResponse, ProxyClient};
use std::time::{Duration, Instant};

/// Rate metric fed one sample per workload outcome; the threshold sets bound
/// its rate of `true` (failed) samples.
pub const ERRORS_METRIC: &str = "errors";

/// Trend metric for enqueue latency, recorded by the smoke and rps profiles.
pub const ENQUEUE_DURATION_METRIC: &str = "enqueue_duration";

/// Counter incremented once per iteration by the soak profile.
pub const TOTAL_REQUESTS_METRIC: &str = "total_requests";

pub const HEALTH_PATH: &str = "/health";
pub const ENQUEUE_PATH: &str = "/api/enqueue";

/// Collapsed operation name for status polls, which would otherwise make a
/// separate operation out of every request id.
pub const REQUEST_STATUS_OPERATION: &str = "/api/request/[id]";

/// Builds the proxy client from the resolved configuration and stores both in
/// the runner context, logging the parameters for operator visibility. Call
/// this from the global setup hook.
pub fn setup_proxy_client(
    ctx: &mut RunnerContext<ProxyRunnerContext>,
    config: ProxyConfig,
) -> HookResult {
    log::info!("Target URL: {}", config.target_url);
    log::info!("Duration: {}", humantime::format_duration(config.duration));
    log::info!("RPS: {}", config.rate_per_sec);

    let client = ProxyClient::new(&config.target_url, &config.api_key, ctx.reporter())?;

    let values = ctx.get_mut();
    values.client = Some(client);
    values.config = Some(config);

    Ok(())
}

fn client<SV: UserValuesConstraint>(
    ctx: &AgentContext<ProxyRunnerContext, ProxyAgentContext<SV>>,
) -> GaleResult<ProxyClient> {
    ctx.runner_context()
        .get()
        .client
        .clone()
        .context("Proxy client is not set up; call setup_proxy_client in the scenario setup")
}

/// Reduces transport failures to `None`, keeping the shutdown signal as the
/// only error that escapes a behaviour.
fn checked_response(response: GaleResult<ApiResponse>) -> GaleResult<Option<ApiResponse>> {
    match response {
        Ok(response) => Ok(Some(response)),
        Err(e) if e.is::<ShutdownSignalError>() => Err(e),
        Err(e) => {
            log::debug!("Request failed: {e:?}");
            Ok(None)
        }
    }
}

/// GET `/health` and record the outcome as checks.
///
/// When `require_status_field` is set, the body must also decode as JSON with
/// a `status` field; this is how the smoke profile distinguishes a healthy
/// response from a lucky 200. Returns whether every check passed.
pub fn check_health<SV: UserValuesConstraint>(
    ctx: &mut AgentContext<ProxyRunnerContext, ProxyAgentContext<SV>>,
    require_status_field: bool,
) -> GaleResult<bool> {
    let client = client(ctx)?;
    let reporter = ctx.runner_context().reporter();

    let response = ctx
        .runner_context()
        .executor()
        .execute_in_place(async move { client.get(HEALTH_PATH).await });
    let response = checked_response(response)?;

    let mut ok = reporter.add_check(
        "health: status 200",
        response.as_ref().is_some_and(|r| r.status_is(200)),
    );
    if require_status_field {
        ok &= reporter.add_check(
            "health: has status field",
            response.as_ref().is_some_and(|r| r.has_json_field("status")),
        );
    }

    Ok(ok)
}

/// Outcome of one enqueue request.
#[derive(Debug)]
pub struct EnqueueOutcome {
    /// Every required check passed.
    pub accepted: bool,
    /// Wall-clock latency of the enqueue call.
    pub latency: Duration,
    /// The id assigned by the proxy, when the body carried one.
    pub request_id: Option<String>,
}

/// POST a prompt to `/api/enqueue` and record the status check.
///
/// The request is accepted on a 200 or 202. With `require_request_id` the
/// response body must also carry a `request_id` field; a body that fails to
/// decode fails that check rather than the iteration.
pub fn enqueue_prompt<SV: UserValuesConstraint>(
    ctx: &mut AgentContext<ProxyRunnerContext, ProxyAgentContext<SV>>,
    prompt: &str,
    max_tokens: u32,
    require_request_id: bool,
) -> GaleResult<EnqueueOutcome> {
    let client = client(ctx)?;
    let reporter = ctx.runner_context().reporter();

    let body = serde_json::json!({
        "prompt": prompt,
        "max_tokens": max_tokens,
    });

    let started = Instant::now();
    let response = ctx
        .runner_context()
        .executor()
        .execute_in_place(async move { client.post_json(ENQUEUE_PATH, &body).await });
    let latency = started.elapsed();
    let response = checked_response(response)?;

    let mut accepted = reporter.add_check(
        "enqueue: status 200 or 202",
        response.as_ref().is_some_and(|r| r.status_in(&[200, 202])),
    );

    let request_id = response
        .as_ref()
        .and_then(|r| r.json_field_str("request_id"));
    if require_request_id {
        accepted &= reporter.add_check("enqueue: has request_id", request_id.is_some());
    }

    Ok(EnqueueOutcome {
        accepted,
        latency,
        request_id,
    })
}

/// Poll `/api/request/{id}` until it answers 200, up to `max_attempts` tries
/// spaced a second apart.
///
/// Polling is best effort: an exhausted poll answers `false` but is not a
/// failed check, since slow completion is not a proxy fault.
pub fn poll_request_status<SV: UserValuesConstraint>(
    ctx: &mut AgentContext<ProxyRunnerContext, ProxyAgentContext<SV>>,
    request_id: &str,
    max_attempts: usize,
) -> GaleResult<bool> {
    let path = format!("/api/request/{request_id}");

    for attempt in 1..=max_attempts {
        let client = client(ctx)?;
        let poll_path = path.clone();
        let response = ctx.runner_context().executor().execute_in_place(async move {
            client.get_authed(REQUEST_STATUS_OPERATION, &poll_path).await
        });

        if let Some(response) = checked_response(response)? {
            if response.status_is(200) {
                return Ok(true);
            }
        }

        if attempt < max_attempts {
            ctx.pause(Duration::from_secs(1))?;
        }
    }

    Ok(false)
}
