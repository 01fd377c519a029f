/// Return this error from an agent's behaviour hook to stop that agent early.
///
/// Use this when an agent hits a condition it cannot recover from, such as the
/// target rejecting its credentials, while the remaining agents should keep
/// driving load at the service.
#[derive(derive_more::Error, derive_more::Display, Debug)]
pub struct AgentBailError {
    msg: String,
}

impl Default for AgentBailError {
    fn default() -> Self {
        Self {
            msg: "Agent stopped early".to_string(),
        }
    }
}
