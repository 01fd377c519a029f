use crate::config::ProxyConfig;
use gale_runner::prelude::UserValuesConstraint;
use proxy_client_instrumented::prelude::ProxyClient;
use std::fmt;

/// Run-wide state for proxy profiles, populated by `setup_proxy_client` in
/// the global setup hook.
#[derive(Default)]
pub struct ProxyRunnerContext {
    pub config: Option<ProxyConfig>,
    pub client: Option<ProxyClient>,
}

impl fmt::Debug for ProxyRunnerContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The client holds the credential; keep it out of debug output.
        f.debug_struct("ProxyRunnerContext")
            .field("config", &self.config.as_ref().map(|c| &c.target_url))
            .field("client", &self.client.is_some())
            .finish()
    }
}

impl UserValuesConstraint for ProxyRunnerContext {}
