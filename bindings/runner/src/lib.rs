mod common;
mod config;
mod context;
mod runner_context;

pub mod prelude {
    /// Common operations for Claude Proxy profiles.
    ///
    /// This is a good place to start when writing a new profile.
    pub use crate::common::*;

    pub use crate::config::ProxyConfig;
    pub use crate::context::ProxyAgentContext;
    pub use crate::runner_context::ProxyRunnerContext;

    /// Re-export of the `gale_runner` prelude so profiles can depend on a
    /// single crate.
    pub use gale_runner::prelude::*;

    /// Re-export of the instrumented client for convenience.
    pub use proxy_client_instrumented::prelude::*;
}
