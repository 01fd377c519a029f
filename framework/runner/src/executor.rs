use gale_core::prelude::{ShutdownHandle, ShutdownSignalError};
use std::future::Future;

/// Bridges the thread-per-agent world onto the shared tokio runtime.
#[derive(Debug)]
pub struct Executor {
    runtime: tokio::runtime::Runtime,
    shutdown_handle: ShutdownHandle,
}

impl Executor {
    pub(crate) fn new(runtime: tokio::runtime::Runtime, shutdown_handle: ShutdownHandle) -> Self {
        Self {
            runtime,
            shutdown_handle,
        }
    }

    /// Run async code in place, blocking the calling agent until it completes.
    ///
    /// The future is raced against the run's shutdown signal: once the run
    /// stops this returns a [ShutdownSignalError] instead of waiting, so a
    /// slow request cannot hold up the end of the run. Submit futures that
    /// tolerate being dropped mid-flight.
    pub fn execute_in_place<T>(
        &self,
        fut: impl Future<Output = anyhow::Result<T>>,
    ) -> anyhow::Result<T> {
        let mut shutdown_listener = self.shutdown_handle.new_listener();
        self.runtime.block_on(async move {
            tokio::select! {
                result = fut => result,
                _ = shutdown_listener.wait_for_shutdown() => {
                    Err(anyhow::anyhow!(ShutdownSignalError::default()))
                },
            }
        })
    }

    /// Submit async work to run in the background. It is not cancelled on
    /// shutdown, only when the runtime itself is dropped at the end of the
    /// run.
    pub fn spawn(&self, fut: impl Future<Output = ()> + Send + 'static) {
        self.runtime.spawn(fut);
    }
}
