use gale_core::prelude::ShutdownHandle;
use tokio::signal;

/// Stop the run on Ctrl-C so agents exit cleanly and the summary still
/// prints.
pub(crate) fn start_shutdown_listener(runtime: &tokio::runtime::Runtime) -> ShutdownHandle {
    let handle = ShutdownHandle::new();

    let signal_handle = handle.clone();
    runtime.spawn(async move {
        if let Err(e) = signal::ctrl_c().await {
            log::error!("Failed to listen for Ctrl-C: {e}");
            return;
        }
        log::info!("Received shutdown signal, stopping agents...");
        signal_handle.shutdown();
    });

    handle
}
