use tokio::sync::watch;

/// Owns the run-wide shutdown flag.
///
/// The handle can be cloned freely and handed to anything that may need to end
/// the run, such as the duration timer or the Ctrl-C listener. Listeners are
/// created with [ShutdownHandle::new_listener] and observe the flag without
/// being able to set it.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    sender: watch::Sender<bool>,
}

impl Default for ShutdownHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownHandle {
    pub fn new() -> Self {
        Self {
            sender: watch::channel(false).0,
        }
    }

    /// Tell every listener that the run is over. Calling this more than once
    /// is harmless.
    pub fn shutdown(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_shutdown(&self) -> bool {
        *self.sender.borrow()
    }

    pub fn new_listener(&self) -> ShutdownListener {
        ShutdownListener {
            receiver: self.sender.subscribe(),
        }
    }
}

/// A read-only view of the shutdown flag.
#[derive(Debug, Clone)]
pub struct ShutdownListener {
    receiver: watch::Receiver<bool>,
}

impl ShutdownListener {
    /// Point-in-time check, intended for use between behaviour cycles. Once
    /// this returns true it never returns false again.
    pub fn should_shutdown(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Wait until the run is shut down. Safe to race against other futures to
    /// cancel work in progress.
    pub async fn wait_for_shutdown(&mut self) {
        // An Err here means the handle was dropped without signalling, which
        // only happens when the runner itself is going away. Treat it the
        // same as a shutdown.
        let _ = self.receiver.wait_for(|stop| *stop).await;
    }
}

#[derive(derive_more::Error, derive_more::Display, Debug)]
pub struct ShutdownSignalError {
    msg: String,
}

impl Default for ShutdownSignalError {
    fn default() -> Self {
        Self {
            msg: "Execution cancelled by shutdown signal".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listener_sees_flag_set_before_subscribing() {
        let handle = ShutdownHandle::new();
        handle.shutdown();

        assert!(handle.new_listener().should_shutdown());
    }

    #[tokio::test]
    async fn wait_for_shutdown_wakes_every_listener() {
        let handle = ShutdownHandle::new();
        let mut first = handle.new_listener();
        let mut second = handle.new_listener();

        assert!(!first.should_shutdown());

        handle.shutdown();
        first.wait_for_shutdown().await;
        second.wait_for_shutdown().await;

        assert!(first.should_shutdown());
        assert!(second.should_shutdown());
    }
}
