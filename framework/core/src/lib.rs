mod bail;
mod shutdown;

pub mod prelude {
    pub use crate::bail::AgentBailError;
    pub use crate::shutdown::{ShutdownHandle, ShutdownListener, ShutdownSignalError};
}
