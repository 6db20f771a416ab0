mod bail;
mod duration;
mod shutdown;

pub mod prelude {
    pub use crate::bail::AgentBailError;
    pub use crate::duration::{format_duration, parse_duration};
    pub use crate::shutdown::{DelegatedShutdownListener, ShutdownHandle, ShutdownSignalError};
}
