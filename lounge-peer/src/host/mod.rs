mod host_command;
mod host_handle;
mod host_orchestrator;
mod media_opts;
mod viewer_registry;

pub use host_command::HostCommand;
pub use host_handle::HostHandle;
pub use host_orchestrator::HostOrchestrator;
pub use media_opts::MediaOpts;
pub use viewer_registry::{ViewerEntry, ViewerInfo, ViewerRegistry};
