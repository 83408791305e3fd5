mod viewer_client;
mod viewer_command;
mod viewer_handle;
mod viewer_status;

pub use viewer_client::ViewerClient;
pub use viewer_command::ViewerCommand;
pub use viewer_handle::ViewerHandle;
pub use viewer_status::ViewerStatus;
