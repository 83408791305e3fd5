mod http;
mod relay_service;
mod ws_handler;

pub use http::{HostInfo, host_info, router, serve};
pub use relay_service::{RelayConnection, RelayService};
pub use ws_handler::ws_handler;
