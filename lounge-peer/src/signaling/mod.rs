mod relay_connector;
mod relay_event;
mod signaling_client;
mod signaling_output;
mod ws_connector;

pub use relay_connector::{RelayConnector, RelayLink};
pub use relay_event::{RelayEvent, RelayEvents};
pub use signaling_client::SignalingClient;
pub use signaling_output::SignalingOutput;
pub use ws_connector::WsConnector;
