mod connection_state;
mod peer_session;
mod session_config;

pub use connection_state::ConnectionState;
pub use peer_session::{NegotiationRole, PeerSession};
pub use session_config::SessionConfig;
