use lounge_core::Identity;
use tokio::sync::mpsc;

/// Relay lifecycle events, in relay order.
#[derive(Debug, Clone, PartialEq)]
pub enum RelayEvent {
    /// The relay acknowledged `announce`.
    Registered,
    /// A viewer asks the host for a session.
    CreateConnectionRequest(Identity),
    /// Another participant already holds the host slot.
    HostAlreadyExists(Identity),
    Closed,
}

pub type RelayEvents = mpsc::UnboundedReceiver<RelayEvent>;
