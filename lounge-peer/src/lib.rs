pub mod behavior;
mod connect;
pub mod error;
pub mod host;
pub mod media;
pub mod router;
pub mod session;
pub mod signaling;
pub mod transport;
pub mod viewer;

pub use behavior::{NoopBehavior, ParticipantBehavior};
pub use error::{ConnectError, SendError, SessionError, SignalingError};
pub use host::{
    HostCommand, HostHandle, HostOrchestrator, MediaOpts, ViewerEntry, ViewerInfo, ViewerRegistry,
};
pub use media::{
    LocalTrack, MediaSource, RemoteTrack, SinkInfo, SinkRegistry, StaticMedia, TrackSource,
};
pub use session::{ConnectionState, NegotiationRole, PeerSession, SessionConfig};
pub use signaling::{
    RelayConnector, RelayEvent, RelayEvents, RelayLink, SignalingClient, SignalingOutput,
    WsConnector,
};
pub use transport::{
    PeerTransport, RtcTransport, RtcTransportFactory, SessionKey, TransportConfig, TransportEvent,
    TransportFactory,
};
pub use viewer::{ViewerClient, ViewerCommand, ViewerHandle, ViewerStatus};
