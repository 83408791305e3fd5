pub use lounge_core::model::{Identity, ParticipantId, Role};

pub mod model {
    pub use lounge_core::model::*;
}

#[cfg(feature = "peer")]
pub mod peer {
    pub use lounge_peer::*;
}

#[cfg(feature = "relay")]
pub mod relay {
    pub use lounge_relay::*;
}
