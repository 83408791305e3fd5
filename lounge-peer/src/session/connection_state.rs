use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
}

impl ConnectionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, ConnectionState::Disconnected | ConnectionState::Failed)
    }

    /// Applies a transport-reported state. Returns the state to move to,
    /// or `None` when the report would break monotonicity: nothing returns
    /// to `New`, `Connected` never falls back to `Connecting`, and terminal
    /// states absorb everything.
    pub fn advance(self, next: ConnectionState) -> Option<ConnectionState> {
        use ConnectionState::*;

        if self == next || self.is_terminal() {
            return None;
        }
        match (self, next) {
            (_, New) => None,
            (Connected, Connecting) => None,
            _ => Some(next),
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionState::New => "new",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Failed => "failed",
        };
        f.write_str(name)
    }
}
