use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerStatus {
    Connecting,
    Connected,
    /// The relay had no host to forward the request to. Terminal.
    NoHost,
    Disconnected,
}

impl ViewerStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, ViewerStatus::NoHost | ViewerStatus::Disconnected)
    }
}

impl fmt::Display for ViewerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ViewerStatus::Connecting => "connecting",
            ViewerStatus::Connected => "connected",
            ViewerStatus::NoHost => "no host",
            ViewerStatus::Disconnected => "disconnected",
        };
        f.write_str(text)
    }
}
