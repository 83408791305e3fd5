use lounge_core::IceServerConfig;

/// WebRTC configuration shared by every session of a participant.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub ice_servers: Vec<IceServerConfig>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            ice_servers: vec![IceServerConfig::stun("stun:stun.l.google.com:19302")],
        }
    }
}

impl TransportConfig {
    /// Parses a comma separated list of ICE urls, one server per url.
    pub fn from_urls(urls: &str) -> Self {
        let ice_servers = urls
            .split(',')
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(IceServerConfig::stun)
            .collect();

        Self { ice_servers }
    }
}
