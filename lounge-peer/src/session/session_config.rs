use crate::transport::TransportConfig;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub transport: TransportConfig,
    /// How long a session may stay `Connecting` before it is failed. Also
    /// bounds relay registration during connect.
    pub connect_timeout: Duration,
    pub stall_check_interval: Duration,
    pub data_channel_label: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            transport: TransportConfig::default(),
            connect_timeout: Duration::from_secs(30),
            stall_check_interval: Duration::from_secs(1),
            data_channel_label: "general".to_owned(),
        }
    }
}
