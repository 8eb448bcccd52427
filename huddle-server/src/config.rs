use huddle_core::IceServerConfig;
use std::net::SocketAddr;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    /// Redis connection URL for the durable presence backing. None means
    /// the process runs on its local backing only.
    pub redis_url: Option<String>,
    pub ice_servers: Vec<IceServerConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: ([127, 0, 0, 1], 4000).into(),
            redis_url: None,
            ice_servers: vec![IceServerConfig::stun("stun:stun.l.google.com:19302")],
        }
    }
}
