use glint_kernel::channel::DEFAULT_SESSION;
use glint_kernel::FrameConfig;
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Relay bind address.
    pub bind_addr: SocketAddr,
    /// Carousel redisplay period.
    pub tick_interval: Duration,
    /// Frame header width and chunk size, shared by both codec ends.
    pub frame: FrameConfig,
    /// Artifact server base URL (serves test.vk, settings.json, kzg.srs).
    pub artifact_base_url: String,
    /// Side-channel session name.
    pub session: String,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3002".parse().unwrap(),
            tick_interval: Duration::from_millis(400),
            frame: FrameConfig::default(),
            artifact_base_url: "http://127.0.0.1:8000/public".to_string(),
            session: DEFAULT_SESSION.to_string(),
        }
    }
}
