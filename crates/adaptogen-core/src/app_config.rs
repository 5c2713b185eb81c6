use std::net::SocketAddr;

#[derive(Clone)]
pub struct AppConfig {
    pub redis_url: String,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub max_output_bytes: usize,
    pub shell: String,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("redis_url", &"[redacted]")
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("max_output_bytes", &self.max_output_bytes)
            .field("shell", &self.shell)
            .finish()
    }
}
