use std::net::SocketAddr;
use std::time::Duration;

/// Configuration for the worker pool.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Number of concurrent worker loops
    pub max_parallel: usize,
    /// How long `stop` waits for workers and pending retention timers
    pub shutdown_grace: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_parallel: 2,
            shutdown_grace: Duration::from_secs(5),
        }
    }
}

impl PoolConfig {
    pub fn new(max_parallel: usize) -> Self {
        Self {
            max_parallel,
            ..Default::default()
        }
    }

    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    pub pool: PoolConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            // SAFETY: This is a hardcoded valid address that will always parse
            listen_addr: "127.0.0.1:8000"
                .parse()
                .expect("default listen address is valid"),
            pool: PoolConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(listen_addr: SocketAddr, pool: PoolConfig) -> Self {
        Self { listen_addr, pool }
    }
}
