use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::ServerConfig;
use crate::error::{Result, SeqPoolError};
use crate::http::{run_server, HttpState};
use crate::scheduler::JobRegistry;
use crate::worker::WorkerPool;

/// Process-level wiring of the registry, the worker pool and the HTTP API.
pub struct Server {
    pub config: ServerConfig,
    pub registry: Arc<JobRegistry>,
    pub pool: WorkerPool,
}

impl Server {
    /// Build a server whose pool stops when `shutdown` is cancelled.
    pub fn new(config: ServerConfig, shutdown: CancellationToken) -> Self {
        let registry = Arc::new(JobRegistry::new());
        let pool =
            WorkerPool::with_shutdown(registry.clone(), config.pool.shutdown_grace, shutdown);

        Self {
            config,
            registry,
            pool,
        }
    }

    /// Run until the shutdown token fires.
    ///
    /// Shutdown order:
    /// 1. Workers and the reaper are stopped, bounded by the grace period
    /// 2. The HTTP server stops accepting and drains open connections
    ///
    /// # Errors
    ///
    /// Returns an error if the pool cannot start or the HTTP listener cannot
    /// be bound. A pool that misses its grace period is logged, not
    /// returned.
    pub async fn run(self) -> Result<()> {
        self.pool.start(self.config.pool.max_parallel)?;

        let http_shutdown = CancellationToken::new();
        let http_state = HttpState {
            registry: self.registry.clone(),
        };
        let mut http = tokio::spawn(run_server(
            self.config.listen_addr,
            http_state,
            http_shutdown.clone(),
        ));

        let pool_shutdown = self.pool.shutdown_token();
        tokio::select! {
            _ = pool_shutdown.cancelled() => {}
            res = &mut http => {
                // The server only returns early on failure; take the pool down with it.
                if let Err(e) = self.pool.stop().await {
                    tracing::warn!(error = %e, "Worker pool shutdown incomplete");
                }
                return flatten(res);
            }
        }

        if let Err(e) = self.pool.stop().await {
            tracing::warn!(error = %e, "Worker pool shutdown incomplete");
        }
        http_shutdown.cancel();
        flatten(http.await)
    }
}

fn flatten(res: std::result::Result<Result<()>, tokio::task::JoinError>) -> Result<()> {
    match res {
        Ok(inner) => inner,
        Err(e) => Err(SeqPoolError::Internal(format!("HTTP server task failed: {}", e))),
    }
}
