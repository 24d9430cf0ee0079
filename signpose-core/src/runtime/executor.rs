//! Tokio runtime configuration
//!
//! Hosts the blocking pool that parallel loader workers run on.

use tokio::runtime::{Builder, Runtime};

use crate::error::{Result, SignPoseError};

/// Configuration for the loader runtime
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Async worker threads (the consumer side)
    pub worker_threads: usize,
    /// Upper bound on concurrently running blocking loader workers
    pub max_blocking_threads: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        let cpus = num_cpus::get();
        Self {
            worker_threads: (cpus / 4).max(1),
            max_blocking_threads: cpus.max(2),
        }
    }
}

/// Runtime that owns the loader thread pools
pub struct LoaderRuntime {
    runtime: Runtime,
    config: RuntimeConfig,
}

impl LoaderRuntime {
    /// Create a new runtime with the given configuration
    pub fn new(config: RuntimeConfig) -> Result<Self> {
        if config.worker_threads == 0 || config.max_blocking_threads == 0 {
            return Err(SignPoseError::InvalidConfig {
                reason: "runtime thread counts must be at least 1".into(),
            });
        }

        let runtime = Builder::new_multi_thread()
            .worker_threads(config.worker_threads)
            .max_blocking_threads(config.max_blocking_threads)
            .thread_name("signpose-loader")
            .enable_all()
            .build()
            .map_err(|e| SignPoseError::Internal {
                message: format!("Failed to create loader runtime: {}", e),
            })?;

        Ok(Self { runtime, config })
    }

    /// Handle for spawning loader workers
    pub fn handle(&self) -> tokio::runtime::Handle {
        self.runtime.handle().clone()
    }

    /// Run a future to completion on this runtime
    pub fn block_on<F: std::future::Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Stop the runtime, giving in-flight reads a short grace period
    pub fn shutdown(self) {
        self.runtime.shutdown_timeout(std::time::Duration::from_secs(5));
    }
}
