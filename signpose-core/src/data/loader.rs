//! Parallel sample loader
//!
//! Runs one blocking worker per shard and streams their samples through a
//! bounded channel. Workers share the generator read-only and never overlap.

use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::generator::{AugmentedSample, SampleGenerator};
use super::shard::WorkerInfo;
use crate::error::{Result, SignPoseError};

/// Configuration for the parallel loader
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Number of shard workers
    pub num_workers: usize,
    /// Samples buffered between workers and consumer
    pub channel_size: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            num_workers: (num_cpus::get() / 2).max(1),
            channel_size: 16,
        }
    }
}

/// A sample tagged with the worker that produced it
#[derive(Debug)]
pub struct WorkerSample {
    pub worker_id: usize,
    pub result: Result<AugmentedSample>,
}

/// Fans a [`SampleGenerator`] out over parallel shard workers
///
/// Dropping the loader stops every worker at its next send.
pub struct ParallelLoader {
    /// Channel to receive samples from workers
    receiver: mpsc::Receiver<WorkerSample>,
    /// Worker task handles, each yielding its sent-sample count
    handles: Vec<JoinHandle<usize>>,
    /// Total samples received
    samples_received: u64,
}

impl ParallelLoader {
    /// Start `config.num_workers` workers on the blocking pool of `handle`.
    ///
    /// Each spawn is one epoch: all workers share the epoch claimed here.
    pub fn spawn(handle: &Handle, generator: Arc<SampleGenerator>, config: LoaderConfig) -> Result<Self> {
        if config.num_workers == 0 {
            return Err(SignPoseError::InvalidShardSpec {
                reason: "num_workers must be at least 1".into(),
            });
        }
        if config.channel_size == 0 {
            return Err(SignPoseError::InvalidConfig {
                reason: "channel_size must be at least 1".into(),
            });
        }

        let epoch = generator.next_epoch();
        let (sender, receiver) = mpsc::channel(config.channel_size);
        let handles = (0..config.num_workers)
            .map(|id| {
                let worker = WorkerInfo::new(id, config.num_workers);
                let generator = generator.clone();
                let sender = sender.clone();
                handle.spawn_blocking(move || run_worker(worker, epoch, &generator, &sender))
            })
            .collect();

        info!(
            "Started {} loader workers over {} samples (epoch {})",
            config.num_workers,
            generator.len(),
            epoch
        );

        Ok(Self {
            receiver,
            handles,
            samples_received: 0,
        })
    }

    /// Next sample from any worker; `None` once every worker is done
    pub async fn next_sample(&mut self) -> Option<WorkerSample> {
        let sample = self.receiver.recv().await?;
        self.samples_received += 1;
        Some(sample)
    }

    /// Blocking variant of [`next_sample`](Self::next_sample) for
    /// synchronous consumers. Must not be called from async code.
    pub fn blocking_next(&mut self) -> Option<WorkerSample> {
        let sample = self.receiver.blocking_recv()?;
        self.samples_received += 1;
        Some(sample)
    }

    /// Total samples received so far
    pub fn samples_received(&self) -> u64 {
        self.samples_received
    }

    pub fn num_workers(&self) -> usize {
        self.handles.len()
    }

    /// Stop the workers and wait for them; returns the samples they sent
    pub async fn shutdown(self) -> usize {
        let Self {
            receiver, handles, ..
        } = self;
        // Closing the channel makes pending sends fail
        drop(receiver);

        let mut sent = 0;
        for handle in handles {
            match handle.await {
                Ok(count) => sent += count,
                Err(e) => warn!("Loader worker panicked: {}", e),
            }
        }
        debug!("ParallelLoader shutdown complete, workers sent {} samples", sent);
        sent
    }
}

fn run_worker(
    worker: WorkerInfo,
    epoch: u64,
    generator: &SampleGenerator,
    sender: &mpsc::Sender<WorkerSample>,
) -> usize {
    let iter = match generator.iter_epoch(Some(worker), epoch) {
        Ok(iter) => iter,
        Err(e) => {
            let _ = sender.blocking_send(WorkerSample {
                worker_id: worker.id,
                result: Err(e),
            });
            return 0;
        }
    };

    let range = iter.range();
    let mut sent = 0;
    for result in iter {
        let sample = WorkerSample {
            worker_id: worker.id,
            result,
        };
        if sender.blocking_send(sample).is_err() {
            debug!("Worker {}: consumer dropped, stopping", worker.id);
            return sent;
        }
        sent += 1;
    }

    debug!(
        "Worker {} finished samples {}..{} ({} sent)",
        worker.id, range.start, range.end, sent
    );
    sent
}
