//! Worker shard assignment
//!
//! Splits a flat list into contiguous, non-overlapping per-worker ranges.

use serde::{Deserialize, Serialize};
use std::ops::Range;

use crate::error::{Result, SignPoseError};

/// Identity of a parallel worker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkerInfo {
    /// Worker id in `0..num_workers`
    pub id: usize,
    /// Total number of workers
    pub num_workers: usize,
}

impl WorkerInfo {
    pub fn new(id: usize, num_workers: usize) -> Self {
        Self { id, num_workers }
    }

    /// Range of `total` items owned by this worker
    pub fn range(&self, total: usize) -> Result<Range<usize>> {
        worker_range(total, self.num_workers, self.id)
    }
}

/// Range of `total` items owned by `worker_id` out of `num_workers`.
///
/// Each worker gets `ceil(total / num_workers)` items; trailing workers may
/// get fewer or none.
pub fn worker_range(total: usize, num_workers: usize, worker_id: usize) -> Result<Range<usize>> {
    if num_workers == 0 {
        return Err(SignPoseError::InvalidShardSpec {
            reason: "num_workers must be at least 1".into(),
        });
    }
    if worker_id >= num_workers {
        return Err(SignPoseError::InvalidShardSpec {
            reason: format!("worker id {worker_id} out of range for {num_workers} workers"),
        });
    }

    let per_worker = total.div_ceil(num_workers);
    let start = worker_id.saturating_mul(per_worker).min(total);
    let end = start.saturating_add(per_worker).min(total);
    Ok(start..end)
}

/// Range for an optional worker; `None` owns everything
pub fn shard_range(total: usize, worker: Option<WorkerInfo>) -> Result<Range<usize>> {
    match worker {
        Some(info) => info.range(total),
        None => Ok(0..total),
    }
}
