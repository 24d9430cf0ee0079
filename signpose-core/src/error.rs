//! Error types for signpose
//!
//! Covers indexing, filtering/splitting, pose loading and sampling errors.

use std::path::PathBuf;
use thiserror::Error;

/// Primary error type for all signpose operations
#[derive(Debug, Error)]
pub enum SignPoseError {
    // ========== Indexing Errors ==========

    /// Class code of a batch directory is missing from the label map
    #[error("Unknown class code '{code}' in batch {batch}")]
    UnknownClassCode { code: String, batch: String },

    /// Batch directory name is not of the form `<code>P<person>`
    #[error("Invalid batch directory name: {name}")]
    InvalidBatchName { name: String },

    // ========== Filter / Split Errors ==========

    /// Filter references a class never seen during indexing
    #[error("Unknown class: {name}")]
    UnknownClass { name: String },

    /// Filter references a person never seen during indexing
    #[error("Unknown person: {id}")]
    UnknownPerson { id: String },

    /// Split ratios violate the partition contract
    #[error("Invalid ratios {ratios:?}: {reason}")]
    InvalidRatios { ratios: Vec<f64>, reason: String },

    /// Worker range request is out of bounds
    #[error("Invalid shard spec: {reason}")]
    InvalidShardSpec { reason: String },

    // ========== Sample Errors ==========

    /// Pose array contains zero frames
    #[error("Empty pose sequence: {path}")]
    EmptySequence { path: String },

    /// Pose file indexed earlier is gone
    #[error("Pose file missing since indexing: {path}")]
    MissingPoseFile { path: PathBuf },

    /// Pose array has an unexpected shape or dtype
    #[error("Bad pose array {path}: {reason}")]
    PoseFormat { path: String, reason: String },

    // ========== Runtime Errors ==========

    /// Invalid configuration value
    #[error("Invalid config: {reason}")]
    InvalidConfig { reason: String },

    /// Filesystem error
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl SignPoseError {
    /// Returns true if this error concerns a single sample rather than the
    /// whole dataset
    pub fn is_per_sample(&self) -> bool {
        matches!(
            self,
            SignPoseError::EmptySequence { .. }
                | SignPoseError::MissingPoseFile { .. }
                | SignPoseError::PoseFormat { .. }
        )
    }

    /// Returns true if the filesystem changed after the index was built
    pub fn is_index_drift(&self) -> bool {
        matches!(self, SignPoseError::MissingPoseFile { .. })
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SignPoseError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for signpose operations
pub type Result<T> = std::result::Result<T, SignPoseError>;
