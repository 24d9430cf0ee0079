//! Sequence augmentation
//!
//! Temporal resampling, spatial perturbation and outlier suppression for
//! `(frames, features)` pose sequences.

pub mod outlier;
pub mod spatial;
pub mod temporal;

pub use outlier::{filter_outliers, filter_sequence_outliers, percentile, OutlierBounds};
pub use spatial::{AffineParams, SpatialAugment, SpatialTransform};
pub use temporal::{Mode, TemporalAugmenter};
