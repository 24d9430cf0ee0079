//! Signpose Core - sign-language pose dataset indexing and sampling
//!
//! This crate provides:
//! - Label map parsing and dataset directory indexing
//! - Class/person filtering, seeded shuffling and ratio splits
//! - Temporal and spatial augmentation of pose sequences
//! - Sharded, parallel emission of augmented training samples

pub mod augment;
pub mod config;
pub mod data;
pub mod error;
pub mod label_map;
pub mod pose;
pub mod runtime;

pub use config::{DatasetConfig, LayoutConfig};
pub use data::{Dataset, FilterSpec, SampleGenerator, SampleList};
pub use error::{Result, SignPoseError};
pub use label_map::LabelMap;
pub use runtime::LoaderRuntime;

/// Default number of frames per emitted sample
pub const DEFAULT_N_FRAMES: usize = 320;

/// Default shuffle and augmentation seed
pub const DEFAULT_SEED: u64 = 42;
