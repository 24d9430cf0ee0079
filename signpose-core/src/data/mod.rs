//! Dataset pipeline
//!
//! Directory index, flat lists, ratio splits, worker shards and augmented
//! sample generation.

pub mod dataset;
pub mod filter;
pub mod generator;
pub mod index;
pub mod loader;
pub mod shard;
pub mod split;

pub use dataset::Dataset;
pub use filter::{FilterSpec, SampleEntry, SampleList};
pub use generator::{AugmentedSample, GeneratorConfig, IterPhase, SampleBatch, SampleGenerator, SampleIter};
pub use index::{DatasetIndex, IndexStats, PersonSamples};
pub use loader::{LoaderConfig, ParallelLoader, WorkerSample};
pub use shard::{shard_range, worker_range, WorkerInfo};
pub use split::{split_by_ratios, split_shuffled, split_sizes};
