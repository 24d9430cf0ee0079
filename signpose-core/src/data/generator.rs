//! Augmented sample generation
//!
//! Turns a flat sample list into a lazy stream of augmented
//! (time-major, feature-major, one-hot label) samples for one worker shard.

use ndarray::{stack, Array1, Array2, Array3, ArrayView2, Axis};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

use super::filter::SampleList;
use super::shard::{shard_range, WorkerInfo};
use crate::augment::{filter_sequence_outliers, Mode, SpatialAugment, SpatialTransform, TemporalAugmenter};
use crate::error::{Result, SignPoseError};
use crate::pose::{PoseLoader, DEFAULT_RETAINED_JOINTS};

/// Configuration for sample generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Frames per emitted sample
    pub n_frames: usize,
    /// Samples per batch for [`SampleIter::batches`]
    pub batch_size: usize,
    /// Temporal sampling mode
    pub mode: Mode,
    /// Spatial augmentation; `None` disables it
    pub spatial: Option<SpatialAugment>,
    /// Suppress coordinate outliers before resampling
    pub filter_outliers: bool,
    /// Leading joints kept from each frame
    pub retained_joints: usize,
    /// Folder for caching flattened pose arrays
    pub cache_folder: Option<PathBuf>,
    /// Base seed, mixed with the worker id and epoch. `None` draws from entropy.
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            n_frames: crate::DEFAULT_N_FRAMES,
            batch_size: 1,
            mode: Mode::Eval,
            spatial: None,
            filter_outliers: false,
            retained_joints: DEFAULT_RETAINED_JOINTS,
            cache_folder: None,
            seed: None,
        }
    }
}

/// One emitted training sample
#[derive(Debug, Clone, PartialEq)]
pub struct AugmentedSample {
    /// `(n_frames, features)`
    pub temporal: Array2<f32>,
    /// `(features, n_frames)`
    pub spatial: Array2<f32>,
    /// One-hot label of length `num_classes`
    pub label: Array1<f32>,
    pub class_index: usize,
    /// Source pose file
    pub pose: PathBuf,
}

/// Stacked samples
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBatch {
    /// `(batch, n_frames, features)`
    pub temporal: Array3<f32>,
    /// `(batch, features, n_frames)`
    pub spatial: Array3<f32>,
    /// `(batch, num_classes)`
    pub labels: Array2<f32>,
    pub class_indices: Vec<usize>,
}

impl SampleBatch {
    /// Stack samples along a new leading axis
    pub fn stack(samples: &[AugmentedSample]) -> Result<Self> {
        let shape_err = |e: ndarray::ShapeError| SignPoseError::PoseFormat {
            path: "<batch>".into(),
            reason: format!("cannot stack samples: {e}"),
        };

        let temporal: Vec<_> = samples.iter().map(|s| s.temporal.view()).collect();
        let spatial: Vec<_> = samples.iter().map(|s| s.spatial.view()).collect();
        let labels: Vec<_> = samples.iter().map(|s| s.label.view()).collect();

        Ok(Self {
            temporal: stack(Axis(0), &temporal).map_err(shape_err)?,
            spatial: stack(Axis(0), &spatial).map_err(shape_err)?,
            labels: stack(Axis(0), &labels).map_err(shape_err)?,
            class_indices: samples.iter().map(|s| s.class_index).collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.class_indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.class_indices.is_empty()
    }
}

/// One-hot encode `class_index` over `num_classes`
pub fn one_hot(class_index: usize, num_classes: usize) -> Array1<f32> {
    let mut label = Array1::zeros(num_classes);
    if let Some(slot) = label.get_mut(class_index) {
        *slot = 1.0;
    }
    label
}

/// Produces augmented samples from a flat list
///
/// Read-only after construction apart from the epoch counter; share it
/// behind an `Arc` to iterate several shards in parallel.
#[derive(Debug)]
pub struct SampleGenerator {
    samples: SampleList,
    num_classes: usize,
    config: GeneratorConfig,
    loader: PoseLoader,
    temporal: TemporalAugmenter,
    spatial: SpatialTransform,
    /// Next epoch handed out by [`SampleGenerator::iter`]
    epoch: AtomicU64,
}

impl SampleGenerator {
    pub fn new(samples: SampleList, num_classes: usize, config: GeneratorConfig) -> Result<Self> {
        if config.batch_size == 0 {
            return Err(SignPoseError::InvalidConfig {
                reason: "batch_size must be at least 1".into(),
            });
        }
        if let Some(entry) = samples.iter().find(|e| e.class_index >= num_classes) {
            return Err(SignPoseError::InvalidConfig {
                reason: format!(
                    "class index {} of {} out of range for {} classes",
                    entry.class_index,
                    entry.pose.display(),
                    num_classes
                ),
            });
        }

        if let Some(augment) = &config.spatial {
            augment.validate()?;
        }

        let temporal = TemporalAugmenter::new(config.n_frames, config.mode)?;
        let spatial = SpatialTransform::from_option(config.spatial);
        let mut loader = PoseLoader::new(config.retained_joints);
        if let Some(cache) = &config.cache_folder {
            loader = loader.with_cache(cache);
        }

        Ok(Self {
            samples,
            num_classes,
            config,
            loader,
            temporal,
            spatial,
            epoch: AtomicU64::new(0),
        })
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn samples(&self) -> &SampleList {
        &self.samples
    }

    /// Iterator over the shard owned by `worker` (everything for `None`).
    ///
    /// Every call shards from scratch and starts a new epoch, so seeded
    /// training draws fresh crops and transforms on each pass.
    pub fn iter(&self, worker: Option<WorkerInfo>) -> Result<SampleIter<'_>> {
        self.iter_epoch(worker, self.next_epoch())
    }

    /// Iterator for an explicit epoch. With a seed, the same
    /// (seed, worker, epoch) always yields the same samples.
    pub fn iter_epoch(&self, worker: Option<WorkerInfo>, epoch: u64) -> Result<SampleIter<'_>> {
        let mut iter = SampleIter::new(self, worker, epoch);
        iter.shard()?;
        Ok(iter)
    }

    /// Claim the next epoch number
    pub fn next_epoch(&self) -> u64 {
        self.epoch.fetch_add(1, Ordering::Relaxed)
    }

    /// Epochs handed out so far
    pub fn epochs_started(&self) -> u64 {
        self.epoch.load(Ordering::Relaxed)
    }

    /// Load and augment the sample at `index`
    pub fn sample_at(&self, index: usize, rng: &mut StdRng) -> Result<AugmentedSample> {
        let entry = self.samples.get(index).ok_or_else(|| SignPoseError::Internal {
            message: format!("sample index {index} out of range for {} samples", self.len()),
        })?;

        let mut sequence = self.loader.load(&entry.pose)?;
        if self.config.filter_outliers {
            filter_sequence_outliers(&mut sequence);
        }

        let resampled = self.temporal.apply(sequence.view(), rng)?;
        let temporal = self.spatial.apply(resampled, rng)?;
        let spatial = feature_major(temporal.view());

        Ok(AugmentedSample {
            temporal,
            spatial,
            label: one_hot(entry.class_index, self.num_classes),
            class_index: entry.class_index,
            pose: entry.pose.clone(),
        })
    }

    fn rng_for(&self, worker: Option<WorkerInfo>, epoch: u64) -> StdRng {
        let worker_id = worker.map(|w| w.id as u64).unwrap_or(0);
        match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(
                seed.wrapping_add(worker_id)
                    .wrapping_add(epoch.wrapping_mul(EPOCH_SEED_STRIDE)),
            ),
            None => StdRng::from_entropy(),
        }
    }
}

// Odd 64-bit constant so epochs land far apart from worker offsets
const EPOCH_SEED_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;

fn feature_major(temporal: ArrayView2<f32>) -> Array2<f32> {
    temporal.t().as_standard_layout().into_owned()
}

/// Lifecycle of a [`SampleIter`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IterPhase {
    /// Created, no range assigned
    Idle,
    /// Range assigned, nothing emitted yet
    Sharded,
    /// At least one sample emitted
    Emitting,
    /// Range consumed
    Exhausted,
}

/// Lazy iterator over one worker's shard
pub struct SampleIter<'a> {
    generator: &'a SampleGenerator,
    worker: Option<WorkerInfo>,
    epoch: u64,
    phase: IterPhase,
    range: Range<usize>,
    cursor: usize,
    rng: StdRng,
}

impl<'a> SampleIter<'a> {
    fn new(generator: &'a SampleGenerator, worker: Option<WorkerInfo>, epoch: u64) -> Self {
        Self {
            generator,
            worker,
            epoch,
            phase: IterPhase::Idle,
            range: 0..0,
            cursor: 0,
            rng: generator.rng_for(worker, epoch),
        }
    }

    fn shard(&mut self) -> Result<()> {
        self.range = shard_range(self.generator.len(), self.worker)?;
        self.cursor = self.range.start;
        self.phase = IterPhase::Sharded;
        debug!(
            "Worker {:?} assigned samples {}..{} for epoch {}",
            self.worker.map(|w| w.id),
            self.range.start,
            self.range.end,
            self.epoch
        );
        Ok(())
    }

    pub fn phase(&self) -> &IterPhase {
        &self.phase
    }

    /// Range of flat-list indices owned by this iterator
    pub fn range(&self) -> Range<usize> {
        self.range.clone()
    }

    pub fn worker(&self) -> Option<WorkerInfo> {
        self.worker
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Group samples into batches of the configured size
    pub fn batches(self) -> Batches<'a> {
        let batch_size = self.generator.config.batch_size;
        Batches {
            inner: self,
            batch_size,
            pending: None,
        }
    }
}

impl Iterator for SampleIter<'_> {
    type Item = Result<AugmentedSample>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.phase {
            IterPhase::Idle | IterPhase::Exhausted => return None,
            IterPhase::Sharded | IterPhase::Emitting => {}
        }
        if self.cursor >= self.range.end {
            self.phase = IterPhase::Exhausted;
            return None;
        }

        let index = self.cursor;
        self.cursor += 1;
        self.phase = IterPhase::Emitting;
        Some(self.generator.sample_at(index, &mut self.rng))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = match self.phase {
            IterPhase::Idle | IterPhase::Exhausted => 0,
            _ => self.range.end.saturating_sub(self.cursor),
        };
        (remaining, Some(remaining))
    }
}

/// Batching adapter over a [`SampleIter`]; the final batch may be short.
///
/// A failed sample cuts the current batch short: the samples gathered so far
/// are emitted first and the error follows on the next call.
pub struct Batches<'a> {
    inner: SampleIter<'a>,
    batch_size: usize,
    pending: Option<SignPoseError>,
}

impl Iterator for Batches<'_> {
    type Item = Result<SampleBatch>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(e) = self.pending.take() {
            return Some(Err(e));
        }

        let mut samples = Vec::with_capacity(self.batch_size);
        while samples.len() < self.batch_size {
            match self.inner.next() {
                Some(Ok(sample)) => samples.push(sample),
                Some(Err(e)) if samples.is_empty() => return Some(Err(e)),
                Some(Err(e)) => {
                    self.pending = Some(e);
                    break;
                }
                None => break,
            }
        }
        if samples.is_empty() {
            return None;
        }
        Some(SampleBatch::stack(&samples))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::SampleEntry;
    use ndarray_npy::write_npy;
    use std::path::Path;

    fn write_pose(dir: &Path, name: &str, frames: usize) -> PathBuf {
        let path = dir.join(name);
        let raw = Array3::<f64>::from_shape_fn((frames, 33, 3), |(f, j, c)| {
            0.01 * f as f64 + 0.001 * j as f64 + c as f64
        });
        write_npy(&path, &raw).unwrap();
        path
    }

    fn list(dir: &Path, n: usize) -> SampleList {
        (0..n)
            .map(|i| SampleEntry {
                rgb: dir.join(format!("{i}.avi")),
                pose: write_pose(dir, &format!("{i}.npy"), 5 + i),
                class_index: i % 2,
            })
            .collect()
    }

    #[test]
    fn test_one_hot() {
        assert_eq!(one_hot(1, 3).to_vec(), vec![0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_emits_views_and_labels() {
        let dir = tempfile::tempdir().unwrap();
        let config = GeneratorConfig {
            n_frames: 8,
            ..Default::default()
        };
        let generator = SampleGenerator::new(list(dir.path(), 3), 2, config).unwrap();

        let samples: Vec<_> = generator.iter(None).unwrap().collect::<Result<_>>().unwrap();
        assert_eq!(samples.len(), 3);
        for sample in &samples {
            assert_eq!(sample.temporal.dim(), (8, 66));
            assert_eq!(sample.spatial.dim(), (66, 8));
            assert_eq!(sample.spatial[[5, 2]], sample.temporal[[2, 5]]);
            assert_eq!(sample.label.sum(), 1.0);
            assert_eq!(sample.label[sample.class_index], 1.0);
        }
    }

    #[test]
    fn test_phases() {
        let dir = tempfile::tempdir().unwrap();
        let config = GeneratorConfig {
            n_frames: 4,
            ..Default::default()
        };
        let generator = SampleGenerator::new(list(dir.path(), 2), 2, config).unwrap();

        let mut iter = generator.iter(None).unwrap();
        assert_eq!(iter.phase(), &IterPhase::Sharded);
        assert!(iter.next().unwrap().is_ok());
        assert_eq!(iter.phase(), &IterPhase::Emitting);
        assert!(iter.next().is_some());
        assert!(iter.next().is_none());
        assert_eq!(iter.phase(), &IterPhase::Exhausted);
        assert!(iter.next().is_none());
    }

    #[test]
    fn test_missing_pose_file() {
        let dir = tempfile::tempdir().unwrap();
        let samples = list(dir.path(), 2);
        let generator = SampleGenerator::new(samples.clone(), 2, GeneratorConfig::default()).unwrap();
        std::fs::remove_file(&samples.entries()[1].pose).unwrap();

        let results: Vec<_> = generator.iter(None).unwrap().collect();
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(SignPoseError::MissingPoseFile { .. })));
    }

    #[test]
    fn test_batches() {
        let dir = tempfile::tempdir().unwrap();
        let config = GeneratorConfig {
            n_frames: 6,
            batch_size: 2,
            ..Default::default()
        };
        let generator = SampleGenerator::new(list(dir.path(), 5), 2, config).unwrap();

        let batches: Vec<_> = generator
            .iter(None)
            .unwrap()
            .batches()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(batches.iter().map(SampleBatch::len).collect::<Vec<_>>(), vec![2, 2, 1]);
        assert_eq!(batches[0].temporal.dim(), (2, 6, 66));
        assert_eq!(batches[0].spatial.dim(), (2, 66, 6));
        assert_eq!(batches[0].labels.dim(), (2, 2));
    }

    #[test]
    fn test_rejects_out_of_range_class() {
        let dir = tempfile::tempdir().unwrap();
        assert!(SampleGenerator::new(list(dir.path(), 3), 1, GeneratorConfig::default()).is_err());
    }

    #[test]
    fn test_seeded_training_is_reproducible() {
        let dir = tempfile::tempdir().unwrap();
        let config = GeneratorConfig {
            n_frames: 3,
            mode: Mode::Train,
            spatial: Some(SpatialAugment::default()),
            seed: Some(11),
            ..Default::default()
        };
        let generator = SampleGenerator::new(list(dir.path(), 4), 2, config).unwrap();

        let twin = SampleGenerator::new(generator.samples().clone(), 2, generator.config().clone()).unwrap();

        fn collect(iter: SampleIter<'_>) -> Vec<AugmentedSample> {
            iter.collect::<Result<Vec<_>>>().unwrap()
        }
        let first = collect(generator.iter(None).unwrap());
        let second = collect(generator.iter(None).unwrap());
        assert_eq!(generator.epochs_started(), 2);

        // Same (seed, epoch) replays; successive epochs draw afresh
        assert_eq!(first, collect(twin.iter_epoch(None, 0).unwrap()));
        assert_eq!(second, collect(twin.iter_epoch(None, 1).unwrap()));
        assert_ne!(first, second);
    }

    #[test]
    fn test_batch_keeps_samples_before_failure() {
        let dir = tempfile::tempdir().unwrap();
        let samples = list(dir.path(), 3);
        let config = GeneratorConfig {
            n_frames: 4,
            batch_size: 3,
            ..Default::default()
        };
        let generator = SampleGenerator::new(samples.clone(), 2, config).unwrap();
        std::fs::remove_file(&samples.entries()[1].pose).unwrap();

        let mut batches = generator.iter(None).unwrap().batches();
        let head = batches.next().unwrap().unwrap();
        assert_eq!(head.len(), 1);
        assert_eq!(head.class_indices, vec![0]);
        assert!(matches!(
            batches.next(),
            Some(Err(SignPoseError::MissingPoseFile { .. }))
        ));
        let tail = batches.next().unwrap().unwrap();
        assert_eq!(tail.len(), 1);
        assert_eq!(tail.class_indices, vec![0]);
        assert!(batches.next().is_none());

        let delivered: usize = generator
            .iter(None)
            .unwrap()
            .batches()
            .filter_map(|b| b.ok())
            .map(|b| b.len())
            .sum();
        assert_eq!(delivered, 2);
    }
}
