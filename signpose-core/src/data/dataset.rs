//! Dataset facade
//!
//! Wires configuration, label map and index together and hands out
//! filtered lists, splits and sample generators.

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

use super::filter::{FilterSpec, SampleList};
use super::generator::{GeneratorConfig, SampleGenerator};
use super::index::DatasetIndex;
use super::split::{split_by_ratios, split_shuffled};
use crate::augment::{Mode, SpatialAugment};
use crate::config::DatasetConfig;
use crate::error::Result;
use crate::label_map::LabelMap;

/// An indexed dataset
#[derive(Debug, Clone)]
pub struct Dataset {
    config: DatasetConfig,
    label_map: LabelMap,
    index: DatasetIndex,
}

impl Dataset {
    /// Load the label map and scan the dataset root
    pub fn open(config: DatasetConfig) -> Result<Self> {
        config.validate()?;
        let label_map = match &config.map_file {
            Some(path) => LabelMap::from_file(path)?,
            None => LabelMap::default(),
        };
        info!("Using label map with {} codes", label_map.len());

        let index = DatasetIndex::build(&config.root, &label_map, &config.layout)?;
        Ok(Self {
            config,
            label_map,
            index,
        })
    }

    pub fn config(&self) -> &DatasetConfig {
        &self.config
    }

    pub fn label_map(&self) -> &LabelMap {
        &self.label_map
    }

    pub fn index(&self) -> &DatasetIndex {
        &self.index
    }

    pub fn classes(&self) -> &[String] {
        self.index.classes()
    }

    pub fn persons(&self) -> &[String] {
        self.index.persons()
    }

    /// A fresh random source seeded with the configured seed
    pub fn seeded_rng(&self) -> StdRng {
        StdRng::seed_from_u64(self.config.random_seed)
    }

    /// Flat list for `spec`, shuffled with the configured seed when `randomize`
    pub fn filter(&self, spec: &FilterSpec, randomize: bool) -> Result<SampleList> {
        if randomize {
            self.index.filter_shuffled(spec, &mut self.seeded_rng())
        } else {
            self.index.filter(spec)
        }
    }

    /// Ratio split of `list`, shuffled with the configured seed when `randomize`
    pub fn split(&self, list: &SampleList, ratios: &[f64], randomize: bool) -> Result<Vec<SampleList>> {
        if randomize {
            split_shuffled(list, ratios, &mut self.seeded_rng())
        } else {
            split_by_ratios(list, ratios)
        }
    }

    /// Generator settings derived from the dataset configuration
    pub fn generator_config(&self, mode: Mode, spatial: Option<SpatialAugment>) -> GeneratorConfig {
        GeneratorConfig {
            n_frames: self.config.n_frames,
            batch_size: self.config.batch_size,
            mode,
            spatial,
            retained_joints: self.config.retained_joints,
            cache_folder: self.config.cache_folder.clone(),
            seed: Some(self.config.random_seed),
            ..Default::default()
        }
    }

    /// Sample generator over `list`, or over the whole shuffled dataset
    pub fn generator(
        &self,
        list: Option<SampleList>,
        mode: Mode,
        spatial: Option<SpatialAugment>,
    ) -> Result<SampleGenerator> {
        let list = match list {
            Some(list) => list,
            None => self.filter(&FilterSpec::all(), true)?,
        };
        SampleGenerator::new(list, self.index.num_classes(), self.generator_config(mode, spatial))
    }
}
