//! Dataset index
//!
//! Scans a dataset root of `<code>P<person>` batch folders and records,
//! per (class, person), the rgb videos that have a matching pose array.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::LayoutConfig;
use crate::error::{Result, SignPoseError};
use crate::label_map::LabelMap;

/// Captures recorded for one (class, person) pair
///
/// `rgb()[i]` and `pose()[i]` always refer to the same capture.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonSamples {
    rgb: Vec<PathBuf>,
    pose: Vec<PathBuf>,
}

impl PersonSamples {
    fn push(&mut self, rgb: PathBuf, pose: PathBuf) {
        self.rgb.push(rgb);
        self.pose.push(pose);
    }

    pub fn rgb(&self) -> &[PathBuf] {
        &self.rgb
    }

    pub fn pose(&self) -> &[PathBuf] {
        &self.pose
    }

    /// Iterate (rgb, pose) pairs
    pub fn pairs(&self) -> impl Iterator<Item = (&Path, &Path)> {
        self.rgb
            .iter()
            .zip(self.pose.iter())
            .map(|(r, p)| (r.as_path(), p.as_path()))
    }

    pub fn len(&self) -> usize {
        self.rgb.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rgb.is_empty()
    }
}

/// Counters collected while scanning
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexStats {
    /// Batch folders visited
    pub batches: usize,
    /// Captures with both rgb and pose artifacts
    pub matched: usize,
    /// rgb captures without a pose artifact
    pub skipped: usize,
}

/// Read-only index: class -> person -> captures
#[derive(Debug, Clone)]
pub struct DatasetIndex {
    root: PathBuf,
    classes: Vec<String>,
    persons: Vec<String>,
    entries: HashMap<String, HashMap<String, PersonSamples>>,
    stats: IndexStats,
}

impl DatasetIndex {
    /// Scan `root` and build the index
    pub fn build(root: impl AsRef<Path>, label_map: &LabelMap, layout: &LayoutConfig) -> Result<Self> {
        let root = root.as_ref();
        let batches = sorted_entries(root)?;
        info!("Gathering dataset information from {} batches in {}", batches.len(), root.display());

        let mut index = Self {
            root: root.to_path_buf(),
            classes: Vec::new(),
            persons: Vec::new(),
            entries: HashMap::new(),
            stats: IndexStats::default(),
        };

        for batch_path in batches {
            if !batch_path.is_dir() {
                debug!("Ignoring non-directory entry {}", batch_path.display());
                continue;
            }
            index.scan_batch(&batch_path, label_map, layout)?;
        }

        info!(
            "Loaded {} classes and {} persons ({} samples, {} skipped without pose)",
            index.classes.len(),
            index.persons.len(),
            index.stats.matched,
            index.stats.skipped
        );

        Ok(index)
    }

    fn scan_batch(&mut self, batch_path: &Path, label_map: &LabelMap, layout: &LayoutConfig) -> Result<()> {
        let batch_name = batch_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| SignPoseError::InvalidBatchName {
                name: batch_path.display().to_string(),
            })?;
        let (code, person) = parse_batch_name(batch_name)?;

        let class = label_map
            .resolve(code)
            .ok_or_else(|| SignPoseError::UnknownClassCode {
                code: code.to_string(),
                batch: batch_name.to_string(),
            })?
            .to_string();

        if !self.classes.contains(&class) {
            self.classes.push(class.clone());
        }
        if !self.persons.iter().any(|p| p == person) {
            self.persons.push(person.to_string());
        }
        self.stats.batches += 1;

        let rgb_dir = batch_path.join(&layout.rgb_dir);
        let landmark_dir = batch_path.join(&layout.landmark_dir);
        let samples = self
            .entries
            .entry(class.clone())
            .or_default()
            .entry(person.to_string())
            .or_default();

        if !rgb_dir.is_dir() {
            warn!("Batch {} has no {} folder", batch_name, layout.rgb_dir);
            return Ok(());
        }

        let before = samples.len();
        for rgb in sorted_entries(&rgb_dir)? {
            if !has_extension(&rgb, &layout.video_ext) {
                continue;
            }
            let Some(stem) = rgb.file_stem() else {
                continue;
            };
            let mut pose_name = stem.to_os_string();
            pose_name.push(".");
            pose_name.push(&layout.pose_ext);
            let pose = landmark_dir.join(pose_name);
            if pose.is_file() {
                samples.push(rgb, pose);
                self.stats.matched += 1;
            } else {
                debug!("Skipping {}: no pose file {}", rgb.display(), pose.display());
                self.stats.skipped += 1;
            }
        }

        debug!(
            "Batch {} -> class={}, person={}, {} samples",
            batch_name,
            class,
            person,
            samples.len() - before
        );
        Ok(())
    }

    /// Dataset root this index was built from
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Class names in first-seen order
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Person ids in first-seen order
    pub fn persons(&self) -> &[String] {
        &self.persons
    }

    pub fn num_classes(&self) -> usize {
        self.classes.len()
    }

    /// Fixed integer index of a class name
    pub fn class_index(&self, class: &str) -> Option<usize> {
        self.classes.iter().position(|c| c == class)
    }

    pub fn class_name(&self, index: usize) -> Option<&str> {
        self.classes.get(index).map(String::as_str)
    }

    /// Captures for a (class, person) pair, if that pair was recorded
    pub fn samples(&self, class: &str, person: &str) -> Option<&PersonSamples> {
        self.entries.get(class)?.get(person)
    }

    pub fn stats(&self) -> IndexStats {
        self.stats
    }

    /// Total number of indexed captures
    pub fn len(&self) -> usize {
        self.stats.matched
    }

    pub fn is_empty(&self) -> bool {
        self.stats.matched == 0
    }
}

/// Split `<code>P<person>` on the first `P`
pub fn parse_batch_name(name: &str) -> Result<(&str, &str)> {
    match name.split_once('P') {
        Some((code, person)) if !code.is_empty() && !person.is_empty() => Ok((code, person)),
        _ => Err(SignPoseError::InvalidBatchName {
            name: name.to_string(),
        }),
    }
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case(ext))
        .unwrap_or(false)
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = std::fs::read_dir(dir)
        .map_err(|e| SignPoseError::io(dir, e))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()
        .map_err(|e| SignPoseError::io(dir, e))?;
    paths.sort();
    Ok(paths)
}
