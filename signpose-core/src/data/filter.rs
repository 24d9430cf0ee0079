//! Flat sample lists
//!
//! Projects the nested index into an ordered list of
//! (rgb path, pose path, class index) triples.

use rand::seq::SliceRandom;
use rand::Rng;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::index::DatasetIndex;
use crate::error::{Result, SignPoseError};

/// One capture in a flat list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleEntry {
    pub rgb: PathBuf,
    pub pose: PathBuf,
    /// Position of the class in the index's class list
    pub class_index: usize,
}

/// Ordered list of captures
///
/// Triples are stored together, so shuffling or slicing can never break the
/// rgb/pose/class alignment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SampleList {
    entries: Vec<SampleEntry>,
}

impl SampleList {
    pub fn new(entries: Vec<SampleEntry>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&SampleEntry> {
        self.entries.get(index)
    }

    pub fn entries(&self) -> &[SampleEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SampleEntry> {
        self.entries.iter()
    }

    pub fn rgb_paths(&self) -> impl Iterator<Item = &Path> {
        self.entries.iter().map(|e| e.rgb.as_path())
    }

    pub fn pose_paths(&self) -> impl Iterator<Item = &Path> {
        self.entries.iter().map(|e| e.pose.as_path())
    }

    pub fn class_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries.iter().map(|e| e.class_index)
    }

    /// Permute the triples with the given random source
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.entries.shuffle(rng);
    }

    /// Contiguous sub-list `[start, end)`
    pub fn slice(&self, start: usize, end: usize) -> SampleList {
        SampleList::new(self.entries[start..end].to_vec())
    }
}

impl<'a> IntoIterator for &'a SampleList {
    type Item = &'a SampleEntry;
    type IntoIter = std::slice::Iter<'a, SampleEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl FromIterator<SampleEntry> for SampleList {
    fn from_iter<I: IntoIterator<Item = SampleEntry>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Class / person subset selection. `None` selects everything known.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSpec {
    pub classes: Option<Vec<String>>,
    pub persons: Option<Vec<String>>,
}

impl FilterSpec {
    /// Select every class and person
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_classes<I, S>(mut self, classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.classes = Some(classes.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_persons<I, S>(mut self, persons: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.persons = Some(persons.into_iter().map(Into::into).collect());
        self
    }
}

impl DatasetIndex {
    /// Flatten the selected (class, person) pairs, classes outermost.
    ///
    /// Pairs that were never recorded are skipped; naming a class or person
    /// that the index has never seen is an error.
    pub fn filter(&self, spec: &FilterSpec) -> Result<SampleList> {
        let classes = spec.classes.as_deref().unwrap_or(self.classes());
        let persons = spec.persons.as_deref().unwrap_or(self.persons());

        let mut class_ids = Vec::with_capacity(classes.len());
        for class in classes {
            let id = self
                .class_index(class)
                .ok_or_else(|| SignPoseError::UnknownClass { name: class.clone() })?;
            class_ids.push(id);
        }
        if let Some(person) = persons.iter().find(|p| !self.persons().contains(p)) {
            return Err(SignPoseError::UnknownPerson { id: person.clone() });
        }

        let mut entries = Vec::new();
        for (class, &class_index) in classes.iter().zip(&class_ids) {
            for person in persons {
                let Some(samples) = self.samples(class, person) else {
                    continue;
                };
                entries.extend(samples.pairs().map(|(rgb, pose)| SampleEntry {
                    rgb: rgb.to_path_buf(),
                    pose: pose.to_path_buf(),
                    class_index,
                }));
            }
        }

        debug!(
            "Filtered {} samples from {} classes x {} persons",
            entries.len(),
            classes.len(),
            persons.len()
        );
        Ok(SampleList::new(entries))
    }

    /// Filter, then shuffle the triples with `rng`
    pub fn filter_shuffled<R: Rng + ?Sized>(&self, spec: &FilterSpec, rng: &mut R) -> Result<SampleList> {
        let mut list = self.filter(spec)?;
        list.shuffle(rng);
        Ok(list)
    }
}
