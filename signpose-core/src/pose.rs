//! Pose array loading
//!
//! Reads `(frames, joints, channels)` `.npy` arrays, keeps the leading
//! joints, drops the last channel (confidence / depth) and flattens each
//! frame to `[x0, y0, x1, y1, ...]`.

use ndarray::{s, Array2, Array3, ArrayView3};
use ndarray_npy::{read_npy, write_npy, ReadNpyError};
use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{Result, SignPoseError};

/// Default number of retained joints (MediaPipe pose landmarks)
pub const DEFAULT_RETAINED_JOINTS: usize = 33;

/// Loads pose artifacts into per-frame feature matrices
#[derive(Debug, Clone)]
pub struct PoseLoader {
    retained_joints: usize,
    cache_folder: Option<PathBuf>,
}

impl PoseLoader {
    pub fn new(retained_joints: usize) -> Self {
        Self {
            retained_joints,
            cache_folder: None,
        }
    }

    /// Cache flattened matrices under `folder`
    pub fn with_cache(mut self, folder: impl Into<PathBuf>) -> Self {
        self.cache_folder = Some(folder.into());
        self
    }

    pub fn retained_joints(&self) -> usize {
        self.retained_joints
    }

    /// Load a pose file as a `(frames, features)` matrix
    pub fn load(&self, path: &Path) -> Result<Array2<f32>> {
        if !path.is_file() {
            return Err(SignPoseError::MissingPoseFile {
                path: path.to_path_buf(),
            });
        }

        if let Some(cached) = self.read_cache(path) {
            return Ok(cached);
        }

        let raw = read_pose_array(path)?;
        let features = flatten_frames(raw.view(), self.retained_joints, path)?;
        self.write_cache(path, &features);
        Ok(features)
    }

    fn cache_path(&self, path: &Path) -> Option<PathBuf> {
        let folder = self.cache_folder.as_ref()?;
        Some(cache_entry(folder, path, self.retained_joints))
    }

    fn read_cache(&self, path: &Path) -> Option<Array2<f32>> {
        let cached = self.cache_path(path)?;
        if !cached.is_file() {
            return None;
        }
        match read_npy::<_, Array2<f32>>(&cached) {
            Ok(features) if features.nrows() > 0 => Some(features),
            Ok(_) => None,
            Err(e) => {
                warn!("Ignoring unreadable cache entry {}: {}", cached.display(), e);
                None
            }
        }
    }

    // Cache failures only cost a reload next time.
    fn write_cache(&self, path: &Path, features: &Array2<f32>) {
        let Some(cached) = self.cache_path(path) else {
            return;
        };
        if let Some(parent) = cached.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!("Cannot create cache folder {}: {}", parent.display(), e);
                return;
            }
        }
        match write_npy(&cached, features) {
            Ok(()) => debug!("Cached {} -> {}", path.display(), cached.display()),
            Err(e) => warn!("Failed to cache {}: {}", path.display(), e),
        }
    }
}

impl Default for PoseLoader {
    fn default() -> Self {
        Self::new(DEFAULT_RETAINED_JOINTS)
    }
}

/// Cache location for `path`: the source path mirrored under `folder`, so
/// distinct sources never share an entry.
///
/// Absolute and relative sources live under separate `abs`/`rel` roots and
/// `..` becomes `_up_`, keeping every entry inside `folder`.
pub fn cache_entry(folder: &Path, path: &Path, retained_joints: usize) -> PathBuf {
    let mut entry = folder.join(if path.has_root() { "abs" } else { "rel" });
    let mut file_name = None;
    for component in path.components() {
        let part: OsString = match component {
            Component::Normal(name) => name.to_os_string(),
            Component::ParentDir => "_up_".into(),
            Component::Prefix(prefix) => prefix
                .as_os_str()
                .to_string_lossy()
                .replace(|c: char| !c.is_ascii_alphanumeric(), "_")
                .into(),
            Component::RootDir | Component::CurDir => continue,
        };
        if let Some(dir) = file_name.replace(part) {
            entry.push(dir);
        }
    }

    let mut name = file_name.unwrap_or_else(|| "_".into());
    name.push(format!(".{retained_joints}j.npy"));
    entry.push(name);
    entry
}

/// Read a `(frames, joints, channels)` array stored as f64 or f32
pub fn read_pose_array(path: &Path) -> Result<Array3<f32>> {
    let format_err = |e: ReadNpyError| SignPoseError::PoseFormat {
        path: path.display().to_string(),
        reason: e.to_string(),
    };

    match read_npy::<_, Array3<f64>>(path) {
        Ok(array) => Ok(array.mapv(|v| v as f32)),
        Err(ReadNpyError::WrongDescriptor(_)) => read_npy::<_, Array3<f32>>(path).map_err(format_err),
        Err(e) => Err(format_err(e)),
    }
}

/// Keep the first `retained_joints` joints and all but the last channel,
/// then flatten each frame
pub fn flatten_frames(raw: ArrayView3<f32>, retained_joints: usize, path: &Path) -> Result<Array2<f32>> {
    let (frames, joints, channels) = raw.dim();
    let bad = |reason: String| SignPoseError::PoseFormat {
        path: path.display().to_string(),
        reason,
    };

    if frames == 0 {
        return Err(SignPoseError::EmptySequence {
            path: path.display().to_string(),
        });
    }
    if joints < retained_joints {
        return Err(bad(format!("{joints} joints, need at least {retained_joints}")));
    }
    if channels < 2 {
        return Err(bad(format!("{channels} channels, need at least 2")));
    }

    let kept = raw.slice(s![.., ..retained_joints, ..channels - 1]);
    let features = retained_joints * (channels - 1);
    let flat: Vec<f32> = kept.iter().copied().collect();
    Array2::from_shape_vec((frames, features), flat).map_err(|e| bad(e.to_string()))
}
