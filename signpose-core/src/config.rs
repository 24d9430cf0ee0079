//! Dataset configuration
//!
//! Serializable configuration for opening a dataset, loadable from a JSON
//! file or from `SIGNPOSE_*` environment variables.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, SignPoseError};

/// Directory layout of a batch folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Subfolder holding the videos
    pub rgb_dir: String,
    /// Subfolder holding the precomputed pose arrays
    pub landmark_dir: String,
    /// Video extension, without the dot
    pub video_ext: String,
    /// Pose array extension, without the dot
    pub pose_ext: String,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            rgb_dir: "rgb".into(),
            landmark_dir: "mediapipe_landmarks".into(),
            video_ext: "avi".into(),
            pose_ext: "npy".into(),
        }
    }
}

/// Dataset configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Root directory containing one folder per `<code>P<person>` batch
    pub root: PathBuf,
    /// Label map file; the built-in map is used when absent
    pub map_file: Option<PathBuf>,
    /// Fixed frame count produced by temporal augmentation
    pub n_frames: usize,
    /// Samples per batch when batching is requested
    pub batch_size: usize,
    /// Seed for shuffling and augmentation
    pub random_seed: u64,
    /// Folder for caching flattened pose arrays
    pub cache_folder: Option<PathBuf>,
    /// Number of leading joints kept from each pose frame
    pub retained_joints: usize,
    /// Batch folder layout
    pub layout: LayoutConfig,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            map_file: None,
            n_frames: crate::DEFAULT_N_FRAMES,
            batch_size: 1,
            random_seed: crate::DEFAULT_SEED,
            cache_folder: None,
            retained_joints: crate::pose::DEFAULT_RETAINED_JOINTS,
            layout: LayoutConfig::default(),
        }
    }
}

impl DatasetConfig {
    /// Create a configuration for the given root with defaults elsewhere
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }

    /// Load a configuration from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| SignPoseError::io(path, e))?;
        let config: Self = serde_json::from_str(&text).map_err(|e| SignPoseError::InvalidConfig {
            reason: format!("{}: {}", path.display(), e),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Build a configuration from `SIGNPOSE_*` environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(root) = std::env::var("SIGNPOSE_ROOT") {
            config.root = PathBuf::from(root);
        }
        if let Ok(map_file) = std::env::var("SIGNPOSE_MAP_FILE") {
            config.map_file = Some(PathBuf::from(map_file));
        }
        if let Ok(cache) = std::env::var("SIGNPOSE_CACHE_DIR") {
            config.cache_folder = Some(PathBuf::from(cache));
        }
        if let Some(n) = env_parse("SIGNPOSE_N_FRAMES")? {
            config.n_frames = n;
        }
        if let Some(n) = env_parse("SIGNPOSE_BATCH_SIZE")? {
            config.batch_size = n;
        }
        if let Some(seed) = env_parse("SIGNPOSE_SEED")? {
            config.random_seed = seed;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.n_frames == 0 {
            return Err(SignPoseError::InvalidConfig {
                reason: "n_frames must be at least 1".into(),
            });
        }
        if self.batch_size == 0 {
            return Err(SignPoseError::InvalidConfig {
                reason: "batch_size must be at least 1".into(),
            });
        }
        if self.retained_joints == 0 {
            return Err(SignPoseError::InvalidConfig {
                reason: "retained_joints must be at least 1".into(),
            });
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| SignPoseError::InvalidConfig {
                reason: format!("{key}={raw}: {e}"),
            }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DatasetConfig::new("/data/dsl");
        assert_eq!(config.root, PathBuf::from("/data/dsl"));
        assert_eq!(config.n_frames, 320);
        assert_eq!(config.batch_size, 1);
        assert_eq!(config.random_seed, 42);
        assert_eq!(config.layout.landmark_dir, "mediapipe_landmarks");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json() {
        let config: DatasetConfig =
            serde_json::from_str(r#"{"root": "/d", "n_frames": 64, "layout": {"video_ext": "mp4"}}"#)
                .unwrap();
        assert_eq!(config.n_frames, 64);
        assert_eq!(config.layout.video_ext, "mp4");
        assert_eq!(config.layout.rgb_dir, "rgb");
        assert_eq!(config.retained_joints, 33);
    }

    #[test]
    fn test_rejects_zero_frames() {
        let config = DatasetConfig {
            n_frames: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SignPoseError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_json_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dataset.json");
        let config = DatasetConfig {
            batch_size: 8,
            cache_folder: Some(dir.path().join("cache")),
            ..DatasetConfig::new(dir.path())
        };
        std::fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();

        let loaded = DatasetConfig::from_json_file(&path).unwrap();
        assert_eq!(loaded.batch_size, 8);
        assert_eq!(loaded.cache_folder, config.cache_folder);
    }
}
