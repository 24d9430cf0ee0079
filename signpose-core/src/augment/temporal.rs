//! Temporal resampling to a fixed frame count
//!
//! Longer sequences are strided down (with a random crop and playback speed
//! while training); shorter ones are linearly interpolated up.

use ndarray::{Array2, ArrayView2, Axis};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{Result, SignPoseError};

/// Sampling mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Randomized cropping for training diversity
    Train,
    /// Deterministic sampling, stable across passes
    #[default]
    Eval,
}

impl FromStr for Mode {
    type Err = SignPoseError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "train" | "training" => Ok(Mode::Train),
            "eval" | "val" | "valid" | "test" => Ok(Mode::Eval),
            other => Err(SignPoseError::InvalidConfig {
                reason: format!("unknown mode '{other}'"),
            }),
        }
    }
}

/// Resamples `(frames, features)` sequences to exactly `n_frames` rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemporalAugmenter {
    n_frames: usize,
    mode: Mode,
}

impl TemporalAugmenter {
    pub fn new(n_frames: usize, mode: Mode) -> Result<Self> {
        if n_frames == 0 {
            return Err(SignPoseError::InvalidConfig {
                reason: "n_frames must be at least 1".into(),
            });
        }
        Ok(Self { n_frames, mode })
    }

    pub fn n_frames(&self) -> usize {
        self.n_frames
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Resample `seq`. `rng` is only consulted in [`Mode::Train`].
    pub fn apply<R: Rng + ?Sized>(&self, seq: ArrayView2<f32>, rng: &mut R) -> Result<Array2<f32>> {
        let len = seq.nrows();
        let target = self.n_frames;

        if len == 0 {
            return Err(SignPoseError::EmptySequence {
                path: "<sequence>".into(),
            });
        }
        if len == target {
            return Ok(seq.to_owned());
        }
        if len < target {
            return Ok(interpolate(seq, target));
        }

        let (start, window) = match self.mode {
            Mode::Eval => (0, len),
            Mode::Train => {
                let window = rng.gen_range(target..=len);
                let start = rng.gen_range(0..=len - window);
                (start, window)
            }
        };
        Ok(stride(seq, start, window, target))
    }
}

/// Pick `target` rows evenly spread over `[start, start + window)`
fn stride(seq: ArrayView2<f32>, start: usize, window: usize, target: usize) -> Array2<f32> {
    let indices: Vec<usize> = (0..target).map(|i| start + i * window / target).collect();
    seq.select(Axis(0), &indices)
}

/// Linear interpolation onto `target` evenly spaced positions
fn interpolate(seq: ArrayView2<f32>, target: usize) -> Array2<f32> {
    let (len, features) = seq.dim();
    let mut out = Array2::zeros((target, features));
    let scale = if target > 1 {
        (len - 1) as f64 / (target - 1) as f64
    } else {
        0.0
    };

    for (i, mut row) in out.axis_iter_mut(Axis(0)).enumerate() {
        let pos = i as f64 * scale;
        let lo = (pos.floor() as usize).min(len - 1);
        let hi = (lo + 1).min(len - 1);
        let frac = (pos - lo as f64) as f32;

        let a = seq.row(lo);
        let b = seq.row(hi);
        row.iter_mut()
            .zip(a.iter().zip(b.iter()))
            .for_each(|(dst, (&x, &y))| *dst = x + (y - x) * frac);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn ramp(frames: usize, features: usize) -> Array2<f32> {
        Array2::from_shape_fn((frames, features), |(f, _)| f as f32)
    }

    #[test]
    fn test_eval_downsample_is_uniform() {
        let aug = TemporalAugmenter::new(4, Mode::Eval).unwrap();
        let out = aug.apply(ramp(8, 2).view(), &mut StdRng::seed_from_u64(0)).unwrap();
        assert_eq!(out.column(0).to_vec(), vec![0.0, 2.0, 4.0, 6.0]);
    }

    #[test]
    fn test_eval_is_stable() {
        let aug = TemporalAugmenter::new(7, Mode::Eval).unwrap();
        let seq = ramp(31, 3);
        let a = aug.apply(seq.view(), &mut StdRng::seed_from_u64(1)).unwrap();
        let b = aug.apply(seq.view(), &mut StdRng::seed_from_u64(2)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_train_crop_is_ordered_subset() {
        let aug = TemporalAugmenter::new(10, Mode::Train).unwrap();
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..20 {
            let out = aug.apply(ramp(50, 1).view(), &mut rng).unwrap();
            let frames = out.column(0).to_vec();
            assert_eq!(frames.len(), 10);
            assert!(frames.windows(2).all(|w| w[0] < w[1]));
            assert!(frames.iter().all(|&f| (0.0..50.0).contains(&f)));
        }
    }

    #[test]
    fn test_upsample_interpolates() {
        let aug = TemporalAugmenter::new(5, Mode::Eval).unwrap();
        let out = aug.apply(ramp(3, 1).view(), &mut StdRng::seed_from_u64(0)).unwrap();
        assert_eq!(out.column(0).to_vec(), vec![0.0, 0.5, 1.0, 1.5, 2.0]);
    }

    #[test]
    fn test_single_frame_repeats() {
        let seq = Array2::from_shape_vec((1, 2), vec![3.0, 4.0]).unwrap();
        let aug = TemporalAugmenter::new(6, Mode::Train).unwrap();
        let out = aug.apply(seq.view(), &mut StdRng::seed_from_u64(0)).unwrap();
        assert_eq!(out.dim(), (6, 2));
        assert!(out.rows().into_iter().all(|r| r.to_vec() == vec![3.0, 4.0]));
    }

    #[test]
    fn test_empty_and_zero_target() {
        let aug = TemporalAugmenter::new(4, Mode::Eval).unwrap();
        let empty = Array2::<f32>::zeros((0, 2));
        assert!(matches!(
            aug.apply(empty.view(), &mut StdRng::seed_from_u64(0)),
            Err(SignPoseError::EmptySequence { .. })
        ));
        assert!(TemporalAugmenter::new(0, Mode::Eval).is_err());
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!("train".parse::<Mode>().unwrap(), Mode::Train);
        assert_eq!("VAL".parse::<Mode>().unwrap(), Mode::Eval);
        assert!("bogus".parse::<Mode>().is_err());
    }
}
