//! Spatial augmentation of joint coordinates
//!
//! Features are interleaved `(x, y)` pairs. One affine transform is drawn per
//! sequence and applied to every frame, so the result does not depend on
//! whether it runs before or after temporal resampling.

use ndarray::Array2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SignPoseError};

/// Perturbation ranges for spatial augmentation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpatialAugment {
    /// Uniform scale range `(min, max)`
    pub scale: (f32, f32),
    /// Rotation drawn from `[-max, max]` degrees
    pub max_rotation_deg: f32,
    /// Translation drawn from `[-max, max]` on each axis
    pub max_translation: f32,
    /// Probability of a horizontal mirror
    pub mirror_prob: f64,
    /// Center of scaling, rotation and mirroring
    pub center: (f32, f32),
}

impl Default for SpatialAugment {
    fn default() -> Self {
        Self {
            scale: (0.9, 1.1),
            max_rotation_deg: 10.0,
            max_translation: 0.05,
            mirror_prob: 0.5,
            // MediaPipe coordinates are normalized to [0, 1]
            center: (0.5, 0.5),
        }
    }
}

impl SpatialAugment {
    /// Reject ranges that cannot be sampled
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| SignPoseError::InvalidConfig { reason };

        let (lo, hi) = self.scale;
        let values = [lo, hi, self.max_rotation_deg, self.max_translation, self.center.0, self.center.1];
        if values.iter().any(|v| !v.is_finite()) || !self.mirror_prob.is_finite() {
            return Err(invalid(format!("spatial augmentation values must be finite: {self:?}")));
        }
        if lo > hi {
            return Err(invalid(format!("scale range ({lo}, {hi}) is reversed")));
        }
        if !(0.0..=1.0).contains(&self.mirror_prob) {
            return Err(invalid(format!("mirror_prob {} outside [0, 1]", self.mirror_prob)));
        }
        Ok(())
    }
}

/// A concrete affine transform drawn from [`SpatialAugment`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineParams {
    pub mirror: bool,
    pub scale: f32,
    pub rotation_rad: f32,
    pub translation: (f32, f32),
    pub center: (f32, f32),
}

impl AffineParams {
    /// Draw parameters from the configured ranges
    pub fn sample<R: Rng + ?Sized>(augment: &SpatialAugment, rng: &mut R) -> Result<Self> {
        augment.validate()?;
        let (lo, hi) = augment.scale;
        let scale = if hi > lo { rng.gen_range(lo..=hi) } else { lo };
        let rot = augment.max_rotation_deg.abs();
        let rotation_rad = if rot > 0.0 {
            rng.gen_range(-rot..=rot).to_radians()
        } else {
            0.0
        };
        let t = augment.max_translation.abs();
        let translation = if t > 0.0 {
            (rng.gen_range(-t..=t), rng.gen_range(-t..=t))
        } else {
            (0.0, 0.0)
        };
        let mirror = rng.gen_bool(augment.mirror_prob);

        Ok(Self {
            mirror,
            scale,
            rotation_rad,
            translation,
            center: augment.center,
        })
    }

    /// Transform a single point
    pub fn apply_point(&self, x: f32, y: f32) -> (f32, f32) {
        let (cx, cy) = self.center;
        let x = if self.mirror { 2.0 * cx - x } else { x };
        let (dx, dy) = (x - cx, y - cy);
        let (sin, cos) = self.rotation_rad.sin_cos();
        let rx = self.scale * (cos * dx - sin * dy);
        let ry = self.scale * (sin * dx + cos * dy);
        (rx + cx + self.translation.0, ry + cy + self.translation.1)
    }
}

/// Optional geometric augmentation; identity when disabled
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SpatialTransform {
    augment: Option<SpatialAugment>,
}

impl SpatialTransform {
    pub fn new(augment: SpatialAugment) -> Self {
        Self {
            augment: Some(augment),
        }
    }

    pub fn identity() -> Self {
        Self { augment: None }
    }

    pub fn from_option(augment: Option<SpatialAugment>) -> Self {
        Self { augment }
    }

    pub fn is_identity(&self) -> bool {
        self.augment.is_none()
    }

    /// Apply a freshly drawn transform to every frame of `seq`
    pub fn apply<R: Rng + ?Sized>(&self, seq: Array2<f32>, rng: &mut R) -> Result<Array2<f32>> {
        match &self.augment {
            None => Ok(seq),
            Some(augment) => {
                let params = AffineParams::sample(augment, rng)?;
                apply_affine(seq, &params)
            }
        }
    }
}

/// Apply `params` to every `(x, y)` pair of every frame
pub fn apply_affine(mut seq: Array2<f32>, params: &AffineParams) -> Result<Array2<f32>> {
    if seq.ncols() % 2 != 0 {
        return Err(SignPoseError::PoseFormat {
            path: "<sequence>".into(),
            reason: format!("{} features is not a whole number of (x, y) pairs", seq.ncols()),
        });
    }

    let features = seq.ncols();
    for mut frame in seq.rows_mut() {
        for i in (0..features).step_by(2) {
            let (x, y) = params.apply_point(frame[i], frame[i + 1]);
            frame[i] = x;
            frame[i + 1] = y;
        }
    }
    Ok(seq)
}
