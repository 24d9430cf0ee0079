//! Quartile-based outlier suppression
//!
//! Per sequence: values outside `[q1 - 1.5 iqr, q3 + 1.5 iqr]` (q1 = 20th,
//! q3 = 70th percentile) are replaced with the sequence median.

use ndarray::{Array3, ArrayBase, Axis, DataMut, Dimension};

/// Lower quartile used for the bounds
pub const LOWER_PERCENTILE: f64 = 20.0;
/// Upper quartile used for the bounds
pub const UPPER_PERCENTILE: f64 = 70.0;
/// IQR multiplier
pub const IQR_FACTOR: f32 = 1.5;

/// Percentile of ascending `sorted` values with linear interpolation
/// between closest ranks. Returns `None` for empty input.
pub fn percentile(sorted: &[f32], p: f64) -> Option<f32> {
    let last = sorted.len().checked_sub(1)?;
    let pos = (p.clamp(0.0, 100.0) / 100.0) * last as f64;
    let lo = pos.floor() as usize;
    let hi = (lo + 1).min(last);
    let frac = (pos - lo as f64) as f32;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Outlier bounds and median of one sequence
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutlierBounds {
    pub lower: f32,
    pub upper: f32,
    pub median: f32,
}

impl OutlierBounds {
    /// Compute bounds over every value of the sequence
    pub fn compute<'a>(values: impl IntoIterator<Item = &'a f32>) -> Option<Self> {
        let mut sorted: Vec<f32> = values.into_iter().copied().collect();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let q1 = percentile(&sorted, LOWER_PERCENTILE)?;
        let q3 = percentile(&sorted, UPPER_PERCENTILE)?;
        let median = percentile(&sorted, 50.0)?;
        let iqr = q3 - q1;
        Some(Self {
            lower: q1 - IQR_FACTOR * iqr,
            upper: q3 + IQR_FACTOR * iqr,
            median,
        })
    }

    pub fn contains(&self, value: f32) -> bool {
        value >= self.lower && value <= self.upper
    }
}

/// Replace outliers of a single sequence in place
pub fn filter_sequence_outliers<S, D>(seq: &mut ArrayBase<S, D>)
where
    S: DataMut<Elem = f32>,
    D: Dimension,
{
    let Some(bounds) = OutlierBounds::compute(seq.iter()) else {
        return;
    };
    seq.mapv_inplace(|v| if bounds.contains(v) { v } else { bounds.median });
}

/// Filter a `(batch, frames, joints)` array, one sequence per leading index
pub fn filter_outliers(batch: &Array3<f32>) -> Array3<f32> {
    let mut filtered = batch.clone();
    for mut seq in filtered.axis_iter_mut(Axis(0)) {
        filter_sequence_outliers(&mut seq);
    }
    filtered
}
