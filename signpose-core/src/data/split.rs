//! Ratio-based partitioning of flat sample lists
//!
//! Produces contiguous train/val/test style slices.

use rand::Rng;

use super::filter::SampleList;
use crate::error::{Result, SignPoseError};

/// Tolerance on `sum(ratios) == 1`
pub const RATIO_SUM_TOLERANCE: f64 = 1e-9;

/// Partition `list` into `ratios.len()` contiguous slices.
///
/// Slice boundaries are the rounded cumulative ratios, so every slice is
/// within one sample of its ideal size and the sizes always sum to
/// `list.len()`.
pub fn split_by_ratios(list: &SampleList, ratios: &[f64]) -> Result<Vec<SampleList>> {
    let bounds = split_bounds(list.len(), ratios)?;
    Ok(bounds
        .windows(2)
        .map(|w| list.slice(w[0], w[1]))
        .collect())
}

/// Shuffle a copy of `list` with `rng`, then split it
pub fn split_shuffled<R: Rng + ?Sized>(
    list: &SampleList,
    ratios: &[f64],
    rng: &mut R,
) -> Result<Vec<SampleList>> {
    validate_ratios(ratios)?;
    let mut shuffled = list.clone();
    shuffled.shuffle(rng);
    split_by_ratios(&shuffled, ratios)
}

/// Slice sizes for `total` items
pub fn split_sizes(total: usize, ratios: &[f64]) -> Result<Vec<usize>> {
    let bounds = split_bounds(total, ratios)?;
    Ok(bounds.windows(2).map(|w| w[1] - w[0]).collect())
}

/// `ratios.len() + 1` boundaries from 0 to `total`
fn split_bounds(total: usize, ratios: &[f64]) -> Result<Vec<usize>> {
    validate_ratios(ratios)?;

    let mut bounds = Vec::with_capacity(ratios.len() + 1);
    bounds.push(0);
    let mut cumulative = 0.0;
    for &ratio in &ratios[..ratios.len() - 1] {
        cumulative += ratio;
        let prev = *bounds.last().unwrap_or(&0);
        let bound = ((total as f64) * cumulative).round() as usize;
        bounds.push(bound.clamp(prev, total));
    }
    bounds.push(total);
    Ok(bounds)
}

fn validate_ratios(ratios: &[f64]) -> Result<()> {
    let invalid = |reason: &str| SignPoseError::InvalidRatios {
        ratios: ratios.to_vec(),
        reason: reason.to_string(),
    };

    if ratios.len() < 2 {
        return Err(invalid("at least 2 ratios are required"));
    }
    if ratios.iter().any(|r| !r.is_finite() || *r < 0.0) {
        return Err(invalid("ratios must be finite and non-negative"));
    }
    let sum: f64 = ratios.iter().sum();
    if (sum - 1.0).abs() > RATIO_SUM_TOLERANCE {
        return Err(invalid(&format!("ratios sum to {sum}, expected 1")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sizes_for_common_split() {
        assert_eq!(split_sizes(100, &[0.7, 0.2, 0.1]).unwrap(), vec![70, 20, 10]);
        assert_eq!(split_sizes(10, &[0.5, 0.5]).unwrap(), vec![5, 5]);
        assert_eq!(split_sizes(0, &[0.8, 0.2]).unwrap(), vec![0, 0]);
    }

    #[test]
    fn test_rejects_bad_ratios() {
        assert!(matches!(
            split_sizes(10, &[1.0]),
            Err(SignPoseError::InvalidRatios { .. })
        ));
        assert!(matches!(
            split_sizes(10, &[0.5, 0.4]),
            Err(SignPoseError::InvalidRatios { .. })
        ));
        assert!(matches!(
            split_sizes(10, &[1.5, -0.5]),
            Err(SignPoseError::InvalidRatios { .. })
        ));
    }
}
