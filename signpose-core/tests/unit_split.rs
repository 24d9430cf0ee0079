//! Unit tests for ratio splits
//!
//! Tests sizes, alignment of (rgb, pose, class) triples and ratio validation.

use rand::rngs::StdRng;
use rand::SeedableRng;
use signpose_core::data::{split_by_ratios, split_shuffled, split_sizes, SampleEntry, SampleList};
use signpose_core::SignPoseError;
use std::path::PathBuf;

fn list(n: usize) -> SampleList {
    (0..n)
        .map(|i| SampleEntry {
            rgb: PathBuf::from(format!("rgb/{i}.avi")),
            pose: PathBuf::from(format!("pose/{i}.npy")),
            class_index: i % 5,
        })
        .collect()
}

fn aligned(entry: &SampleEntry) -> bool {
    let rgb = entry.rgb.file_stem().unwrap();
    let pose = entry.pose.file_stem().unwrap();
    let i: usize = rgb.to_str().unwrap().parse().unwrap();
    rgb == pose && entry.class_index == i % 5
}

#[test]
fn test_standard_split() {
    let splits = split_by_ratios(&list(100), &[0.7, 0.2, 0.1]).unwrap();
    let sizes: Vec<_> = splits.iter().map(SampleList::len).collect();
    assert_eq!(sizes, vec![70, 20, 10]);
}

#[test]
fn test_sizes_sum_and_stay_near_ideal() {
    let ratio_sets: [&[f64]; 4] = [&[0.7, 0.2, 0.1], &[0.5, 0.5], &[1.0 / 3.0; 3], &[0.25, 0.25, 0.25, 0.25]];
    for ratios in ratio_sets {
        for n in 0..60 {
            let sizes = split_sizes(n, ratios).unwrap();
            assert_eq!(sizes.len(), ratios.len());
            assert_eq!(sizes.iter().sum::<usize>(), n, "ratios {:?} n {}", ratios, n);
            for (size, ratio) in sizes.iter().zip(ratios) {
                let ideal = ratio * n as f64;
                assert!((*size as f64 - ideal).abs() <= 1.0, "size {} ideal {}", size, ideal);
            }
        }
    }
}

#[test]
fn test_splits_are_contiguous_and_disjoint() {
    let source = list(23);
    let splits = split_by_ratios(&source, &[0.6, 0.4]).unwrap();
    let rejoined: Vec<_> = splits.iter().flat_map(|s| s.iter().cloned()).collect();
    assert_eq!(rejoined, source.entries());
}

#[test]
fn test_shuffled_split_keeps_triples_aligned() {
    let source = list(57);
    let splits = split_shuffled(&source, &[0.7, 0.2, 0.1], &mut StdRng::seed_from_u64(42)).unwrap();
    let total: usize = splits.iter().map(SampleList::len).sum();
    assert_eq!(total, 57);
    assert!(splits.iter().flat_map(|s| s.iter()).all(aligned));

    let again = split_shuffled(&source, &[0.7, 0.2, 0.1], &mut StdRng::seed_from_u64(42)).unwrap();
    assert_eq!(splits, again);
}

#[test]
fn test_invalid_ratios() {
    let source = list(10);
    for ratios in [&[][..], &[0.5, 0.4][..], &[1.2, -0.2][..], &[0.5, f64::NAN][..]] {
        assert!(
            matches!(split_by_ratios(&source, ratios), Err(SignPoseError::InvalidRatios { .. })),
            "{:?} should be rejected",
            ratios
        );
    }
}
