//! Unit tests for dataset indexing and filtering
//!
//! Builds small on-disk datasets and checks the index, filters and the
//! samples generated from them.

use ndarray::Array3;
use ndarray_npy::write_npy;
use signpose_core::augment::Mode;
use signpose_core::data::{DatasetIndex, FilterSpec};
use signpose_core::{Dataset, DatasetConfig, LabelMap, LayoutConfig, SignPoseError};
use std::fs;
use std::path::Path;

fn add_capture(root: &Path, batch: &str, name: &str, with_pose: bool) {
    let rgb = root.join(batch).join("rgb");
    let landmarks = root.join(batch).join("mediapipe_landmarks");
    fs::create_dir_all(&rgb).unwrap();
    fs::create_dir_all(&landmarks).unwrap();
    fs::write(rgb.join(format!("{name}.avi")), b"").unwrap();
    if with_pose {
        let raw = Array3::<f64>::from_shape_fn((12, 33, 3), |(f, j, _)| 0.5 + 0.01 * f as f64 - 0.001 * j as f64);
        write_npy(landmarks.join(format!("{name}.npy")), &raw).unwrap();
    }
}

fn map_file(root: &Path) -> std::path::PathBuf {
    let path = root.join("labels.txt");
    fs::write(&path, "A1 => house\nA2 => tree\n\nA3=>river\n").unwrap();
    path
}

#[test]
fn test_single_batch_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("data");
    for name in ["a", "b", "c"] {
        add_capture(&data, "A1P01", name, true);
    }
    add_capture(&data, "A1P01", "d", false);

    let config = DatasetConfig {
        map_file: Some(map_file(dir.path())),
        ..DatasetConfig::new(&data)
    };
    let dataset = Dataset::open(config).unwrap();

    assert_eq!(dataset.classes(), ["house"]);
    assert_eq!(dataset.persons(), ["01"]);
    let samples = dataset.index().samples("house", "01").unwrap();
    assert_eq!(samples.len(), 3);
    assert!(samples.pairs().all(|(rgb, pose)| rgb.file_stem() == pose.file_stem()));
    assert_eq!(dataset.index().stats().skipped, 1);

    let list = dataset.filter(&FilterSpec::all(), false).unwrap();
    assert_eq!(list.len(), 3);
    assert!(list.class_indices().all(|c| c == 0));

    let generator = dataset.generator(Some(list), Mode::Eval, None).unwrap();
    let emitted: Vec<_> = generator
        .iter(None)
        .unwrap()
        .collect::<signpose_core::Result<_>>()
        .unwrap();
    assert_eq!(emitted.len(), 3);
    assert!(emitted.iter().all(|s| s.temporal.dim() == (320, 66) && s.label.to_vec() == vec![1.0]));
}

#[test]
fn test_filter_by_class_and_person() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    add_capture(root, "A1P01", "x", true);
    add_capture(root, "A1P02", "x", true);
    add_capture(root, "A1P02", "y", true);
    add_capture(root, "A2P01", "x", true);
    add_capture(root, "A3P03", "x", true);

    let map = LabelMap::parse("A1 => house\nA2 => tree\nA3 => river");
    let index = DatasetIndex::build(root, &map, &LayoutConfig::default()).unwrap();
    assert_eq!(index.classes(), ["house", "tree", "river"]);
    assert_eq!(index.persons(), ["01", "02", "03"]);
    assert_eq!(index.len(), 5);

    let houses = index.filter(&FilterSpec::all().with_classes(["house"])).unwrap();
    assert_eq!(houses.len(), 3);

    // tree has no person 02: skipped, not an error
    let person_two = index
        .filter(&FilterSpec::all().with_classes(["tree", "house"]).with_persons(["02"]))
        .unwrap();
    assert_eq!(person_two.len(), 2);
    assert!(person_two.class_indices().all(|c| c == 0));

    // Classes outermost, in the requested order
    let ordered = index
        .filter(&FilterSpec::all().with_classes(["river", "tree"]))
        .unwrap();
    assert_eq!(ordered.class_indices().collect::<Vec<_>>(), vec![2, 1]);
}

#[test]
fn test_unknown_filter_entities() {
    let dir = tempfile::tempdir().unwrap();
    add_capture(dir.path(), "A1P01", "x", true);
    let map = LabelMap::parse("A1 => house");
    let index = DatasetIndex::build(dir.path(), &map, &LayoutConfig::default()).unwrap();

    assert!(matches!(
        index.filter(&FilterSpec::all().with_classes(["castle"])),
        Err(SignPoseError::UnknownClass { .. })
    ));
    assert!(matches!(
        index.filter(&FilterSpec::all().with_persons(["99"])),
        Err(SignPoseError::UnknownPerson { .. })
    ));
}

#[test]
fn test_unparseable_batch_name() {
    let dir = tempfile::tempdir().unwrap();
    add_capture(dir.path(), "A1", "x", true);
    let err = DatasetIndex::build(dir.path(), &LabelMap::default(), &LayoutConfig::default()).unwrap_err();
    assert!(matches!(err, SignPoseError::InvalidBatchName { .. }));
}

#[test]
fn test_missing_label_map_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = DatasetConfig {
        map_file: Some(dir.path().join("absent.txt")),
        ..DatasetConfig::new(dir.path())
    };
    assert!(matches!(Dataset::open(config), Err(SignPoseError::Io { .. })));
}
