// Tests for hornet-data: IDX loading from disk, labels, synthetic data

use std::fs;
use std::path::PathBuf;

use hornet_data::{
    build_idx1_bytes, build_idx3_bytes, pixel_value, IdxDataset, IdxError, IdxSplit,
};

/// A fresh directory under the system temp dir, unique per test.
fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("hornet-data-{}-{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

/// Write a split of 2x3 images whose pixels are all `label * 10`.
fn write_split(dir: &PathBuf, split: IdxSplit, labels: &[u8]) {
    let pixels: Vec<Vec<u8>> = labels.iter().map(|&l| vec![l * 10; 6]).collect();
    let refs: Vec<&[u8]> = pixels.iter().map(|p| p.as_slice()).collect();
    let (img_name, lbl_name) = split.file_names();
    fs::write(dir.join(img_name), build_idx3_bytes(&refs, 2, 3)).unwrap();
    fs::write(dir.join(lbl_name), build_idx1_bytes(labels)).unwrap();
}

#[test]
fn test_load_split_from_disk() {
    let dir = scratch_dir("load");
    write_split(&dir, IdxSplit::Train, &[3, 1, 3, 7]);

    let ds = IdxDataset::load(&dir, IdxSplit::Train, None).unwrap();
    assert_eq!(ds.len(), 4);
    assert_eq!(ds.split(), IdxSplit::Train);
    assert_eq!(ds.image_dims(), (2, 3));
    // [cols, rows]
    assert_eq!(ds.input_dims().dims(), &[3, 2]);
    assert_eq!(ds.classes(), &[1, 3, 7]);
    assert_eq!(ds.label(2), Some(3));
    assert_eq!(ds.label(4), None);

    assert_eq!(ds.targets()[0].values(), &[0.0, 1.0, 0.0]);
    assert_eq!(ds.targets()[3].values(), &[0.0, 0.0, 1.0]);
    assert!(ds.images()[1]
        .values()
        .iter()
        .all(|&v| v == pixel_value(10)));

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_load_with_limit() {
    let dir = scratch_dir("limit");
    write_split(&dir, IdxSplit::Test, &[0, 1, 2, 3, 4]);

    let ds = IdxDataset::load(&dir, IdxSplit::Test, Some(2)).unwrap();
    assert_eq!(ds.len(), 2);
    assert_eq!(ds.classes(), &[0, 1]);

    let ds = IdxDataset::load(&dir, IdxSplit::Test, Some(100)).unwrap();
    assert_eq!(ds.len(), 5);

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_missing_split() {
    let dir = scratch_dir("missing");
    write_split(&dir, IdxSplit::Train, &[0, 1]);
    let err = IdxDataset::load(&dir, IdxSplit::Test, None).unwrap_err();
    assert!(matches!(err, IdxError::MissingFile(_)));
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_relabel_test_split_onto_train_classes() {
    let dir = scratch_dir("relabel");
    write_split(&dir, IdxSplit::Train, &[0, 1, 2]);
    write_split(&dir, IdxSplit::Test, &[2, 2]);

    let train = IdxDataset::load(&dir, IdxSplit::Train, None).unwrap();
    let mut test = IdxDataset::load(&dir, IdxSplit::Test, None).unwrap();
    assert_eq!(test.targets()[0].values(), &[1.0]);

    test.relabel(train.classes()).unwrap();
    assert_eq!(test.classes(), train.classes());
    assert_eq!(test.targets()[0].values(), &[0.0, 0.0, 1.0]);

    let mut only_zero = IdxDataset::load(&dir, IdxSplit::Test, None).unwrap();
    assert!(matches!(
        only_zero.relabel(&[0]),
        Err(IdxError::UnknownLabel(2))
    ));

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_label_count_mismatch() {
    let img = build_idx3_bytes(&[&[0u8; 4], &[0u8; 4]], 2, 2);
    let lbl = build_idx1_bytes(&[1]);
    let err = IdxDataset::from_raw(&img, &lbl, IdxSplit::Train, None).unwrap_err();
    assert!(matches!(
        err,
        IdxError::CountMismatch {
            images: 2,
            labels: 1
        }
    ));
}

#[test]
fn test_synthetic_dataset() {
    let ds = IdxDataset::synthetic(12, 5, 4, 3, 42).unwrap();
    assert_eq!(ds.len(), 12);
    assert_eq!(ds.classes(), &[0, 1, 2]);
    assert_eq!(ds.input_dims().dims(), &[4, 5]);
    assert!(ds
        .images()
        .iter()
        .all(|img| img.values().iter().all(|v| v.abs() <= 0.51)));

    let again = IdxDataset::synthetic(12, 5, 4, 3, 42).unwrap();
    assert_eq!(ds.images(), again.images());

    let (images, targets) = ds.into_samples();
    assert_eq!(images.len(), targets.len());
}
