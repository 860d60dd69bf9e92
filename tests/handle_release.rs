//! Checks that every exit path closes the files it opened.
//!
//! Kept in its own test binary so no other test opens descriptors while
//! the count is being compared.

#![cfg(target_os = "linux")]

use std::fs;

use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;
use tempfile::TempDir;

use jpeg_gray::{transform_image, ErrorKind, TransformOptions};

fn open_descriptors() -> usize {
    fs::read_dir("/proc/self/fd").unwrap().count()
}

#[test]
fn test_no_descriptor_leak_on_any_path() {
    let dir = TempDir::new().unwrap();
    let options = TransformOptions {
        quality: 75,
        parallel: false,
    };

    let good = dir.path().join("good.jpg");
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, 90)
        .encode(&[200u8; 4 * 4 * 3], 4, 4, ExtendedColorType::Rgb8)
        .unwrap();
    fs::write(&good, bytes).unwrap();

    let corrupt = dir.path().join("corrupt.jpg");
    fs::write(&corrupt, b"not a jpeg").unwrap();

    let baseline = open_descriptors();

    // corrupt header: input and temporary output were both opened
    let err = transform_image(&corrupt, &dir.path().join("a.jpg"), &options).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DecodeHeader);
    assert_eq!(open_descriptors(), baseline);

    // output directory missing: input was opened
    let err = transform_image(&good, &dir.path().join("missing/b.jpg"), &options).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::OutputOpen);
    assert_eq!(open_descriptors(), baseline);

    // input missing: nothing opened
    let err = transform_image(&dir.path().join("nope.jpg"), &dir.path().join("c.jpg"), &options)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InputOpen);
    assert_eq!(open_descriptors(), baseline);

    // success
    transform_image(&good, &dir.path().join("d.jpg"), &options).unwrap();
    assert_eq!(open_descriptors(), baseline);
}
