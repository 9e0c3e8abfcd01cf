use super::*;
use std::path::PathBuf;

fn scratch(name: &str) -> PathBuf {
    let dir = PathBuf::from("target").join("unit_output_image");
    std::fs::create_dir_all(&dir).unwrap();
    dir.join(name)
}

#[test]
fn rows_are_encoded_as_jpeg() {
    let path = scratch("gray.jpg");
    let budget = Rc::new(MemoryBudget::new());
    let mut out = OutputImage::create(
        &path,
        8,
        4,
        &Metadata::default(),
        &EncoderOptions::with_quality(95),
        &budget,
    )
    .unwrap();
    assert_eq!(budget.usage(), 8 * 4 * 3);

    let row = [128u8; 8 * 3];
    for _ in 0..4 {
        out.write_row(&row).unwrap();
    }
    out.finish().unwrap();
    drop(out);
    assert_eq!(budget.usage(), 0);

    let img = image::open(&path).unwrap().to_rgb8();
    assert_eq!(img.dimensions(), (8, 4));
    for px in img.pixels() {
        assert!(px.0[0].abs_diff(128) <= 2);
    }
}

#[test]
fn icc_profile_is_embedded() {
    use image::ImageDecoder as _;

    let path = scratch("icc.jpg");
    let icc = vec![7u8; 64];
    let budget = Rc::new(MemoryBudget::new());
    let mut out = OutputImage::create(
        &path,
        2,
        2,
        &Metadata::with_icc(icc.clone()),
        &EncoderOptions::default(),
        &budget,
    )
    .unwrap();
    out.write_row(&[0; 6]).unwrap();
    out.write_row(&[0; 6]).unwrap();
    out.finish().unwrap();

    let mut decoder = image::ImageReader::open(&path)
        .unwrap()
        .into_decoder()
        .unwrap();
    assert_eq!(decoder.icc_profile().unwrap(), Some(icc));
}

#[test]
fn row_contract_is_enforced() {
    let budget = Rc::new(MemoryBudget::new());
    let opts = EncoderOptions::default();
    let meta = Metadata::default();

    let mut out = OutputImage::create(&scratch("short.jpg"), 2, 2, &meta, &opts, &budget).unwrap();
    assert!(out.write_row(&[0; 5]).is_err());
    out.write_row(&[0; 6]).unwrap();
    assert!(out.finish().unwrap_err().to_string().contains("1 of 2 rows"));

    let mut out = OutputImage::create(&scratch("long.jpg"), 2, 1, &meta, &opts, &budget).unwrap();
    out.write_row(&[0; 6]).unwrap();
    assert!(out.write_row(&[0; 6]).is_err());
    out.finish().unwrap();
    assert!(out.finish().is_err());
    assert!(out.write_row(&[0; 6]).is_err());
}

#[test]
fn row_buffer_counts_against_the_budget() {
    let budget = Rc::new(MemoryBudget::with_limit(1000));
    let err = OutputImage::create(
        &scratch("big.jpg"),
        100,
        100,
        &Metadata::default(),
        &EncoderOptions::default(),
        &budget,
    )
    .err()
    .unwrap();
    assert!(err.to_string().contains("3 x 100 x 100"));
}

#[test]
fn unwritable_destination_fails_at_create() {
    let budget = Rc::new(MemoryBudget::new());
    let err = OutputImage::create(
        Path::new("target/no-such-dir/nested/out.jpg"),
        1,
        1,
        &Metadata::default(),
        &EncoderOptions::default(),
        &budget,
    )
    .err()
    .unwrap();
    assert!(err.to_string().contains("error opening output file"));
    assert_eq!(budget.usage(), 0);
}
