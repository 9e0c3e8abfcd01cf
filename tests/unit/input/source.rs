use super::*;
use crate::geometry::face::Face;

fn coded_image(width: u32, height: u32) -> DecodedImage {
    let mut pixels = Vec::new();
    for y in 0..height {
        for x in 0..width {
            pixels.extend_from_slice(&[x as u8 * 10, y as u8 * 10, 7]);
        }
    }
    DecodedImage::from_rgb8(width, height, pixels, Vec::new()).unwrap()
}

/// Delegating reader that widens partial-row requests to 4-pixel blocks, as
/// block-based decoders do, and counts delivered rows.
struct BlockAlignedReader {
    inner: DecodedImage,
    rows_read: u32,
}

impl ScanlineReader for BlockAlignedReader {
    fn width(&self) -> u32 {
        self.inner.width()
    }
    fn height(&self) -> u32 {
        self.inner.height()
    }
    fn icc_profile(&self) -> &[u8] {
        self.inner.icc_profile()
    }
    fn output_scanline(&self) -> u32 {
        self.inner.output_scanline()
    }
    fn skip_scanlines(&mut self, count: u32) -> PanoResult<u32> {
        self.inner.skip_scanlines(count)
    }
    fn crop_scanline(&mut self, left: u32, width: u32) -> (u32, u32) {
        let aligned = left / 4 * 4;
        let end = (left + width).div_ceil(4) * 4;
        self.inner.crop_scanline(aligned, end - aligned)
    }
    fn read_scanline(&mut self, dest: &mut [u8]) -> PanoResult<()> {
        self.rows_read += 1;
        self.inner.read_scanline(dest)
    }
}

#[test]
fn full_window_buffers_every_pixel() {
    let budget = Rc::new(MemoryBudget::new());
    let src = SourceBuffer::decode(coded_image(8, 4), &CropRect::FULL, &budget).unwrap();
    assert_eq!((src.width(), src.height()), (8, 4));
    assert_eq!(src.pixel(3, 2).unwrap(), &[30, 20, 7]);
    assert_eq!(src.row(1).unwrap().len(), 8 * CHANNELS);
    assert_eq!(&src.row(1).unwrap()[..3], &[0, 10, 7]);
    assert!(src.pixel(8, 0).is_none());
    assert!(src.row(4).is_none());
}

#[test]
fn wrapped_window_addresses_both_halves() {
    let budget = Rc::new(MemoryBudget::new());
    let src = SourceBuffer::decode(coded_image(16, 8), &Face::Back.crop_rect(), &budget).unwrap();
    let crop = *src.crop();
    assert!(crop.wrap);
    assert_eq!((crop.left, crop.right, crop.top, crop.bottom), (13, 3, 1, 7));

    for row in 0..8u32 {
        for col in 0..16u32 {
            let inside = (col >= 13 || col < 3) && (1..7).contains(&row);
            match src.pixel(col, row) {
                Some(px) => {
                    assert!(inside, "({col}, {row}) should be outside");
                    assert_eq!(px, &[col as u8 * 10, row as u8 * 10, 7]);
                }
                None => assert!(!inside, "({col}, {row}) should be inside"),
            }
        }
    }
    assert!(src.pixel(16, 3).is_none());
}

#[test]
fn partial_row_decode_copies_needed_columns_only() {
    let budget = Rc::new(MemoryBudget::new());
    let reader = BlockAlignedReader {
        inner: coded_image(16, 8),
        rows_read: 0,
    };
    let src = SourceBuffer::decode(reader, &Face::Front.crop_rect(), &budget).unwrap();
    let crop = *src.crop();
    assert_eq!((crop.left, crop.right), (5, 11));
    assert_eq!(crop.width, 6);
    for col in 5..11 {
        assert_eq!(src.pixel(col, 4).unwrap(), &[col as u8 * 10, 40, 7]);
    }
    assert!(src.pixel(4, 4).is_none());
    assert!(src.pixel(11, 4).is_none());
}

#[test]
fn only_window_rows_are_decoded() {
    let budget = Rc::new(MemoryBudget::new());
    let mut reader = BlockAlignedReader {
        inner: coded_image(16, 8),
        rows_read: 0,
    };
    let crop = IntegerCropRect::resolve(&Face::Top.crop_rect(), 16, 8).unwrap();
    let src = SourceBuffer::decode(&mut reader, &Face::Top.crop_rect(), &budget).unwrap();
    assert_eq!(src.crop().height, crop.height);
    assert_eq!(reader.rows_read, crop.height);
    assert_eq!(reader.output_scanline(), 8);
}

#[test]
fn buffer_is_reserved_before_allocation_and_released_on_drop() {
    let budget = Rc::new(MemoryBudget::with_limit(3 * 8 * 4 - 1));
    let err = SourceBuffer::decode(coded_image(8, 4), &CropRect::FULL, &budget).unwrap_err();
    assert!(matches!(err, PanoError::OutOfMemory { .. }));
    assert_eq!(budget.usage(), 0);

    budget.set_limit(3 * 8 * 4);
    let src = SourceBuffer::decode(coded_image(8, 4), &CropRect::FULL, &budget).unwrap();
    assert_eq!(budget.usage(), 3 * 8 * 4);
    drop(src);
    assert_eq!(budget.usage(), 0);
}

#[test]
fn icc_profile_is_carried_into_metadata() {
    let budget = Rc::new(MemoryBudget::new());
    let reader = DecodedImage::from_rgb8(2, 1, vec![0; 6], vec![9, 8, 7]).unwrap();
    let src = SourceBuffer::decode(reader, &CropRect::FULL, &budget).unwrap();
    assert_eq!(src.metadata().icc, vec![9, 8, 7]);
}

#[test]
fn interpolation_blends_neighbours_in_fixed_point() {
    let pixels = vec![
        0, 0, 0, 100, 100, 100, 200, 200, 200, 50, 50, 50, //
        100, 100, 100, 200, 200, 200, 0, 0, 0, 250, 250, 250,
    ];
    let reader = DecodedImage::from_rgb8(4, 2, pixels, Vec::new()).unwrap();
    let budget = Rc::new(MemoryBudget::new());
    let src = SourceBuffer::decode(reader, &CropRect::FULL, &budget).unwrap();

    let mut out = [0u8; 3];
    src.interpolate(&mut out, 1.0, 0.0);
    assert_eq!(out, [100; 3]);

    src.interpolate(&mut out, 0.5, 0.0);
    assert_eq!(out, [50; 3]);

    src.interpolate(&mut out, 0.0, 0.5);
    assert_eq!(out, [50; 3]);

    src.interpolate(&mut out, 0.5, 0.5);
    assert_eq!(out, [100; 3]);

    // Column 3 blends with column 0 across the seam.
    src.interpolate(&mut out, 3.5, 0.0);
    assert_eq!(out, [25; 3]);

    // The last row has no lower neighbour; it must not be read.
    src.interpolate(&mut out, 2.0, 1.0);
    assert_eq!(out, [0; 3]);
}
