use super::*;
use crate::foundation::budget::MemoryBudget;
use crate::foundation::error::PanoError;
use crate::geometry::crop::CropRect;
use crate::input::scanline::DecodedImage;
use crate::output::sink::MemorySink;
use std::rc::Rc;

fn source_from(
    width: u32,
    height: u32,
    crop: &CropRect,
    f: impl Fn(u32, u32) -> [u8; 3],
) -> SourceBuffer {
    let mut pixels = Vec::new();
    for y in 0..height {
        for x in 0..width {
            pixels.extend_from_slice(&f(x, y));
        }
    }
    let img = DecodedImage::from_rgb8(width, height, pixels, Vec::new()).unwrap();
    SourceBuffer::decode(img, crop, &Rc::new(MemoryBudget::new())).unwrap()
}

#[test]
fn every_row_is_written_then_the_sink_is_finished() {
    let src = source_from(16, 8, &CropRect::FULL, |x, y| [x as u8, y as u8, 0]);
    let mut sink = MemorySink::new(6, 6);
    extract_face(Face::Front, &src, &mut sink).unwrap();
    assert_eq!(sink.rows.len(), 6);
    assert!(sink.finished);
}

#[test]
fn uniform_source_stays_uniform_inside_each_face_window() {
    for face in Face::ALL {
        let src = source_from(64, 32, &face.crop_rect(), |_, _| [40, 80, 120]);
        let mut sink = MemorySink::new(9, 9);
        extract_face(face, &src, &mut sink).unwrap();
        for row in &sink.rows {
            for px in row.chunks_exact(3) {
                assert_eq!(px, &[40, 80, 120], "face {face}");
            }
        }
    }
}

#[test]
fn mirrored_half_matches_direct_half_for_symmetric_source() {
    // Symmetric about the centre of the front face, u = 7.5.
    let src = source_from(16, 8, &Face::Front.crop_rect(), |x, y| {
        let d = (2 * x as i32 - 15).unsigned_abs() as u8;
        [d * 12, y as u8 * 30, 5]
    });
    let mut sink = MemorySink::new(10, 10);
    extract_face(Face::Front, &src, &mut sink).unwrap();

    for row in &sink.rows {
        for i in 0..5usize {
            let left = &row[i * 3..i * 3 + 3];
            let right = &row[(9 - i) * 3..(9 - i) * 3 + 3];
            for c in 0..3 {
                assert!(left[c].abs_diff(right[c]) <= 1, "{left:?} vs {right:?}");
            }
        }
    }
}

struct FailingSink {
    rows: u32,
}

impl RowSink for FailingSink {
    fn width(&self) -> u32 {
        4
    }
    fn height(&self) -> u32 {
        4
    }
    fn write_row(&mut self, _row: &[u8]) -> PanoResult<()> {
        if self.rows == 2 {
            return Err(PanoError::codec("disk full"));
        }
        self.rows += 1;
        Ok(())
    }
    fn finish(&mut self) -> PanoResult<()> {
        panic!("finish must not run after a failed row");
    }
}

#[test]
fn sink_failure_aborts_the_face() {
    let src = source_from(16, 8, &CropRect::FULL, |_, _| [1, 2, 3]);
    let mut sink = FailingSink { rows: 0 };
    let err = extract_face(Face::Left, &src, &mut sink).unwrap_err();
    assert!(err.to_string().contains("disk full"));
    assert_eq!(sink.rows, 2);
}

/// Rasterize every pixel independently with `f64::atan2`, without the
/// mirrored half. The pole keeps azimuth 0, as `atan2_approx` does.
fn reference_face(face: Face, source: &SourceBuffer, size: u32) -> Vec<Vec<u8>> {
    use std::f64::consts::{FRAC_PI_2, PI, TAU};

    let u_scale = f64::from(source.width() - 1) / TAU;
    let v_scale = f64::from(source.height() - 1) / PI;
    (0..size)
        .map(|j| {
            let b = (2 * j + 1) as f32 / size as f32 - 1.0;
            let mut row = vec![0u8; row_bytes(size)];
            for i in 0..size {
                let a = (2 * i + 1) as f32 / size as f32 - 1.0;
                let [x, y, z] = face.direction(a, b).map(f64::from);
                let theta = if x == 0.0 && y == 0.0 { 0.0 } else { y.atan2(x) };
                let phi = z.atan2(x.hypot(y));
                let start = i as usize * CHANNELS;
                source.interpolate(
                    &mut row[start..],
                    ((theta + PI) * u_scale) as f32,
                    ((FRAC_PI_2 - phi) * v_scale) as f32,
                );
            }
            row
        })
        .collect()
}

#[test]
fn every_face_matches_an_unmirrored_reference() {
    let pattern = |x: u32, y: u32| [(4 * x) as u8, (8 * y) as u8, ((x + y) * 2) as u8];
    for face in Face::ALL {
        for window in [face.crop_rect(), CropRect::FULL] {
            let src = source_from(64, 32, &window, pattern);
            for size in [1, 4, 5, 8, 9, 16, 17] {
                let mut sink = MemorySink::new(size, size);
                extract_face(face, &src, &mut sink).unwrap();
                let expected = reference_face(face, &src, size);

                for (j, (got, want)) in sink.rows.iter().zip(&expected).enumerate() {
                    for (k, (g, w)) in got.iter().zip(want).enumerate() {
                        assert!(
                            g.abs_diff(*w) <= 6,
                            "{face} size {size} row {j} col {}: {g} vs {w}",
                            k / CHANNELS
                        );
                    }
                }
            }
        }
    }
}

#[test]
fn odd_right_face_centre_column_samples_the_right_side() {
    // Red west of the front axis, blue east of it.
    let src = source_from(64, 32, &CropRect::FULL, |x, _| {
        if x < 32 { [255, 0, 0] } else { [0, 0, 255] }
    });
    for size in [1, 3, 5, 7] {
        let mut sink = MemorySink::new(size, size);
        extract_face(Face::Right, &src, &mut sink).unwrap();
        for row in &sink.rows {
            for px in row.chunks_exact(CHANNELS) {
                assert_eq!(px, &[0, 0, 255], "size {size}");
            }
        }
    }

    let windowed = source_from(64, 32, &Face::Right.crop_rect(), |_, _| [7, 7, 7]);
    let mut sink = MemorySink::new(5, 5);
    extract_face(Face::Right, &windowed, &mut sink).unwrap();
    assert_eq!(sink.pixel(2, 2), Some(&[7u8, 7, 7][..]));
}
