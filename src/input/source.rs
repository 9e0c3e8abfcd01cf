use crate::foundation::budget::{MemoryBudget, Reservation};
use crate::foundation::core::{CHANNELS, Metadata, row_bytes};
use crate::foundation::error::{PanoError, PanoResult};
use crate::geometry::crop::{CropRect, IntegerCropRect};
use crate::input::scanline::{DecodedImage, ScanlineReader};
use image::ImageFormat;
use std::path::Path;
use std::rc::Rc;

/// Fixed-point scale used by [`SourceBuffer::interpolate`].
const SCALE: i32 = 256;

/// The cropped region of an equirectangular source, held in memory.
///
/// Only the rows and columns inside the resolved crop window are stored. A
/// wrapped window is stored as one contiguous logical row starting at
/// `crop.left` and continuing through column 0.
#[derive(Debug)]
pub struct SourceBuffer {
    width: u32,
    height: u32,
    crop: IntegerCropRect,
    metadata: Metadata,
    data: Vec<u8>,
    _reservation: Reservation,
}

impl SourceBuffer {
    /// Decode the image at `path`, keeping only the part inside `crop`.
    pub fn open(
        path: &Path,
        format: Option<ImageFormat>,
        crop: &CropRect,
        budget: &Rc<MemoryBudget>,
    ) -> PanoResult<Self> {
        let reader = DecodedImage::open(path, format, budget)?;
        Self::decode(reader, crop, budget)
    }

    /// Read exactly the rows of `crop` from `reader` and buffer its columns.
    ///
    /// The buffer is reserved from `budget` before it is allocated. Rows after
    /// the window are skipped so that the reader is left fully consumed.
    pub fn decode<R: ScanlineReader>(
        mut reader: R,
        crop: &CropRect,
        budget: &Rc<MemoryBudget>,
    ) -> PanoResult<Self> {
        let (width, height) = (reader.width(), reader.height());
        let crop = IntegerCropRect::resolve(crop, width, height)?;

        let (mut span_left, mut span_width) = if crop.wrap {
            (0, width)
        } else {
            (crop.left, crop.right - crop.left)
        };

        let reservation = budget.claim(&[
            CHANNELS as u64,
            u64::from(crop.width),
            u64::from(crop.height),
        ])?;
        let mut data = vec![0u8; reservation.bytes() as usize];

        if span_width < width {
            (span_left, span_width) = reader.crop_scanline(span_left, span_width);
            if span_left > crop.left || span_left + span_width < crop.right {
                return Err(PanoError::codec(format!(
                    "decoder span {span_left}+{span_width} does not cover columns {}..{}",
                    crop.left, crop.right
                )));
            }
        }
        if crop.top > 0 {
            reader.skip_scanlines(crop.top)?;
        }

        tracing::debug!(
            left = crop.left,
            right = crop.right,
            top = crop.top,
            bottom = crop.bottom,
            wrap = crop.wrap,
            span_left,
            span_width,
            "buffering source crop"
        );

        let row_len = row_bytes(crop.width);
        if row_len > 0 {
            if crop.wrap {
                let mut scratch = vec![0u8; row_bytes(width)];
                let left_offset = row_bytes(crop.left);
                let left_size = row_bytes(width - crop.left);
                let right_size = row_bytes(crop.right);
                for dest in data.chunks_exact_mut(row_len) {
                    reader.read_scanline(&mut scratch)?;
                    dest[..left_size].copy_from_slice(&scratch[left_offset..]);
                    dest[left_size..].copy_from_slice(&scratch[..right_size]);
                }
            } else if crop.width < span_width {
                let mut scratch = vec![0u8; row_bytes(span_width)];
                let offset = row_bytes(crop.left - span_left);
                for dest in data.chunks_exact_mut(row_len) {
                    reader.read_scanline(&mut scratch)?;
                    dest.copy_from_slice(&scratch[offset..offset + row_len]);
                }
            } else {
                for dest in data.chunks_exact_mut(row_len) {
                    reader.read_scanline(dest)?;
                }
            }
        }

        let remaining = height.saturating_sub(reader.output_scanline());
        reader.skip_scanlines(remaining)?;

        Ok(Self {
            width,
            height,
            crop,
            metadata: Metadata::with_icc(reader.icc_profile().to_vec()),
            data,
            _reservation: reservation,
        })
    }

    /// Full source width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Full source height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The resolved crop window.
    pub fn crop(&self) -> &IntegerCropRect {
        &self.crop
    }

    /// Metadata read from the source.
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// The buffered part of source row `y`, or `None` outside the window.
    pub fn row(&self, y: u32) -> Option<&[u8]> {
        if !self.crop.contains_row(y) {
            return None;
        }
        let len = row_bytes(self.crop.width);
        let start = (y - self.crop.top) as usize * len;
        Some(&self.data[start..start + len])
    }

    /// The RGB triple at source column `col`, row `row`, or `None` outside the window.
    pub fn pixel(&self, col: u32, row: u32) -> Option<&[u8]> {
        if !self.crop.contains_col(col) || !self.crop.contains_row(row) {
            return None;
        }
        let start = self.offset(col, row);
        Some(&self.data[start..start + CHANNELS])
    }

    fn offset(&self, col: u32, row: u32) -> usize {
        debug_assert!(self.crop.contains_col(col), "column {col} outside crop");
        debug_assert!(self.crop.contains_row(row), "row {row} outside crop");
        ((row - self.crop.top) as usize * self.crop.width as usize
            + self.crop.col_offset(col) as usize)
            * CHANNELS
    }

    /// Bilinearly interpolate the source at pixel coordinates `(x, y)` into
    /// the first three bytes of `dest`.
    ///
    /// Uses 8-bit fixed-point weights. Columns wrap modulo the full width; the
    /// lower neighbour row is clamped to the bottom of the window. The four
    /// neighbours must otherwise lie inside the window.
    #[inline]
    pub fn interpolate(&self, dest: &mut [u8], x: f32, y: f32) {
        let xf = x.floor();
        let yf = y.floor();
        let fx = x - xf;
        let fy = y - yf;
        let mu = (SCALE as f32 * fx) as i32;
        let nu = (SCALE as f32 * fy) as i32;
        let munu = (SCALE as f32 * fx * fy) as i32;

        let full = self.width as i32;
        let x0 = (xf as i32).rem_euclid(full) as u32;
        let x1 = (xf as i32 + 1).rem_euclid(full) as u32;
        let y0 = (yf as i32).max(0) as u32;
        let y1 = (y0 + 1).min(self.crop.bottom.saturating_sub(1));

        let f00 = self.offset(x0, y0);
        let f01 = self.offset(x0, y1);
        let f10 = self.offset(x1, y0);
        let f11 = self.offset(x1, y1);

        for (c, out) in dest.iter_mut().take(CHANNELS).enumerate() {
            let p00 = i32::from(self.data[f00 + c]);
            let p01 = i32::from(self.data[f01 + c]);
            let p10 = i32::from(self.data[f10 + c]);
            let p11 = i32::from(self.data[f11 + c]);
            let v = SCALE * p00
                + mu * (p10 - p00)
                + nu * (p01 - p00)
                + munu * (p11 - p10 - p01 + p00);
            *out = (v / SCALE).clamp(0, 255) as u8;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/input/source.rs"]
mod tests;
