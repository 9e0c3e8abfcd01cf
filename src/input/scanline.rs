use crate::foundation::budget::{MemoryBudget, Reservation};
use crate::foundation::core::{CHANNELS, row_bytes};
use crate::foundation::error::{PanoError, PanoResult};
use anyhow::Context as _;
use image::{ImageDecoder as _, ImageFormat};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::rc::Rc;

/// Row-sequential access to a decoded RGB8 image.
///
/// Rows are produced strictly top to bottom. Implementations only ever deliver
/// 3-channel, 8-bit pixels; anything else must be rejected when the reader is
/// created.
pub trait ScanlineReader {
    /// Full image width in pixels.
    fn width(&self) -> u32;

    /// Full image height in pixels.
    fn height(&self) -> u32;

    /// Embedded ICC profile, empty when absent.
    fn icc_profile(&self) -> &[u8];

    /// Index of the row the next [`read_scanline`](Self::read_scanline) call produces.
    fn output_scanline(&self) -> u32;

    /// Skip up to `count` rows without delivering them. Returns the number skipped.
    fn skip_scanlines(&mut self, count: u32) -> PanoResult<u32>;

    /// Restrict subsequent rows to the column span starting at `left` with
    /// `width` pixels.
    ///
    /// Returns the span that will actually be delivered, which may be wider
    /// than requested but always contains it. Readers without partial-row
    /// support return the full row.
    fn crop_scanline(&mut self, left: u32, width: u32) -> (u32, u32) {
        let _ = (left, width);
        (0, self.width())
    }

    /// Decode the next row into `dest`, which holds exactly the current span.
    fn read_scanline(&mut self, dest: &mut [u8]) -> PanoResult<()>;
}

impl<R: ScanlineReader + ?Sized> ScanlineReader for &mut R {
    fn width(&self) -> u32 {
        (**self).width()
    }

    fn height(&self) -> u32 {
        (**self).height()
    }

    fn icc_profile(&self) -> &[u8] {
        (**self).icc_profile()
    }

    fn output_scanline(&self) -> u32 {
        (**self).output_scanline()
    }

    fn skip_scanlines(&mut self, count: u32) -> PanoResult<u32> {
        (**self).skip_scanlines(count)
    }

    fn crop_scanline(&mut self, left: u32, width: u32) -> (u32, u32) {
        (**self).crop_scanline(left, width)
    }

    fn read_scanline(&mut self, dest: &mut [u8]) -> PanoResult<()> {
        (**self).read_scanline(dest)
    }
}

/// A fully decoded RGB8 image served one row at a time.
///
/// Decoding through the `image` crate materialises the whole frame, so the
/// decoded pixels are accounted against the memory budget for as long as the
/// reader lives.
#[derive(Debug)]
pub struct DecodedImage {
    width: u32,
    height: u32,
    icc: Vec<u8>,
    pixels: Vec<u8>,
    next_row: u32,
    span: (u32, u32),
    _reservation: Option<Reservation>,
}

impl DecodedImage {
    /// Wrap already-decoded packed RGB8 pixels.
    pub fn from_rgb8(width: u32, height: u32, pixels: Vec<u8>, icc: Vec<u8>) -> PanoResult<Self> {
        let expected = row_bytes(width) * height as usize;
        if pixels.len() != expected {
            return Err(PanoError::codec(format!(
                "pixel buffer holds {} bytes, expected {expected} for {width}x{height} RGB8",
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            icc,
            pixels,
            next_row: 0,
            span: (0, width),
            _reservation: None,
        })
    }

    /// Decode the image at `path`.
    ///
    /// The format is guessed from the file contents unless given. Sources that
    /// are not 3-channel 8-bit are rejected before any pixel data is decoded.
    pub fn open(
        path: &Path,
        format: Option<ImageFormat>,
        budget: &Rc<MemoryBudget>,
    ) -> PanoResult<Self> {
        let file = File::open(path)
            .with_context(|| format!("unable to open input image '{}'", path.display()))?;
        let mut reader = image::ImageReader::new(BufReader::new(file));
        match format {
            Some(f) => reader.set_format(f),
            None => {
                reader = reader
                    .with_guessed_format()
                    .with_context(|| format!("read input image '{}'", path.display()))?;
            }
        }
        // Allocation is bounded by the memory budget instead.
        reader.no_limits();

        let mut decoder = reader.into_decoder()?;
        let color = decoder.color_type();
        if color.channel_count() as usize != CHANNELS {
            return Err(PanoError::config(
                "invalid input image: wrong number of components",
            ));
        }
        if color.bytes_per_pixel() as usize != CHANNELS {
            return Err(PanoError::config(
                "invalid input image: wrong data precision",
            ));
        }

        let (width, height) = decoder.dimensions();
        let icc = decoder.icc_profile()?.unwrap_or_default();
        let reservation = budget.claim(&[decoder.total_bytes()])?;
        let mut pixels = vec![0u8; reservation.bytes() as usize];
        decoder.read_image(&mut pixels)?;

        tracing::debug!(width, height, icc_bytes = icc.len(), path = %path.display(), "decoded source image");

        let mut decoded = Self::from_rgb8(width, height, pixels, icc)?;
        decoded._reservation = Some(reservation);
        Ok(decoded)
    }
}

impl ScanlineReader for DecodedImage {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn icc_profile(&self) -> &[u8] {
        &self.icc
    }

    fn output_scanline(&self) -> u32 {
        self.next_row
    }

    fn skip_scanlines(&mut self, count: u32) -> PanoResult<u32> {
        let skipped = count.min(self.height - self.next_row);
        self.next_row += skipped;
        Ok(skipped)
    }

    fn crop_scanline(&mut self, left: u32, width: u32) -> (u32, u32) {
        let left = left.min(self.width);
        self.span = (left, width.min(self.width - left));
        self.span
    }

    fn read_scanline(&mut self, dest: &mut [u8]) -> PanoResult<()> {
        if self.next_row >= self.height {
            return Err(PanoError::codec("read past the last scanline"));
        }
        let (left, span) = self.span;
        if dest.len() != row_bytes(span) {
            return Err(PanoError::codec(format!(
                "scanline buffer holds {} bytes, expected {}",
                dest.len(),
                row_bytes(span)
            )));
        }
        let start = row_bytes(self.width) * self.next_row as usize + row_bytes(left);
        dest.copy_from_slice(&self.pixels[start..start + dest.len()]);
        self.next_row += 1;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/input/scanline.rs"]
mod tests;
