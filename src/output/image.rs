use crate::foundation::budget::{MemoryBudget, Reservation};
use crate::foundation::core::{EncoderOptions, Metadata, row_bytes};
use crate::foundation::error::{PanoError, PanoResult};
use crate::output::sink::RowSink;
use anyhow::Context as _;
use image::ImageEncoder as _;
use image::codecs::jpeg::JpegEncoder;
use std::fs::File;
use std::io::{BufWriter, Write as _};
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Terminal sink that encodes its rows to a JPEG file.
///
/// The destination is created up front so that an unwritable path fails
/// before any pixels are produced. Rows are buffered until [`RowSink::finish`]
/// because the encoder takes a whole frame; that buffer is reserved from the
/// memory budget for the lifetime of the sink.
pub struct OutputImage {
    path: PathBuf,
    width: u32,
    height: u32,
    metadata: Metadata,
    options: EncoderOptions,
    writer: Option<BufWriter<File>>,
    pixels: Vec<u8>,
    rows: u32,
    _reservation: Reservation,
}

impl OutputImage {
    /// Create `path` and prepare to receive `height` rows of `width` pixels.
    pub fn create(
        path: &Path,
        width: u32,
        height: u32,
        metadata: &Metadata,
        options: &EncoderOptions,
        budget: &Rc<MemoryBudget>,
    ) -> PanoResult<Self> {
        let reservation = budget.claim(&[3, u64::from(width), u64::from(height)])?;
        let file = File::create(path)
            .with_context(|| format!("error opening output file '{}'", path.display()))?;
        Ok(Self {
            path: path.to_path_buf(),
            width,
            height,
            metadata: metadata.clone(),
            options: *options,
            writer: Some(BufWriter::new(file)),
            pixels: Vec::with_capacity(reservation.bytes() as usize),
            rows: 0,
            _reservation: reservation,
        })
    }

    /// Destination path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RowSink for OutputImage {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn write_row(&mut self, row: &[u8]) -> PanoResult<()> {
        if self.writer.is_none() {
            return Err(PanoError::codec(format!(
                "row written to '{}' after finish",
                self.path.display()
            )));
        }
        if self.rows >= self.height {
            return Err(PanoError::codec(format!(
                "too many rows written to '{}'",
                self.path.display()
            )));
        }
        if row.len() != row_bytes(self.width) {
            return Err(PanoError::codec(format!(
                "row holds {} bytes, expected {}",
                row.len(),
                row_bytes(self.width)
            )));
        }
        self.pixels.extend_from_slice(row);
        self.rows += 1;
        Ok(())
    }

    fn finish(&mut self) -> PanoResult<()> {
        let Some(mut writer) = self.writer.take() else {
            return Err(PanoError::codec(format!(
                "'{}' finished twice",
                self.path.display()
            )));
        };
        if self.rows != self.height {
            return Err(PanoError::codec(format!(
                "'{}' finished after {} of {} rows",
                self.path.display(),
                self.rows,
                self.height
            )));
        }

        let mut encoder = JpegEncoder::new_with_quality(&mut writer, self.options.quality);
        if self.metadata.has_icc() {
            encoder
                .set_icc_profile(self.metadata.icc.clone())
                .map_err(|e| PanoError::codec(e.to_string()))?;
        }
        encoder.write_image(
            &self.pixels,
            self.width,
            self.height,
            image::ExtendedColorType::Rgb8,
        )?;
        writer
            .flush()
            .with_context(|| format!("write jpeg '{}'", self.path.display()))?;

        tracing::trace!(path = %self.path.display(), width = self.width, height = self.height, "encoded image");
        self.pixels = Vec::new();
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/output/image.rs"]
mod tests;
