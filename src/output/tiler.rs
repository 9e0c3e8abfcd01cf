use crate::foundation::budget::MemoryBudget;
use crate::foundation::core::{EncoderOptions, Metadata, row_bytes};
use crate::foundation::error::{PanoError, PanoResult};
use crate::output::image::OutputImage;
use crate::output::sink::RowSink;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Creates the terminal sink for one tile.
pub trait TileFactory {
    /// Open a sink of `width x height` writing to `path`.
    fn create(&mut self, path: &Path, width: u32, height: u32) -> PanoResult<Box<dyn RowSink>>;
}

/// Writes each tile as a JPEG with the same metadata and encoder settings.
pub struct JpegTiles {
    metadata: Metadata,
    options: EncoderOptions,
    budget: Rc<MemoryBudget>,
}

impl JpegTiles {
    /// A factory embedding `metadata` in every tile.
    pub fn new(metadata: Metadata, options: EncoderOptions, budget: Rc<MemoryBudget>) -> Self {
        Self {
            metadata,
            options,
            budget,
        }
    }
}

impl TileFactory for JpegTiles {
    fn create(&mut self, path: &Path, width: u32, height: u32) -> PanoResult<Box<dyn RowSink>> {
        let image = OutputImage::create(
            path,
            width,
            height,
            &self.metadata,
            &self.options,
            &self.budget,
        )?;
        Ok(Box::new(image))
    }
}

/// Sink that splits its image into a grid of tiles.
///
/// Tiles are opened one strip (row of tiles) at a time when the strip's first
/// row arrives and finished as soon as its last row is written. Tiles in the
/// last column and strip are truncated to the image. Tile `(row, col)` is
/// written to `{prefix}{row}_{col}{suffix}`.
pub struct OutputTiler {
    prefix: String,
    suffix: String,
    width: u32,
    height: u32,
    tile_width: u32,
    tile_height: u32,
    tiles_wide: u32,
    tiles_high: u32,
    row_index: u32,
    factory: Box<dyn TileFactory>,
    strip: Vec<Box<dyn RowSink>>,
}

impl OutputTiler {
    /// A tiler over a `width x height` image with `tile_width x tile_height` tiles.
    pub fn new(
        prefix: impl Into<String>,
        suffix: impl Into<String>,
        width: u32,
        height: u32,
        tile_width: u32,
        tile_height: u32,
        factory: Box<dyn TileFactory>,
    ) -> PanoResult<Self> {
        if tile_width == 0 || tile_height == 0 {
            return Err(PanoError::config(format!(
                "invalid tile size {tile_width}x{tile_height}"
            )));
        }
        Ok(Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
            width,
            height,
            tile_width,
            tile_height,
            tiles_wide: width.div_ceil(tile_width),
            tiles_high: height.div_ceil(tile_height),
            row_index: 0,
            factory,
            strip: Vec::new(),
        })
    }

    /// Number of tile columns.
    pub fn tiles_wide(&self) -> u32 {
        self.tiles_wide
    }

    /// Number of strips.
    pub fn tiles_high(&self) -> u32 {
        self.tiles_high
    }

    /// Path of tile `(strip, col)`.
    pub fn tile_path(&self, strip: u32, col: u32) -> PathBuf {
        PathBuf::from(format!("{}{strip}_{col}{}", self.prefix, self.suffix))
    }

    fn open_strip(&mut self) -> PanoResult<()> {
        if !self.strip.is_empty() {
            return Ok(());
        }
        let strip = self.row_index / self.tile_height;
        let tile_height = if strip == self.tiles_high - 1 {
            self.height - self.tile_height * (self.tiles_high - 1)
        } else {
            self.tile_height
        };
        for col in 0..self.tiles_wide {
            let tile_width = if col == self.tiles_wide - 1 {
                self.width - self.tile_width * (self.tiles_wide - 1)
            } else {
                self.tile_width
            };
            let path = self.tile_path(strip, col);
            let sink = self.factory.create(&path, tile_width, tile_height)?;
            self.strip.push(sink);
        }
        tracing::debug!(strip, tiles = self.tiles_wide, tile_height, prefix = %self.prefix, "opened strip");
        Ok(())
    }

    fn close_strip(&mut self) -> PanoResult<()> {
        for mut tile in self.strip.drain(..) {
            tile.finish()?;
        }
        tracing::debug!(row = self.row_index, prefix = %self.prefix, "closed strip");
        Ok(())
    }
}

impl RowSink for OutputTiler {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn write_row(&mut self, row: &[u8]) -> PanoResult<()> {
        if self.row_index >= self.height {
            return Err(PanoError::codec(format!(
                "too many rows written to tiles '{}'",
                self.prefix
            )));
        }
        if row.len() != row_bytes(self.width) {
            return Err(PanoError::codec(format!(
                "row holds {} bytes, expected {}",
                row.len(),
                row_bytes(self.width)
            )));
        }
        self.open_strip()?;

        let step = row_bytes(self.tile_width);
        for (tile, chunk) in self.strip.iter_mut().zip(row.chunks(step)) {
            tile.write_row(chunk)?;
        }

        if self.row_index % self.tile_height == self.tile_height - 1 {
            self.close_strip()?;
        }
        self.row_index += 1;
        Ok(())
    }

    fn finish(&mut self) -> PanoResult<()> {
        if !self.strip.is_empty() {
            self.close_strip()?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/output/tiler.rs"]
mod tests;
