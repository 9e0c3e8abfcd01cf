use crate::foundation::core::row_bytes;
use crate::foundation::error::{PanoError, PanoResult};

/// Streaming consumer of fixed-width RGB8 rows.
///
/// Ordering contract: `write_row` is called exactly `height()` times with rows
/// in strictly increasing order, each holding `width() * 3` bytes, followed by
/// one call to `finish`.
pub trait RowSink {
    /// Row width in pixels.
    fn width(&self) -> u32;

    /// Number of rows the sink expects.
    fn height(&self) -> u32;

    /// Consume the next row.
    fn write_row(&mut self, row: &[u8]) -> PanoResult<()>;

    /// Flush and close the sink once every row has been written.
    fn finish(&mut self) -> PanoResult<()>;
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct MemorySink {
    width: u32,
    height: u32,
    /// Rows in arrival order.
    pub rows: Vec<Vec<u8>>,
    /// Set by [`RowSink::finish`].
    pub finished: bool,
}

impl MemorySink {
    /// An empty sink expecting `height` rows of `width` pixels.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    /// The RGB triple at `(col, row)`, if that row has arrived.
    pub fn pixel(&self, col: u32, row: u32) -> Option<&[u8]> {
        let start = row_bytes(col);
        self.rows
            .get(row as usize)
            .and_then(|r| r.get(start..start + row_bytes(1)))
    }
}

impl RowSink for MemorySink {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn write_row(&mut self, row: &[u8]) -> PanoResult<()> {
        if self.finished {
            return Err(PanoError::codec("row written after finish"));
        }
        if row.len() != row_bytes(self.width) {
            return Err(PanoError::codec(format!(
                "row holds {} bytes, expected {}",
                row.len(),
                row_bytes(self.width)
            )));
        }
        if self.rows.len() as u32 >= self.height {
            return Err(PanoError::codec("too many rows written"));
        }
        self.rows.push(row.to_vec());
        Ok(())
    }

    fn finish(&mut self) -> PanoResult<()> {
        self.finished = true;
        Ok(())
    }
}
