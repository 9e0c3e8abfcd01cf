use crate::foundation::core::{CHANNELS, row_bytes};
use crate::foundation::error::{PanoError, PanoResult};
use crate::output::sink::RowSink;

/// Size of one pyramid level: `ceil(size / 2^level)`.
pub fn level_size(size: u32, level: u32) -> u32 {
    if level >= 32 {
        return u32::from(size > 0);
    }
    let scale = 1u64 << level;
    (u64::from(size).div_ceil(scale)) as u32
}

struct Level {
    sink: Box<dyn RowSink>,
    /// A row of the level above waiting for its partner.
    saved: Vec<u8>,
    pending: bool,
    mixed: Vec<u8>,
}

/// Sink that writes every row to level 0 and synthesizes each coarser level
/// by 2x2 box filtering as row pairs complete.
///
/// Level `L` is `ceil(w / 2^L) x ceil(h / 2^L)`. Only one saved row and one
/// scratch row are held per level. A trailing odd column is averaged
/// vertically only; a trailing odd row is flushed by [`RowSink::finish`],
/// averaged horizontally only.
pub struct OutputPyramid {
    width: u32,
    height: u32,
    depth: u32,
    levels: Vec<Level>,
    next_row: u32,
}

impl OutputPyramid {
    /// A pyramid of `levels` levels over a `width x height` base image.
    ///
    /// Level sinks must be attached with [`add_level`](Self::add_level),
    /// finest first, before the first row is written.
    pub fn new(levels: u32, width: u32, height: u32) -> PanoResult<Self> {
        if levels == 0 {
            return Err(PanoError::config("a pyramid needs at least one level"));
        }
        Ok(Self {
            width,
            height,
            depth: levels,
            levels: Vec::with_capacity(levels as usize),
            next_row: 0,
        })
    }

    /// Number of levels.
    pub fn levels(&self) -> u32 {
        self.depth
    }

    /// `(width, height)` of `level`.
    pub fn level_dimensions(&self, level: u32) -> (u32, u32) {
        (level_size(self.width, level), level_size(self.height, level))
    }

    /// Attach the sink for the next level.
    pub fn add_level(&mut self, sink: Box<dyn RowSink>) -> PanoResult<()> {
        let level = self.levels.len() as u32;
        if level >= self.depth {
            return Err(PanoError::config(format!(
                "pyramid already has all {} levels",
                self.depth
            )));
        }
        let (w, h) = self.level_dimensions(level);
        if (sink.width(), sink.height()) != (w, h) {
            return Err(PanoError::config(format!(
                "level {level} sink is {}x{}, expected {w}x{h}",
                sink.width(),
                sink.height()
            )));
        }
        let above = if level == 0 {
            0
        } else {
            level_size(self.width, level - 1)
        };
        self.levels.push(Level {
            sink,
            saved: vec![0; row_bytes(above)],
            pending: false,
            mixed: vec![0; row_bytes(w)],
        });
        tracing::debug!(level, width = w, height = h, "added pyramid level");
        Ok(())
    }

    fn check_complete(&self) -> PanoResult<()> {
        if self.levels.len() as u32 != self.depth {
            return Err(PanoError::config(format!(
                "pyramid has {} of {} level sinks",
                self.levels.len(),
                self.depth
            )));
        }
        Ok(())
    }

    /// Deliver `row` to `level` and cascade into coarser levels.
    fn push(&mut self, level: usize, row: &[u8]) -> PanoResult<()> {
        self.levels[level].sink.write_row(row)?;
        let next = level + 1;
        if next >= self.levels.len() {
            return Ok(());
        }

        let target = &mut self.levels[next];
        if !target.pending {
            target.saved.copy_from_slice(row);
            target.pending = true;
            return Ok(());
        }
        target.pending = false;
        let mut mixed = std::mem::take(&mut target.mixed);
        mix_rows(&target.saved, Some(row), &mut mixed);
        let result = self.push(next, &mixed);
        self.levels[next].mixed = mixed;
        result
    }
}

/// Box-filter one row pair (or a lone row) into a half-width row.
fn mix_rows(upper: &[u8], lower: Option<&[u8]>, out: &mut [u8]) {
    let src_width = upper.len() / CHANNELS;
    for (di, px) in out.chunks_exact_mut(CHANNELS).enumerate() {
        let si = 2 * di;
        let cols = if si + 1 < src_width { 2 } else { 1 };
        let rows = if lower.is_some() { 2 } else { 1 };
        for (c, value) in px.iter_mut().enumerate() {
            let mut sum = 0u32;
            for col in si..si + cols {
                sum += u32::from(upper[col * CHANNELS + c]);
                if let Some(lower) = lower {
                    sum += u32::from(lower[col * CHANNELS + c]);
                }
            }
            *value = (sum / (cols * rows) as u32) as u8;
        }
    }
}

impl RowSink for OutputPyramid {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn write_row(&mut self, row: &[u8]) -> PanoResult<()> {
        self.check_complete()?;
        if self.next_row >= self.height {
            return Err(PanoError::codec("too many rows written to pyramid"));
        }
        self.next_row += 1;
        self.push(0, row)
    }

    fn finish(&mut self) -> PanoResult<()> {
        self.check_complete()?;
        // Flush rows left unpaired by an odd level height, finest first.
        for level in 1..self.levels.len() {
            let target = &mut self.levels[level];
            if !target.pending {
                continue;
            }
            target.pending = false;
            let mut mixed = std::mem::take(&mut target.mixed);
            mix_rows(&target.saved, None, &mut mixed);
            let result = self.push(level, &mixed);
            self.levels[level].mixed = mixed;
            result?;
        }
        for level in &mut self.levels {
            level.sink.finish()?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/output/pyramid.rs"]
mod tests;
