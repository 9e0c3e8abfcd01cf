use crate::foundation::error::{PanoError, PanoResult};

/// Upper bound (exclusive) on a resolved crop width or height, in pixels.
pub const MAX_CROP_DIMENSION: u32 = 65536;

/// A crop window in fractions of the full image size.
///
/// `right < left` denotes a window spanning the left/right seam; it only
/// becomes meaningful once resolved against pixel dimensions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CropRect {
    /// Left edge, 0..=1.
    pub left: f64,
    /// Right edge, 0..=1.
    pub right: f64,
    /// Top edge, 0..=1.
    pub top: f64,
    /// Bottom edge, 0..=1.
    pub bottom: f64,
}

impl CropRect {
    /// The identity window covering the whole image.
    pub const FULL: CropRect = CropRect::new(0.0, 1.0, 0.0, 1.0);

    /// Create a crop window from fractional edges.
    pub const fn new(left: f64, right: f64, top: f64, bottom: f64) -> Self {
        Self {
            left,
            right,
            top,
            bottom,
        }
    }
}

/// A crop window resolved to pixel coordinates.
///
/// Every edge is pushed outwards by one pixel where the image allows, so that
/// bilinear sampling anywhere inside the fractional window has both
/// neighbours available.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IntegerCropRect {
    /// Leftmost column. Greater than `right` when `wrap` is set.
    pub left: u32,
    /// Past-the-end right column.
    pub right: u32,
    /// The window is the union of `[left, full_width)` and `[0, right)`.
    pub wrap: bool,
    /// Topmost row.
    pub top: u32,
    /// Past-the-end bottom row.
    pub bottom: u32,
    /// Number of buffered columns, including both halves of a wrapped window.
    pub width: u32,
    /// Number of buffered rows.
    pub height: u32,
    /// Width of the image the window was resolved against.
    pub full_width: u32,
}

fn fudge_floor(arg: f64) -> u32 {
    let i = arg.floor();
    if i >= 1.0 { i as u32 - 1 } else { 0 }
}

fn fudge_ceil(arg: f64, limit: u32) -> u32 {
    let i = arg.ceil();
    if i < f64::from(limit) {
        i.max(0.0) as u32 + 1
    } else {
        limit
    }
}

impl IntegerCropRect {
    /// Resolve `crop` against an image of `full_width` x `full_height` pixels.
    ///
    /// Fails if the resolved width or height is not below [`MAX_CROP_DIMENSION`].
    pub fn resolve(crop: &CropRect, full_width: u32, full_height: u32) -> PanoResult<Self> {
        let left = fudge_floor(crop.left * f64::from(full_width));
        let right = fudge_ceil(crop.right * f64::from(full_width), full_width);
        let top = fudge_floor(crop.top * f64::from(full_height));
        let bottom = fudge_ceil(crop.bottom * f64::from(full_height), full_height);

        let wrap = right < left;
        let width = if wrap {
            full_width - left + right
        } else {
            right - left
        };
        let height = bottom.saturating_sub(top);

        if height >= MAX_CROP_DIMENSION {
            return Err(PanoError::config(format!(
                "invalid cropped height {height}, must be less than {MAX_CROP_DIMENSION}"
            )));
        }
        if width >= MAX_CROP_DIMENSION {
            return Err(PanoError::config(format!(
                "invalid cropped width {width}, must be less than {MAX_CROP_DIMENSION}"
            )));
        }

        Ok(Self {
            left,
            right,
            wrap,
            top,
            bottom,
            width,
            height,
            full_width,
        })
    }

    /// Return `true` when column `col` of the full image is inside the window.
    pub fn contains_col(&self, col: u32) -> bool {
        if self.wrap {
            (col >= self.left && col < self.full_width) || col < self.right
        } else {
            col >= self.left && col < self.right
        }
    }

    /// Return `true` when row `row` of the full image is inside the window.
    pub fn contains_row(&self, row: u32) -> bool {
        row >= self.top && row < self.bottom
    }

    /// Offset of column `col` within a buffered row. `col` must be inside the window.
    pub(crate) fn col_offset(&self, col: u32) -> u32 {
        if col >= self.left {
            col - self.left
        } else {
            col + self.full_width - self.left
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/crop.rs"]
mod tests;
