//! Source image decoding and the cropped, memory-accounted source buffer.

pub mod format;
pub mod scanline;
pub mod source;
