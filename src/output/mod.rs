//! Streaming row sinks: the JPEG encoder, the mip pyramid and the tiler.

pub mod image;
pub mod pyramid;
pub mod sink;
pub mod tiler;
