//! Convert equirectangular panoramas into cube faces and tiled
//! multiresolution pyramids.
//!
//! The pipeline is strictly row-sequential: a [`SourceBuffer`] holds the
//! cropped part of the source a face needs, [`extract_face`] inverse-maps
//! every destination pixel onto it, and each row is streamed into a
//! [`RowSink`], which may be a JPEG file, an [`OutputTiler`] or an
//! [`OutputPyramid`] of tilers.
#![forbid(unsafe_code)]

pub mod foundation;
pub mod geometry;
pub mod input;
pub mod output;
pub mod pipeline;
pub mod project;

pub use foundation::budget::{MemoryBudget, Reservation};
pub use foundation::core::{CHANNELS, EncoderOptions, Metadata};
pub use foundation::error::{PanoError, PanoResult};
pub use geometry::crop::{CropRect, IntegerCropRect};
pub use geometry::face::Face;
pub use input::scanline::{DecodedImage, ScanlineReader};
pub use input::source::SourceBuffer;
pub use output::image::OutputImage;
pub use output::pyramid::OutputPyramid;
pub use output::sink::{MemorySink, RowSink};
pub use output::tiler::{JpegTiles, OutputTiler, TileFactory};
pub use pipeline::{
    FaceOpts, PyramidOpts, PyramidSummary, build_pyramid, default_cube_size, default_levels,
    extract_face_file,
};
pub use project::diagram::{DiagramMode, render_face_diagram};
pub use project::extract::extract_face;
