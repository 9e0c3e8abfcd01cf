use crate::foundation::budget::MemoryBudget;
use crate::foundation::core::{EncoderOptions, Metadata};
use crate::foundation::error::{PanoError, PanoResult};
use crate::geometry::crop::CropRect;
use crate::geometry::face::Face;
use crate::input::format::{input_format, require_jpeg_output};
use crate::input::source::SourceBuffer;
use crate::output::image::OutputImage;
use crate::output::pyramid::OutputPyramid;
use crate::output::tiler::{JpegTiles, OutputTiler};
use crate::project::extract::extract_face;
use anyhow::Context as _;
use serde::Serialize;
use std::path::Path;
use std::rc::Rc;

/// Default pyramid tile edge in pixels.
pub const DEFAULT_TILE_SIZE: u32 = 512;

/// File name of the viewer manifest written by [`build_pyramid`].
pub const MANIFEST_FILE: &str = "config.json";

/// Options for extracting a single face to one image.
#[derive(Clone, Debug)]
pub struct FaceOpts {
    pub face: Face,
    /// Output edge length; `None` or `0` picks [`default_cube_size`].
    pub size: Option<u32>,
    pub input_format: Option<String>,
    pub output_format: Option<String>,
    /// Embed the source ICC profile in the output.
    pub copy_icc: bool,
    pub encoder: EncoderOptions,
}

impl FaceOpts {
    pub fn new(face: Face) -> Self {
        Self {
            face,
            size: None,
            input_format: None,
            output_format: None,
            copy_icc: false,
            encoder: EncoderOptions::default(),
        }
    }
}

/// Options for building a tiled multiresolution pyramid.
#[derive(Clone, Debug)]
pub struct PyramidOpts {
    /// A single face, or all six when `None`.
    pub face: Option<Face>,
    pub cube_size: Option<u32>,
    pub tile_size: u32,
    pub levels: Option<u32>,
    pub input_format: Option<String>,
    pub copy_icc: bool,
    pub encoder: EncoderOptions,
    /// Also write a Pannellum `config.json` into the output directory.
    pub manifest: bool,
}

impl Default for PyramidOpts {
    fn default() -> Self {
        Self {
            face: None,
            cube_size: None,
            tile_size: DEFAULT_TILE_SIZE,
            levels: None,
            input_format: None,
            copy_icc: false,
            encoder: EncoderOptions::default(),
            manifest: false,
        }
    }
}

/// What [`build_pyramid`] produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PyramidSummary {
    pub cube_size: u32,
    pub tile_size: u32,
    pub levels: u32,
    pub faces: Vec<Face>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MultiRes<'a> {
    path: &'a str,
    extension: &'a str,
    tile_resolution: u32,
    max_level: u32,
    cube_resolution: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Manifest<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    multi_res: MultiRes<'a>,
}

/// Cube edge that roughly preserves the source's angular resolution,
/// rounded down to a multiple of 8.
pub fn default_cube_size(source_width: u32) -> u32 {
    8 * (f64::from(source_width) / std::f64::consts::PI / 8.0) as u32
}

/// The smallest level count whose coarsest level fits in a single tile.
///
/// A zero tile size counts as one pixel, so the coarsest level is 1x1.
pub fn default_levels(cube_size: u32, tile_size: u32) -> u32 {
    let tile_size = tile_size.max(1);
    let mut levels = 1;
    let mut size = cube_size;
    while size > tile_size {
        size = size.div_ceil(2);
        levels += 1;
    }
    levels
}

fn check_aspect(source: &SourceBuffer) -> PanoResult<()> {
    if u64::from(source.width()) != 2 * u64::from(source.height()) {
        return Err(PanoError::config(format!(
            "input image has incorrect aspect ratio {}x{}, must be 2:1",
            source.width(),
            source.height()
        )));
    }
    Ok(())
}

fn output_metadata(source: &SourceBuffer, copy_icc: bool) -> Metadata {
    if copy_icc {
        source.metadata().clone()
    } else {
        Metadata::default()
    }
}

fn cube_size(requested: Option<u32>, source: &SourceBuffer) -> PanoResult<u32> {
    let size = requested
        .filter(|&s| s > 0)
        .unwrap_or_else(|| default_cube_size(source.width()));
    if size == 0 {
        return Err(PanoError::config(format!(
            "input image {}x{} is too small for a default cube size",
            source.width(),
            source.height()
        )));
    }
    Ok(size)
}

/// Extract one face of the panorama at `input` into the JPEG at `output`.
#[tracing::instrument(skip(opts, budget), fields(face = %opts.face))]
pub fn extract_face_file(
    input: &Path,
    output: &Path,
    opts: &FaceOpts,
    budget: &Rc<MemoryBudget>,
) -> PanoResult<()> {
    require_jpeg_output(output, opts.output_format.as_deref())?;
    let format = input_format(input, opts.input_format.as_deref())?;

    let source = SourceBuffer::open(input, Some(format), &opts.face.crop_rect(), budget)?;
    check_aspect(&source)?;
    let size = cube_size(opts.size, &source)?;

    let mut sink = OutputImage::create(
        output,
        size,
        size,
        &output_metadata(&source, opts.copy_icc),
        &opts.encoder,
        budget,
    )?;
    extract_face(opts.face, &source, &mut sink)
}

/// Extract one or all faces of `input` into a tiled pyramid under `out_dir`.
///
/// Level `L` (0 = full resolution) is written to the directory named
/// `levels - L`, each tile as `{letter}{row}_{col}.jpg`.
#[tracing::instrument(skip(opts, budget))]
pub fn build_pyramid(
    input: &Path,
    out_dir: &Path,
    opts: &PyramidOpts,
    budget: &Rc<MemoryBudget>,
) -> PanoResult<PyramidSummary> {
    if opts.tile_size == 0 {
        return Err(PanoError::config("tile size must be positive"));
    }
    if opts.levels == Some(0) {
        return Err(PanoError::config("level count must be positive"));
    }
    let format = input_format(input, opts.input_format.as_deref())?;

    let crop = opts.face.map_or(CropRect::FULL, Face::crop_rect);
    let source = SourceBuffer::open(input, Some(format), &crop, budget)?;
    check_aspect(&source)?;

    let cube_size = cube_size(opts.cube_size, &source)?;
    let levels = opts
        .levels
        .unwrap_or_else(|| default_levels(cube_size, opts.tile_size));
    let metadata = output_metadata(&source, opts.copy_icc);

    let level_dirs = (0..levels)
        .map(|level| out_dir.join((levels - level).to_string()))
        .collect::<Vec<_>>();
    for dir in &level_dirs {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("create output dir '{}'", dir.display()))?;
    }

    let faces = opts.face.map_or_else(|| Face::ALL.to_vec(), |f| vec![f]);
    for &face in &faces {
        let mut pyramid = OutputPyramid::new(levels, cube_size, cube_size)?;
        for (level, dir) in level_dirs.iter().enumerate() {
            let (w, h) = pyramid.level_dimensions(level as u32);
            let prefix = dir.join(face.letter()).to_string_lossy().into_owned();
            let factory = JpegTiles::new(metadata.clone(), opts.encoder, budget.clone());
            let tiler = OutputTiler::new(
                prefix,
                ".jpg",
                w,
                h,
                opts.tile_size,
                opts.tile_size,
                Box::new(factory),
            )?;
            pyramid.add_level(Box::new(tiler))?;
        }
        extract_face(face, &source, &mut pyramid)?;
        tracing::debug!(%face, levels, cube_size, "face pyramid done");
    }

    let summary = PyramidSummary {
        cube_size,
        tile_size: opts.tile_size,
        levels,
        faces,
    };
    if opts.manifest {
        write_manifest(out_dir, &summary)?;
    }
    Ok(summary)
}

fn write_manifest(out_dir: &Path, summary: &PyramidSummary) -> PanoResult<()> {
    let manifest = Manifest {
        kind: "multires",
        multi_res: MultiRes {
            path: "/%l/%s%y_%x",
            extension: "jpg",
            tile_resolution: summary.tile_size,
            max_level: summary.levels,
            cube_resolution: summary.cube_size,
        },
    };
    let path = out_dir.join(MANIFEST_FILE);
    let json = serde_json::to_vec_pretty(&manifest).context("serialize manifest")?;
    std::fs::write(&path, json).with_context(|| format!("write manifest '{}'", path.display()))?;
    Ok(())
}

#[cfg(test)]
#[path = "../tests/unit/pipeline.rs"]
mod tests;
