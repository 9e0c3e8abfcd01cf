use crate::foundation::error::{PanoError, PanoResult};
use image::ImageFormat;
use std::path::Path;

/// Extract a lowercase format name from an explicit option or else the file
/// extension. `jpg` is normalised to `jpeg`; the name is not validated.
///
/// Returns `None` when there is neither an explicit format nor an extension.
pub fn normalize_format(path: &Path, explicit: Option<&str>) -> Option<String> {
    let raw = match explicit.filter(|f| !f.is_empty()) {
        Some(f) => f.to_string(),
        None => path.extension()?.to_string_lossy().into_owned(),
    };
    let lower = raw.to_ascii_lowercase();
    if lower == "jpg" {
        Some("jpeg".to_string())
    } else {
        Some(lower)
    }
}

/// Resolve the decoder format for an input path.
pub fn input_format(path: &Path, explicit: Option<&str>) -> PanoResult<ImageFormat> {
    let name = normalize_format(path, explicit).ok_or_else(|| {
        PanoError::config("no file extension: use --input-format to specify the input file format")
    })?;
    ImageFormat::from_extension(&name)
        .filter(|f| f.reading_enabled())
        .ok_or_else(|| PanoError::config(format!("unknown input image format \"{name}\"")))
}

/// Check that an output path will be written as JPEG.
pub fn require_jpeg_output(path: &Path, explicit: Option<&str>) -> PanoResult<()> {
    match normalize_format(path, explicit).as_deref() {
        Some("jpeg") => Ok(()),
        _ => Err(PanoError::config(
            "for forwards compatibility, the output file format must be specified as JPEG, \
             either by the file extension or with --output-format",
        )),
    }
}
