/// Convenience result type used across the projector.
pub type PanoResult<T> = Result<T, PanoError>;

/// Top-level error taxonomy used by the projection pipeline.
///
/// None of these are recoverable at the point of detection: each aborts the
/// enclosing face extraction or pyramid build.
#[derive(thiserror::Error, Debug)]
pub enum PanoError {
    /// Invalid face name, aspect ratio, pixel format or dimensions.
    #[error("configuration error: {0}")]
    Config(String),

    /// A memory reservation would exceed the configured budget, or the size
    /// computation overflowed.
    #[error("out of memory: tried to allocate {request} bytes with usage {usage} and limit {limit}")]
    OutOfMemory {
        /// The requested dimensions, rendered as `a x b x c`.
        request: String,
        /// Accounted usage at the time of the request.
        usage: u64,
        /// The configured limit.
        limit: u64,
    },

    /// Malformed or unsupported image data, or a sink used out of contract.
    #[error("codec error: {0}")]
    Codec(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PanoError {
    /// Build a [`PanoError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Build a [`PanoError::Codec`] value.
    pub fn codec(msg: impl Into<String>) -> Self {
        Self::Codec(msg.into())
    }

    /// Build a [`PanoError::OutOfMemory`] value for a request of `dims` bytes.
    pub fn out_of_memory(dims: &[u64], usage: u64, limit: u64) -> Self {
        let mut request = dims.first().copied().unwrap_or(0).to_string();
        for d in dims.iter().skip(1).filter(|&&d| d > 1) {
            request.push_str(&format!(" x {d}"));
        }
        Self::OutOfMemory {
            request,
            usage,
            limit,
        }
    }
}

impl From<image::ImageError> for PanoError {
    fn from(err: image::ImageError) -> Self {
        Self::Codec(err.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
