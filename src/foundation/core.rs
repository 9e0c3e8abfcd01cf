/// Number of interleaved 8-bit channels in every buffer passed between stages.
///
/// Only RGB8 is supported; sources with any other layout are rejected at decode time.
pub const CHANNELS: usize = 3;

/// Image-level metadata carried from the source to every encoded output.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Metadata {
    /// Opaque ICC color profile, empty when absent or not copied.
    pub icc: Vec<u8>,
}

impl Metadata {
    /// Metadata carrying the given ICC profile.
    pub fn with_icc(icc: Vec<u8>) -> Self {
        Self { icc }
    }

    /// Return `true` when there is a profile to embed.
    pub fn has_icc(&self) -> bool {
        !self.icc.is_empty()
    }
}

/// Encoder settings shared by every terminal image sink.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncoderOptions {
    /// JPEG quality as a percentage, 1..=100.
    pub quality: u8,
}

impl EncoderOptions {
    /// Create options with `quality` clamped into 1..=100.
    pub fn with_quality(quality: u32) -> Self {
        Self {
            quality: quality.clamp(1, 100) as u8,
        }
    }
}

impl Default for EncoderOptions {
    fn default() -> Self {
        Self { quality: 80 }
    }
}

/// Byte length of a packed RGB8 row of `width` pixels.
pub(crate) fn row_bytes(width: u32) -> usize {
    width as usize * CHANNELS
}
