//! Compression settings for stored objects.

use serde::{Deserialize, Serialize};

/// Compression level applied when writing objects.
///
/// Decompression does not depend on the level, so a repository may mix
/// objects written at different levels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionLevel {
    /// No compression (zlib framing only)
    None,
    /// Fast compression (lower ratio)
    Fast,
    /// Default compression (balanced)
    #[default]
    Default,
    /// Best compression (slower, higher ratio)
    Best,
}

impl CompressionLevel {
    /// Converts to flate2 compression level.
    pub fn to_flate2(self) -> flate2::Compression {
        match self {
            CompressionLevel::None => flate2::Compression::none(),
            CompressionLevel::Fast => flate2::Compression::fast(),
            CompressionLevel::Default => flate2::Compression::default(),
            CompressionLevel::Best => flate2::Compression::best(),
        }
    }
}
