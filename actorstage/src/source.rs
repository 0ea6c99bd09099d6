//! Collaborator seams for byte fetching and image decoding.
//!
//! These are the only suspension points of the engine: they are called from
//! `Stage::process_pending_loads` and the recovery path, never from a tick.

use crate::Error;

/// Fetches asset bytes by absolute URL (network, filesystem, or an in-memory
/// store in tests).
pub trait AssetSource {
    fn fetch_bytes(&mut self, url: &str) -> Result<Vec<u8>, Error>;

    fn fetch_text(&mut self, url: &str) -> Result<String, Error> {
        let bytes = self.fetch_bytes(url)?;
        String::from_utf8(bytes).map_err(|e| Error::Fetch {
            url: url.to_string(),
            message: format!("not valid UTF-8: {e}"),
        })
    }
}

/// Turns fetched image bytes into RGBA8 pixels.
pub trait ImageDecoder {
    fn decode(&mut self, url: &str, bytes: &[u8]) -> Result<DecodedImage, Error>;
}

/// A fully decoded raster image, ready for texture upload.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    /// RGBA8, row-major, `width * height * 4` bytes.
    pub pixels: Vec<u8>,
}
