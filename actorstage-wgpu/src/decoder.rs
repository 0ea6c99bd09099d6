use actorstage::{DecodedImage, Error, ImageDecoder};

/// PNG decoder backed by the `image` crate. Pure Rust, works on wasm32.
#[derive(Debug, Default)]
pub struct PngImageDecoder;

impl ImageDecoder for PngImageDecoder {
    fn decode(&mut self, url: &str, bytes: &[u8]) -> Result<DecodedImage, Error> {
        let img = image::load_from_memory_with_format(bytes, image::ImageFormat::Png).map_err(
            |e| Error::Decode {
                asset: String::new(),
                url: url.to_string(),
                message: e.to_string(),
            },
        )?;
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        Ok(DecodedImage {
            width,
            height,
            pixels: rgba.into_raw(),
        })
    }
}
