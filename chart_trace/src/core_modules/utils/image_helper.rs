// Interop with the `image` crate: decoding files into `PixelBuffer`s and
// writing buffers back out as PNG. Decoding sits outside the extraction core;
// these helpers exist for the tester binary and for building fixtures.

pub mod image_helper {
    use crate::core_modules::pixel::pixel::PixelBuffer;
    use crate::error::Result;
    use image::{ImageEncoder, RgbaImage};
    use std::path::Path;

    /// Copies a decoded RGBA image into a validated `PixelBuffer`.
    pub fn from_rgba_image(image: &RgbaImage) -> Result<PixelBuffer> {
        PixelBuffer::new(image.width(), image.height(), image.as_raw().clone())
    }

    /// Opens and decodes any format supported by `image`, converting to RGBA.
    pub fn load(path: impl AsRef<Path>) -> Result<PixelBuffer> {
        let image = image::open(path)?.to_rgba8();
        from_rgba_image(&image)
    }

    pub fn save(
        path: impl AsRef<Path>,
        buffer: &PixelBuffer,
    ) -> std::result::Result<(), image::error::ImageError> {
        let output = std::fs::File::create(path)?;
        let encoder = image::codecs::png::PngEncoder::new(output);

        encoder.write_image(
            buffer.samples(),
            buffer.width(),
            buffer.height(),
            image::ExtendedColorType::Rgba8,
        )?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {

    use super::image_helper::*;
    use crate::core_modules::pixel::pixel::{Pixel, PixelBuffer};
    use crate::error::ExtractionError;

    #[test]
    fn save_and_load_gradient_file() {
        let dir = tempfile::tempdir().expect("Error creating temp dir.");
        let name = dir.path().join("gradient_file.png");
        let buffer = PixelBuffer::from_fn(64, 16, |x, y| {
            Pixel::new((x * 4) as u8, (y * 16) as u8, 7, 255)
        })
        .expect("Error building buffer.");

        save(&name, &buffer).expect("Error Saving File.");
        let loaded = load(&name).expect("Error Loading File.");

        assert_eq!(loaded, buffer);
    }

    #[test]
    fn wraps_rgba_image_without_reordering() {
        let mut image = image::RgbaImage::new(3, 2);
        image.put_pixel(2, 1, image::Rgba([1, 2, 3, 4]));
        let buffer = from_rgba_image(&image).expect("Error wrapping image.");
        assert_eq!(buffer.pixel(2, 1), Pixel::new(1, 2, 3, 4));
        assert_eq!(buffer.pixel(0, 0), Pixel::new(0, 0, 0, 0));
    }

    #[test]
    fn missing_file_is_a_decode_error() {
        let dir = tempfile::tempdir().expect("Error creating temp dir.");
        let err = load(dir.path().join("absent.png")).unwrap_err();
        assert!(matches!(err, ExtractionError::ImageDecode(_)));
    }
}
