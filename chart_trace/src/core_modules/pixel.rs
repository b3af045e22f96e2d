// THEORY:
// The `pixel` module holds the two most fundamental data types of the engine:
// a single RGBA `Pixel` and the `PixelBuffer` that owns a whole decoded image.
//
// Key architectural principles:
// 1.  **Dumb Containers**: Neither type knows anything about ink, grids or
//     curves. They hold bytes and answer single-pixel questions (brightness).
//     Classification lives in the `binarizer`.
// 2.  **Validated at the Boundary**: A `PixelBuffer` can only be built through a
//     constructor that checks `samples.len() == 4 * width * height` and that both
//     dimensions are non-zero. Every downstream stage can then index freely.
// 3.  **Immutable Input**: Once built, the buffer is only read. The extraction
//     pipeline never writes back into the caller's image.

pub mod pixel {
    use crate::error::{ExtractionError, Result};

    pub type Byte = u8;
    pub type Bytes = Vec<Byte>;
    pub type Channel = Byte;
    pub type Brightness = f64;

    /// Bytes per pixel in a row-major RGBA sample array.
    pub const CHANNELS: usize = 4;

    /// A "dumb" data container representing a single RGBA pixel.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Pixel {
        /// The red channel value (0-255).
        pub red: Channel,
        /// The green channel value (0-255).
        pub green: Channel,
        /// The blue channel value (0-255).
        pub blue: Channel,
        /// The alpha (transparency) channel value (0-255). Ignored by the binarizer.
        pub alpha: Channel,
    }

    impl Pixel {
        pub const WHITE: Pixel = Pixel::new(255, 255, 255, 255);
        pub const BLACK: Pixel = Pixel::new(0, 0, 0, 255);

        pub const fn new(red: Channel, green: Channel, blue: Channel, alpha: Channel) -> Self {
            Pixel {
                red,
                green,
                blue,
                alpha,
            }
        }

        /// Opaque gray pixel with all three color channels set to `level`.
        pub const fn gray(level: Channel) -> Self {
            Pixel::new(level, level, level, 255)
        }

        /// Unweighted mean of the three color channels.
        pub fn brightness(&self) -> Brightness {
            (self.red as f64 + self.green as f64 + self.blue as f64) / 3.0
        }
    }

    impl From<&[Byte]> for Pixel {
        fn from(bytes: &[Byte]) -> Self {
            if bytes.len() != CHANNELS {
                panic!("Cannot convert {} bytes into pixel.", bytes.len());
            }
            Pixel::new(bytes[0], bytes[1], bytes[2], bytes[3])
        }
    }

    /// A decoded image: width, height and a row-major RGBA sample array with the
    /// origin at the top-left corner.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct PixelBuffer {
        width: u32,
        height: u32,
        samples: Bytes,
    }

    impl PixelBuffer {
        /// Wraps a sample array, rejecting zero dimensions and length mismatches.
        pub fn new(width: u32, height: u32, samples: Bytes) -> Result<Self> {
            if width == 0 || height == 0 {
                return Err(ExtractionError::InvalidBuffer(format!(
                    "dimensions must be at least 1x1, got {width}x{height}"
                )));
            }
            let expected = (width as usize)
                .checked_mul(height as usize)
                .and_then(|n| n.checked_mul(CHANNELS))
                .ok_or_else(|| {
                    ExtractionError::InvalidBuffer(format!(
                        "{width}x{height} overflows the addressable sample count"
                    ))
                })?;
            if samples.len() != expected {
                return Err(ExtractionError::InvalidBuffer(format!(
                    "expected {expected} samples for {width}x{height} RGBA, got {}",
                    samples.len()
                )));
            }
            Ok(Self {
                width,
                height,
                samples,
            })
        }

        /// Builds a buffer by evaluating `paint` at every pixel coordinate.
        pub fn from_fn(width: u32, height: u32, paint: impl Fn(u32, u32) -> Pixel) -> Result<Self> {
            let mut samples = Bytes::with_capacity(width as usize * height as usize * CHANNELS);
            for y in 0..height {
                for x in 0..width {
                    let pixel = paint(x, y);
                    samples.extend_from_slice(&[pixel.red, pixel.green, pixel.blue, pixel.alpha]);
                }
            }
            Self::new(width, height, samples)
        }

        /// A buffer where every pixel is `pixel`.
        pub fn filled(width: u32, height: u32, pixel: Pixel) -> Result<Self> {
            Self::from_fn(width, height, |_, _| pixel)
        }

        pub fn width(&self) -> u32 {
            self.width
        }

        pub fn height(&self) -> u32 {
            self.height
        }

        pub fn samples(&self) -> &[Byte] {
            &self.samples
        }

        /// Reads the pixel at `(x, y)`.
        ///
        /// Coordinates outside `[0, width) x [0, height)` are a programming error
        /// and panic.
        pub fn pixel(&self, x: u32, y: u32) -> Pixel {
            assert!(
                x < self.width && y < self.height,
                "pixel ({x}, {y}) is outside the {}x{} buffer",
                self.width,
                self.height
            );
            let index = (y as usize * self.width as usize + x as usize) * CHANNELS;
            Pixel::from(&self.samples[index..index + CHANNELS])
        }
    }
}
