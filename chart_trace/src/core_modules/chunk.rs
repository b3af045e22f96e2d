// THEORY:
// The `chunk` module defines the geometry of the analysis grid. A chart image is
// rarely analyzed pixel by pixel for curve following: the caller picks how many
// logical units the image should be divided into horizontally and vertically,
// and every logical cell then covers a `cell_width x cell_height` block of
// pixels.
//
// Key architectural principles:
// 1.  **Units, not Pixels**: The caller supplies unit counts (`x_resolution`,
//     `y_resolution`). Cell sizes are derived as `max(1, dimension / units)` with
//     real-valued division, so a 100 px wide image split into 30 units has cells
//     3.33 px wide. A resolution larger than the image is clamped to one unit
//     per pixel.
// 2.  **Two-Way Mapping**: `GridSpec` maps a cell to the pixel columns and rows
//     it covers (for quantization) and back to the pixel-space point reported in
//     paths (`gx * cell_width, gy * cell_height`).
// 3.  **Data Container**: Like `Pixel`, a `GridSpec` is a plain value. It owns no
//     pixel data and is cheap to copy into every stage that needs it.

pub mod chunk {
    use crate::core_modules::polyline::{GridPoint, Point};
    use serde::{Deserialize, Serialize};
    use std::ops::Range;

    /// Geometry of the logical analysis grid laid over a pixel buffer.
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct GridSpec {
        /// The width of the full image in pixels.
        pub image_width: u32,
        /// The height of the full image in pixels.
        pub image_height: u32,
        /// Horizontal size of one cell in pixels (`gridX`), always >= 1.
        pub cell_width: f64,
        /// Vertical size of one cell in pixels (`gridY`), always >= 1.
        pub cell_height: f64,
        /// Number of cell columns, `ceil(image_width / cell_width)`.
        pub grid_width: u32,
        /// Number of cell rows, `ceil(image_height / cell_height)`.
        pub grid_height: u32,
    }

    impl GridSpec {
        /// Derives the grid for an image and the requested unit counts.
        ///
        /// Resolutions are clamped into `[1, dimension]`; use
        /// [`GridSpec::is_clamped`] to learn whether that happened.
        pub fn new(
            image_width: u32,
            image_height: u32,
            x_resolution: u32,
            y_resolution: u32,
        ) -> Self {
            let x_units = x_resolution.clamp(1, image_width.max(1));
            let y_units = y_resolution.clamp(1, image_height.max(1));
            let cell_width = (image_width as f64 / x_units as f64).max(1.0);
            let cell_height = (image_height as f64 / y_units as f64).max(1.0);
            Self {
                image_width,
                image_height,
                cell_width,
                cell_height,
                grid_width: (image_width as f64 / cell_width).ceil() as u32,
                grid_height: (image_height as f64 / cell_height).ceil() as u32,
            }
        }

        /// One logical cell per pixel.
        pub fn per_pixel(image_width: u32, image_height: u32) -> Self {
            Self::new(image_width, image_height, image_width, image_height)
        }

        /// True when `(x_resolution, y_resolution)` had to be clamped for this image.
        pub fn is_clamped(
            image_width: u32,
            image_height: u32,
            x_resolution: u32,
            y_resolution: u32,
        ) -> bool {
            x_resolution > image_width || y_resolution > image_height
        }

        /// Pixel columns covered by cell column `gx`, clipped to the image.
        pub fn pixel_columns(&self, gx: u32) -> Range<u32> {
            Self::span(gx, self.cell_width, self.image_width)
        }

        /// Pixel rows covered by cell row `gy`, clipped to the image.
        pub fn pixel_rows(&self, gy: u32) -> Range<u32> {
            Self::span(gy, self.cell_height, self.image_height)
        }

        /// The pixel-space point a path reports for cell `cell`.
        pub fn to_pixel(&self, cell: GridPoint) -> Point {
            Point::new(
                cell.x as f64 * self.cell_width,
                cell.y as f64 * self.cell_height,
            )
        }

        fn span(index: u32, cell_size: f64, limit: u32) -> Range<u32> {
            let start = ((index as f64 * cell_size).floor() as u32).min(limit);
            let end = start.saturating_add(cell_size.ceil() as u32).min(limit);
            start..end
        }
    }
}
