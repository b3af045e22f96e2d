// THEORY:
// The binarizer is the bridge between raw color samples and everything else in
// the engine. It answers one question per pixel: is this ink?
//
// A pixel is ink when the plain mean of its R, G and B channels is below the
// configured threshold scaled by `INK_MARGIN`. The margin lets anti-aliased
// edge pixels that sit just above the threshold still register, and both the
// tick detector and the grid quantizer must see the same classification, so
// there is exactly one definition of the test in the crate (`is_ink`).
//
// Because the test is re-evaluated many times per pixel by the tick searches and
// the quantizer, `InkMask` memoizes it into a dense boolean raster. The mask
// is also the only pixel-resolution state the combined-detection variant is
// allowed to mutate (`erase_vertical_runs`).

use crate::core_modules::pixel::pixel::PixelBuffer;

/// Multiplicative tolerance applied to the threshold during comparison.
pub const INK_MARGIN: f64 = 1.05;

/// Classifies the pixel at `(x, y)` as ink under `threshold`.
///
/// Panics when the coordinate lies outside the buffer.
pub fn is_ink(buffer: &PixelBuffer, x: u32, y: u32, threshold: u8) -> bool {
    buffer.pixel(x, y).brightness() < threshold as f64 * INK_MARGIN
}

/// A pixel-space occupancy test. Implementors must be pure: the same
/// coordinate always yields the same answer.
pub trait OccupancyTest {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn is_ink(&self, x: u32, y: u32) -> bool;
}

/// Evaluates `is_ink` directly against the buffer on every query.
pub struct DirectInkTest<'a> {
    buffer: &'a PixelBuffer,
    threshold: u8,
}

impl<'a> DirectInkTest<'a> {
    pub fn new(buffer: &'a PixelBuffer, threshold: u8) -> Self {
        Self { buffer, threshold }
    }
}

impl OccupancyTest for DirectInkTest<'_> {
    fn width(&self) -> u32 {
        self.buffer.width()
    }

    fn height(&self) -> u32 {
        self.buffer.height()
    }

    fn is_ink(&self, x: u32, y: u32) -> bool {
        is_ink(self.buffer, x, y, self.threshold)
    }
}

/// A contiguous vertical stretch of ink inside one pixel column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerticalRun {
    /// First ink row of the run.
    pub start: u32,
    /// Number of ink rows.
    pub length: u32,
}

impl VerticalRun {
    pub fn end(&self) -> u32 {
        self.start + self.length
    }

    pub fn overlaps(&self, other: &VerticalRun) -> bool {
        self.start < other.end() && other.start < self.end()
    }
}

/// All ink runs of column `x`, top to bottom. A run touching the bottom edge
/// is closed by the edge.
pub fn column_runs<T: OccupancyTest + ?Sized>(ink: &T, x: u32) -> Vec<VerticalRun> {
    let mut runs = Vec::new();
    let mut streak = 0u32;
    for y in 0..ink.height() {
        if ink.is_ink(x, y) {
            streak += 1;
        } else if streak > 0 {
            runs.push(VerticalRun {
                start: y - streak,
                length: streak,
            });
            streak = 0;
        }
    }
    if streak > 0 {
        runs.push(VerticalRun {
            start: ink.height() - streak,
            length: streak,
        });
    }
    runs
}

/// Dense, memoized ink classification of a whole buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InkMask {
    width: u32,
    height: u32,
    cells: Vec<bool>,
}

impl InkMask {
    pub fn build(buffer: &PixelBuffer, threshold: u8) -> Self {
        let (width, height) = (buffer.width(), buffer.height());
        let mut cells = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                cells.push(is_ink(buffer, x, y, threshold));
            }
        }
        Self {
            width,
            height,
            cells,
        }
    }

    pub fn ink_count(&self) -> usize {
        self.cells.iter().filter(|&&ink| ink).count()
    }

    pub fn column_runs(&self, x: u32) -> Vec<VerticalRun> {
        column_runs(self, x)
    }

    /// Clears every vertical run whose length lies in `[min_height, max_height]`
    /// and returns how many pixels were erased. Runs closed by the bottom edge
    /// count like any other.
    pub fn erase_vertical_runs(&mut self, min_height: u32, max_height: u32) -> usize {
        let mut erased = 0usize;
        for x in 0..self.width {
            for run in self.column_runs(x) {
                if run.length < min_height || run.length > max_height {
                    continue;
                }
                for y in run.start..run.end() {
                    let index = self.index(x, y);
                    self.cells[index] = false;
                }
                erased += run.length as usize;
            }
        }
        erased
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        debug_assert!(x < self.width && y < self.height);
        y as usize * self.width as usize + x as usize
    }
}

impl OccupancyTest for InkMask {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    fn is_ink(&self, x: u32, y: u32) -> bool {
        self.cells[self.index(x, y)]
    }
}
