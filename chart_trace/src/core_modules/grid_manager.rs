// THEORY:
// The `GridManager` turns pixel-level ink into the coarse occupancy grid the
// path tracer walks. It is not an analyzer itself; it orchestrates the
// slicing of the image into logical cells described by a `GridSpec` and asks
// the occupancy test about each cell's pixels.
//
// Key architectural principles:
// 1.  **Spatial Pooling**: A cell is occupied when any pixel it covers is ink.
//     The scan short-circuits on the first ink pixel, so dense regions are cheap.
// 2.  **Source Agnostic**: Quantization works against any `OccupancyTest`, so the
//     memoized `InkMask` (possibly with tick strokes erased) and the direct
//     buffer test produce the same grid for the same ink.
// 3.  **Plain Boolean Raster**: The result is a `CellGrid`, the same structure
//     the path tracer uses for its `visited` markers.

use crate::core_modules::binarizer::OccupancyTest;
use crate::core_modules::chunk::chunk::GridSpec;
use crate::core_modules::polyline::GridPoint;

/// A row-major boolean matrix over grid cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellGrid {
    width: u32,
    height: u32,
    cells: Vec<bool>,
}

/// Cells containing at least one ink pixel.
pub type OccupancyGrid = CellGrid;

impl CellGrid {
    /// An all-false grid.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cells: vec![false; width as usize * height as usize],
        }
    }

    /// Builds a grid from rows of `'#'` (set) and any other character (clear).
    /// Every row must have the same length.
    pub fn from_rows(rows: &[&str]) -> Self {
        let height = rows.len() as u32;
        let width = rows.first().map_or(0, |row| row.chars().count()) as u32;
        let mut grid = Self::new(width, height);
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                if ch == '#' {
                    grid.set(GridPoint::new(x as u32, y as u32), true);
                }
            }
        }
        grid
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x < self.width as i64 && y < self.height as i64
    }

    #[inline]
    pub fn get(&self, cell: GridPoint) -> bool {
        self.cells[self.index(cell)]
    }

    #[inline]
    pub fn set(&mut self, cell: GridPoint, value: bool) {
        let index = self.index(cell);
        self.cells[index] = value;
    }

    pub fn count_set(&self) -> usize {
        self.cells.iter().filter(|&&set| set).count()
    }

    #[inline]
    fn index(&self, cell: GridPoint) -> usize {
        assert!(
            cell.x < self.width && cell.y < self.height,
            "cell ({}, {}) is outside the {}x{} grid",
            cell.x,
            cell.y,
            self.width,
            self.height
        );
        cell.y as usize * self.width as usize + cell.x as usize
    }
}

/// Quantizes pixel-space ink onto the logical grid described by a `GridSpec`.
pub struct GridManager {
    spec: GridSpec,
}

impl GridManager {
    pub fn new(spec: GridSpec) -> Self {
        Self { spec }
    }

    /// Builds the occupancy grid for `ink`.
    pub fn quantize<T: OccupancyTest + ?Sized>(&self, ink: &T) -> OccupancyGrid {
        let mut grid = CellGrid::new(self.spec.grid_width, self.spec.grid_height);
        for gy in 0..self.spec.grid_height {
            let rows = self.spec.pixel_rows(gy);
            for gx in 0..self.spec.grid_width {
                let columns = self.spec.pixel_columns(gx);
                let occupied = rows
                    .clone()
                    .any(|y| columns.clone().any(|x| ink.is_ink(x, y)));
                if occupied {
                    grid.set(GridPoint::new(gx, gy), true);
                }
            }
        }
        grid
    }
}
