use chart_trace::{Pixel, PixelBuffer};

/// Black-on-white drawing surface for building chart fixtures.
pub struct SyntheticChart {
    width: u32,
    height: u32,
    ink: Vec<bool>,
}

impl SyntheticChart {
    pub fn new(width: u32, height: u32) -> Self {
        assert!(width > 0 && height > 0, "chart dimensions must be positive");
        Self {
            width,
            height,
            ink: vec![false; (width * height) as usize],
        }
    }

    /// Fills the rectangle, clipped to the canvas.
    pub fn rect(mut self, x: u32, y: u32, width: u32, height: u32) -> Self {
        for py in y..(y + height).min(self.height) {
            for px in x..(x + width).min(self.width) {
                self.ink[(py * self.width + px) as usize] = true;
            }
        }
        self
    }

    /// One pixel thick horizontal line over columns `x0..x1`.
    pub fn hline(self, y: u32, x0: u32, x1: u32) -> Self {
        self.rect(x0, y, x1 - x0, 1)
    }

    /// One pixel wide vertical stroke of `length` rows starting at `top`.
    pub fn tick(self, x: u32, top: u32, length: u32) -> Self {
        self.rect(x, top, 1, length)
    }

    /// Paints every `#` of `rows` as a `cell x cell` block.
    pub fn cells(rows: &[&str], cell: u32) -> Self {
        let width = rows[0].len() as u32 * cell;
        let height = rows.len() as u32 * cell;
        let mut chart = Self::new(width, height);
        for (gy, row) in rows.iter().enumerate() {
            for (gx, c) in row.chars().enumerate() {
                if c == '#' {
                    chart = chart.rect(gx as u32 * cell, gy as u32 * cell, cell, cell);
                }
            }
        }
        chart
    }

    pub fn build(&self) -> PixelBuffer {
        PixelBuffer::from_fn(self.width, self.height, |x, y| {
            if self.ink[(y * self.width + x) as usize] { Pixel::BLACK } else { Pixel::WHITE }
        })
        .expect("synthetic chart dimensions are valid")
    }
}
