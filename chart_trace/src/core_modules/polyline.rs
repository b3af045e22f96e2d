// THEORY:
// Output data containers shared by the tick detector, the path tracer, the
// snapper and the SVG writer. Like `Pixel`, these are stateless snapshots of a
// single extraction: a `TracedPath` records one walk through the analysis grid
// in both grid and pixel coordinates, and a `TickMark` is one detected stroke
// centre in pixel space.

use serde::{Deserialize, Serialize};

/// A cell coordinate on the analysis grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridPoint {
    pub x: u32,
    pub y: u32,
}

impl GridPoint {
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// A point in pixel space. Cell sizes may be fractional, so coordinates are real.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// The centre of one detected tick stroke, in pixel space.
///
/// Only `y` is ever adjusted after detection (by the snapper).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TickMark {
    pub x: f64,
    pub y: f64,
}

impl TickMark {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// One polyline recovered by the path tracer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TracedPath {
    /// The visited grid cells, in walk order.
    pub cells: Vec<GridPoint>,
    /// `cells` mapped to pixel space, in the same order.
    pub points: Vec<Point>,
}

impl TracedPath {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
