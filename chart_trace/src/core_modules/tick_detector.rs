// THEORY:
// Tick marks are short, roughly vertical ink strokes drawn on or near a curve.
// They are detected at pixel resolution, directly on the ink test, and
// independently of the path tracer.
//
// Two heuristics exist and their outputs are not guaranteed to agree, so both
// are kept as named strategies behind `TickDetectionStrategy`:
//
// 1.  **Grid-stepped search** (default): candidate columns are visited at the
//     analysis grid's horizontal stride. At each candidate the search measures
//     how wide a stroke starting there is (up to twice the nominal tick width)
//     and how tall it is at that width. The first stroke in the height band
//     emits a tick whose x is snapped to the grid, and a `skip_to_x` cursor
//     jumps past the stroke so a wide stroke is not reported twice.
// 2.  **Column run-length scan**: every pixel column is scanned for ink runs
//     whose length falls in the band. Matching runs in neighbouring columns
//     that overlap vertically are one physical stroke and emit one tick.
//
// Both strategies report ticks in ascending x order and silently ignore
// strokes outside the height band.

use crate::core_modules::binarizer::{OccupancyTest, VerticalRun, column_runs};
use crate::core_modules::chunk::chunk::GridSpec;
use crate::core_modules::polyline::TickMark;
use log::trace;
use serde::{Deserialize, Serialize};

/// Selects the tick detection heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TickDetectionStrategy {
    #[default]
    GridStepped,
    ColumnScan,
}

/// Accepted stroke shape, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickShape {
    /// Minimum stroke width.
    pub width: u32,
    pub min_height: u32,
    pub max_height: u32,
}

impl TickShape {
    pub fn accepts_height(&self, height: u32) -> bool {
        (self.min_height..=self.max_height).contains(&height)
    }
}

impl TickDetectionStrategy {
    pub fn detect<T: OccupancyTest + ?Sized>(
        &self,
        ink: &T,
        grid: &GridSpec,
        shape: &TickShape,
    ) -> Vec<TickMark> {
        match self {
            TickDetectionStrategy::GridStepped => detect_grid_stepped(ink, grid, shape),
            TickDetectionStrategy::ColumnScan => detect_column_scan(ink, shape),
        }
    }
}

/// A stroke accepted by the grid-stepped search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MeasuredStroke {
    top: u32,
    /// Measured width, capped at twice the nominal tick width.
    width: u32,
    height: u32,
    /// Number of columns the stroke spans, following a slant.
    extent: u32,
}

fn detect_grid_stepped<T: OccupancyTest + ?Sized>(
    ink: &T,
    grid: &GridSpec,
    shape: &TickShape,
) -> Vec<TickMark> {
    let mut ticks = Vec::new();
    let mut skip_to_x = 0u32;
    let limit = ink.width().saturating_sub(shape.width) as f64;

    let mut x = 0.0f64;
    while x < limit {
        let px = x.floor() as u32;
        x += grid.cell_width;
        if px < skip_to_x {
            continue;
        }

        match measure_column(ink, px, shape) {
            Some(stroke) => {
                let center_x = px + stroke.width / 2;
                let tick = TickMark::new(
                    (center_x as f64 / grid.cell_width).round() * grid.cell_width,
                    stroke.top as f64 + stroke.height as f64 / 2.0,
                );
                trace!(
                    "tick at column {px}: {}x{} stroke -> ({}, {})",
                    stroke.width,
                    stroke.height,
                    tick.x,
                    tick.y
                );
                ticks.push(tick);
                skip_to_x = px + stroke.extent;
            }
            None => skip_to_x = 0,
        }
    }
    ticks
}

/// Scans column `px` top to bottom for the first stroke matching `shape`.
fn measure_column<T: OccupancyTest + ?Sized>(
    ink: &T,
    px: u32,
    shape: &TickShape,
) -> Option<MeasuredStroke> {
    let height_limit = ink.height();
    let mut y = 0u32;
    while y < height_limit {
        let width = measure_width(ink, px, y, shape);
        let mut height = 0u32;
        if width >= shape.width {
            height = run_height(ink, px, width, y);
            if shape.accepts_height(height) {
                return Some(MeasuredStroke {
                    top: y,
                    width,
                    height,
                    extent: stroke_extent(
                        ink,
                        px,
                        shape,
                        VerticalRun {
                            start: y,
                            length: height,
                        },
                        width,
                    ),
                });
            }
        }
        // Resume below whatever run was just measured so the lower part of a
        // too-tall stroke is never mistaken for a tick.
        y += height.max(1);
    }
    None
}

/// Number of contiguous columns from `px` that are ink for `min_height` rows
/// starting at `y` (clipped at the bottom edge), capped at `2 * shape.width`.
fn measure_width<T: OccupancyTest + ?Sized>(ink: &T, px: u32, y: u32, shape: &TickShape) -> u32 {
    let rows = y..y.saturating_add(shape.min_height).min(ink.height());
    let cap = shape.width.saturating_mul(2);
    let mut width = 0u32;
    while width < cap && px + width < ink.width() {
        let column = px + width;
        if !rows.clone().all(|row| ink.is_ink(column, row)) {
            break;
        }
        width += 1;
    }
    width
}

/// Consecutive rows from `y` on which all `width` columns from `px` are ink.
fn run_height<T: OccupancyTest + ?Sized>(ink: &T, px: u32, width: u32, y: u32) -> u32 {
    let mut height = 0u32;
    while y + height < ink.height()
        && (px..px + width).all(|column| ink.is_ink(column, y + height))
    {
        height += 1;
    }
    height
}

/// Columns covered by the stroke from `px`: the measured width, then every
/// following column with an in-band run overlapping the previous column's run.
fn stroke_extent<T: OccupancyTest + ?Sized>(
    ink: &T,
    px: u32,
    shape: &TickShape,
    stroke: VerticalRun,
    width: u32,
) -> u32 {
    let mut extent = width;
    let mut run = stroke;
    while px + extent < ink.width() {
        let next = column_runs(ink, px + extent)
            .into_iter()
            .find(|r| shape.accepts_height(r.length) && r.overlaps(&run));
        match next {
            Some(next) => {
                run = next;
                extent += 1;
            }
            None => break,
        }
    }
    extent
}

/// A stroke being assembled column by column by the run-length scan.
struct OpenStroke {
    first_column: u32,
    runs: Vec<VerticalRun>,
}

impl OpenStroke {
    fn last_run(&self) -> &VerticalRun {
        // A stroke is only ever created with one run and only grows.
        &self.runs[self.runs.len() - 1]
    }

    fn finish(self, shape: &TickShape) -> Option<TickMark> {
        let width = self.runs.len() as u32;
        if width < shape.width {
            return None;
        }
        let center = &self.runs[(width / 2) as usize];
        Some(TickMark::new(
            (self.first_column + width / 2) as f64,
            center.start as f64 + center.length as f64 / 2.0,
        ))
    }
}

fn detect_column_scan<T: OccupancyTest + ?Sized>(ink: &T, shape: &TickShape) -> Vec<TickMark> {
    let mut ticks = Vec::new();
    let mut open: Vec<OpenStroke> = Vec::new();

    for x in 0..ink.width() {
        let mut continued: Vec<OpenStroke> = Vec::with_capacity(open.len());
        for run in column_runs(ink, x) {
            if !shape.accepts_height(run.length) {
                continue;
            }
            match open.iter().position(|s| s.last_run().overlaps(&run)) {
                Some(index) => {
                    let mut stroke = open.remove(index);
                    stroke.runs.push(run);
                    continued.push(stroke);
                }
                None => continued.push(OpenStroke {
                    first_column: x,
                    runs: vec![run],
                }),
            }
        }
        ticks.extend(open.drain(..).filter_map(|stroke| stroke.finish(shape)));
        open = continued;
    }
    ticks.extend(open.into_iter().filter_map(|stroke| stroke.finish(shape)));

    // Strokes close in column order of their right edge; report by centre.
    ticks.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    ticks
}
