// THEORY:
// The snapper reconciles the two independently computed artifacts of an
// extraction: tick marks (pixel-resolution stroke centres) and traced paths
// (grid-resolution cell origins). A tick drawn on a curve is usually detected a
// little above or below the curve's traced baseline; the snapper moves its y
// onto the nearest path point in the same grid column.
//
// Matching is a nearest-neighbour search with two gates:
// 1.  **Column gate**: only path points within one cell width horizontally of
//     the tick are candidates.
// 2.  **Distance gate**: the best candidate is only used when it lies less than
//     two cell heights away vertically. Ticks far from every curve (axis ticks)
//     keep their detected position.
//
// The x coordinate of a tick is never changed.

use crate::core_modules::chunk::chunk::GridSpec;
use crate::core_modules::polyline::{Point, TickMark, TracedPath};

/// Horizontal candidate window, in cell widths.
const COLUMN_WINDOW_CELLS: f64 = 1.0;
/// Maximum vertical snapping distance (exclusive), in cell heights.
const SNAP_LIMIT_CELLS: f64 = 2.0;

/// Returns `ticks` with each y moved onto the nearest qualifying path point.
pub fn snap_ticks(ticks: &[TickMark], paths: &[TracedPath], grid: &GridSpec) -> Vec<TickMark> {
    ticks
        .iter()
        .map(|tick| snap_tick(*tick, paths, grid))
        .collect()
}

fn snap_tick(tick: TickMark, paths: &[TracedPath], grid: &GridSpec) -> TickMark {
    let window = grid.cell_width * COLUMN_WINDOW_CELLS;
    let mut best_match: Option<Point> = None;
    let mut best_distance = f64::INFINITY;

    for point in paths.iter().flat_map(|path| path.points.iter()) {
        if (point.x - tick.x).abs() > window {
            continue;
        }
        let distance = (point.y - tick.y).abs();
        if distance < best_distance {
            best_distance = distance;
            best_match = Some(*point);
        }
    }

    match best_match {
        Some(point) if best_distance < grid.cell_height * SNAP_LIMIT_CELLS => {
            TickMark::new(tick.x, point.y)
        }
        _ => tick,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::polyline::GridPoint;

    fn horizontal_path(y: u32, from: u32, to: u32, grid: &GridSpec) -> TracedPath {
        let cells: Vec<GridPoint> = (from..to).map(|x| GridPoint::new(x, y)).collect();
        let points = cells.iter().map(|&c| grid.to_pixel(c)).collect();
        TracedPath { cells, points }
    }

    #[test]
    fn nearby_tick_moves_onto_the_curve() {
        let grid = GridSpec::new(40, 40, 20, 20);
        let path = horizontal_path(10, 0, 20, &grid);
        let snapped = snap_ticks(&[TickMark::new(10.0, 17.0)], &[path], &grid);
        assert_eq!(snapped, vec![TickMark::new(10.0, 20.0)]);
    }

    #[test]
    fn distant_tick_is_left_alone() {
        let grid = GridSpec::new(40, 40, 20, 20);
        let path = horizontal_path(10, 0, 20, &grid);
        // Exactly two cell heights away does not snap.
        let ticks = [TickMark::new(10.0, 16.0), TickMark::new(10.0, 35.5)];
        assert_eq!(snap_ticks(&ticks, &[path], &grid), ticks.to_vec());
    }

    #[test]
    fn tick_outside_column_window_is_left_alone() {
        let grid = GridSpec::per_pixel(30, 30);
        let path = horizontal_path(5, 0, 10, &grid);
        let tick = TickMark::new(11.0, 5.5);
        assert_eq!(snap_ticks(&[tick], &[path], &grid), vec![tick]);
    }

    #[test]
    fn equidistant_paths_keep_the_first_found() {
        let grid = GridSpec::per_pixel(30, 30);
        let upper = horizontal_path(9, 0, 20, &grid);
        let lower = horizontal_path(11, 0, 20, &grid);
        let snapped = snap_ticks(&[TickMark::new(4.0, 10.0)], &[upper, lower], &grid);
        assert_eq!(snapped, vec![TickMark::new(4.0, 9.0)]);
    }

    #[test]
    fn no_paths_means_no_change() {
        let grid = GridSpec::per_pixel(10, 10);
        let ticks = [TickMark::new(1.0, 2.0)];
        assert_eq!(snap_ticks(&ticks, &[], &grid), ticks.to_vec());
    }
}
