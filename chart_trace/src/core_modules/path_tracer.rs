// THEORY:
// The path tracer recovers drawn curves as polylines by walking the occupancy
// grid. It is a greedy heuristic, not a global optimizer: each walk commits to
// the best-looking next cell and never backtracks.
//
// Key architectural principles:
// 1.  **Global Visited Set**: A single `visited` grid is shared by every walk in
//     one invocation and handed to each walk by `&mut`. A cell joins at most one
//     trace, which bounds the total work by `cells * max_gap` and guarantees
//     termination. Cells of traces that are later discarded stay visited.
// 2.  **Left Edge First**: Plotted series usually start at the left edge, so
//     seeds are taken from grid column 0 top to bottom before the rest of the
//     grid is scanned row-major. Curves touching the left edge become primary.
// 3.  **Gap Tolerance**: Walks look up to `max_gap` cells ahead, bridging dashed
//     or broken strokes.
// 4.  **Selection**: Short traces are dropped, survivors are stable-sorted by
//     length (longest first) and only `max_paths` are kept.
//
// Strategies:
// - `Lookahead`: right/down only, scored so that continuing in the same
//   direction beats turning and right beats down.
// - `EightNeighbour`: first free cell in the fixed compass order E, NE, N, NW,
//   W, SW, S, SE at the nearest distance.
// - `Segments`: right/down single steps that stop at any ambiguity; segments
//   start only where nothing free lies to the left or above.

use crate::core_modules::chunk::chunk::GridSpec;
use crate::core_modules::grid_manager::{CellGrid, OccupancyGrid};
use crate::core_modules::polyline::{GridPoint, TracedPath};
use log::trace;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

pub const RIGHT_CONTINUE_SCORE: u32 = 12;
pub const RIGHT_TURN_SCORE: u32 = 10;
pub const DOWN_CONTINUE_SCORE: u32 = 10;
pub const DOWN_TURN_SCORE: u32 = 8;

/// Compass order tried by the eight-neighbour walk (y grows downward).
const COMPASS: [(i64, i64); 8] = [
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Selects the path following heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathTracingStrategy {
    #[default]
    Lookahead,
    EightNeighbour,
    Segments,
}

/// Tracer parameters, all >= 1 after validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceLimits {
    /// Lookahead distance in grid cells.
    pub max_gap: u32,
    /// Minimum number of points for a trace to be retained.
    pub min_path_length: u32,
    /// Maximum number of retained traces.
    pub max_paths: u32,
}

/// Result of one tracing run.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceOutcome {
    /// Retained paths, longest first.
    pub paths: Vec<TracedPath>,
    /// Traces that met `min_path_length`, before the `max_paths` cut.
    pub qualifying: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Right,
    Down,
}

impl PathTracingStrategy {
    pub fn trace(
        &self,
        grid: &OccupancyGrid,
        spec: &GridSpec,
        limits: &TraceLimits,
    ) -> TraceOutcome {
        let mut visited = CellGrid::new(grid.width(), grid.height());
        let walks = match self {
            PathTracingStrategy::Lookahead => {
                seeded_walks(grid, &mut visited, |grid, visited, seed| {
                    walk_lookahead(grid, visited, seed, limits.max_gap)
                })
            }
            PathTracingStrategy::EightNeighbour => {
                seeded_walks(grid, &mut visited, |grid, visited, seed| {
                    walk_compass(grid, visited, seed, limits.max_gap)
                })
            }
            PathTracingStrategy::Segments => segment_walks(grid, &mut visited),
        };
        select(walks, spec, limits)
    }
}

/// Runs `walk` from every free occupied cell: column 0 first, then the rest of
/// the grid row-major.
fn seeded_walks<F>(grid: &OccupancyGrid, visited: &mut CellGrid, mut walk: F) -> Vec<Vec<GridPoint>>
where
    F: FnMut(&OccupancyGrid, &mut CellGrid, GridPoint) -> Vec<GridPoint>,
{
    let mut walks = Vec::new();
    if grid.width() == 0 {
        return walks;
    }
    let left_edge = (0..grid.height()).map(|y| GridPoint::new(0, y));
    let interior = (0..grid.height())
        .flat_map(|y| (1..grid.width()).map(move |x| GridPoint::new(x, y)));
    for seed in left_edge.chain(interior) {
        if grid.get(seed) && !visited.get(seed) {
            let cells = walk(grid, visited, seed);
            trace!("walk from ({}, {}) covered {} cells", seed.x, seed.y, cells.len());
            walks.push(cells);
        }
    }
    walks
}

fn is_free(grid: &OccupancyGrid, visited: &CellGrid, cell: GridPoint) -> bool {
    grid.get(cell) && !visited.get(cell)
}

fn walk_lookahead(
    grid: &OccupancyGrid,
    visited: &mut CellGrid,
    start: GridPoint,
    max_gap: u32,
) -> Vec<GridPoint> {
    let reach = max_gap.min(grid.width().max(grid.height()));
    let mut path = vec![start];
    visited.set(start, true);
    let mut current = start;
    let mut last_direction: Option<Direction> = None;

    loop {
        let mut best: Option<(GridPoint, Direction)> = None;
        let mut best_score = 0u32;

        for distance in 1..=reach {
            let right = GridPoint::new(current.x + distance, current.y);
            if right.x < grid.width() && is_free(grid, visited, right) {
                let score = if last_direction == Some(Direction::Right) {
                    RIGHT_CONTINUE_SCORE
                } else {
                    RIGHT_TURN_SCORE
                };
                if score > best_score {
                    best_score = score;
                    best = Some((right, Direction::Right));
                }
            }

            let down = GridPoint::new(current.x, current.y + distance);
            if down.y < grid.height() && is_free(grid, visited, down) {
                let score = if last_direction == Some(Direction::Down) {
                    DOWN_CONTINUE_SCORE
                } else {
                    DOWN_TURN_SCORE
                };
                if score > best_score {
                    best_score = score;
                    best = Some((down, Direction::Down));
                }
            }
        }

        let Some((next, direction)) = best else {
            break;
        };
        visited.set(next, true);
        path.push(next);
        current = next;
        last_direction = Some(direction);
    }
    path
}

fn walk_compass(
    grid: &OccupancyGrid,
    visited: &mut CellGrid,
    start: GridPoint,
    max_gap: u32,
) -> Vec<GridPoint> {
    let reach = max_gap.min(grid.width().max(grid.height())) as i64;
    let mut path = vec![start];
    visited.set(start, true);
    let mut current = start;

    'walk: loop {
        for distance in 1..=reach {
            for (dx, dy) in COMPASS {
                let nx = current.x as i64 + dx * distance;
                let ny = current.y as i64 + dy * distance;
                if !grid.contains(nx, ny) {
                    continue;
                }
                let next = GridPoint::new(nx as u32, ny as u32);
                if is_free(grid, visited, next) {
                    visited.set(next, true);
                    path.push(next);
                    current = next;
                    continue 'walk;
                }
            }
        }
        break;
    }
    path
}

/// Right/down segments that stop wherever the next step is ambiguous.
fn segment_walks(grid: &OccupancyGrid, visited: &mut CellGrid) -> Vec<Vec<GridPoint>> {
    let free = |visited: &CellGrid, x: i64, y: i64| {
        grid.contains(x, y) && is_free(grid, visited, GridPoint::new(x as u32, y as u32))
    };

    let mut walks = Vec::new();
    for y in 0..grid.height() as i64 {
        for x in 0..grid.width() as i64 {
            if !free(visited, x, y) || free(visited, x - 1, y) || free(visited, x, y - 1) {
                continue;
            }
            let start = GridPoint::new(x as u32, y as u32);
            visited.set(start, true);
            let mut segment = vec![start];
            let (mut cx, mut cy) = (x, y);
            loop {
                let right = free(visited, cx + 1, cy);
                let down = free(visited, cx, cy + 1);
                (cx, cy) = match (right, down) {
                    (true, false) => (cx + 1, cy),
                    (false, true) => (cx, cy + 1),
                    _ => break,
                };
                let next = GridPoint::new(cx as u32, cy as u32);
                visited.set(next, true);
                segment.push(next);
            }
            walks.push(segment);
        }
    }
    walks
}

fn select(walks: Vec<Vec<GridPoint>>, spec: &GridSpec, limits: &TraceLimits) -> TraceOutcome {
    let mut qualifying: Vec<Vec<GridPoint>> = walks
        .into_iter()
        .filter(|cells| cells.len() >= limits.min_path_length as usize)
        .collect();
    let count = qualifying.len();

    // `sort_by_key` is stable: equal lengths keep discovery order.
    qualifying.sort_by_key(|cells| Reverse(cells.len()));
    qualifying.truncate(limits.max_paths as usize);

    let paths = qualifying
        .into_iter()
        .map(|cells| {
            let points = cells.iter().map(|&cell| spec.to_pixel(cell)).collect();
            TracedPath { cells, points }
        })
        .collect();
    TraceOutcome {
        paths,
        qualifying: count,
    }
}

#[cfg(test)]
mod tests {
    use super::PathTracingStrategy::{EightNeighbour, Lookahead, Segments};
    use super::*;
    use crate::core_modules::polyline::Point;

    fn limits(max_gap: u32, min_path_length: u32, max_paths: u32) -> TraceLimits {
        TraceLimits {
            max_gap,
            min_path_length,
            max_paths,
        }
    }

    fn cells(path: &TracedPath) -> Vec<(u32, u32)> {
        path.cells.iter().map(|c| (c.x, c.y)).collect()
    }

    fn traced(
        strategy: PathTracingStrategy,
        grid: &OccupancyGrid,
        limits: TraceLimits,
    ) -> TraceOutcome {
        let spec = GridSpec::per_pixel(grid.width(), grid.height());
        strategy.trace(grid, &spec, &limits)
    }

    #[test]
    fn empty_grid_has_no_paths() {
        let grid = CellGrid::new(8, 5);
        for strategy in [Lookahead, EightNeighbour, Segments] {
            let outcome = traced(strategy, &grid, limits(3, 1, 4));
            assert!(outcome.paths.is_empty());
            assert_eq!(outcome.qualifying, 0);
        }
    }

    #[test]
    fn staircase_with_gaps_is_one_path() {
        let grid = CellGrid::from_rows(&[
            "#.#.....",
            "........",
            "..#.#...",
            "........",
            "....#.##",
        ]);
        let outcome = traced(Lookahead, &grid, limits(2, 3, 5));
        assert_eq!(outcome.paths.len(), 1);
        assert_eq!(
            cells(&outcome.paths[0]),
            vec![(0, 0), (2, 0), (2, 2), (4, 2), (4, 4), (6, 4), (7, 4)]
        );
    }

    #[test]
    fn continuing_right_beats_a_nearer_down_move() {
        // After moving right, a right move two cells away (12) outranks a down
        // move one cell away (8).
        let grid = CellGrid::from_rows(&[
            "##.#",
            ".#..",
        ]);
        let outcome = traced(Lookahead, &grid, limits(2, 1, 5));
        assert_eq!(cells(&outcome.paths[0]), vec![(0, 0), (1, 0), (3, 0)]);
        assert_eq!(cells(&outcome.paths[1]), vec![(1, 1)]);
    }

    #[test]
    fn equal_scores_prefer_the_nearer_right_move() {
        // After moving down, right and down both score 10; right at distance 1
        // is found first and a later tie does not displace it.
        let grid = CellGrid::from_rows(&[
            "#..",
            "##.",
            "#..",
        ]);
        let outcome = traced(Lookahead, &grid, limits(1, 1, 5));
        assert_eq!(cells(&outcome.paths[0]), vec![(0, 0), (0, 1), (1, 1)]);
    }

    #[test]
    fn left_edge_seeds_come_first() {
        let grid = CellGrid::from_rows(&[
            "....###",
            "#......",
        ]);
        let outcome = traced(Lookahead, &grid, limits(1, 1, 5));
        assert_eq!(cells(&outcome.paths[0]), vec![(4, 0), (5, 0), (6, 0)]);
        assert_eq!(cells(&outcome.paths[1]), vec![(0, 1)]);
        // Equal lengths would keep discovery order, so re-run with the left seed
        // as long as the interior trace.
        let grid = CellGrid::from_rows(&[
            ".....##",
            "##.....",
        ]);
        let outcome = traced(Lookahead, &grid, limits(1, 1, 5));
        assert_eq!(cells(&outcome.paths[0]), vec![(0, 1), (1, 1)]);
        assert_eq!(cells(&outcome.paths[1]), vec![(5, 0), (6, 0)]);
    }

    #[test]
    fn max_paths_keeps_the_longest() {
        let grid = CellGrid::from_rows(&[
            "###.....",
            "........",
            "#####...",
        ]);
        let outcome = traced(Lookahead, &grid, limits(1, 2, 1));
        assert_eq!(outcome.qualifying, 2);
        assert_eq!(outcome.paths.len(), 1);
        assert_eq!(outcome.paths[0].len(), 5);
    }

    #[test]
    fn short_traces_are_discarded_but_stay_visited() {
        let grid = CellGrid::from_rows(&["#.###"]);
        let outcome = traced(Lookahead, &grid, limits(1, 2, 5));
        assert_eq!(outcome.paths.len(), 1);
        assert_eq!(cells(&outcome.paths[0]), vec![(2, 0), (3, 0), (4, 0)]);
    }

    #[test]
    fn no_cell_is_shared_between_paths() {
        let grid = CellGrid::from_rows(&[
            "#.#.#.#.",
            "########",
            "#.#.#.#.",
            "########",
        ]);
        for strategy in [Lookahead, EightNeighbour, Segments] {
            let outcome = traced(strategy, &grid, limits(2, 1, 100));
            let mut seen = std::collections::HashSet::new();
            for path in &outcome.paths {
                for cell in &path.cells {
                    assert!(seen.insert(*cell), "{strategy:?} revisited {cell:?}");
                }
            }
            assert_eq!(seen.len(), grid.count_set(), "{strategy:?}");
        }
    }

    #[test]
    fn points_are_scaled_by_cell_size() {
        let grid = CellGrid::from_rows(&["##"]);
        let spec = GridSpec::new(8, 3, 2, 1);
        let outcome = Lookahead.trace(&grid, &spec, &limits(1, 1, 1));
        assert_eq!(
            outcome.paths[0].points,
            vec![Point::new(0.0, 0.0), Point::new(4.0, 0.0)]
        );
    }

    #[test]
    fn eight_neighbour_follows_a_falling_diagonal() {
        let grid = CellGrid::from_rows(&[
            "#...",
            ".#..",
            "..#.",
            "...#",
        ]);
        let outcome = traced(EightNeighbour, &grid, limits(1, 1, 5));
        assert_eq!(outcome.paths.len(), 1);
        assert_eq!(
            cells(&outcome.paths[0]),
            vec![(0, 0), (1, 1), (2, 2), (3, 3)]
        );
    }

    #[test]
    fn eight_neighbour_prefers_east_then_north_east() {
        let grid = CellGrid::from_rows(&[
            ".#.",
            "##.",
            ".#.",
        ]);
        // From (0, 1): E is (1, 1); from there E is empty, NE empty, N is (1, 0).
        let outcome = traced(EightNeighbour, &grid, limits(1, 1, 5));
        assert_eq!(cells(&outcome.paths[0]), vec![(0, 1), (1, 1), (1, 0)]);
    }

    #[test]
    fn segments_stop_at_forks() {
        let grid = CellGrid::from_rows(&[
            "###.",
            "..##",
            "..#.",
        ]);
        let outcome = traced(Segments, &grid, limits(1, 1, 5));
        // At (2, 1) both right and down are free, so the segment ends there.
        assert_eq!(
            cells(&outcome.paths[0]),
            vec![(0, 0), (1, 0), (2, 0), (2, 1)]
        );
    }
}
