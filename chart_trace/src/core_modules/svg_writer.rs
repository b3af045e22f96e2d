// SVG export module
// Renders traced paths and tick cross-hairs in pixel coordinates, with the
// document sized to the source image.

use crate::core_modules::polyline::{TickMark, TracedPath};

/// Stroke styling for the exported document.
#[derive(Debug, Clone, PartialEq)]
pub struct SvgStyle {
    pub path_stroke: String,
    pub tick_stroke: String,
    pub stroke_width: f64,
    /// Half-length of the horizontal arm of a tick cross-hair.
    pub tick_arm: f64,
}

impl Default for SvgStyle {
    fn default() -> Self {
        Self {
            path_stroke: "red".to_string(),
            tick_stroke: "green".to_string(),
            stroke_width: 1.0,
            tick_arm: 5.0,
        }
    }
}

/// Half-height of a tick cross-hair for a tick height band: the band midpoint
/// rounded half up.
pub fn median_tick_height(min_tick_height: u32, max_tick_height: u32) -> u32 {
    (min_tick_height + max_tick_height).div_ceil(2)
}

/// Writes one extraction's vectors as an SVG document.
#[derive(Debug, Clone, PartialEq)]
pub struct SvgWriter {
    pub width: u32,
    pub height: u32,
    pub median_tick_height: u32,
    pub style: SvgStyle,
}

impl SvgWriter {
    pub fn new(width: u32, height: u32, median_tick_height: u32) -> Self {
        Self {
            width,
            height,
            median_tick_height,
            style: SvgStyle::default(),
        }
    }

    pub fn with_style(mut self, style: SvgStyle) -> Self {
        self.style = style;
        self
    }

    pub fn render(&self, paths: &[TracedPath], ticks: &[TickMark]) -> String {
        let mut svg = String::new();

        // SVG header with viewBox in image pixels
        svg.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        svg.push_str(&format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" version=\"1.1\" viewBox=\"0 0 {} {}\" \
             preserveAspectRatio=\"xMidYMid meet\">\n",
            self.width, self.height
        ));
        svg.push_str("  <title>chart_trace - Extracted curves and tick marks</title>\n");

        for (idx, path) in paths.iter().enumerate() {
            let Some((first, rest)) = path.points.split_first() else {
                continue;
            };
            let mut data = format!("M {} {}", first.x, first.y);
            for point in rest {
                data.push_str(&format!(" L {} {}", point.x, point.y));
            }
            svg.push_str(&format!(
                "  <path id=\"path-{idx}\" d=\"{data}\" stroke=\"{}\" \
                 stroke-width=\"{}\" fill=\"none\" />\n",
                self.style.path_stroke, self.style.stroke_width
            ));
        }

        let half = self.median_tick_height as f64;
        let arm = self.style.tick_arm;
        for (idx, tick) in ticks.iter().enumerate() {
            let (x, y) = (tick.x, tick.y);
            svg.push_str(&format!(
                "  <path id=\"tick-{idx}\" d=\"M {x} {} L {x} {} M {} {y} L {} {y}\" \
                 stroke=\"{}\" stroke-width=\"{}\" fill=\"none\" />\n",
                y - half,
                y + half,
                x - arm,
                x + arm,
                self.style.tick_stroke,
                self.style.stroke_width
            ));
        }

        svg.push_str("</svg>\n");
        svg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::polyline::{GridPoint, Point};

    fn path(points: &[(f64, f64)]) -> TracedPath {
        TracedPath {
            cells: points.iter().map(|&(x, y)| GridPoint::new(x as u32, y as u32)).collect(),
            points: points.iter().map(|&(x, y)| Point::new(x, y)).collect(),
        }
    }

    #[test]
    fn median_tick_height_rounds_half_up() {
        assert_eq!(median_tick_height(6, 7), 7);
        assert_eq!(median_tick_height(4, 8), 6);
        assert_eq!(median_tick_height(1, 1), 1);
    }

    #[test]
    fn document_is_sized_to_the_image() {
        let svg = SvgWriter::new(320, 200, 7).render(&[], &[]);
        assert!(svg.contains("viewBox=\"0 0 320 200\""));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert!(!svg.contains("<path"));
    }

    #[test]
    fn paths_are_open_polylines_in_trace_order() {
        let paths = [path(&[(0.0, 1.0), (2.5, 1.0), (2.5, 4.0)])];
        let svg = SvgWriter::new(10, 10, 7).render(&paths, &[]);
        assert!(svg.contains("d=\"M 0 1 L 2.5 1 L 2.5 4\""));
        assert!(svg.contains("stroke=\"red\""));
        assert!(!svg.contains('Z'));
    }

    #[test]
    fn ticks_are_cross_hairs() {
        let svg = SvgWriter::new(50, 50, 7).render(&[], &[TickMark::new(10.0, 20.5)]);
        assert!(svg.contains("d=\"M 10 13.5 L 10 27.5 M 5 20.5 L 15 20.5\""));
        assert!(svg.contains("stroke=\"green\""));
    }

    #[test]
    fn empty_paths_are_skipped_and_rendering_is_idempotent() {
        let writer = SvgWriter::new(20, 20, 3).with_style(SvgStyle {
            path_stroke: "blue".to_string(),
            ..SvgStyle::default()
        });
        let paths = [path(&[]), path(&[(1.0, 1.0), (2.0, 1.0)])];
        let ticks = [TickMark::new(4.0, 4.0)];
        let first = writer.render(&paths, &ticks);
        assert_eq!(first, writer.render(&paths, &ticks));
        assert_eq!(first.matches("<path id=\"path-").count(), 1);
        assert!(first.contains("id=\"path-1\""));
        assert!(first.contains("stroke=\"blue\""));
    }
}
