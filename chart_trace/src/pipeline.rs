// THEORY:
// The `pipeline` module is the top-level API of the extraction engine. It
// encapsulates the full stack (binarize, detect ticks, quantize, trace, snap,
// serialize) behind a single call that turns a decoded image into an
// `ExtractionResult`.
//
// Key architectural principles:
// 1.  **Fail Fast**: Configuration is validated when the pipeline is built and
//     the buffer is validated when it is constructed, so no scanning starts on
//     bad input and there is never a partial result.
// 2.  **Stateless Runs**: `ExtractionPipeline` only holds configuration. Every
//     call to `extract` allocates its own ink mask, occupancy grid and visited
//     markers, so one pipeline can be shared across threads and repeated calls
//     with the same input produce identical output.
// 3.  **Explicit Configuration**: Every tunable lives in `PipelineConfig`, which
//     is serde-friendly so callers can keep settings in a file.

use crate::core_modules::binarizer::InkMask;
use crate::core_modules::chunk::chunk::GridSpec;
use crate::core_modules::grid_manager::GridManager;
use crate::core_modules::path_tracer::TraceLimits;
use crate::core_modules::pixel::pixel::PixelBuffer;
use crate::core_modules::snapper::snap_ticks;
use crate::core_modules::svg_writer::{SvgStyle, SvgWriter, median_tick_height};
use crate::core_modules::tick_detector::TickShape;
use crate::error::{ExtractionError, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fmt;

// Re-export key data structures for the public API.
pub use crate::core_modules::path_tracer::PathTracingStrategy;
pub use crate::core_modules::polyline::{GridPoint, Point, TickMark, TracedPath};
pub use crate::core_modules::tick_detector::TickDetectionStrategy;

/// Configuration for the ExtractionPipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Ink/background luminance cutoff, 0-255.
    pub threshold: u32,
    /// Horizontal analysis unit count. `None` means one unit per pixel.
    pub x_resolution: Option<u32>,
    /// Vertical analysis unit count. `None` means one unit per pixel.
    pub y_resolution: Option<u32>,
    pub tick_width: u32,
    pub min_tick_height: u32,
    pub max_tick_height: u32,
    /// Path tracer lookahead distance in grid cells.
    pub max_gap: u32,
    pub min_path_length: u32,
    pub max_paths: u32,
    pub tick_strategy: TickDetectionStrategy,
    pub path_strategy: PathTracingStrategy,
    /// Clear tick-sized vertical strokes from the ink mask before the grid is
    /// built, so ticks do not attract the path tracer.
    pub erase_ticks: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            threshold: 127,
            x_resolution: None,
            y_resolution: None,
            tick_width: 1,
            min_tick_height: 6,
            max_tick_height: 7,
            max_gap: 3,
            min_path_length: 5,
            max_paths: 2,
            tick_strategy: TickDetectionStrategy::default(),
            path_strategy: PathTracingStrategy::default(),
            erase_ticks: false,
        }
    }
}

impl PipelineConfig {
    /// Checks every range constraint, reporting the first violation.
    pub fn validate(&self) -> Result<()> {
        if self.threshold > 255 {
            return Err(invalid(format!(
                "threshold must be within 0..=255, got {}",
                self.threshold
            )));
        }
        let at_least_one = [
            ("tick_width", self.tick_width),
            ("min_tick_height", self.min_tick_height),
            ("max_tick_height", self.max_tick_height),
            ("max_gap", self.max_gap),
            ("min_path_length", self.min_path_length),
            ("max_paths", self.max_paths),
        ];
        if let Some((name, value)) = at_least_one.iter().find(|(_, value)| *value < 1) {
            return Err(invalid(format!("{name} must be at least 1, got {value}")));
        }
        for (name, resolution) in [
            ("x_resolution", self.x_resolution),
            ("y_resolution", self.y_resolution),
        ] {
            if resolution == Some(0) {
                return Err(invalid(format!("{name} must be at least 1")));
            }
        }
        if self.min_tick_height > self.max_tick_height {
            return Err(invalid(format!(
                "min_tick_height ({}) exceeds max_tick_height ({})",
                self.min_tick_height, self.max_tick_height
            )));
        }
        Ok(())
    }

    pub fn tick_shape(&self) -> TickShape {
        TickShape {
            width: self.tick_width,
            min_height: self.min_tick_height,
            max_height: self.max_tick_height,
        }
    }

    pub fn trace_limits(&self) -> TraceLimits {
        TraceLimits {
            max_gap: self.max_gap,
            min_path_length: self.min_path_length,
            max_paths: self.max_paths,
        }
    }

    /// The analysis grid for an image of the given size.
    pub fn grid_spec(&self, image_width: u32, image_height: u32) -> GridSpec {
        let x_resolution = self.x_resolution.unwrap_or(image_width);
        let y_resolution = self.y_resolution.unwrap_or(image_height);
        if GridSpec::is_clamped(image_width, image_height, x_resolution, y_resolution) {
            warn!(
                "resolution {x_resolution}x{y_resolution} clamped to {image_width}x{image_height}"
            );
        }
        GridSpec::new(image_width, image_height, x_resolution, y_resolution)
    }
}

fn invalid(message: String) -> ExtractionError {
    ExtractionError::InvalidConfig(message)
}

/// Everything one extraction produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Retained paths, longest first.
    pub paths: Vec<TracedPath>,
    /// Detected ticks after snapping, in ascending x.
    pub ticks: Vec<TickMark>,
    /// The SVG document for `paths` and `ticks`.
    pub svg: String,
    /// The analysis grid used for this run.
    pub grid: GridSpec,
    /// Traces that met `min_path_length` before the `max_paths` cut.
    pub qualifying_paths: usize,
}

impl fmt::Display for ExtractionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Found {} paths and {} tick marks",
            self.paths.len(),
            self.ticks.len()
        )
    }
}

/// The main, top-level struct for the extraction engine.
#[derive(Debug, Clone)]
pub struct ExtractionPipeline {
    config: PipelineConfig,
    style: SvgStyle,
}

impl ExtractionPipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            style: SvgStyle::default(),
        })
    }

    pub fn with_style(mut self, style: SvgStyle) -> Self {
        self.style = style;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn extract(&self, buffer: &PixelBuffer) -> Result<ExtractionResult> {
        let config = &self.config;
        let (width, height) = (buffer.width(), buffer.height());
        let grid = config.grid_spec(width, height);
        // Validated in `new`, so the cast cannot truncate.
        let threshold = config.threshold as u8;

        // Stage 1: Binarization
        let mut ink = InkMask::build(buffer, threshold);
        debug!(
            "binarized {width}x{height} buffer: {} ink pixels",
            ink.ink_count()
        );

        // Stage 2: Tick Detection (pixel resolution, before any erasure)
        let shape = config.tick_shape();
        let raw_ticks = config.tick_strategy.detect(&ink, &grid, &shape);
        debug!(
            "{:?} detection found {} ticks",
            config.tick_strategy,
            raw_ticks.len()
        );

        if config.erase_ticks {
            let erased = ink.erase_vertical_runs(shape.min_height, shape.max_height);
            debug!("erased {erased} tick pixels before quantization");
        }

        // Stage 3: Quantization
        let occupancy = GridManager::new(grid).quantize(&ink);
        debug!(
            "quantized onto {}x{} grid ({:.2}x{:.2} px cells): {} occupied",
            grid.grid_width,
            grid.grid_height,
            grid.cell_width,
            grid.cell_height,
            occupancy.count_set()
        );

        // Stage 4: Path Tracing
        let limits = config.trace_limits();
        let outcome = config.path_strategy.trace(&occupancy, &grid, &limits);
        debug!(
            "{:?} tracing kept {} of {} qualifying paths",
            config.path_strategy,
            outcome.paths.len(),
            outcome.qualifying
        );

        // Stage 5: Snapping
        let ticks = snap_ticks(&raw_ticks, &outcome.paths, &grid);

        // Stage 6: Serialization
        let median = median_tick_height(config.min_tick_height, config.max_tick_height);
        let svg = SvgWriter::new(width, height, median)
            .with_style(self.style.clone())
            .render(&outcome.paths, &ticks);

        Ok(ExtractionResult {
            paths: outcome.paths,
            ticks,
            svg,
            grid,
            qualifying_paths: outcome.qualifying,
        })
    }
}

/// One-shot convenience wrapper around `ExtractionPipeline`.
pub fn extract(buffer: &PixelBuffer, config: &PipelineConfig) -> Result<ExtractionResult> {
    ExtractionPipeline::new(config.clone())?.extract(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::pixel::pixel::Pixel;

    #[test]
    fn default_config_is_valid() {
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_values() {
        let cases = [
            PipelineConfig {
                threshold: 256,
                ..PipelineConfig::default()
            },
            PipelineConfig {
                tick_width: 0,
                ..PipelineConfig::default()
            },
            PipelineConfig {
                min_tick_height: 0,
                ..PipelineConfig::default()
            },
            PipelineConfig {
                max_gap: 0,
                ..PipelineConfig::default()
            },
            PipelineConfig {
                min_path_length: 0,
                ..PipelineConfig::default()
            },
            PipelineConfig {
                max_paths: 0,
                ..PipelineConfig::default()
            },
            PipelineConfig {
                x_resolution: Some(0),
                ..PipelineConfig::default()
            },
            PipelineConfig {
                min_tick_height: 8,
                max_tick_height: 7,
                ..PipelineConfig::default()
            },
        ];
        for config in cases {
            assert!(
                matches!(
                    ExtractionPipeline::new(config.clone()),
                    Err(ExtractionError::InvalidConfig(_))
                ),
                "{config:?}"
            );
        }
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let json = r#"{"threshold": 90, "path_strategy": "eight_neighbour"}"#;
        let config: PipelineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.threshold, 90);
        assert_eq!(config.path_strategy, PathTracingStrategy::EightNeighbour);
        assert_eq!(config.max_paths, 2);
        assert_eq!(config.tick_strategy, TickDetectionStrategy::GridStepped);
    }

    #[test]
    fn blank_image_is_a_valid_empty_result() {
        let buffer = PixelBuffer::filled(32, 24, Pixel::WHITE).unwrap();
        let result = extract(&buffer, &PipelineConfig::default()).unwrap();
        assert!(result.paths.is_empty());
        assert!(result.ticks.is_empty());
        assert_eq!(result.qualifying_paths, 0);
        assert!(result.svg.contains("viewBox=\"0 0 32 24\""));
        assert_eq!(result.to_string(), "Found 0 paths and 0 tick marks");
    }

    #[test]
    fn erasing_ticks_removes_them_from_the_grid() {
        // A horizontal curve on row 20 and a free-standing tick at column 30.
        let buffer = PixelBuffer::from_fn(60, 40, |x, y| {
            if y == 20 || (x == 30 && (5..11).contains(&y)) {
                Pixel::BLACK
            } else {
                Pixel::WHITE
            }
        })
        .unwrap();
        let keep = PipelineConfig {
            max_paths: 5,
            min_path_length: 1,
            ..PipelineConfig::default()
        };
        let erase = PipelineConfig {
            erase_ticks: true,
            ..keep.clone()
        };
        let kept = extract(&buffer, &keep).unwrap();
        let erased = extract(&buffer, &erase).unwrap();
        assert_eq!(kept.ticks, erased.ticks);
        assert_eq!(kept.paths.len(), 2);
        assert_eq!(erased.paths.len(), 1);
        assert_eq!(erased.paths[0].len(), 60);
    }
}
