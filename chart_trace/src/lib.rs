// THEORY:
// This file is the main entry point for the `chart_trace` library crate.
// It follows the standard Rust convention of using `lib.rs` to define the public
// API that will be exposed to external consumers (like the `chart_tester` CLI).
//
// The primary goal is to export the `ExtractionPipeline` and its associated data
// structures (`PipelineConfig`, `ExtractionResult`, etc.) as the clean,
// high-level interface for turning a chart image into curves, tick marks and an
// SVG document. The stage modules (`core_modules`) stay public for callers that
// want to run one stage on its own, but the pipeline is the intended surface.

pub mod core_modules;
pub mod error;
pub mod parallel_pipeline;
pub mod pipeline;

pub use core_modules::chunk::chunk::GridSpec;
pub use core_modules::pixel::pixel::{Pixel, PixelBuffer};
pub use core_modules::svg_writer::SvgStyle;
pub use error::{ExtractionError, Result};
pub use parallel_pipeline::WorkerPool;
pub use pipeline::{
    ExtractionPipeline, ExtractionResult, GridPoint, PathTracingStrategy, PipelineConfig, Point,
    TickDetectionStrategy, TickMark, TracedPath, extract,
};
