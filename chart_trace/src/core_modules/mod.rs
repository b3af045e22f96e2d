pub mod binarizer;
pub mod chunk;
pub mod grid_manager;
pub mod path_tracer;
pub mod pixel;
pub mod polyline;
pub mod snapper;
pub mod svg_writer;
pub mod tick_detector;
pub mod utils;
