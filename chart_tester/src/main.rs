use anyhow::{Context, Result};
use chart_trace::core_modules::utils::image_helper::image_helper;
use chart_trace::{
    ExtractionPipeline, ExtractionResult, PathTracingStrategy, PipelineConfig,
    TickDetectionStrategy, WorkerPool,
};
use clap::Parser;
use image::{Rgba, RgbaImage};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

/// Extract curves and tick marks from chart images as SVG
#[derive(Parser, Debug)]
#[command(name = "chart_tester")]
#[command(about = "Trace plotted curves and tick marks in chart images", long_about = None)]
struct Args {
    /// Input image file path(s)
    #[arg(short, long, required = true, num_args = 1..)]
    input: Vec<PathBuf>,

    /// Output file path (without extension)
    #[arg(short, long, default_value = "output")]
    output: String,

    /// JSON file with pipeline settings; flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Also write the extraction result as JSON
    #[arg(long)]
    json: bool,

    /// Save the input with the extracted vectors painted over it
    #[arg(short, long)]
    debug: bool,

    /// Number of batch workers (defaults to the CPU count)
    #[arg(long)]
    workers: Option<usize>,

    #[arg(long)]
    threshold: Option<u32>,
    #[arg(long)]
    x_resolution: Option<u32>,
    #[arg(long)]
    y_resolution: Option<u32>,
    #[arg(long)]
    tick_width: Option<u32>,
    #[arg(long)]
    min_tick_height: Option<u32>,
    #[arg(long)]
    max_tick_height: Option<u32>,
    #[arg(long)]
    max_gap: Option<u32>,
    #[arg(long)]
    min_path_length: Option<u32>,
    #[arg(long)]
    max_paths: Option<u32>,
    #[arg(long, value_enum)]
    tick_strategy: Option<TickArg>,
    #[arg(long, value_enum)]
    path_strategy: Option<PathArg>,
    /// Remove tick strokes before tracing curves
    #[arg(long)]
    erase_ticks: bool,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum TickArg {
    GridStepped,
    ColumnScan,
}

impl From<TickArg> for TickDetectionStrategy {
    fn from(arg: TickArg) -> Self {
        match arg {
            TickArg::GridStepped => TickDetectionStrategy::GridStepped,
            TickArg::ColumnScan => TickDetectionStrategy::ColumnScan,
        }
    }
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum PathArg {
    Lookahead,
    EightNeighbour,
    Segments,
}

impl From<PathArg> for PathTracingStrategy {
    fn from(arg: PathArg) -> Self {
        match arg {
            PathArg::Lookahead => PathTracingStrategy::Lookahead,
            PathArg::EightNeighbour => PathTracingStrategy::EightNeighbour,
            PathArg::Segments => PathTracingStrategy::Segments,
        }
    }
}

impl Args {
    fn pipeline_config(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("reading config {}", path.display()))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("parsing config {}", path.display()))?
            }
            None => PipelineConfig::default(),
        };

        if let Some(v) = self.threshold {
            config.threshold = v;
        }
        if self.x_resolution.is_some() {
            config.x_resolution = self.x_resolution;
        }
        if self.y_resolution.is_some() {
            config.y_resolution = self.y_resolution;
        }
        if let Some(v) = self.tick_width {
            config.tick_width = v;
        }
        if let Some(v) = self.min_tick_height {
            config.min_tick_height = v;
        }
        if let Some(v) = self.max_tick_height {
            config.max_tick_height = v;
        }
        if let Some(v) = self.max_gap {
            config.max_gap = v;
        }
        if let Some(v) = self.min_path_length {
            config.min_path_length = v;
        }
        if let Some(v) = self.max_paths {
            config.max_paths = v;
        }
        if let Some(v) = self.tick_strategy {
            config.tick_strategy = v.into();
        }
        if let Some(v) = self.path_strategy {
            config.path_strategy = v.into();
        }
        config.erase_ticks |= self.erase_ticks;
        Ok(config)
    }

    /// Output stem for the `index`-th input.
    fn output_stem(&self, index: usize) -> String {
        if self.input.len() == 1 {
            self.output.clone()
        } else {
            format!("{}_{index}", self.output)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    // --- 1. Configuration ---
    let config = args.pipeline_config()?;
    let pipeline = ExtractionPipeline::new(config).context("invalid pipeline configuration")?;

    println!("Chart Trace - Curve and Tick Extraction");
    println!("=======================================");
    println!("Inputs: {}", args.input.len());
    println!("Output: {}", args.output);
    println!("Tick strategy: {:?}", pipeline.config().tick_strategy);
    println!("Path strategy: {:?}", pipeline.config().path_strategy);
    println!();

    // --- 2. Image Decoding ---
    let mut buffers = Vec::with_capacity(args.input.len());
    for path in &args.input {
        let buffer =
            image_helper::load(path).with_context(|| format!("loading {}", path.display()))?;
        info!(
            "decoded {} ({}x{})",
            path.display(),
            buffer.width(),
            buffer.height()
        );
        buffers.push(buffer);
    }

    // --- 3. Extraction ---
    let results = if buffers.len() == 1 {
        vec![pipeline.extract(&buffers[0])?]
    } else {
        let pool = match args.workers {
            Some(count) => WorkerPool::with_workers(pipeline, count),
            None => WorkerPool::new(pipeline),
        };
        println!("Processing batch on {} workers", pool.worker_count());
        let results = pool.process_batch(buffers).await;
        info!("batch of {} images finished", results.len());
        pool.shutdown().await;
        results.into_iter().collect::<chart_trace::Result<Vec<_>>>()?
    };

    // --- 4. Output ---
    for (index, (input, result)) in args.input.iter().zip(&results).enumerate() {
        let stem = args.output_stem(index);
        println!("{}: {result}", input.display());

        let svg_path = format!("{stem}.svg");
        fs::write(&svg_path, &result.svg).with_context(|| format!("writing {svg_path}"))?;
        println!("  Saved SVG to: {svg_path}");

        if args.json {
            let json_path = format!("{stem}.json");
            let json = serde_json::to_string_pretty(result)?;
            fs::write(&json_path, json).with_context(|| format!("writing {json_path}"))?;
            println!("  Saved JSON to: {json_path}");
        }

        if args.debug {
            let overlay_path = format!("{stem}_overlay.png");
            save_overlay(input, result, &overlay_path)?;
            println!("  Saved overlay to: {overlay_path}");
        }
    }

    Ok(())
}

/// Paints path points red and tick centres green over the source image.
fn save_overlay(input: &Path, result: &ExtractionResult, output: &str) -> Result<()> {
    let mut canvas: RgbaImage = image::open(input)
        .with_context(|| format!("reopening {}", input.display()))?
        .to_rgba8();

    let red = Rgba([255, 0, 0, 255]);
    let green = Rgba([0, 200, 0, 255]);

    for point in result.paths.iter().flat_map(|path| path.points.iter()) {
        mark(&mut canvas, point.x, point.y, 0, red);
    }
    for tick in &result.ticks {
        mark(&mut canvas, tick.x, tick.y, 3, green);
    }

    canvas.save(output).with_context(|| format!("writing {output}"))?;
    Ok(())
}

/// Draws a plus sign of the given arm length, clipped to the canvas.
fn mark(canvas: &mut RgbaImage, x: f64, y: f64, arm: i64, color: Rgba<u8>) {
    let (cx, cy) = (x.round() as i64, y.round() as i64);
    for d in -arm..=arm {
        for (px, py) in [(cx + d, cy), (cx, cy + d)] {
            if px >= 0 && py >= 0 && (px as u32) < canvas.width() && (py as u32) < canvas.height() {
                canvas.put_pixel(px as u32, py as u32, color);
            }
        }
    }
}
