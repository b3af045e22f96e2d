// Error taxonomy for the extraction engine. Every fatal condition is detected
// before scanning starts, so a caller either receives a complete
// `ExtractionResult` or one of these variants and nothing in between. Finding
// no ticks or no paths is not an error.

/// Errors surfaced by the extraction pipeline and its adapters.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    /// The pixel buffer has a zero dimension or a sample array whose length
    /// does not equal `4 * width * height`.
    #[error("invalid pixel buffer: {0}")]
    InvalidBuffer(String),

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// An image file could not be opened or decoded.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The batch worker pool dropped a job or its reply.
    #[error("extraction worker unavailable: {0}")]
    WorkerUnavailable(String),
}

pub type Result<T> = std::result::Result<T, ExtractionError>;
