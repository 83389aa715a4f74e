use thiserror::Error;

/// Errors originating from the rendering pipeline.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invalid chunk size: {0} (must be > 0)")]
    InvalidChunkSize(u32),

    #[error("invalid worker concurrency cap: {0} (must be > 0)")]
    InvalidConcurrency(usize),

    #[error("invalid gradient '{name}': {reason}")]
    InvalidGradient { name: String, reason: String },

    #[error("invalid surface dimensions: {width}×{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("failed to start worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("PNG encoding failed: {0}")]
    Png(#[from] png::EncodingError),

    #[error(transparent)]
    Core(#[from] chunkbrot_core::CoreError),
}
