pub mod chunk;
pub mod error;
pub mod export;
pub mod gradient;
pub mod pool;
pub mod renderer;
pub mod scheduler;
pub mod surface;

pub use chunk::{ChunkCoord, ChunkGrid, DEFAULT_CHUNK_SIZE};
pub use error::RenderError;
pub use export::{export_png, ExportMetadata};
pub use gradient::{builtin_themes, ColorGradient, ColorStop};
pub use pool::{ChunkExecutor, ChunkOutcome, InlineExecutor, WorkerPool};
pub use renderer::{render_chunk, ChunkJob, ChunkResult, RenderSnapshot};
pub use scheduler::{RenderScheduler, SchedulerStats};
pub use surface::DisplaySurface;

/// Convenience result type for the render crate.
pub type Result<T> = std::result::Result<T, RenderError>;
